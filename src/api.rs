//! REST API server for the wealth advisor pipeline
//!
//! Exposes the orchestrator via HTTP endpoints for the front-end.
//! Each endpoint is a self-contained pipeline run; no session state is
//! persisted between requests.

use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::error::AdvisorError;
use crate::models::{GoalPlan, RiskTier, UserProfile};
use crate::pipeline::PipelineOrchestrator;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub age: u8,
    pub monthly_income: f64,
    pub risk_tolerance: String,
    pub goal: String,
}

#[derive(Debug, Deserialize)]
pub struct SipRequest {
    pub goal_amount: f64,
    pub years: u32,
    pub expected_return_pct: f64,
}

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    #[serde(flatten)]
    pub profile: ProfileRequest,
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    #[serde(flatten)]
    pub profile: ProfileRequest,
    pub plan: Option<SipRequest>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<PipelineOrchestrator>,
}

/// =============================
/// Helpers
/// =============================

/// Risk tiers form a closed domain; anything else is a caller
/// contract violation, never a silent default.
fn parse_risk(r: &str) -> Result<RiskTier, AdvisorError> {
    match r.to_lowercase().as_str() {
        "low" => Ok(RiskTier::Low),
        "medium" => Ok(RiskTier::Medium),
        "high" => Ok(RiskTier::High),
        other => Err(AdvisorError::InvalidArgument(format!(
            "risk tolerance must be one of low, medium, high; got '{}'",
            other
        ))),
    }
}

fn build_profile(req: &ProfileRequest) -> Result<UserProfile, AdvisorError> {
    UserProfile::new(
        req.age,
        req.monthly_income,
        parse_risk(&req.risk_tolerance)?,
        req.goal.clone(),
    )
}

/// Which step failed, and with which status. Validation failures are
/// the caller's fault; collaborator failures are upstream's.
fn error_status(e: &AdvisorError) -> StatusCode {
    match e {
        AdvisorError::InvalidArgument(_) | AdvisorError::DegenerateRate(_) => {
            StatusCode::BAD_REQUEST
        }
        AdvisorError::CollaboratorUnavailable(_)
        | AdvisorError::CollaboratorRejected { .. }
        | AdvisorError::MalformedCollaboratorResponse(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(e: AdvisorError) -> (StatusCode, Json<ApiResponse>) {
    (error_status(&e), Json(ApiResponse::error(e.to_string())))
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Portfolio Endpoint
/// =============================

async fn generate_portfolio(
    State(state): State<ApiState>,
    Json(req): Json<ProfileRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    info!(age = req.age, risk = %req.risk_tolerance, "Received portfolio request");

    let profile = match build_profile(&req) {
        Ok(profile) => profile,
        Err(e) => return failure(e),
    };

    let session = state.orchestrator.generate_portfolio(profile).await;

    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({
            "session_id": session.session_id,
            "allocation": session.allocation,
            "narrative": session.narrative.as_ref().map(|n| n.text.clone()),
            "narrative_error": session.narrative_error,
            "state": session.state,
        }))),
    )
}

/// =============================
/// SIP Endpoint
/// =============================

async fn compute_sip(
    Json(req): Json<SipRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    match crate::sip::solve(req.goal_amount, req.years, req.expected_return_pct) {
        Ok(result) => (StatusCode::OK, Json(ApiResponse::success(result))),
        Err(e) => failure(e),
    }
}

/// =============================
/// Returns Endpoint
/// =============================

async fn estimate_returns(State(state): State<ApiState>) -> (StatusCode, Json<ApiResponse>) {
    // Table assembly is infallible; failing tickers degrade to
    // unavailable rows.
    let table = state.orchestrator.estimate_market_returns().await;
    (StatusCode::OK, Json(ApiResponse::success(table)))
}

/// =============================
/// Question Endpoint
/// =============================

async fn ask_question(
    State(state): State<ApiState>,
    Json(req): Json<QuestionRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let profile = match build_profile(&req.profile) {
        Ok(profile) => profile,
        Err(e) => return failure(e),
    };

    let session = state.orchestrator.start_session(profile);
    match state.orchestrator.answer_question(&session, &req.question).await {
        Ok(answer) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({
                "answer": answer.text,
            }))),
        ),
        Err(e) => failure(e),
    }
}

/// =============================
/// Report Endpoint
/// =============================

async fn render_report(
    State(state): State<ApiState>,
    Json(req): Json<ReportRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let profile = match build_profile(&req.profile) {
        Ok(profile) => profile,
        Err(e) => return failure(e),
    };

    let mut session = state.orchestrator.generate_portfolio(profile).await;

    if let Some(plan_req) = &req.plan {
        let plan = match GoalPlan::new(
            plan_req.goal_amount,
            plan_req.years,
            plan_req.expected_return_pct,
        ) {
            Ok(plan) => plan,
            Err(e) => return failure(e),
        };
        if let Err(e) = state.orchestrator.compute_sip(&mut session, &plan) {
            return failure(e);
        }
    }

    match state.orchestrator.render_report(&mut session) {
        Ok(path) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({
                "session_id": session.session_id,
                "report_path": path.display().to_string(),
                "narrative_error": session.narrative_error,
                "state": session.state,
            }))),
        ),
        Err(e) => failure(e),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(orchestrator: Arc<PipelineOrchestrator>) -> Router {
    let state = ApiState { orchestrator };

    Router::new()
        .route("/health", get(health))
        .route("/api/portfolio", post(generate_portfolio))
        .route("/api/sip", post(compute_sip))
        .route("/api/returns", post(estimate_returns))
        .route("/api/question", post(ask_question))
        .route("/api/report", post(render_report))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    orchestrator: Arc<PipelineOrchestrator>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(orchestrator);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
