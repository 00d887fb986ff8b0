//! Pipeline orchestration
//!
//! Sequences allocation, narrative, SIP, return estimation and report
//! rendering for one in-flight request. Owns no business logic; each
//! optional step is triggered independently and a failure in one never
//! blocks the others.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

use crate::allocation;
use crate::markets::{ReturnEstimator, TickerMap};
use crate::models::{Allocation, GoalPlan, Narrative, ReturnsTable, SipResult, UserProfile};
use crate::narrative::NarrativeGenerator;
use crate::report::{self, ReportSink};
use crate::sip;
use crate::Result;

/// Progress of one advisory request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    ProfileCollected,
    AllocationComputed,
    NarrativeRequested,
    NarrativeReady,
    NarrativeFailed,
    SipComputed,
    ReturnsEstimated,
    ReportRendered,
}

/// All state for one in-flight request. Value object: nothing here is
/// shared across requests.
#[derive(Debug, Clone, Serialize)]
pub struct AdvisorySession {
    pub session_id: Uuid,
    pub profile: UserProfile,
    pub allocation: Allocation,
    pub narrative: Option<Narrative>,
    /// Displayable message when narrative generation failed; the
    /// allocation and any SIP figure remain valid.
    pub narrative_error: Option<String>,
    pub sip: Option<SipResult>,
    pub returns: Option<ReturnsTable>,
    pub state: PipelineState,
}

/// Sequences the pipeline components. Construction-time configuration
/// (collaborator credentials, tickers) is read-only thereafter.
pub struct PipelineOrchestrator {
    generator: NarrativeGenerator,
    estimator: ReturnEstimator,
    sink: Box<dyn ReportSink>,
    tickers: TickerMap,
}

impl PipelineOrchestrator {
    pub fn new(
        generator: NarrativeGenerator,
        estimator: ReturnEstimator,
        sink: Box<dyn ReportSink>,
        tickers: TickerMap,
    ) -> Self {
        Self {
            generator,
            estimator,
            sink,
            tickers,
        }
    }

    /// Open a session for a collected profile and compute its
    /// allocation. Pure and deterministic.
    pub fn start_session(&self, profile: UserProfile) -> AdvisorySession {
        let session_id = Uuid::new_v4();
        let allocation = allocation::allocate(profile.risk);

        AdvisorySession {
            session_id,
            profile,
            allocation,
            narrative: None,
            narrative_error: None,
            sip: None,
            returns: None,
            state: PipelineState::AllocationComputed,
        }
    }

    /// One "generate portfolio" request: allocate, then request the
    /// narrative. A narrative failure is recorded on the session as a
    /// displayable message; the allocation is already complete and is
    /// never discarded.
    pub async fn generate_portfolio(&self, profile: UserProfile) -> AdvisorySession {
        let mut session = self.start_session(profile);
        let session_id = session.session_id;
        info!(session_id = %session_id, risk = %session.profile.risk, "Generating portfolio");

        session.state = PipelineState::NarrativeRequested;

        match self
            .generator
            .explain(
                &session.allocation,
                session.profile.age,
                session.profile.risk,
                &session.profile.goal,
            )
            .await
        {
            Ok(narrative) => {
                session.narrative = Some(narrative);
                session.state = PipelineState::NarrativeReady;
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Narrative generation failed");
                session.narrative_error = Some(e.to_string());
                session.state = PipelineState::NarrativeFailed;
            }
        }

        session
    }

    /// Compute the required monthly contribution. Fails fast: the
    /// caller must never receive a silently wrong figure.
    pub fn compute_sip(&self, session: &mut AdvisorySession, plan: &GoalPlan) -> Result<SipResult> {
        let result = sip::solve_plan(plan)?;
        session.sip = Some(result);
        session.state = PipelineState::SipComputed;
        Ok(result)
    }

    /// Estimate historical returns for the configured tickers. Always
    /// yields a full table; failing tickers show as unavailable rows.
    pub async fn estimate_returns(&self, session: &mut AdvisorySession) -> ReturnsTable {
        let table = self.estimator.estimate_all(&self.tickers).await;
        session.returns = Some(table.clone());
        session.state = PipelineState::ReturnsEstimated;
        table
    }

    /// Session-free variant for display-only callers.
    pub async fn estimate_market_returns(&self) -> ReturnsTable {
        self.estimator.estimate_all(&self.tickers).await
    }

    /// One "ask a question" request against the session's allocation.
    pub async fn answer_question(
        &self,
        session: &AdvisorySession,
        question: &str,
    ) -> Result<Narrative> {
        self.generator
            .answer(
                &session.allocation,
                session.profile.age,
                &session.profile.goal,
                question,
            )
            .await
    }

    /// Assemble and publish the report. When the narrative failed, the
    /// recorded error message fills the explanation block so rendering
    /// still succeeds for that widget.
    pub fn render_report(&self, session: &mut AdvisorySession) -> Result<PathBuf> {
        let narrative = match (&session.narrative, &session.narrative_error) {
            (Some(narrative), _) => narrative.text.clone(),
            (None, Some(message)) => format!("Advisor explanation unavailable: {}", message),
            (None, None) => "Advisor explanation was not requested.".to_string(),
        };

        let report = report::assemble(
            session.profile.clone(),
            session.allocation,
            narrative,
            session.sip,
        );

        let bytes = report::render(&report);
        let path = self.sink.publish(&bytes)?;
        session.state = PipelineState::ReportRendered;
        info!(session_id = %session.session_id, path = %path.display(), "Report rendered");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdvisorError;
    use crate::markets::{DailyBar, MarketDataError, PriceSeriesProvider};
    use crate::models::{ReturnEstimate, RiskTier};
    use crate::narrative::{ChatMessage, CompletionProvider};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct FixedCompletions {
        reply: Result<String>,
    }

    #[async_trait]
    impl CompletionProvider for FixedCompletions {
        async fn submit_prompt(&self, _messages: &[ChatMessage]) -> Result<String> {
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(AdvisorError::MalformedCollaboratorResponse(m)) => {
                    Err(AdvisorError::MalformedCollaboratorResponse(m.clone()))
                }
                Err(_) => Err(AdvisorError::CollaboratorUnavailable("down".into())),
            }
        }
    }

    struct FlatMarket;

    #[async_trait]
    impl PriceSeriesProvider for FlatMarket {
        async fn daily_closes(
            &self,
            _ticker: &str,
            start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> std::result::Result<Vec<DailyBar>, MarketDataError> {
            Ok(vec![
                DailyBar {
                    date: start,
                    close: Some(100.0),
                },
                DailyBar {
                    date: start + Duration::days(1),
                    close: Some(100.0),
                },
            ])
        }
    }

    struct MemorySink {
        published: Mutex<Vec<Vec<u8>>>,
    }

    impl ReportSink for MemorySink {
        fn publish(&self, bytes: &[u8]) -> Result<PathBuf> {
            self.published.lock().unwrap().push(bytes.to_vec());
            Ok(PathBuf::from(crate::report::REPORT_FILE_NAME))
        }
    }

    fn orchestrator(reply: Result<String>) -> PipelineOrchestrator {
        PipelineOrchestrator::new(
            NarrativeGenerator::new(Box::new(FixedCompletions { reply })),
            ReturnEstimator::new(Box::new(FlatMarket)),
            Box::new(MemorySink {
                published: Mutex::new(Vec::new()),
            }),
            TickerMap {
                equity: "EQ".into(),
                debt: "DB".into(),
                gold: "GD".into(),
            },
        )
    }

    fn profile() -> UserProfile {
        UserProfile::new(30, 50_000.0, RiskTier::Medium, "retirement").unwrap()
    }

    #[tokio::test]
    async fn test_full_run_reaches_report_rendered() {
        let orchestrator = orchestrator(Ok("A sensible mix.".to_string()));
        let mut session = orchestrator.generate_portfolio(profile()).await;
        assert_eq!(session.state, PipelineState::NarrativeReady);

        let plan = GoalPlan::new(1_000_000.0, 10, 12.0).unwrap();
        let sip = orchestrator.compute_sip(&mut session, &plan).unwrap();
        assert_eq!(sip.monthly_contribution, 4347.09);

        let table = orchestrator.estimate_returns(&mut session).await;
        assert!(table
            .entries
            .iter()
            .all(|(_, e)| matches!(e, ReturnEstimate::Available { .. })));

        orchestrator.render_report(&mut session).unwrap();
        assert_eq!(session.state, PipelineState::ReportRendered);
    }

    #[tokio::test]
    async fn test_narrative_failure_preserves_allocation_and_sip() {
        let orchestrator = orchestrator(Err(AdvisorError::MalformedCollaboratorResponse(
            "no completion content".into(),
        )));
        let mut session = orchestrator.generate_portfolio(profile()).await;

        assert_eq!(session.state, PipelineState::NarrativeFailed);
        assert!(session.narrative.is_none());
        assert!(session
            .narrative_error
            .as_deref()
            .unwrap()
            .contains("Malformed collaborator response"));

        // Allocation already complete and untouched.
        assert_eq!(session.allocation.equity, 50);

        // SIP still computable, and the report still renders.
        let plan = GoalPlan::new(500_000.0, 5, 10.0).unwrap();
        orchestrator.compute_sip(&mut session, &plan).unwrap();
        assert!(session.sip.is_some());
        orchestrator.render_report(&mut session).unwrap();
        assert_eq!(session.state, PipelineState::ReportRendered);
    }

    #[tokio::test]
    async fn test_degenerate_sip_does_not_touch_session() {
        let orchestrator = orchestrator(Ok("fine".to_string()));
        let mut session = orchestrator.generate_portfolio(profile()).await;

        let plan = GoalPlan {
            target_amount: 1_000.0,
            years: 5,
            expected_return_pct: 0.0,
        };
        let err = orchestrator.compute_sip(&mut session, &plan).unwrap_err();
        assert!(matches!(err, AdvisorError::DegenerateRate(_)));
        assert!(session.sip.is_none());
    }

    #[tokio::test]
    async fn test_answer_question_uses_session_allocation() {
        let orchestrator = orchestrator(Ok("Quarterly is fine.".to_string()));
        let session = orchestrator.generate_portfolio(profile()).await;
        let answer = orchestrator
            .answer_question(&session, "How often should I rebalance?")
            .await
            .unwrap();
        assert_eq!(answer.text, "Quarterly is fine.");
    }
}
