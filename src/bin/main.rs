use wealth_advisor::{
    config::AdvisorConfig,
    markets::{yahoo::YahooChartClient, ReturnEstimator},
    models::{GoalPlan, ReturnEstimate, RiskTier, UserProfile},
    narrative::{openrouter::ChatCompletionsClient, NarrativeGenerator},
    pipeline::PipelineOrchestrator,
    report::FileReportSink,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Load environment variables
    dotenv::dotenv().ok();
    let config = AdvisorConfig::from_env();

    info!("Wealth Advisor Pipeline starting");

    let generator = NarrativeGenerator::new(Box::new(ChatCompletionsClient::new(
        &config.completion,
    )));
    let estimator = ReturnEstimator::new(Box::new(YahooChartClient::new()));
    let sink = Box::new(FileReportSink::new(&config.report_dir));

    let orchestrator = PipelineOrchestrator::new(generator, estimator, sink, config.tickers);

    // Sample advisory run
    let profile = UserProfile::new(30, 50_000.0, RiskTier::Medium, "retirement")?;

    let mut session = orchestrator.generate_portfolio(profile).await;

    println!("\n=== PORTFOLIO ALLOCATION ===");
    for (class, percent) in session.allocation.entries() {
        println!("  {}: {}%", class, percent);
    }

    match (&session.narrative, &session.narrative_error) {
        (Some(narrative), _) => {
            println!("\n=== ADVISOR'S EXPLANATION ===");
            println!("{}", narrative.text);
        }
        (None, Some(message)) => {
            eprintln!("\nAdvisor explanation unavailable: {}", message);
        }
        (None, None) => {}
    }

    let plan = GoalPlan::new(1_000_000.0, 10, 12.0)?;
    let sip = orchestrator.compute_sip(&mut session, &plan)?;
    println!("\n=== SIP CALCULATOR ===");
    println!(
        "Invest {:.2}/month to reach {:.2} in {} years",
        sip.monthly_contribution, sip.target_amount, sip.years
    );

    println!("\n=== HISTORICAL RETURN ESTIMATES ===");
    let table = orchestrator.estimate_returns(&mut session).await;
    for (class, estimate) in &table.entries {
        match estimate {
            ReturnEstimate::Available { cagr_pct } => {
                println!("  {}: {:.2}% CAGR", class, cagr_pct)
            }
            ReturnEstimate::Unavailable { reason } => {
                println!("  {}: unavailable ({})", class, reason)
            }
        }
    }

    let path = orchestrator.render_report(&mut session)?;
    println!("\nReport written to {}", path.display());

    Ok(())
}
