use wealth_advisor::{
    api::start_server,
    config::AdvisorConfig,
    markets::{yahoo::YahooChartClient, ReturnEstimator},
    narrative::{openrouter::ChatCompletionsClient, NarrativeGenerator},
    pipeline::PipelineOrchestrator,
    report::FileReportSink,
};
use std::sync::Arc;
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

    if config.completion.api_key.is_empty() {
        eprintln!("OPENROUTER_API_KEY not set; narrative generation will degrade");
    }

    let api_port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("API_PORT"))
        .unwrap_or_else(|_| "8080".to_string())
        .parse()?;

    info!("Wealth Advisor API Server");
    info!("Port: {}", api_port);

    let generator = NarrativeGenerator::new(Box::new(ChatCompletionsClient::new(
        &config.completion,
    )));
    let estimator = ReturnEstimator::new(Box::new(YahooChartClient::new()));
    let sink = Box::new(FileReportSink::new(&config.report_dir));

    let orchestrator = Arc::new(PipelineOrchestrator::new(
        generator,
        estimator,
        sink,
        config.tickers,
    ));

    info!("Orchestrator initialized, starting API server");

    start_server(orchestrator, api_port).await?;

    Ok(())
}
