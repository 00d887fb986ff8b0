//! Process-start configuration
//!
//! Loaded once from the environment and treated as read-only for the
//! process's lifetime. Never re-read mid-request.

use std::env;
use std::path::PathBuf;

use crate::markets::TickerMap;

/// Credentials and model selection for the completion collaborator.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

/// Full advisor configuration.
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub completion: CompletionConfig,
    pub tickers: TickerMap,
    pub report_dir: PathBuf,
}

impl AdvisorConfig {
    /// Read configuration from the environment, with defaults for
    /// everything except the API key. Callers load `.env` first
    /// (the bins call `dotenv::dotenv()`).
    pub fn from_env() -> Self {
        let completion = CompletionConfig {
            api_key: env::var("OPENROUTER_API_KEY").unwrap_or_default(),
            model: env::var("OPENROUTER_MODEL")
                .unwrap_or_else(|_| "openrouter/auto".to_string()),
            base_url: env::var("OPENROUTER_BASE_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string()),
        };

        // Illustrative instruments, one per asset class.
        let tickers = TickerMap {
            equity: env::var("EQUITY_TICKER").unwrap_or_else(|_| "^NSEI".to_string()),
            debt: env::var("DEBT_TICKER").unwrap_or_else(|_| "ICICIBANK.NS".to_string()),
            gold: env::var("GOLD_TICKER").unwrap_or_else(|_| "GOLDBEES.NS".to_string()),
        };

        let report_dir = env::var("REPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        Self {
            completion,
            tickers,
            report_dir,
        }
    }
}
