//! Historical-return estimation
//!
//! Fetches daily price series from a time-series provider and computes
//! annualized growth (CAGR) per asset class. Provider failures are
//! isolated per ticker: one failing ticker degrades its own row only.

pub mod yahoo;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{round2, AssetClass, ReturnEstimate, ReturnsTable, UnavailableReason};

/// Default lookback window for CAGR estimation.
pub const DEFAULT_LOOKBACK_YEARS: u32 = 5;

/// One daily bar of the fetched series. The closing price may be
/// absent when the provider returns a gap for that day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: DateTime<Utc>,
    pub close: Option<f64>,
}

/// Provider-scoped errors. These never escape the estimator: they are
/// folded into `UnavailableReason::FetchFailed` per ticker.
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider returned {status}: {detail}")]
    Rejected { status: u16, detail: String },

    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Market time-series collaborator: a chronologically ordered series
/// of daily bars for a ticker over a date window, or an empty result.
#[async_trait]
pub trait PriceSeriesProvider: Send + Sync {
    async fn daily_closes(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> std::result::Result<Vec<DailyBar>, MarketDataError>;
}

/// Ticker per asset class. Illustrative instruments, supplied by
/// configuration rather than baked into the policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerMap {
    pub equity: String,
    pub debt: String,
    pub gold: String,
}

impl TickerMap {
    pub fn ticker(&self, class: AssetClass) -> &str {
        match class {
            AssetClass::Equity => &self.equity,
            AssetClass::Debt => &self.debt,
            AssetClass::Gold => &self.gold,
        }
    }
}

/// Computes per-ticker CAGR estimates over a fixed lookback window.
pub struct ReturnEstimator {
    provider: Box<dyn PriceSeriesProvider>,
    lookback_years: u32,
}

impl ReturnEstimator {
    pub fn new(provider: Box<dyn PriceSeriesProvider>) -> Self {
        Self {
            provider,
            lookback_years: DEFAULT_LOOKBACK_YEARS,
        }
    }

    pub fn with_lookback(provider: Box<dyn PriceSeriesProvider>, lookback_years: u32) -> Self {
        Self {
            provider,
            lookback_years: lookback_years.max(1),
        }
    }

    /// Estimate one ticker's CAGR. Never fails: every failure mode
    /// becomes an `Unavailable` estimate with a diagnostic reason.
    pub async fn estimate(&self, ticker: &str) -> ReturnEstimate {
        let end = Utc::now();
        let start = end - Duration::days(self.lookback_years as i64 * 365);

        let series = match self.provider.daily_closes(ticker, start, end).await {
            Ok(series) => series,
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "Price series fetch failed");
                return ReturnEstimate::Unavailable {
                    reason: UnavailableReason::FetchFailed(e.to_string()),
                };
            }
        };

        if series.is_empty() {
            debug!(ticker = %ticker, "Empty price series");
            return ReturnEstimate::Unavailable {
                reason: UnavailableReason::NoData,
            };
        }

        // First and last valid closes in chronological order.
        let mut closes = series.iter().filter_map(|bar| bar.close);
        let start_price = match closes.next() {
            Some(price) => price,
            None => {
                debug!(ticker = %ticker, "Series has no valid closing prices");
                return ReturnEstimate::Unavailable {
                    reason: UnavailableReason::MissingField,
                };
            }
        };
        let end_price = closes.last().unwrap_or(start_price);

        // A zero or negative start price would make the fractional
        // power below a division error or a NaN.
        if start_price <= 0.0 || end_price <= 0.0 {
            debug!(ticker = %ticker, start_price, end_price, "Invalid price data");
            return ReturnEstimate::Unavailable {
                reason: UnavailableReason::InvalidPrice,
            };
        }

        let cagr = (end_price / start_price).powf(1.0 / self.lookback_years as f64) - 1.0;
        if !cagr.is_finite() {
            return ReturnEstimate::Unavailable {
                reason: UnavailableReason::InvalidPrice,
            };
        }

        ReturnEstimate::Available {
            cagr_pct: round2(cagr * 100.0),
        }
    }

    /// Estimate all three asset classes concurrently. Completion order
    /// does not matter: results are keyed by asset class.
    pub async fn estimate_all(&self, tickers: &TickerMap) -> ReturnsTable {
        let (equity, debt, gold) = tokio::join!(
            self.estimate(&tickers.equity),
            self.estimate(&tickers.debt),
            self.estimate(&tickers.gold),
        );

        ReturnsTable {
            entries: [
                (AssetClass::Equity, equity),
                (AssetClass::Debt, debt),
                (AssetClass::Gold, gold),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Canned provider for estimator tests: closes per ticker, or a
    /// transport failure for tickers marked as failing.
    struct CannedProvider {
        closes: Vec<Option<f64>>,
        failing_ticker: Option<String>,
    }

    impl CannedProvider {
        fn with_closes(closes: Vec<Option<f64>>) -> Self {
            Self {
                closes,
                failing_ticker: None,
            }
        }
    }

    #[async_trait]
    impl PriceSeriesProvider for CannedProvider {
        async fn daily_closes(
            &self,
            ticker: &str,
            start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> std::result::Result<Vec<DailyBar>, MarketDataError> {
            if self.failing_ticker.as_deref() == Some(ticker) {
                return Err(MarketDataError::Transport("connection refused".into()));
            }
            Ok(self
                .closes
                .iter()
                .enumerate()
                .map(|(i, close)| DailyBar {
                    date: start + Duration::days(i as i64),
                    close: *close,
                })
                .collect())
        }
    }

    fn tickers() -> TickerMap {
        TickerMap {
            equity: "EQ".into(),
            debt: "DB".into(),
            gold: "GD".into(),
        }
    }

    #[tokio::test]
    async fn test_cagr_from_first_and_last_close() {
        // 100 → 200 over 5 years: 2^(1/5) - 1 = 14.87%
        let estimator = ReturnEstimator::new(Box::new(CannedProvider::with_closes(vec![
            Some(100.0),
            Some(150.0),
            Some(200.0),
        ])));
        let estimate = estimator.estimate("EQ").await;
        assert_eq!(estimate, ReturnEstimate::Available { cagr_pct: 14.87 });
    }

    #[tokio::test]
    async fn test_empty_series_is_no_data() {
        let estimator = ReturnEstimator::new(Box::new(CannedProvider::with_closes(vec![])));
        let estimate = estimator.estimate("EQ").await;
        assert_eq!(
            estimate,
            ReturnEstimate::Unavailable {
                reason: UnavailableReason::NoData
            }
        );
    }

    #[tokio::test]
    async fn test_all_gaps_is_missing_field() {
        let estimator = ReturnEstimator::new(Box::new(CannedProvider::with_closes(vec![None, None])));
        let estimate = estimator.estimate("EQ").await;
        assert_eq!(
            estimate,
            ReturnEstimate::Unavailable {
                reason: UnavailableReason::MissingField
            }
        );
    }

    #[tokio::test]
    async fn test_zero_start_price_is_invalid_not_a_panic() {
        let estimator = ReturnEstimator::new(Box::new(CannedProvider::with_closes(vec![
            Some(0.0),
            Some(120.0),
        ])));
        let estimate = estimator.estimate("EQ").await;
        assert_eq!(
            estimate,
            ReturnEstimate::Unavailable {
                reason: UnavailableReason::InvalidPrice
            }
        );
    }

    #[tokio::test]
    async fn test_one_failing_ticker_does_not_contaminate_the_table() {
        let provider = CannedProvider {
            closes: vec![Some(100.0), Some(200.0)],
            failing_ticker: Some("DB".into()),
        };
        let estimator = ReturnEstimator::new(Box::new(provider));
        let table = estimator.estimate_all(&tickers()).await;

        assert!(matches!(
            table.get(AssetClass::Equity),
            ReturnEstimate::Available { .. }
        ));
        assert!(matches!(
            table.get(AssetClass::Gold),
            ReturnEstimate::Available { .. }
        ));
        assert!(matches!(
            table.get(AssetClass::Debt),
            ReturnEstimate::Unavailable {
                reason: UnavailableReason::FetchFailed(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_single_close_yields_flat_growth() {
        let estimator = ReturnEstimator::new(Box::new(CannedProvider::with_closes(vec![Some(50.0)])));
        let estimate = estimator.estimate("EQ").await;
        assert_eq!(estimate, ReturnEstimate::Available { cagr_pct: 0.0 });
    }
}
