//! Yahoo chart-API backend for the price-series collaborator
//!
//! Fetches daily bars from the public v8 chart endpoint with a
//! long-lived reqwest::Client for connection pooling.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{DailyBar, MarketDataError, PriceSeriesProvider};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

// Yahoo rejects requests without a browser-looking user agent.
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

pub struct YahooChartClient {
    client: Client,
    base_url: String,
}

impl YahooChartClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(4)
            .timeout(Duration::from_secs(20))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for YahooChartClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceSeriesProvider for YahooChartClient {
    async fn daily_closes(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> std::result::Result<Vec<DailyBar>, MarketDataError> {
        let url = format!(
            "{}/{}?period1={}&period2={}&interval=1d",
            self.base_url,
            ticker,
            start.timestamp(),
            end.timestamp()
        );

        info!(ticker = %ticker, "Fetching daily price series");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MarketDataError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(MarketDataError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        let payload: ChartResponse = response
            .json()
            .await
            .map_err(|e| MarketDataError::Malformed(e.to_string()))?;

        let bars = parse_chart(payload)?;
        debug!(ticker = %ticker, bars = bars.len(), "Price series fetched");
        Ok(bars)
    }
}

/// Flatten the chart payload into chronological daily bars. A payload
/// with no result block at all is malformed; a result with no
/// timestamps is simply an empty series.
fn parse_chart(payload: ChartResponse) -> std::result::Result<Vec<DailyBar>, MarketDataError> {
    if let Some(err) = payload.chart.error {
        return Err(MarketDataError::Rejected {
            status: 200,
            detail: format!("{}: {}", err.code, err.description),
        });
    }

    let result = payload
        .chart
        .result
        .and_then(|mut results| if results.is_empty() { None } else { Some(results.remove(0)) })
        .ok_or_else(|| MarketDataError::Malformed("chart payload has no result".to_string()))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    let bars = timestamps
        .into_iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            Utc.timestamp_opt(ts, 0).single().map(|date| DailyBar {
                date,
                close: closes.get(i).copied().flatten(),
            })
        })
        .collect();

    Ok(bars)
}

//
// ================= Wire Models =================
//

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chart_payload() {
        let payload: ChartResponse = serde_json::from_str(
            r#"{
                "chart": {
                    "result": [{
                        "timestamp": [1700000000, 1700086400],
                        "indicators": {
                            "quote": [{"close": [101.5, null]}]
                        }
                    }],
                    "error": null
                }
            }"#,
        )
        .unwrap();

        let bars = parse_chart(payload).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, Some(101.5));
        assert_eq!(bars[1].close, None);
        assert!(bars[0].date < bars[1].date);
    }

    #[test]
    fn test_parse_chart_error_block() {
        let payload: ChartResponse = serde_json::from_str(
            r#"{
                "chart": {
                    "result": null,
                    "error": {"code": "Not Found", "description": "No data found"}
                }
            }"#,
        )
        .unwrap();

        let err = parse_chart(payload).unwrap_err();
        assert!(matches!(err, MarketDataError::Rejected { .. }));
    }

    #[test]
    fn test_parse_chart_missing_result_is_malformed() {
        let payload: ChartResponse =
            serde_json::from_str(r#"{"chart": {"result": null, "error": null}}"#).unwrap();
        assert!(matches!(
            parse_chart(payload).unwrap_err(),
            MarketDataError::Malformed(_)
        ));
    }

    #[test]
    fn test_no_timestamps_is_empty_series() {
        let payload: ChartResponse = serde_json::from_str(
            r#"{
                "chart": {
                    "result": [{
                        "timestamp": null,
                        "indicators": {"quote": []}
                    }],
                    "error": null
                }
            }"#,
        )
        .unwrap();
        assert!(parse_chart(payload).unwrap().is_empty());
    }
}
