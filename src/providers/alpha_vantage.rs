use crate::core::config::{OutputSize, ProviderConfig};
use crate::core::price::{DATE_FORMAT, DailyPrice, FetchError, PriceQuery, PriceSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

const CLOSE_FIELD: &str = "4. close";

/// Daily time-series client for the Alpha Vantage API.
pub struct AlphaVantageProvider {
    base_url: String,
    api_key: String,
    output_size: OutputSize,
    client: reqwest::Client,
}

impl AlphaVantageProvider {
    pub fn new(
        base_url: &str,
        api_key: &str,
        output_size: OutputSize,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("whatif/0.1")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(AlphaVantageProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            output_size,
            client,
        })
    }

    pub fn from_config(config: &ProviderConfig, api_key: &str) -> Result<Self> {
        Self::new(
            &config.base_url,
            api_key,
            config.output_size,
            config.timeout(),
        )
    }

    fn series_url(&self, ticker: &str) -> Result<Url, FetchError> {
        Url::parse_with_params(
            &format!("{}/query", self.base_url),
            &[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", ticker),
                ("outputsize", self.output_size.as_str()),
                ("apikey", self.api_key.as_str()),
            ],
        )
        .map_err(|e| FetchError::Network(format!("invalid provider URL: {e}")))
    }
}

#[derive(Deserialize, Debug)]
struct DailySeriesResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<HashMap<String, HashMap<String, String>>>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
}

fn malformed(reason: impl Into<String>, body: &str) -> FetchError {
    let reason = reason.into();
    debug!(%reason, body, "Unexpected provider response");
    FetchError::Malformed {
        reason,
        body: body.to_string(),
    }
}

/// Extracts the close price for the queried date from a daily series document.
fn extract_close(body: &str, query: &PriceQuery) -> Result<f64, FetchError> {
    let data: DailySeriesResponse =
        serde_json::from_str(body).map_err(|e| malformed(e.to_string(), body))?;

    let Some(series) = data.time_series else {
        // The provider reports bad symbols and throttling in-band with a 200.
        return match data.error_message.or(data.information).or(data.note) {
            Some(message) => Err(FetchError::Provider {
                status: 200,
                message,
            }),
            None => Err(malformed("missing \"Time Series (Daily)\"", body)),
        };
    };

    let date_key = query.date.format(DATE_FORMAT).to_string();
    let entry = series
        .get(&date_key)
        .ok_or_else(|| FetchError::NoDataForDate {
            ticker: query.ticker.clone(),
            date: query.date,
        })?;

    let raw_close = entry
        .get(CLOSE_FIELD)
        .ok_or_else(|| malformed(format!("entry for {date_key} has no \"{CLOSE_FIELD}\""), body))?;

    raw_close
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
        .ok_or_else(|| malformed(format!("invalid close price {raw_close:?} for {date_key}"), body))
}

#[async_trait]
impl PriceSource for AlphaVantageProvider {
    #[instrument(
        name = "AlphaVantageFetch",
        skip(self, query),
        fields(ticker = %query.ticker, date = %query.date)
    )]
    async fn fetch_close(&self, query: &PriceQuery) -> Result<DailyPrice, FetchError> {
        let url = self.series_url(&query.ticker)?;
        debug!(path = url.path(), "Requesting daily series");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Provider {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let close = extract_close(&body, query)?;
        debug!(close, "Received close price");

        Ok(DailyPrice {
            ticker: query.ticker.clone(),
            date: query.date,
            close,
        })
    }
}
