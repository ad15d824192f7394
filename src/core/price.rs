//! Pricing abstractions and core types

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Date format used on the wire, both by callers and by the provider.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single point lookup: one ticker on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriceQuery {
    pub ticker: String,
    pub date: NaiveDate,
}

impl PriceQuery {
    pub fn new(ticker: impl Into<String>, date: NaiveDate) -> Self {
        PriceQuery {
            ticker: ticker.into(),
            date,
        }
    }
}

/// Closing price reported for a [`PriceQuery`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPrice {
    pub ticker: String,
    #[serde(serialize_with = "serialize_date")]
    pub date: NaiveDate,
    #[serde(rename = "price")]
    pub close: f64,
}

fn serialize_date<S: serde::Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&date.format(DATE_FORMAT))
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FetchError {
    #[error("request to price provider failed: {0}")]
    Network(String),

    #[error("price provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("malformed provider response: {reason}")]
    Malformed { reason: String, body: String },

    #[error("no data available for {ticker} on {date}")]
    NoDataForDate { ticker: String, date: NaiveDate },
}

impl FetchError {
    /// Raw payload the provider sent, when the failure was caused by its shape.
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            FetchError::Malformed { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, FetchError::NoDataForDate { .. })
    }
}

/// Source of daily closing prices.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_close(&self, query: &PriceQuery) -> Result<DailyPrice, FetchError>;
}
