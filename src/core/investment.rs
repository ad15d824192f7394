//! Hypothetical investment replay

use crate::core::calendar::{EndDatePolicy, to_business_day};
use crate::core::price::{DATE_FORMAT, FetchError, PriceQuery, PriceSource};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Display;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Request field that failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Field {
    #[serde(rename = "ticker")]
    Ticker,
    #[serde(rename = "startDate")]
    StartDate,
    #[serde(rename = "endDate")]
    EndDate,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "shares")]
    Shares,
    #[serde(rename = "startingBalance")]
    StartingBalance,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Ticker => "ticker",
            Field::StartDate => "startDate",
            Field::EndDate => "endDate",
            Field::Date => "date",
            Field::Shares => "shares",
            Field::StartingBalance => "startingBalance",
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BadInput {
    pub field: Field,
    pub value: String,
}

impl BadInput {
    pub fn new(field: Field, value: &str) -> Self {
        BadInput {
            field,
            value: value.to_string(),
        }
    }

    pub fn message(&self) -> &'static str {
        if self.field == Field::Date && self.value.trim().is_empty() {
            return "Missing date";
        }
        match self.field {
            Field::Ticker => "Missing ticker",
            Field::Shares => "Invalid number of shares",
            Field::StartingBalance => "Invalid starting balance",
            Field::StartDate | Field::EndDate | Field::Date => "Invalid date format",
        }
    }
}

impl Display for BadInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for BadInput {}

/// Which of the two price lookups failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    Start,
    End,
}

impl Display for Leg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Leg::Start => "start",
            Leg::End => "end",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalcError {
    #[error(transparent)]
    BadInput(#[from] BadInput),

    #[error("Error fetching {leg} price: {source}")]
    Fetch {
        leg: Leg,
        #[source]
        source: FetchError,
    },
}

pub fn parse_ticker(raw: &str) -> Result<String, BadInput> {
    let ticker = raw.trim();
    if ticker.is_empty() {
        return Err(BadInput::new(Field::Ticker, raw));
    }
    Ok(ticker.to_string())
}

/// Strict `YYYY-MM-DD`: chrono alone accepts unpadded fields and signed years.
fn is_iso_date_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

pub fn parse_date(raw: &str, field: Field) -> Result<NaiveDate, BadInput> {
    let trimmed = raw.trim();
    if !is_iso_date_shape(trimmed) {
        return Err(BadInput::new(field, raw));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| BadInput::new(field, raw))
}

fn parse_amount(raw: &str, field: Field) -> Result<f64, BadInput> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| BadInput::new(field, raw))
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentRequest {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub shares: f64,
    pub starting_balance: f64,
    /// Overrides the policy end date when set.
    pub end_date: Option<NaiveDate>,
}

impl InvestmentRequest {
    /// Validates raw inputs. Numbers are checked before the date.
    pub fn parse(
        ticker: &str,
        start_date: &str,
        shares: &str,
        starting_balance: &str,
    ) -> Result<Self, BadInput> {
        let shares_value = parse_amount(shares, Field::Shares)?;
        if shares_value == 0.0 {
            return Err(BadInput::new(Field::Shares, shares));
        }
        let starting_balance = parse_amount(starting_balance, Field::StartingBalance)?;
        let start_date = parse_date(start_date, Field::StartDate)?;
        let ticker = parse_ticker(ticker)?;

        Ok(InvestmentRequest {
            ticker,
            start_date,
            shares: shares_value,
            starting_balance,
            end_date: None,
        })
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentResult {
    pub initial_investment: f64,
    pub final_investment: f64,
    pub new_balance: f64,
}

impl InvestmentResult {
    pub fn profit(&self) -> f64 {
        self.final_investment - self.initial_investment
    }
}

/// Prices and dates the result was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct Valuation {
    pub start_date: NaiveDate,
    pub start_price: f64,
    pub end_date: NaiveDate,
    pub end_price: f64,
    pub result: InvestmentResult,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Completed(Valuation),
    /// The purchase costs more than the starting balance; the end price is never fetched.
    InsufficientFunds {
        start_date: NaiveDate,
        start_price: f64,
        required: f64,
        available: f64,
    },
}

pub struct InvestmentCalculator {
    source: Arc<dyn PriceSource>,
    policy: EndDatePolicy,
}

impl InvestmentCalculator {
    pub fn new(source: Arc<dyn PriceSource>, policy: EndDatePolicy) -> Self {
        InvestmentCalculator { source, policy }
    }

    pub async fn compute(&self, request: &InvestmentRequest) -> Result<Outcome, CalcError> {
        self.compute_as_of(request, chrono::Local::now().date_naive())
            .await
    }

    #[instrument(
        name = "InvestmentCompute",
        skip(self, request),
        fields(ticker = %request.ticker, start = %request.start_date)
    )]
    pub async fn compute_as_of(
        &self,
        request: &InvestmentRequest,
        today: NaiveDate,
    ) -> Result<Outcome, CalcError> {
        let start_date = to_business_day(request.start_date);
        let start = self
            .source
            .fetch_close(&PriceQuery::new(&request.ticker, start_date))
            .await
            .map_err(|source| CalcError::Fetch {
                leg: Leg::Start,
                source,
            })?;

        let initial_investment = request.shares * start.close;
        if initial_investment > request.starting_balance {
            info!(
                required = initial_investment,
                available = request.starting_balance,
                "Insufficient funds for purchase"
            );
            return Ok(Outcome::InsufficientFunds {
                start_date,
                start_price: start.close,
                required: initial_investment,
                available: request.starting_balance,
            });
        }

        let end_date = match request.end_date {
            Some(date) => to_business_day(date),
            None => self.policy.end_date(today),
        };
        debug!(%end_date, policy = %self.policy, "Resolved end date");

        let end = self
            .source
            .fetch_close(&PriceQuery::new(&request.ticker, end_date))
            .await
            .map_err(|source| CalcError::Fetch {
                leg: Leg::End,
                source,
            })?;

        let final_investment = request.shares * end.close;
        let new_balance = request.starting_balance - initial_investment + final_investment;

        Ok(Outcome::Completed(Valuation {
            start_date,
            start_price: start.close,
            end_date,
            end_price: end.close,
            result: InvestmentResult {
                initial_investment,
                final_investment,
                new_balance,
            },
        }))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::FakePriceSource;
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calculator(source: &Arc<FakePriceSource>) -> InvestmentCalculator {
        InvestmentCalculator::new(source.clone(), EndDatePolicy::Today)
    }

    #[test]
    fn test_parse_rejects_bad_shares() {
        let err = InvestmentRequest::parse("ACME", "2023-07-01", "abc", "10000").unwrap_err();
        assert_eq!(err.field, Field::Shares);
        assert_eq!(err.value, "abc");
        assert_eq!(err.to_string(), "Invalid number of shares");
    }

    #[test]
    fn test_parse_rejects_bad_balance_and_date() {
        let err = InvestmentRequest::parse("ACME", "2023-07-01", "10", "-5").unwrap_err();
        assert_eq!(err.field, Field::StartingBalance);

        let err = InvestmentRequest::parse("ACME", "07/01/2023", "10", "100").unwrap_err();
        assert_eq!(err.field, Field::StartDate);
        assert_eq!(err.to_string(), "Invalid date format");

        let err = InvestmentRequest::parse("ACME", "2023-02-30", "10", "100").unwrap_err();
        assert_eq!(err.field, Field::StartDate);
    }

    #[test]
    fn test_parse_requires_padded_dates() {
        for raw in ["2023-7-1", "+2023-07-01", "02023-07-01", "2023/07/01", "2023-07-1 "] {
            let err = InvestmentRequest::parse("ACME", raw, "1", "100").unwrap_err();
            assert_eq!(err.field, Field::StartDate, "input {raw:?}");
        }
        assert_eq!(
            parse_date("2023-7-1", Field::EndDate).unwrap_err().field,
            Field::EndDate
        );
        assert_eq!(
            parse_date(" 2023-07-01 ", Field::Date).unwrap(),
            date(2023, 7, 1)
        );
    }

    #[test]
    fn test_parse_rejects_zero_and_non_finite_shares() {
        for raw in ["0", "NaN", "inf", ""] {
            let err = InvestmentRequest::parse("ACME", "2023-07-01", raw, "100").unwrap_err();
            assert_eq!(err.field, Field::Shares, "input {raw:?}");
        }
    }

    #[test]
    fn test_parse_accepts_fractional_values() {
        let request = InvestmentRequest::parse(" ACME ", "2023-07-01", "2.5", "0").unwrap();
        assert_eq!(request.ticker, "ACME");
        assert_eq!(request.shares, 2.5);
        assert_eq!(request.starting_balance, 0.0);
        assert_eq!(request.start_date, date(2023, 7, 1));
        assert!(request.end_date.is_none());
    }

    #[tokio::test]
    async fn test_weekend_start_example() {
        let today = date(2024, 3, 14);
        let source = Arc::new(
            FakePriceSource::default()
                .with_price(date(2023, 6, 30), 50.0)
                .with_price(today, 55.0),
        );
        let request = InvestmentRequest::parse("ACME", "2023-07-01", "10", "10000").unwrap();

        let outcome = calculator(&source)
            .compute_as_of(&request, today)
            .await
            .unwrap();

        let Outcome::Completed(valuation) = outcome else {
            panic!("Expected a completed valuation");
        };
        assert_eq!(valuation.start_date, date(2023, 6, 30));
        assert_eq!(valuation.end_date, today);
        assert_eq!(valuation.result.initial_investment, 500.0);
        assert_eq!(valuation.result.final_investment, 550.0);
        assert_eq!(valuation.result.new_balance, 10050.0);
        assert_eq!(valuation.result.profit(), 50.0);
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn test_insufficient_funds_skips_end_fetch() {
        let today = date(2024, 3, 14);
        let source = Arc::new(
            FakePriceSource::default()
                .with_price(date(2023, 6, 30), 50.0)
                .with_price(today, 55.0),
        );
        let request = InvestmentRequest::parse("ACME", "2023-06-30", "10", "499.99").unwrap();

        let outcome = calculator(&source)
            .compute_as_of(&request, today)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::InsufficientFunds {
                start_date: date(2023, 6, 30),
                start_price: 50.0,
                required: 500.0,
                available: 499.99,
            }
        );
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_exact_balance_is_affordable() {
        let today = date(2024, 3, 14);
        let source = Arc::new(
            FakePriceSource::default()
                .with_price(date(2023, 6, 30), 50.0)
                .with_price(today, 40.0),
        );
        let request = InvestmentRequest::parse("ACME", "2023-06-30", "10", "500").unwrap();

        let outcome = calculator(&source)
            .compute_as_of(&request, today)
            .await
            .unwrap();

        let Outcome::Completed(valuation) = outcome else {
            panic!("Expected a completed valuation");
        };
        assert_eq!(valuation.result.new_balance, 400.0);
    }

    #[tokio::test]
    async fn test_end_date_follows_policy_and_weekends() {
        // Monday; previous day is Sunday, which walks back to Friday
        let today = date(2023, 7, 3);
        let friday = date(2023, 6, 30);
        let source = Arc::new(
            FakePriceSource::default()
                .with_price(date(2023, 6, 1), 10.0)
                .with_price(friday, 12.0),
        );
        let calculator = InvestmentCalculator::new(source.clone(), EndDatePolicy::PreviousDay);
        let request = InvestmentRequest::parse("ACME", "2023-06-01", "1", "100").unwrap();

        let outcome = calculator.compute_as_of(&request, today).await.unwrap();

        let Outcome::Completed(valuation) = outcome else {
            panic!("Expected a completed valuation");
        };
        assert_eq!(valuation.end_date, friday);
        let calls = source.calls.lock().unwrap();
        assert_eq!(calls[1], PriceQuery::new("ACME", friday));
    }

    #[tokio::test]
    async fn test_explicit_end_date_is_normalized() {
        let source = Arc::new(
            FakePriceSource::default()
                .with_price(date(2023, 6, 1), 10.0)
                .with_price(date(2023, 6, 30), 15.0),
        );
        let request = InvestmentRequest::parse("ACME", "2023-06-01", "2", "100")
            .unwrap()
            .with_end_date(date(2023, 7, 2));

        let outcome = calculator(&source)
            .compute_as_of(&request, date(2024, 1, 1))
            .await
            .unwrap();

        let Outcome::Completed(valuation) = outcome else {
            panic!("Expected a completed valuation");
        };
        assert_eq!(valuation.end_date, date(2023, 6, 30));
        assert_eq!(valuation.result.final_investment, 30.0);
    }

    #[tokio::test]
    async fn test_fetch_failures_are_tagged_with_leg() {
        let today = date(2024, 3, 14);
        let source = Arc::new(FakePriceSource::default().with_price(date(2023, 6, 30), 50.0));
        let request = InvestmentRequest::parse("ACME", "2023-06-30", "1", "100").unwrap();

        let err = calculator(&source)
            .compute_as_of(&request, today)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            CalcError::Fetch {
                leg: Leg::End,
                source: FetchError::NoDataForDate {
                    ticker: "ACME".to_string(),
                    date: today,
                },
            }
        );
        assert_eq!(
            err.to_string(),
            "Error fetching end price: no data available for ACME on 2024-03-14"
        );

        let source = Arc::new(FakePriceSource::default().with_failure(
            date(2023, 6, 30),
            FetchError::Network("connection refused".to_string()),
        ));
        let err = calculator(&source)
            .compute_as_of(&request, today)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CalcError::Fetch {
                leg: Leg::Start,
                source: FetchError::Network(_)
            }
        ));
        assert_eq!(source.call_count(), 1);
    }
}
