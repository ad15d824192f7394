//! Business-day handling

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Moves weekend dates back to the preceding Friday. No holiday calendar is consulted.
pub fn to_business_day(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date - Duration::days(2),
        _ => date,
    }
}

/// Which day counts as "now" when valuing the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndDatePolicy {
    #[default]
    Today,
    PreviousDay,
}

impl EndDatePolicy {
    pub fn end_date(&self, today: NaiveDate) -> NaiveDate {
        let date = match self {
            EndDatePolicy::Today => today,
            EndDatePolicy::PreviousDay => today - Duration::days(1),
        };
        to_business_day(date)
    }
}

impl Display for EndDatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                EndDatePolicy::Today => "today",
                EndDatePolicy::PreviousDay => "previous_day",
            }
        )
    }
}

impl FromStr for EndDatePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "today" => Ok(EndDatePolicy::Today),
            "previous_day" | "yesterday" => Ok(EndDatePolicy::PreviousDay),
            _ => Err(anyhow::anyhow!("Invalid end date policy: {}", s)),
        }
    }
}
