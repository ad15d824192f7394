//! Core business logic abstractions

pub mod calendar;
pub mod config;
pub mod investment;
pub mod log;
pub mod price;

// Re-export main types for cleaner imports
pub use calendar::{EndDatePolicy, to_business_day};
pub use investment::{
    BadInput, CalcError, Field, InvestmentCalculator, InvestmentRequest, InvestmentResult, Leg,
    Outcome, Valuation,
};
pub use price::{DailyPrice, FetchError, PriceQuery, PriceSource};
