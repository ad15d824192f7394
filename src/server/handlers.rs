use crate::core::investment::{Field, parse_date, parse_ticker};
use crate::core::{BadInput, DailyPrice, InvestmentRequest, Outcome, PriceQuery};
use crate::server::AppState;
use crate::server::error::ApiError;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct StockParams {
    ticker: Option<String>,
    start_date: Option<String>,
    shares: Option<String>,
    starting_balance: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct StockInfoParams {
    ticker: Option<String>,
    date: Option<String>,
}

pub async fn stock(
    State(state): State<AppState>,
    Query(params): Query<StockParams>,
) -> Result<Response, ApiError> {
    let request = InvestmentRequest::parse(
        params.ticker.as_deref().unwrap_or_default(),
        params.start_date.as_deref().unwrap_or_default(),
        params.shares.as_deref().unwrap_or_default(),
        params.starting_balance.as_deref().unwrap_or_default(),
    )?;
    info!(ticker = %request.ticker, start = %request.start_date, "Valuing investment");

    match state
        .calculator
        .compute_as_of(&request, state.today())
        .await?
    {
        Outcome::Completed(valuation) => Ok(Json(valuation.result).into_response()),
        Outcome::InsufficientFunds { .. } => Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Insufficient funds" })),
        )
            .into_response()),
    }
}

pub async fn stock_info(
    State(state): State<AppState>,
    Query(params): Query<StockInfoParams>,
) -> Result<Json<DailyPrice>, ApiError> {
    let raw_ticker = params.ticker.unwrap_or_default();
    let raw_date = params.date.unwrap_or_default();
    if raw_date.trim().is_empty() {
        return Err(BadInput::new(Field::Date, &raw_date).into());
    }
    let ticker = parse_ticker(&raw_ticker)?;
    let date = parse_date(&raw_date, Field::Date)?;

    let price = state.source.fetch_close(&PriceQuery::new(ticker, date)).await?;
    Ok(Json(price))
}
