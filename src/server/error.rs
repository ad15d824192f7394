use crate::core::{BadInput, CalcError, FetchError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, warn};

/// Failures a handler turns into an HTTP response.
#[derive(Debug)]
pub enum ApiError {
    BadInput(BadInput),
    Fetch { message: String, source: FetchError },
}

impl From<BadInput> for ApiError {
    fn from(err: BadInput) -> Self {
        ApiError::BadInput(err)
    }
}

impl From<CalcError> for ApiError {
    fn from(err: CalcError) -> Self {
        let message = err.to_string();
        match err {
            CalcError::BadInput(bad) => ApiError::BadInput(bad),
            CalcError::Fetch { source, .. } => ApiError::Fetch { message, source },
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        ApiError::Fetch {
            message: format!("Error fetching price: {err}"),
            source: err,
        }
    }
}

fn fetch_status(err: &FetchError) -> StatusCode {
    if err.is_no_data() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn fetch_failure(status: StatusCode, message: String, err: &FetchError) -> Response {
    warn!(%status, error = %message, "Price fetch failed");
    if let Some(body) = err.raw_body() {
        debug!(body, "Provider response body");
    }
    (status, message).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadInput(bad) => {
                debug!(field = %bad.field, value = %bad.value, "Rejected request");
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": bad.message(), "field": bad.field })),
                )
                    .into_response()
            }
            ApiError::Fetch { message, source } => {
                fetch_failure(fetch_status(&source), message, &source)
            }
        }
    }
}
