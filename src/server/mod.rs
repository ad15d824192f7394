//! HTTP surface: JSON endpoints plus static files

pub mod error;
pub mod handlers;

use crate::core::config::ServerConfig;
use crate::core::{EndDatePolicy, InvestmentCalculator, PriceSource};
use anyhow::{Context, Result};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use chrono::NaiveDate;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Supplies the calendar day used to resolve the end date.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn PriceSource>,
    pub calculator: Arc<InvestmentCalculator>,
    pub clock: Clock,
}

impl AppState {
    pub fn new(source: Arc<dyn PriceSource>, policy: EndDatePolicy) -> Self {
        let calculator = Arc::new(InvestmentCalculator::new(Arc::clone(&source), policy));
        AppState {
            source,
            calculator,
            clock: Arc::new(|| chrono::Local::now().date_naive()),
        }
    }

    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }
}

fn cors_layer(allowed_origin: &str) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(allowed_origin)
        .with_context(|| format!("Invalid allowed origin: {allowed_origin}"))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]))
}

pub fn create_app(state: AppState, config: &ServerConfig) -> Result<Router> {
    Ok(Router::new()
        .route("/stock", get(handlers::stock))
        .route("/stockinfo", get(handlers::stock_info))
        .fallback_service(ServeDir::new(&config.static_dir))
        .with_state(state)
        .layer(cors_layer(&config.allowed_origin)?)
        .layer(TraceLayer::new_for_http()))
}

pub async fn serve(state: AppState, config: &ServerConfig) -> Result<()> {
    let app = create_app(state, config)?;

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!(
        addr = %listener.local_addr()?,
        static_dir = %config.static_dir.display(),
        "Server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
