pub mod cli;
pub mod core;
pub mod providers;
pub mod server;

pub use crate::core::config;

use crate::core::EndDatePolicy;
use crate::core::config::AppConfig;
use crate::providers::AlphaVantageProvider;
use crate::server::AppState;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub enum AppCommand {
    /// Serve the JSON endpoints and static files.
    #[default]
    Serve,
    /// Prompt for one investment on the console and print the result.
    Calc,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind: Option<String>,
    pub end_date: Option<EndDatePolicy>,
}

pub fn load_config(config_path: Option<&str>, overrides: &Overrides) -> Result<AppConfig> {
    let mut config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    if let Some(bind) = &overrides.bind {
        config.server.bind = bind.clone();
    }
    if let Some(policy) = overrides.end_date {
        config.end_date = policy;
    }
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

/// Wires the configured price provider into the shared handler state.
pub fn build_state(config: &AppConfig) -> Result<AppState> {
    let api_key = config.api_key()?;
    let provider = AlphaVantageProvider::from_config(&config.provider, &api_key)?;
    Ok(AppState::new(Arc::new(provider), config.end_date))
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    overrides: &Overrides,
) -> Result<()> {
    let config = load_config(config_path, overrides)?;
    let state = build_state(&config)?;
    info!(end_date = %config.end_date, "Using end date policy");

    match command {
        AppCommand::Serve => server::serve(state, &config.server).await,
        AppCommand::Calc => cli::interactive::run(&state.calculator).await,
    }
}
