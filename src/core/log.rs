use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// How log lines are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStyle {
    /// Timestamped single lines for the long-running server.
    Service,
    /// Pretty, untimed output for interactive use.
    Console,
}

fn default_level(verbose: bool, style: LogStyle) -> (LevelFilter, &'static str) {
    match (verbose, style) {
        (true, _) => (LevelFilter::DEBUG, "debug"),
        (false, LogStyle::Service) => (LevelFilter::INFO, "info"),
        (false, LogStyle::Console) => (LevelFilter::WARN, "warn"),
    }
}

/// Target filter applied only when `RUST_LOG` does not decide on its own.
fn app_targets(env_filter_set: bool, level_filter: LevelFilter) -> Option<Targets> {
    (!env_filter_set).then(|| {
        Targets::new()
            .with_target("whatif", level_filter)
            .with_target("tower_http", level_filter)
    })
}

pub fn init_logging(verbose: bool, style: LogStyle) {
    let (level_filter, level) = default_level(verbose, style);
    let (env_filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(level), false),
    };

    let registry = tracing_subscriber::registry()
        .with(app_targets(from_env, level_filter))
        .with(env_filter);
    match style {
        LogStyle::Service => registry.with(fmt::layer().compact()).init(),
        LogStyle::Console => registry.with(fmt::layer().pretty().without_time()).init(),
    }
}
