//! Process-wide tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::WorkbenchError;

pub const LOG_ENV: &str = "PARLANCE_LOG";
pub const DEFAULT_LOG_DIRECTIVE: &str = "info";

/// Installs a fmt subscriber filtered by `directive`, else `PARLANCE_LOG`, else `info`.
pub fn init_tracing(directive: Option<&str>) -> Result<(), WorkbenchError> {
    let directive = filter_directive(directive, std::env::var(LOG_ENV).ok());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|error| {
        eprintln!("ignoring invalid log filter '{directive}': {error}");
        EnvFilter::new(DEFAULT_LOG_DIRECTIVE)
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| {
            WorkbenchError::config(format!("failed to install tracing subscriber: {error}"))
        })
}

pub fn filter_directive(explicit: Option<&str>, from_env: Option<String>) -> String {
    explicit
        .map(str::to_string)
        .or(from_env)
        .map(|directive| directive.trim().to_string())
        .filter(|directive| !directive.is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_DIRECTIVE.to_string())
}
