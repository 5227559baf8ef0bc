//! Workbench settings with environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use pedit::DEFAULT_AIDER_BINARY;
use pprovider::{DEFAULT_PROVIDER_PRIORITY, ProviderKind};

use crate::WorkbenchError;

pub const HOME_ENV: &str = "PARLANCE_HOME";
pub const SECRETS_ENV: &str = "PARLANCE_SECRETS";
pub const TIMEOUT_ENV: &str = "PARLANCE_TIMEOUT_SECS";
pub const ENGINE_ENV: &str = "PARLANCE_AIDER_BIN";

pub const APP_DIR_NAME: &str = "parlance";
pub const SECRETS_FILE_NAME: &str = "secrets.json";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbenchConfig {
    pub data_dir: PathBuf,
    pub secrets_path: PathBuf,
    pub request_timeout: Duration,
    pub provider_priority: Vec<ProviderKind>,
    pub engine_binary: PathBuf,
    /// Mirror resolved and saved secrets into the process environment.
    pub export_env: bool,
}

impl WorkbenchConfig {
    /// Defaults rooted at `data_dir`, with the secrets file stored alongside the data.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            secrets_path: data_dir.join(SECRETS_FILE_NAME),
            data_dir,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            provider_priority: DEFAULT_PROVIDER_PRIORITY.to_vec(),
            engine_binary: PathBuf::from(DEFAULT_AIDER_BINARY),
            export_env: true,
        }
    }

    /// Platform defaults overridden by `PARLANCE_*` environment variables.
    pub fn from_env() -> Result<Self, WorkbenchError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`WorkbenchConfig::from_env`] with a caller-supplied variable lookup.
    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WorkbenchError> {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let data_dir = match lookup(HOME_ENV) {
            Some(home) => PathBuf::from(home),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR_NAME))
                .ok_or_else(|| {
                    WorkbenchError::config(format!(
                        "could not determine a data directory; set {HOME_ENV}"
                    ))
                })?,
        };

        let mut config = Self::new(&data_dir);
        config.secrets_path = match lookup(SECRETS_ENV) {
            Some(path) => PathBuf::from(path),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR_NAME).join(SECRETS_FILE_NAME))
                .unwrap_or_else(|| data_dir.join(SECRETS_FILE_NAME)),
        };

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            config.request_timeout = parse_timeout(&raw)?;
        }
        if let Some(binary) = lookup(ENGINE_ENV) {
            config.engine_binary = PathBuf::from(binary);
        }

        Ok(config)
    }

    pub fn with_secrets_path(mut self, path: impl AsRef<Path>) -> Self {
        self.secrets_path = path.as_ref().to_path_buf();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_provider_priority(mut self, priority: Vec<ProviderKind>) -> Self {
        self.provider_priority = priority;
        self
    }

    pub fn with_engine_binary(mut self, binary: impl AsRef<Path>) -> Self {
        self.engine_binary = binary.as_ref().to_path_buf();
        self
    }

    pub fn with_export_env(mut self, export_env: bool) -> Self {
        self.export_env = export_env;
        self
    }

    pub fn conversations_dir(&self) -> PathBuf {
        self.data_dir.join("conversations")
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, WorkbenchError> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(WorkbenchError::config(format!(
            "{TIMEOUT_ENV} must be a positive number of seconds, got '{}'",
            raw.trim()
        ))),
        Ok(seconds) => Ok(Duration::from_secs(seconds)),
    }
}
