use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    /// Gates verbose cycle logging.
    #[serde(default)]
    pub debug: bool,
    /// Ordered command templates per package key.
    #[serde(default)]
    pub commands: BTreeMap<String, Vec<String>>,
    /// How the standalone agent dispatches commands to the game server.
    #[serde(default)]
    pub dispatch: Option<DispatchConfig>,
}

/// Store backend connection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Backend base URL (e.g., "https://store.example.com")
    pub url: String,
    /// Shared secret sent as `X-API-Key`
    pub key: String,
}

/// Polling schedule configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollingConfig {
    #[serde(default = "default_polling_enabled")]
    pub enabled: bool,
    /// Seconds between polling cycles
    #[serde(default = "default_polling_interval")]
    pub interval: u64,
}

impl PollingConfig {
    pub fn interval_duration(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            enabled: default_polling_enabled(),
            interval: default_polling_interval(),
        }
    }
}

fn default_polling_enabled() -> bool {
    true
}

fn default_polling_interval() -> u64 {
    60
}

/// External program used to run console commands on the game server.
///
/// The rendered command is appended as the last argument, e.g.
/// `program = "mcrcon"`, `args = ["-H", "localhost", "-p", "secret"]`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatchConfig {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    /// Timeout for a single command in seconds (default: 10)
    #[serde(default = "default_dispatch_timeout")]
    pub timeout_secs: u64,
    /// Command template used to message a player after delivery.
    /// Supports `{username}` and `{message}`.
    #[serde(default)]
    pub notify_template: Option<String>,
}

fn default_dispatch_timeout() -> u64 {
    10
}

/// Sanitized config for status output (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub api_url: String,
    pub api_key_configured: bool,
    pub polling: PollingConfig,
    pub debug: bool,
    pub packages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch_program: Option<String>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            api_url: config.api.url.clone(),
            api_key_configured: !config.api.key.is_empty(),
            polling: config.polling.clone(),
            debug: config.debug,
            packages: config.commands.keys().cloned().collect(),
            dispatch_program: config
                .dispatch
                .as_ref()
                .map(|d| d.program.display().to_string()),
        }
    }
}
