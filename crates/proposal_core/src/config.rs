//! Runtime configuration from environment variables.
//!
//! # Responsibility
//! - Collect gateway endpoints, watcher timing and logging options.
//!
//! # Invariants
//! - Loading never fails: malformed values fall back to defaults and are
//!   reported through a `warn` event.
//! - Blank values count as unset.

use crate::logging::default_log_level;
use log::warn;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_QUEUE_URL: &str = "PROPOSAL_QUEUE_URL";
pub const ENV_QUEUE_TOKEN: &str = "PROPOSAL_QUEUE_TOKEN";
pub const ENV_API_URL: &str = "PROPOSAL_API_URL";
pub const ENV_NOTIFY_INTERVAL_SECS: &str = "PROPOSAL_NOTIFY_INTERVAL_SECS";
pub const ENV_NOTIFY_WINDOW_SECS: &str = "PROPOSAL_NOTIFY_WINDOW_SECS";
pub const ENV_LOG_LEVEL: &str = "PROPOSAL_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "PROPOSAL_LOG_DIR";
pub const ENV_DB_PATH: &str = "PROPOSAL_DB_PATH";

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_NOTIFY_INTERVAL_SECS: u64 = 60;
const DEFAULT_NOTIFY_WINDOW_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: None,
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl QueueConfig {
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherConfig {
    /// Period between notification checks.
    pub interval: Duration,
    /// Half-width of the "due now" window around a notification time.
    pub window: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_NOTIFY_INTERVAL_SECS),
            window: Duration::from_secs(DEFAULT_NOTIFY_WINDOW_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub queue: QueueConfig,
    pub api: ApiConfig,
    pub watcher: WatcherConfig,
    pub log_level: String,
    /// File logging is disabled when unset.
    pub log_dir: Option<PathBuf>,
    /// Key/value store file; in-memory when unset.
    pub db_path: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            queue: QueueConfig::default(),
            api: ApiConfig::default(),
            watcher: WatcherConfig::default(),
            log_level: default_log_level().to_string(),
            log_dir: None,
            db_path: None,
        }
    }
}

impl CoreConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };
        let defaults = Self::default();

        Self {
            queue: QueueConfig {
                endpoint: value(ENV_QUEUE_URL),
                token: value(ENV_QUEUE_TOKEN),
                timeout: defaults.queue.timeout,
            },
            api: ApiConfig {
                base_url: value(ENV_API_URL).unwrap_or(defaults.api.base_url),
                timeout: defaults.api.timeout,
            },
            watcher: WatcherConfig {
                interval: parse_secs(
                    ENV_NOTIFY_INTERVAL_SECS,
                    value(ENV_NOTIFY_INTERVAL_SECS),
                    defaults.watcher.interval,
                ),
                window: parse_secs(
                    ENV_NOTIFY_WINDOW_SECS,
                    value(ENV_NOTIFY_WINDOW_SECS),
                    defaults.watcher.window,
                ),
            },
            log_level: value(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir: value(ENV_LOG_DIR).map(PathBuf::from),
            db_path: value(ENV_DB_PATH).map(PathBuf::from),
        }
    }
}

fn parse_secs(key: &str, raw: Option<String>, default: Duration) -> Duration {
    let Some(raw) = raw else {
        return default;
    };
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        _ => {
            warn!("event=config_load module=config status=error key={key} reason=invalid_seconds");
            default
        }
    }
}
