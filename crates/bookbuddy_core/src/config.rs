//! Process configuration resolved from the environment.
//!
//! # Responsibility
//! - Resolve database path, log level/directory and snapshot key.
//!
//! # Invariants
//! - Every value has a default; only present-but-invalid values are errors.
//! - Paths are absolute after resolution.

use crate::logging::default_log_level;
use crate::store::snapshot::DEFAULT_SNAPSHOT_KEY;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "BOOKBUDDY_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "BOOKBUDDY_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "BOOKBUDDY_LOG_DIR";
pub const ENV_SNAPSHOT_KEY: &str = "BOOKBUDDY_SNAPSHOT_KEY";

const DEFAULT_DB_FILE_NAME: &str = "bookbuddy.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "bookbuddy-logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { var: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { var, message } => {
                write!(f, "invalid value for {var}: {message}")
            }
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
    pub snapshot_key: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        let base = std::env::temp_dir();
        Self {
            db_path: base.join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: base.join(DEFAULT_LOG_DIR_NAME),
            snapshot_key: DEFAULT_SNAPSHOT_KEY.to_string(),
        }
    }
}

impl CoreConfig {
    /// Resolves configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Resolves configuration through `lookup`, which maps a variable name to
    /// its raw value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let read = |var: &str| {
            lookup(var)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = match read(ENV_DB_PATH) {
            Some(value) => absolute_path(ENV_DB_PATH, value)?,
            None => defaults.db_path,
        };
        let log_dir = match read(ENV_LOG_DIR) {
            Some(value) => absolute_path(ENV_LOG_DIR, value)?,
            None => defaults.log_dir,
        };
        let log_level = match read(ENV_LOG_LEVEL) {
            Some(value) => {
                let lowered = value.to_ascii_lowercase();
                if !matches!(
                    lowered.as_str(),
                    "trace" | "debug" | "info" | "warn" | "warning" | "error"
                ) {
                    return Err(ConfigError::InvalidValue {
                        var: ENV_LOG_LEVEL,
                        message: format!("unsupported level `{value}`"),
                    });
                }
                lowered
            }
            None => defaults.log_level,
        };

        Ok(Self {
            db_path,
            log_level,
            log_dir,
            snapshot_key: read(ENV_SNAPSHOT_KEY).unwrap_or(defaults.snapshot_key),
        })
    }
}

fn absolute_path(var: &'static str, value: String) -> Result<PathBuf, ConfigError> {
    let path = PathBuf::from(value);
    if !path.is_absolute() {
        return Err(ConfigError::InvalidValue {
            var,
            message: format!("`{}` is not an absolute path", path.display()),
        });
    }
    Ok(path)
}
