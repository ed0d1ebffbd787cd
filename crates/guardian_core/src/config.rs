//! Engine configuration.
//!
//! # Responsibility
//! - Hold logging settings and workflow limits with working defaults.
//! - Load overrides from TOML; missing keys keep their defaults.
//!
//! # Invariants
//! - A loaded config has passed `validate`.

use crate::model::attendance::DEFAULT_OVERTIME_THRESHOLD_HOURS;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Top-level configuration for the core and its CLI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub logging: LoggingConfig,
    pub limits: WorkflowLimits,
}

/// File logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace|debug|info|warn|error`; `None` picks the build-mode default.
    pub level: Option<String>,
    /// Absolute directory; `None` disables file logging.
    pub directory: Option<PathBuf>,
    pub max_file_size_bytes: u64,
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            directory: None,
            max_file_size_bytes: 10 * 1024 * 1024,
            max_files: 5,
        }
    }
}

/// Numeric limits used by the workflow services.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowLimits {
    /// Worked hours strictly above this count as overtime.
    pub overtime_threshold_hours: f64,
    pub notification_feed_limit: u32,
    pub attendance_history_limit: u32,
    /// More meetings than this in one day marks the day as meeting-heavy.
    pub meeting_heavy_threshold: usize,
    pub telemetry_history_default: u32,
    pub telemetry_history_max: u32,
    /// More open tasks than this triggers a prioritization suggestion.
    pub pending_task_threshold: u32,
    /// Number of most recent sampled days in the org neural-load series.
    pub org_traffic_days: u32,
}

impl Default for WorkflowLimits {
    fn default() -> Self {
        Self {
            overtime_threshold_hours: DEFAULT_OVERTIME_THRESHOLD_HOURS,
            notification_feed_limit: 50,
            attendance_history_limit: 30,
            meeting_heavy_threshold: 4,
            telemetry_history_default: 24,
            telemetry_history_max: 500,
            pending_task_threshold: 5,
            org_traffic_days: 14,
        }
    }
}

impl WorkflowLimits {
    /// Resolves a caller-provided history limit against default and cap.
    pub fn telemetry_history_limit(&self, requested: Option<u32>) -> u32 {
        match requested {
            None | Some(0) => self.telemetry_history_default,
            Some(value) => value.min(self.telemetry_history_max),
        }
    }
}

/// Configuration load failure.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config syntax: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

impl EngineConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = &self.limits;
        if !limits.overtime_threshold_hours.is_finite() || limits.overtime_threshold_hours < 0.0 {
            return Err(ConfigError::Invalid(
                "limits.overtime_threshold_hours must be a non-negative number".to_string(),
            ));
        }
        if limits.telemetry_history_default == 0 || limits.telemetry_history_max == 0 {
            return Err(ConfigError::Invalid(
                "telemetry history limits must be positive".to_string(),
            ));
        }
        if limits.telemetry_history_default > limits.telemetry_history_max {
            return Err(ConfigError::Invalid(format!(
                "limits.telemetry_history_default ({}) exceeds limits.telemetry_history_max ({})",
                limits.telemetry_history_default, limits.telemetry_history_max
            )));
        }
        if limits.org_traffic_days == 0 {
            return Err(ConfigError::Invalid(
                "limits.org_traffic_days must be at least 1".to_string(),
            ));
        }
        if self.logging.max_files == 0 {
            return Err(ConfigError::Invalid(
                "logging.max_files must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
