//! Runtime configuration resolved from the environment.
//!
//! # Invariants
//! - Unset or blank variables fall back to defaults.
//! - Set but invalid values are errors, never silently replaced.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "DEGREEPLAN_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "DEGREEPLAN_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "DEGREEPLAN_LOG_DIR";
pub const TARGET_UNITS_ENV: &str = "DEGREEPLAN_TARGET_UNITS";

const DEFAULT_DB_FILE_NAME: &str = "degreeplan.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "degreeplan-logs";
/// Units required for a complete plan when not configured.
pub const DEFAULT_TARGET_UNITS: f64 = 32.0;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidTargetUnits(String),
    RelativeLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTargetUnits(value) => write!(
                f,
                "{TARGET_UNITS_ENV} must be a positive number, got `{value}`"
            ),
            Self::RelativeLogDir(value) => {
                write!(f, "{LOG_DIR_ENV} must be an absolute path, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Planner runtime settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
    pub target_units: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        let temp = std::env::temp_dir();
        Self {
            db_path: temp.join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: temp.join(DEFAULT_LOG_DIR_NAME),
            target_units: DEFAULT_TARGET_UNITS,
        }
    }
}

impl PlannerConfig {
    /// Resolves configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(db_path) = read(DB_PATH_ENV) {
            config.db_path = PathBuf::from(db_path);
        }
        if let Some(level) = read(LOG_LEVEL_ENV) {
            config.log_level = level;
        }
        if let Some(log_dir) = read(LOG_DIR_ENV) {
            let path = PathBuf::from(&log_dir);
            if !path.is_absolute() {
                return Err(ConfigError::RelativeLogDir(log_dir));
            }
            config.log_dir = path;
        }
        if let Some(raw) = read(TARGET_UNITS_ENV) {
            config.target_units = match raw.parse::<f64>() {
                Ok(value) if value.is_finite() && value > 0.0 => value,
                _ => return Err(ConfigError::InvalidTargetUnits(raw)),
            };
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ConfigError, PlannerConfig, DB_PATH_ENV, DEFAULT_TARGET_UNITS, LOG_DIR_ENV,
        TARGET_UNITS_ENV,
    };
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = PlannerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, PlannerConfig::default());
        assert_eq!(config.target_units, DEFAULT_TARGET_UNITS);
    }

    #[test]
    fn values_override_defaults_and_blank_is_ignored() {
        let config = PlannerConfig::from_lookup(lookup(&[
            (DB_PATH_ENV, " /tmp/plans.db "),
            (TARGET_UNITS_ENV, "37.5"),
            (LOG_DIR_ENV, "   "),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/plans.db"));
        assert_eq!(config.target_units, 37.5);
        assert_eq!(config.log_dir, PlannerConfig::default().log_dir);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = PlannerConfig::from_lookup(lookup(&[(TARGET_UNITS_ENV, "-4")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidTargetUnits("-4".to_string()));

        let err = PlannerConfig::from_lookup(lookup(&[(LOG_DIR_ENV, "logs")])).unwrap_err();
        assert_eq!(err, ConfigError::RelativeLogDir("logs".to_string()));
    }
}
