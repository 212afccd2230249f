// Schedule configuration: defaults, YAML loading and `${VAR}` expansion

use std::{env, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Environment variable '{0}' not found")]
    MissingEnv(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    // Store collection holding the bookings
    pub collection: String,
    pub max_duration_minutes: u32,
    pub notification_auto_close_ms: u64,
    // Raise an error notification for missing or malformed fields.
    // Off by default: incomplete submissions are dropped silently.
    pub notify_validation_errors: bool,
    pub log_filter: String,
    pub log_json: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            collection: "schedule".to_string(),
            max_duration_minutes: 25,
            notification_auto_close_ms: 3000,
            notify_validation_errors: false,
            log_filter: "bath_schedule=info".to_string(),
            log_json: false,
        }
    }
}

impl ScheduleConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: ScheduleConfig = serde_yaml::from_str(yaml)?;

        config.collection = expand_env(&config.collection)?;
        config.log_filter = expand_env(&config.log_filter)?;

        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection.trim().is_empty() {
            return Err(ConfigError::Invalid("collection must not be empty".to_string()));
        }
        if self.max_duration_minutes == 0 {
            return Err(ConfigError::Invalid(
                "max_duration_minutes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn auto_close(&self) -> Duration {
        Duration::from_millis(self.notification_auto_close_ms)
    }
}

// `${NAME}` is replaced by the value of NAME; anything else passes through
fn expand_env(value: &str) -> Result<String, ConfigError> {
    match value
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
    {
        Some(name) => env::var(name).map_err(|_| ConfigError::MissingEnv(name.to_string())),
        None => Ok(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScheduleConfig::default();
        assert_eq!(config.collection, "schedule");
        assert_eq!(config.max_duration_minutes, 25);
        assert_eq!(config.auto_close(), Duration::from_millis(3000));
        assert!(!config.notify_validation_errors);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ScheduleConfig::from_yaml_str("max_duration_minutes: 15\nlog_json: true\n")
            .unwrap();
        assert_eq!(config.max_duration_minutes, 15);
        assert!(config.log_json);
        assert_eq!(config.collection, "schedule");
    }

    #[test]
    fn test_env_expansion() {
        env::set_var("BATH_SCHEDULE_TEST_COLLECTION", "dorm_3");
        let config =
            ScheduleConfig::from_yaml_str("collection: ${BATH_SCHEDULE_TEST_COLLECTION}\n").unwrap();
        assert_eq!(config.collection, "dorm_3");

        let err = ScheduleConfig::from_yaml_str("collection: ${BATH_SCHEDULE_SURELY_UNSET}\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(name) if name == "BATH_SCHEDULE_SURELY_UNSET"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            ScheduleConfig::from_yaml_str("max_duration_minutes: 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ScheduleConfig::from_yaml_str("collection: \"\"\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ScheduleConfig::from_yaml_str("max_duration_minutes: [1, 2]\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ScheduleConfig::from_yaml_file("/definitely/not/here.yaml"),
            Err(ConfigError::Io(_))
        ));
    }
}
