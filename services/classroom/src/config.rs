//! Environment-driven configuration for the classroom service.

use sahayak_core::{
    Domain, activity::DEFAULT_GRADE_LEVEL, agents::ModelChoice, planning::DEFAULT_TEACHING_STYLE,
};
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub prompts_path: PathBuf,
    pub log_level: Level,
    pub default_grade_level: String,
    pub default_teaching_style: String,
    pub models: ModelChoice,
}

fn non_empty_var(name: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() => Err(ConfigError::InvalidValue(
            name.to_string(),
            "value must not be empty".to_string(),
        )),
        Ok(value) => Ok(Some(value)),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let prompts_path = std::env::var("PROMPTS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./prompts"));

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let default_grade_level = non_empty_var("DEFAULT_GRADE_LEVEL")?
            .unwrap_or_else(|| DEFAULT_GRADE_LEVEL.to_string());
        let default_teaching_style = non_empty_var("DEFAULT_TEACHING_STYLE")?
            .unwrap_or_else(|| DEFAULT_TEACHING_STYLE.to_string());

        let defaults = ModelChoice::default();
        let models = ModelChoice {
            manager: non_empty_var("MANAGER_MODEL")?.unwrap_or(defaults.manager),
            worker: non_empty_var("WORKER_MODEL")?.unwrap_or(defaults.worker),
        };

        Ok(Self {
            prompts_path,
            log_level,
            default_grade_level,
            default_teaching_style,
            models,
        })
    }

    /// The initializer default for `domain`: grade level or teaching style.
    pub fn default_for(&self, domain: Domain) -> &str {
        match domain {
            Domain::FunActivity => &self.default_grade_level,
            Domain::Planning => &self.default_teaching_style,
        }
    }
}
