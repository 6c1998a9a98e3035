//! Server configuration
//!
//! Read once from the environment at startup.

use thiserror::Error;

use crate::models::MeasurementSystem;

/// Environment variable selecting the default measurement system
pub const MEASUREMENT_SYSTEM_VAR: &str = "OGTT_MEASUREMENT_SYSTEM";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {var} value '{value}' (expected US or SI)")]
    InvalidMeasurementSystem { var: &'static str, value: String },
}

/// Server configuration
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Measurement system assumed when a tool call omits one
    pub default_system: MeasurementSystem,
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through a variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_system = match lookup(MEASUREMENT_SYSTEM_VAR) {
            Some(value) if !value.trim().is_empty() => MeasurementSystem::from_str(&value)
                .ok_or(ConfigError::InvalidMeasurementSystem {
                    var: MEASUREMENT_SYSTEM_VAR,
                    value,
                })?,
            _ => MeasurementSystem::default(),
        };

        Ok(Self { default_system })
    }
}
