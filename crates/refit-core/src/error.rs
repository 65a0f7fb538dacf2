//! Error types for refit-core

use thiserror::Error;

/// Result type alias using refit-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Refit
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration contents
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Plugin is not present in the configuration
    #[error("Unknown plugin: {plugin}")]
    UnknownPlugin { plugin: String },
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an unknown plugin error
    pub fn unknown_plugin(plugin: impl Into<String>) -> Self {
        Self::UnknownPlugin {
            plugin: plugin.into(),
        }
    }
}
