//! Configuration errors.

use super::error_code::{self, NestifyErrorCode};

/// Errors that can occur during configuration loading and validation.
/// All of them are fatal and raised before any file is touched.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing resource key: a key is required to derive module paths")]
    MissingKey,

    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Config parse error in {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Config validation failed for {field}: {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Invalid config value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl NestifyErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingKey => error_code::MISSING_KEY,
            _ => error_code::CONFIG_ERROR,
        }
    }
}
