//! Step-level errors. Only these propagate out of a migration step.

use super::error_code::{self, NestifyErrorCode};
use super::{ConfigError, SyntaxError};

/// Errors that abort a migration step.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("Step {step} requires {what}, which was not found at {path}")]
    MissingInput {
        step: &'static str,
        what: &'static str,
        path: String,
    },
}

impl MigrateError {
    /// Configuration errors are fatal before any mutation; everything else
    /// surfaces while a step is running.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl NestifyErrorCode for MigrateError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Syntax(e) => e.error_code(),
            Self::MissingInput { .. } => error_code::MIGRATION_FAILED,
        }
    }
}
