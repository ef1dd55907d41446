//! Error handling for nestify.
//! One error enum per subsystem, `thiserror` only.

pub mod config_error;
pub mod diagnostic;
pub mod error_code;
pub mod migrate_error;
pub mod syntax_error;

pub use config_error::ConfigError;
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use error_code::NestifyErrorCode;
pub use migrate_error::MigrateError;
pub use syntax_error::SyntaxError;
