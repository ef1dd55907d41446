//! NestifyErrorCode trait for stable error identifiers.

/// Trait for converting nestify errors to stable error code strings.
/// Every error enum implements this so the CLI can report a machine-readable
/// code next to the human message.
pub trait NestifyErrorCode {
    /// Returns the error code string (e.g., "CONFIG_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted error string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const MISSING_KEY: &str = "MISSING_KEY";
pub const PARSE_ERROR: &str = "PARSE_ERROR";
pub const IO_ERROR: &str = "IO_ERROR";
pub const EDIT_CONFLICT: &str = "EDIT_CONFLICT";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
