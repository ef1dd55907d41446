//! Errors raised while loading, parsing, editing, or saving source files.

use std::path::PathBuf;

use super::error_code::{self, NestifyErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Grammar could not be loaded: {message}")]
    GrammarNotFound { message: String },

    #[error("Tree-sitter error parsing {path}: {message}")]
    TreeSitterError { path: PathBuf, message: String },

    #[error("Overlapping edits in {path} at bytes {start}..{end}")]
    OverlappingEdit {
        path: PathBuf,
        start: usize,
        end: usize,
    },

    #[error("Edit range {start}..{end} out of bounds for {path} ({len} bytes)")]
    EditOutOfBounds {
        path: PathBuf,
        start: usize,
        end: usize,
        len: usize,
    },
}

impl SyntaxError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl NestifyErrorCode for SyntaxError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => error_code::IO_ERROR,
            Self::OverlappingEdit { .. } | Self::EditOutOfBounds { .. } => {
                error_code::EDIT_CONFLICT
            }
            _ => error_code::PARSE_ERROR,
        }
    }
}
