//! Non-fatal findings collected while a step runs.
//!
//! A diagnostic never aborts a step: the offending site is left untouched
//! and the finding is reported alongside the step result.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A call or access did not match a recognised shape.
    PatternMismatch,
    /// A request access used a field group outside the known set.
    UnexpectedGroup,
    /// No type could be inferred; the field was typed `any`.
    TypeInference,
    /// The Service/Controller counterpart of a method was not found.
    MissingCounterpart,
    /// A route registration could not be interpreted.
    UnrecognizedRoute,
}

impl DiagnosticKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::PatternMismatch => "pattern_mismatch",
            Self::UnexpectedGroup => "unexpected_group",
            Self::TypeInference => "type_inference",
            Self::MissingCounterpart => "missing_counterpart",
            Self::UnrecognizedRoute => "unrecognized_route",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub file: String,
    /// 1-based line number.
    pub line: u32,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        file: impl Into<String>,
        line: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            file: file.into(),
            line,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} [{}] {}",
            self.file,
            self.line,
            self.kind.name(),
            self.message
        )
    }
}
