//! Review marker configuration.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MARKER_PREFIX;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MarkersConfig {
    /// Prefix of every review marker. Default: `TODO(NestJS Migration)`.
    pub prefix: Option<String>,
}

impl MarkersConfig {
    pub fn effective_prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or(DEFAULT_MARKER_PREFIX)
    }

    /// Formats a review marker: `<prefix>: <message>`.
    pub fn marker(&self, message: &str) -> String {
        format!("{}: {}", self.effective_prefix(), message)
    }
}
