//! Route extraction configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_API_PREFIX, DEFAULT_APP_IDENTIFIER, DEFAULT_WRAPPER_FUNCTIONS};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RoutesConfig {
    /// Identifier of the application object in the bootstrap file. Default: `app`.
    pub app_identifier: Option<String>,
    /// Global API prefix stripped from mounted paths. Default: `api`.
    pub api_prefix: Option<String>,
    /// Error-boundary wrappers unwrapped around handler references.
    #[serde(default)]
    pub wrapper_functions: Vec<String>,
}

impl RoutesConfig {
    pub fn effective_app_identifier(&self) -> &str {
        self.app_identifier
            .as_deref()
            .unwrap_or(DEFAULT_APP_IDENTIFIER)
    }

    pub fn effective_api_prefix(&self) -> &str {
        self.api_prefix.as_deref().unwrap_or(DEFAULT_API_PREFIX)
    }

    /// Configured wrappers, or the defaults when none are configured.
    pub fn effective_wrapper_functions(&self) -> Vec<String> {
        if self.wrapper_functions.is_empty() {
            DEFAULT_WRAPPER_FUNCTIONS
                .iter()
                .map(|s| s.to_string())
                .collect()
        } else {
            self.wrapper_functions.clone()
        }
    }
}
