//! Project layout configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MODULES_DIR, DEFAULT_ROUTES_DIR, DEFAULT_SERVER_FILE};

/// Where handler files live, where modules are generated, and which file
/// bootstraps the Express application. All paths are relative to the
/// project root.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding Express route handler files. Default: `src/routes`.
    pub routes_dir: Option<String>,
    /// Directory under which modules are generated. Default: `src/modules`.
    pub modules_dir: Option<String>,
    /// Express bootstrap file. Default: `src/server.ts`.
    pub server_file: Option<String>,
}

impl PathsConfig {
    pub fn effective_routes_dir(&self) -> &str {
        self.routes_dir.as_deref().unwrap_or(DEFAULT_ROUTES_DIR)
    }

    pub fn effective_modules_dir(&self) -> &str {
        self.modules_dir.as_deref().unwrap_or(DEFAULT_MODULES_DIR)
    }

    pub fn effective_server_file(&self) -> &str {
        self.server_file.as_deref().unwrap_or(DEFAULT_SERVER_FILE)
    }
}
