//! Top-level nestify configuration with layered resolution.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{MarkersConfig, PathsConfig, RoutesConfig};
use crate::constants::CONFIG_FILE_NAME;
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`NESTIFY_*`)
/// 3. Project config (`nestify.toml` in project root)
/// 4. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NestifyConfig {
    pub paths: PathsConfig,
    pub routes: RoutesConfig,
    pub markers: MarkersConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub routes_dir: Option<String>,
    pub modules_dir: Option<String>,
    pub server_file: Option<String>,
    pub api_prefix: Option<String>,
}

const ENV_OVERRIDES: &[&str] = &[
    "NESTIFY_ROUTES_DIR",
    "NESTIFY_MODULES_DIR",
    "NESTIFY_SERVER_FILE",
    "NESTIFY_APP_IDENTIFIER",
    "NESTIFY_API_PREFIX",
    "NESTIFY_WRAPPER_FUNCTIONS",
    "NESTIFY_MARKER_PREFIX",
];

impl NestifyConfig {
    /// Load configuration with layered resolution.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let project_config_path = root.join(CONFIG_FILE_NAME);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
            tracing::debug!(path = %project_config_path.display(), "merged project config");
        }

        Self::apply_env_overrides(&mut config);

        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;
        tracing::debug!(
            routes_dir = config.paths.routes_dir.as_deref().unwrap_or_default(),
            modules_dir = config.paths.modules_dir.as_deref().unwrap_or_default(),
            api_prefix = config.routes.api_prefix.as_deref().unwrap_or_default(),
            "config resolved"
        );

        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &NestifyConfig) -> Result<(), ConfigError> {
        let non_empty = [
            ("paths.routes_dir", config.paths.routes_dir.as_deref()),
            ("paths.modules_dir", config.paths.modules_dir.as_deref()),
            ("paths.server_file", config.paths.server_file.as_deref()),
            ("routes.app_identifier", config.routes.app_identifier.as_deref()),
            ("markers.prefix", config.markers.prefix.as_deref()),
        ];
        for (field, value) in non_empty {
            if let Some(v) = value {
                if v.trim().is_empty() {
                    return Err(ConfigError::ValidationFailed {
                        field: field.to_string(),
                        message: "must not be empty".to_string(),
                    });
                }
            }
        }

        if let Some(ref ident) = config.routes.app_identifier {
            if !is_identifier(ident) {
                return Err(ConfigError::InvalidValue {
                    field: "routes.app_identifier".to_string(),
                    message: format!("'{ident}' is not a valid identifier"),
                });
            }
        }
        for wrapper in &config.routes.wrapper_functions {
            if !is_identifier(wrapper) {
                return Err(ConfigError::InvalidValue {
                    field: "routes.wrapper_functions".to_string(),
                    message: format!("'{wrapper}' is not a valid identifier"),
                });
            }
        }
        if let Some(ref prefix) = config.routes.api_prefix {
            if prefix.contains(char::is_whitespace) {
                return Err(ConfigError::InvalidValue {
                    field: "routes.api_prefix".to_string(),
                    message: "must not contain whitespace".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored (forward-compatible).
    fn merge_toml_file(config: &mut NestifyConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: NestifyConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`, where `other` values override `base` values
    /// only when `other` has a `Some` value.
    fn merge(base: &mut NestifyConfig, other: &NestifyConfig) {
        // Paths
        if other.paths.routes_dir.is_some() {
            base.paths.routes_dir = other.paths.routes_dir.clone();
        }
        if other.paths.modules_dir.is_some() {
            base.paths.modules_dir = other.paths.modules_dir.clone();
        }
        if other.paths.server_file.is_some() {
            base.paths.server_file = other.paths.server_file.clone();
        }

        // Routes
        if other.routes.app_identifier.is_some() {
            base.routes.app_identifier = other.routes.app_identifier.clone();
        }
        if other.routes.api_prefix.is_some() {
            base.routes.api_prefix = other.routes.api_prefix.clone();
        }
        if !other.routes.wrapper_functions.is_empty() {
            base.routes.wrapper_functions = other.routes.wrapper_functions.clone();
        }

        // Markers
        if other.markers.prefix.is_some() {
            base.markers.prefix = other.markers.prefix.clone();
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `NESTIFY_ROUTES_DIR`, `NESTIFY_API_PREFIX`, etc.
    fn apply_env_overrides(config: &mut NestifyConfig) {
        let applied: Vec<&str> = ENV_OVERRIDES
            .iter()
            .copied()
            .filter(|name| std::env::var_os(name).is_some())
            .collect();
        if !applied.is_empty() {
            tracing::debug!(?applied, "applying environment overrides");
        }
        if let Ok(val) = std::env::var("NESTIFY_ROUTES_DIR") {
            config.paths.routes_dir = Some(val);
        }
        if let Ok(val) = std::env::var("NESTIFY_MODULES_DIR") {
            config.paths.modules_dir = Some(val);
        }
        if let Ok(val) = std::env::var("NESTIFY_SERVER_FILE") {
            config.paths.server_file = Some(val);
        }
        if let Ok(val) = std::env::var("NESTIFY_APP_IDENTIFIER") {
            config.routes.app_identifier = Some(val);
        }
        if let Ok(val) = std::env::var("NESTIFY_API_PREFIX") {
            config.routes.api_prefix = Some(val);
        }
        if let Ok(val) = std::env::var("NESTIFY_WRAPPER_FUNCTIONS") {
            let wrappers: Vec<String> = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            if !wrappers.is_empty() {
                config.routes.wrapper_functions = wrappers;
            }
        }
        if let Ok(val) = std::env::var("NESTIFY_MARKER_PREFIX") {
            config.markers.prefix = Some(val);
        }
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut NestifyConfig, cli: &CliOverrides) {
        if let Some(ref v) = cli.routes_dir {
            config.paths.routes_dir = Some(v.clone());
        }
        if let Some(ref v) = cli.modules_dir {
            config.paths.modules_dir = Some(v.clone());
        }
        if let Some(ref v) = cli.server_file {
            config.paths.server_file = Some(v.clone());
        }
        if let Some(ref v) = cli.api_prefix {
            config.routes.api_prefix = Some(v.clone());
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_check() {
        assert!(is_identifier("app"));
        assert!(is_identifier("$server"));
        assert!(!is_identifier("1app"));
        assert!(!is_identifier("my-app"));
        assert!(!is_identifier(""));
    }
}
