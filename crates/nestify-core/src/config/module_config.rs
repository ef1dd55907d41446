//! Per-invocation module configuration.
//!
//! Every generated file name, class name and variable name is derived from
//! the resource key, the module key and the admin flag. The derivation is
//! deterministic, so reruns land on the same files.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::NestifyConfig;
use crate::errors::ConfigError;

/// Raw inputs of a migration run, as given by the invoker.
#[derive(Debug, Clone, Default)]
pub struct MigrationOptions {
    /// Resource key, e.g. `users`. Required.
    pub key: Option<String>,
    /// Module directory name. Defaults to the key.
    pub module_key: Option<String>,
    /// Handler file, relative to the routes directory. Defaults to `{key}.ts`.
    pub route_path: Option<String>,
    /// Handler names to migrate. Empty means all.
    pub functions: Vec<String>,
    /// Generate the admin flavour (`.admin` files, `Admin` classes).
    pub admin: bool,
}

impl MigrationOptions {
    /// Parses a comma-separated function filter, dropping blanks.
    pub fn parse_function_filter(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

/// File and naming configuration of one generated component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentConfig {
    /// e.g. `users.service.ts`
    pub file_name: String,
    /// e.g. `<root>/src/modules/users/users.service.ts`
    pub file_path: PathBuf,
    /// e.g. `UsersService`
    pub class_name: String,
    /// e.g. `usersService`
    pub var_name: String,
}

impl ComponentConfig {
    /// Module specifier used to import this component from a sibling file.
    pub fn sibling_specifier(&self) -> String {
        let stem = self
            .file_name
            .strip_suffix(".ts")
            .unwrap_or(&self.file_name);
        format!("./{stem}")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleConfig {
    pub root: PathBuf,
    pub key: String,
    pub module_key: String,
    pub module_dir: PathBuf,
    /// Absolute path of the handler file.
    pub route_path: PathBuf,
    pub functions: Vec<String>,
    pub admin: bool,
    pub controller: ComponentConfig,
    pub service: ComponentConfig,
}

impl ModuleConfig {
    /// Resolve the module configuration. A missing or blank key is fatal.
    pub fn resolve(
        root: &Path,
        options: &MigrationOptions,
        config: &NestifyConfig,
    ) -> Result<Self, ConfigError> {
        let key = options
            .key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingKey)?
            .to_string();

        if key.contains(['/', '\\']) {
            return Err(ConfigError::InvalidValue {
                field: "key".to_string(),
                message: format!("'{key}' must not contain path separators"),
            });
        }

        let module_key = options
            .module_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .unwrap_or(&key)
            .to_string();

        let route_file = options
            .route_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .unwrap_or_else(|| format!("{key}.ts"));

        let module_dir = root
            .join(config.paths.effective_modules_dir())
            .join(&module_key);
        let route_path = root
            .join(config.paths.effective_routes_dir())
            .join(route_file);

        let class_key = upper_camel_case(&key);
        let var_key = lower_camel_case(&key);
        let (suffix_file, suffix_name) = if options.admin {
            (".admin", "Admin")
        } else {
            ("", "")
        };

        let component = |kind_file: &str, kind_name: &str| {
            let file_name = format!("{key}{suffix_file}.{kind_file}.ts");
            ComponentConfig {
                file_path: module_dir.join(&file_name),
                file_name,
                class_name: format!("{class_key}{suffix_name}{kind_name}"),
                var_name: format!("{var_key}{suffix_name}{kind_name}"),
            }
        };

        Ok(Self {
            root: root.to_path_buf(),
            controller: component("controller", "Controller"),
            service: component("service", "Service"),
            key,
            module_key,
            module_dir,
            route_path,
            functions: options.functions.clone(),
            admin: options.admin,
        })
    }

    /// Mount path used in `@Controller(...)`: `admin/{key}` or `{key}`.
    pub fn mount_path(&self) -> String {
        if self.admin {
            format!("admin/{}", self.key)
        } else {
            self.key.clone()
        }
    }

    /// Whether a handler passes the function filter (empty = all).
    pub fn selects(&self, function_name: &str) -> bool {
        self.functions.is_empty() || self.functions.iter().any(|f| f == function_name)
    }
}

/// `users` -> `Users`, `user-groups` -> `UserGroups`.
pub fn upper_camel_case(s: &str) -> String {
    s.split(['-', '_', ' '])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// `users` -> `users`, `user-groups` -> `userGroups`.
pub fn lower_camel_case(s: &str) -> String {
    let upper = upper_camel_case(s);
    let mut chars = upper.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_cases() {
        assert_eq!(upper_camel_case("users"), "Users");
        assert_eq!(upper_camel_case("user-groups"), "UserGroups");
        assert_eq!(lower_camel_case("user_groups"), "userGroups");
        assert_eq!(lower_camel_case("users"), "users");
    }

    #[test]
    fn function_filter_parsing() {
        assert_eq!(
            MigrationOptions::parse_function_filter(" list, show ,,create"),
            vec!["list", "show", "create"]
        );
        assert!(MigrationOptions::parse_function_filter("").is_empty());
    }

    #[test]
    fn sibling_specifier_drops_extension() {
        let c = ComponentConfig {
            file_name: "users.admin.service.ts".into(),
            file_path: PathBuf::from("x"),
            class_name: "UsersAdminService".into(),
            var_name: "usersAdminService".into(),
        };
        assert_eq!(c.sibling_specifier(), "./users.admin.service");
    }
}
