//! Configuration system for nestify.
//! TOML-based, layered resolution: CLI > env > project > defaults.

pub mod markers_config;
pub mod module_config;
pub mod nestify_config;
pub mod paths_config;
pub mod routes_config;

pub use markers_config::MarkersConfig;
pub use module_config::{ComponentConfig, MigrationOptions, ModuleConfig};
pub use nestify_config::{CliOverrides, NestifyConfig};
pub use paths_config::PathsConfig;
pub use routes_config::RoutesConfig;
