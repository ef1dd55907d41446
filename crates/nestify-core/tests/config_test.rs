//! Tests for the nestify configuration system.

use std::path::Path;
use std::sync::Mutex;

use nestify_core::config::{CliOverrides, MigrationOptions, ModuleConfig, NestifyConfig};
use nestify_core::errors::{ConfigError, NestifyErrorCode};

/// Global mutex to serialize tests that modify environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn tempdir() -> tempfile::TempDir {
    tempfile::TempDir::new().unwrap()
}

/// Clear all NESTIFY_ env vars to prevent cross-test contamination.
fn clear_nestify_env_vars() {
    for key in [
        "NESTIFY_ROUTES_DIR",
        "NESTIFY_MODULES_DIR",
        "NESTIFY_SERVER_FILE",
        "NESTIFY_APP_IDENTIFIER",
        "NESTIFY_API_PREFIX",
        "NESTIFY_WRAPPER_FUNCTIONS",
        "NESTIFY_MARKER_PREFIX",
    ] {
        std::env::remove_var(key);
    }
}

fn options(key: &str) -> MigrationOptions {
    MigrationOptions {
        key: Some(key.to_string()),
        ..Default::default()
    }
}

/// CLI beats env, env beats project file, project file beats defaults.
#[test]
fn test_layered_resolution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_nestify_env_vars();

    let dir = tempdir();
    std::fs::write(
        dir.path().join("nestify.toml"),
        r#"
[paths]
routes_dir = "server/routes"
modules_dir = "server/modules"

[routes]
api_prefix = "v1"
"#,
    )
    .unwrap();

    std::env::set_var("NESTIFY_MODULES_DIR", "app/modules");

    let cli = CliOverrides {
        api_prefix: Some("v2".to_string()),
        ..Default::default()
    };
    let config = NestifyConfig::load(dir.path(), Some(&cli)).unwrap();

    assert_eq!(config.paths.effective_routes_dir(), "server/routes");
    assert_eq!(config.paths.effective_modules_dir(), "app/modules");
    assert_eq!(config.routes.effective_api_prefix(), "v2");

    clear_nestify_env_vars();
}

#[test]
fn test_load_without_project_file_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_nestify_env_vars();

    let dir = tempdir();
    let config = NestifyConfig::load(dir.path(), None).unwrap();

    assert_eq!(config.paths.effective_routes_dir(), "src/routes");
    assert_eq!(config.paths.effective_modules_dir(), "src/modules");
    assert_eq!(config.paths.effective_server_file(), "src/server.ts");
    assert_eq!(config.routes.effective_app_identifier(), "app");
    assert_eq!(config.routes.effective_api_prefix(), "api");
    assert!(config
        .routes
        .effective_wrapper_functions()
        .contains(&"wrap".to_string()));
    assert_eq!(
        config.markers.marker("Check req/res"),
        "TODO(NestJS Migration): Check req/res"
    );
}

/// Layering is traced at debug level without changing the outcome.
#[test]
fn test_env_overrides_load_under_debug_subscriber() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_nestify_env_vars();

    std::env::set_var("NESTIFY_WRAPPER_FUNCTIONS", "asyncHandler, ,catchErrors");
    let dir = tempdir();
    std::fs::write(dir.path().join("nestify.toml"), "[routes]\napi_prefix = \"v1\"\n").unwrap();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .finish();
    let config = tracing::subscriber::with_default(subscriber, || {
        NestifyConfig::load(dir.path(), None).unwrap()
    });

    assert_eq!(
        config.routes.effective_wrapper_functions(),
        vec!["asyncHandler".to_string(), "catchErrors".to_string()]
    );
    assert_eq!(config.routes.effective_api_prefix(), "v1");

    clear_nestify_env_vars();
}

#[test]
fn test_invalid_toml_is_a_parse_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_nestify_env_vars();

    let dir = tempdir();
    std::fs::write(dir.path().join("nestify.toml"), "[paths\nroutes_dir = ").unwrap();

    let err = NestifyConfig::load(dir.path(), None).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
    assert_eq!(err.error_code(), "CONFIG_ERROR");
}

#[test]
fn test_validation_rejects_bad_identifiers() {
    let config = NestifyConfig::from_toml(
        r#"
[routes]
app_identifier = "my-app"
"#,
    )
    .unwrap();
    assert!(matches!(
        NestifyConfig::validate(&config),
        Err(ConfigError::InvalidValue { .. })
    ));

    let config = NestifyConfig::from_toml(
        r#"
[markers]
prefix = "  "
"#,
    )
    .unwrap();
    assert!(matches!(
        NestifyConfig::validate(&config),
        Err(ConfigError::ValidationFailed { .. })
    ));
}

#[test]
fn test_toml_round_trip_keeps_overrides() {
    let config = NestifyConfig::from_toml(
        r#"
[routes]
wrapper_functions = ["safe"]
"#,
    )
    .unwrap();
    let serialized = config.to_toml().unwrap();
    let reloaded = NestifyConfig::from_toml(&serialized).unwrap();
    assert_eq!(reloaded.routes.effective_wrapper_functions(), vec!["safe"]);
}

#[test]
fn test_module_config_derivation() {
    let root = Path::new("/project");
    let module = ModuleConfig::resolve(root, &options("users"), &NestifyConfig::default()).unwrap();

    assert_eq!(module.module_key, "users");
    assert_eq!(module.module_dir, root.join("src/modules/users"));
    assert_eq!(module.route_path, root.join("src/routes/users.ts"));
    assert_eq!(module.service.file_name, "users.service.ts");
    assert_eq!(module.service.class_name, "UsersService");
    assert_eq!(module.service.var_name, "usersService");
    assert_eq!(module.controller.file_name, "users.controller.ts");
    assert_eq!(module.controller.class_name, "UsersController");
    assert_eq!(
        module.controller.file_path,
        root.join("src/modules/users/users.controller.ts")
    );
    assert_eq!(module.mount_path(), "users");
    assert!(module.selects("anything"));
}

#[test]
fn test_module_config_admin_flavour() {
    let opts = MigrationOptions {
        key: Some("users".to_string()),
        module_key: Some("accounts".to_string()),
        route_path: Some("admin/users.ts".to_string()),
        functions: vec!["list".to_string()],
        admin: true,
    };
    let root = Path::new("/project");
    let module = ModuleConfig::resolve(root, &opts, &NestifyConfig::default()).unwrap();

    assert_eq!(module.module_dir, root.join("src/modules/accounts"));
    assert_eq!(module.route_path, root.join("src/routes/admin/users.ts"));
    assert_eq!(module.service.file_name, "users.admin.service.ts");
    assert_eq!(module.service.class_name, "UsersAdminService");
    assert_eq!(module.service.var_name, "usersAdminService");
    assert_eq!(module.controller.class_name, "UsersAdminController");
    assert_eq!(module.mount_path(), "admin/users");
    assert!(module.selects("list"));
    assert!(!module.selects("show"));
}

#[test]
fn test_missing_key_is_fatal() {
    let root = Path::new("/project");
    let err = ModuleConfig::resolve(root, &MigrationOptions::default(), &NestifyConfig::default())
        .unwrap_err();
    assert!(matches!(err, ConfigError::MissingKey));
    assert_eq!(err.error_code(), "MISSING_KEY");

    let err = ModuleConfig::resolve(root, &options("   "), &NestifyConfig::default()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingKey));
}
