//! Shared constants for the migration engine.

/// Project config file name, looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "nestify.toml";

/// Environment variable holding per-subsystem log directives.
pub const LOG_ENV_VAR: &str = "NESTIFY_LOG";

/// Default directory holding the Express route handler files.
pub const DEFAULT_ROUTES_DIR: &str = "src/routes";

/// Default directory under which NestJS modules are generated.
pub const DEFAULT_MODULES_DIR: &str = "src/modules";

/// Default Express bootstrap file read by the route extractor.
pub const DEFAULT_SERVER_FILE: &str = "src/server.ts";

/// Default identifier of the top-level application object.
pub const DEFAULT_APP_IDENTIFIER: &str = "app";

/// Default global API prefix stripped from mounted route paths.
pub const DEFAULT_API_PREFIX: &str = "api";

/// Default error-boundary wrapper functions unwrapped around handlers.
pub const DEFAULT_WRAPPER_FUNCTIONS: &[&str] = &["wrap", "asyncHandler", "catchAsync"];

/// Default prefix of every review marker.
pub const DEFAULT_MARKER_PREFIX: &str = "TODO(NestJS Migration)";

/// Conventional identifier of the Express request parameter.
pub const REQUEST_IDENT: &str = "req";

/// Conventional identifier of the Express response parameter.
pub const RESPONSE_IDENT: &str = "res";

/// NestJS core decorators and exceptions.
pub const NEST_COMMON: &str = "@nestjs/common";

/// NestJS OpenAPI decorators.
pub const NEST_SWAGGER: &str = "@nestjs/swagger";
