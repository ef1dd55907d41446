//! Resolution of a handler's HTTP binding for the generated controller.

use nestify_core::config::ModuleConfig;
use regex::Regex;
use serde::Serialize;

use super::{HttpMethod, RouteEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingSource {
    RouteTable,
    /// A route-table entry whose path lies outside the controller mount; the
    /// full path is kept.
    OutsideMount,
    NamingConvention,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteBinding {
    pub method: HttpMethod,
    /// Sub-path relative to the controller mount (`''`, `':id'`, ...).
    pub path: String,
    pub source: BindingSource,
}

impl RouteBinding {
    /// Decorator arguments: empty for the mount root, else the quoted path.
    pub fn decorator_arguments(&self) -> Vec<String> {
        if self.path.is_empty() {
            Vec::new()
        } else {
            vec![format!("'{}'", self.path)]
        }
    }
}

/// Conventional binding inferred from a handler name.
pub fn convention_binding(handler_name: &str) -> (HttpMethod, &'static str) {
    const TABLE: &[(&str, HttpMethod, &str)] = &[
        ("get", HttpMethod::Get, ":id"),
        ("show", HttpMethod::Get, ":id"),
        ("index", HttpMethod::Get, ""),
        ("list", HttpMethod::Get, ""),
        ("create", HttpMethod::Post, ""),
        ("update", HttpMethod::Put, ":id"),
        ("delete", HttpMethod::Delete, ":id"),
        ("remove", HttpMethod::Delete, ":id"),
    ];
    TABLE
        .iter()
        .find(|(prefix, _, _)| handler_name.starts_with(prefix))
        .map(|(_, method, path)| (*method, *path))
        .unwrap_or((HttpMethod::Get, ""))
}

/// Remove the `/{api_prefix}/{mount}` prefix of a full route path. `None` when
/// the path does not start with that prefix.
pub fn strip_mount_prefix(path: &str, api_prefix: &str, mount: &str) -> Option<String> {
    let prefix = if api_prefix.is_empty() {
        format!("/{}", mount.trim_matches('/'))
    } else {
        format!("/{}/{}", api_prefix.trim_matches('/'), mount.trim_matches('/'))
    };
    let pattern = format!("^{}(/|$)", regex::escape(&prefix));
    let re = Regex::new(&pattern).ok()?;
    if !re.is_match(path) {
        return None;
    }
    Some(re.replace(path, "").trim_matches('/').to_string())
}

/// Binding of `handler_name`: the route-table entry whose handler reference is
/// `{key}.{handler_name}`, else the naming convention.
pub fn resolve_binding(
    handler_name: &str,
    routes: &[RouteEntry],
    module: &ModuleConfig,
    api_prefix: &str,
) -> RouteBinding {
    let handler_ref = format!("{}.{handler_name}", module.key);
    if let Some(route) = routes.iter().find(|r| r.handler_ref == handler_ref) {
        let mount = module.mount_path();
        return match strip_mount_prefix(&route.path, api_prefix, &mount) {
            Some(path) => RouteBinding {
                method: route.http_method,
                path,
                source: BindingSource::RouteTable,
            },
            None => {
                tracing::warn!(handler = handler_name, path = %route.path, %mount, "route outside controller mount");
                RouteBinding {
                    method: route.http_method,
                    path: route.path.clone(),
                    source: BindingSource::OutsideMount,
                }
            }
        };
    }
    let (method, path) = convention_binding(handler_name);
    tracing::debug!(handler = handler_name, %method, path, "no route entry, using naming convention");
    RouteBinding {
        method,
        path: path.to_string(),
        source: BindingSource::NamingConvention,
    }
}
