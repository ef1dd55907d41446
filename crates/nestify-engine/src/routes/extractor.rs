//! Static discovery of the Express route table.
//!
//! Recognised shapes, on the configured application identifier:
//!
//! ```text
//! app.use('/api/users', auth, usersRouter)      // group, router variable
//! app.use('/api/users', auth, express.Router()
//!   .get('/', wrap(users.list))
//!   .post('/', validate, users.create))         // group, inline chain
//! app.get('/health', health.check)              // direct route
//! ```
//!
//! Everything else is skipped.

use nestify_core::config::RoutesConfig;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tree_sitter::Node;

use crate::syntax::error_tolerant::is_in_error;
use crate::syntax::nodes::{
    call_arguments, descendants_of_kind, method_call_parts, node_text, string_literal_value,
};
use crate::syntax::SourceFile;

use super::{HttpMethod, RouteEntry};

#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    pub app_identifier: String,
    pub wrapper_functions: Vec<String>,
}

impl ExtractorSettings {
    pub fn from_config(config: &RoutesConfig) -> Self {
        Self {
            app_identifier: config.effective_app_identifier().to_string(),
            wrapper_functions: config.effective_wrapper_functions(),
        }
    }
}

/// A route call found inside a group, before prefixing.
struct RouteCall {
    method: HttpMethod,
    path: String,
    handler_ref: String,
    middlewares: Vec<String>,
    position: usize,
    line: u32,
}

/// Extract every route bound on the application object, in source order.
pub fn extract_routes(file: &SourceFile, settings: &ExtractorSettings) -> Vec<RouteEntry> {
    let source = file.text();
    let mut routes: Vec<(usize, RouteEntry)> = Vec::new();

    for call in descendants_of_kind(file.root(), "call_expression") {
        if is_in_error(&call) {
            continue;
        }
        let Some((receiver, method)) = method_call_parts(call, source) else {
            continue;
        };
        if receiver.kind() != "identifier" || node_text(receiver, source) != settings.app_identifier {
            continue;
        }

        if method == "use" {
            let args = call_arguments(call);
            let Some(prefix) = args.first().and_then(|a| string_literal_value(*a, source)) else {
                tracing::debug!(line = file.line_of(call), "app.use without a literal path, skipped");
                continue;
            };
            if args.len() < 2 {
                continue;
            }
            let group_middlewares: Vec<String> = args[1..args.len() - 1]
                .iter()
                .map(|m| node_text(*m, source).to_string())
                .collect();
            let target = args[args.len() - 1];

            for route in collect_group_routes(file, target, settings) {
                let mut middlewares: SmallVec<[String; 2]> = group_middlewares.iter().cloned().collect();
                middlewares.extend(route.middlewares);
                routes.push((
                    route.position,
                    RouteEntry {
                        http_method: route.method,
                        path: format!("{prefix}{}", route.path),
                        handler_ref: route.handler_ref,
                        middlewares,
                        line: route.line,
                    },
                ));
            }
        } else if let Some(route) = parse_route_call(file, call, settings) {
            routes.push((
                route.position,
                RouteEntry {
                    http_method: route.method,
                    path: route.path,
                    handler_ref: route.handler_ref,
                    middlewares: route.middlewares.into_iter().collect(),
                    line: route.line,
                },
            ));
        }
    }

    routes.sort_by_key(|(position, _)| *position);
    tracing::debug!(count = routes.len(), "extracted routes");
    routes.into_iter().map(|(_, entry)| entry).collect()
}

/// Route calls reachable from the last argument of a group.
fn collect_group_routes(file: &SourceFile, target: Node<'_>, settings: &ExtractorSettings) -> Vec<RouteCall> {
    let source = file.text();
    let mut candidates: Vec<Node<'_>> = descendants_of_kind(target, "call_expression");

    if target.kind() == "identifier" {
        let name = node_text(target, source);
        for call in descendants_of_kind(file.root(), "call_expression") {
            if chain_root(call).is_some_and(|root| node_text(root, source) == name) {
                candidates.push(call);
            }
        }
        for declarator in descendants_of_kind(file.root(), "variable_declarator") {
            let is_router = declarator
                .child_by_field_name("name")
                .is_some_and(|n| node_text(n, source) == name);
            if let (true, Some(value)) = (is_router, declarator.child_by_field_name("value")) {
                candidates.extend(descendants_of_kind(value, "call_expression"));
            }
        }
    }

    let mut seen: FxHashSet<usize> = FxHashSet::default();
    let mut calls: Vec<RouteCall> = candidates
        .into_iter()
        .filter(|c| seen.insert(c.id()))
        .filter_map(|c| parse_route_call(file, c, settings))
        .collect();
    calls.sort_by_key(|c| c.position);
    calls
}

/// `<recv>.get|post|put|delete('<literal>', ...middlewares, handler)`.
fn parse_route_call(file: &SourceFile, call: Node<'_>, settings: &ExtractorSettings) -> Option<RouteCall> {
    let source = file.text();
    let function = call.child_by_field_name("function")?;
    let (_, method_name) = method_call_parts(call, source)?;
    let method = HttpMethod::from_router_method(method_name)?;
    let args = call_arguments(call);
    if args.len() < 2 {
        return None;
    }
    let path = string_literal_value(args[0], source)?;
    let handler = args[args.len() - 1];
    let middlewares = args[1..args.len() - 1]
        .iter()
        .map(|m| node_text(*m, source).to_string())
        .collect();
    let property = function.child_by_field_name("property")?;

    Some(RouteCall {
        method,
        path,
        handler_ref: unwrap_handler(handler, source, &settings.wrapper_functions),
        middlewares,
        position: property.start_byte(),
        line: file.line_of(property),
    })
}

/// Strip error-boundary wrappers: `wrap(wrap(users.list))` -> `users.list`.
fn unwrap_handler(node: Node<'_>, source: &str, wrappers: &[String]) -> String {
    if node.kind() == "call_expression" {
        if let Some(function) = node.child_by_field_name("function") {
            let callee = node_text(function, source);
            if function.kind() == "identifier" && wrappers.iter().any(|w| w == callee) {
                if let Some(inner) = call_arguments(node).first() {
                    return unwrap_handler(*inner, source, wrappers);
                }
            }
        }
    }
    node_text(node, source).trim().to_string()
}

/// Root identifier of a call/member chain: `router.get(..).post(..)` -> `router`.
fn chain_root(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node;
    loop {
        current = match current.kind() {
            "call_expression" => current.child_by_field_name("function")?,
            "member_expression" => current.child_by_field_name("object")?,
            "identifier" => return Some(current),
            _ => return None,
        };
    }
}
