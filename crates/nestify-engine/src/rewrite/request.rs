//! Request rewriter.
//!
//! Turns `req.<group>.<field>` accesses inside Service methods into explicit
//! parameters, then mirrors the new signature onto the Controller method and
//! its delegating call:
//!
//! ```text
//! async show(req, res) { User.findById(req.params.id) }
//!   => async show(id: string) { User.findById(id) }
//! async show(@Req() req: any, @Res() res: any) { return await this.s.show(req, res); }
//!   => async show(@Param('id') id: string) { return await this.s.show(id); }
//! ```

use std::collections::BTreeMap;

use nestify_core::config::{MarkersConfig, ModuleConfig};
use nestify_core::constants::{NEST_COMMON, REQUEST_IDENT, RESPONSE_IDENT};
use nestify_core::errors::{Diagnostic, DiagnosticKind, SyntaxError};
use tree_sitter::Node;

use crate::components::find_class;
use crate::components::component::method_bodies;
use crate::imports::{reconcile_imports, ImportRequirement};
use crate::syntax::nodes::{
    call_arguments, descendants, descendants_of_kind, function_parameters, is_identifier, named_children,
    node_text, parameter_name, string_literal_value,
};
use crate::syntax::printer::{render_params, DecoratorSpec, ParamSpec};
use crate::syntax::text::{is_js_identifier, line_indent, line_start};
use crate::syntax::{SourceFile, TextEdit};

use super::classify::{AccessClassifier, AccessPath, FieldGroup};
use super::types::TypeOracle;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestRewriteOutcome {
    pub methods_rewritten: Vec<String>,
    pub accesses_rewritten: usize,
    pub controller_methods_synced: usize,
}

/// Observed fields per group, in first-seen order. The empty key stands for
/// an access to the whole group object.
#[derive(Debug, Clone, Default)]
struct FieldAccesses {
    groups: BTreeMap<FieldGroup, Vec<(String, String)>>,
}

impl FieldAccesses {
    fn record(&mut self, group: FieldGroup, field: &str, ty: &str) {
        let fields = self.groups.entry(group).or_default();
        match fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, existing)) if existing == "any" && ty != "any" => *existing = ty.to_string(),
            Some(_) => {}
            None => fields.push((field.to_string(), ty.to_string())),
        }
    }

    fn get(&self, group: FieldGroup) -> Option<&[(String, String)]> {
        self.groups.get(&group).map(Vec::as_slice)
    }
}

/// New signature of a migrated method pair.
#[derive(Debug, Clone, Default)]
struct SignaturePlan {
    service_params: Vec<ParamSpec>,
    controller_params: Vec<ParamSpec>,
    call_args: Vec<String>,
    decorators: Vec<&'static str>,
}

impl SignaturePlan {
    fn push(&mut self, service: ParamSpec, controller: ParamSpec, arg: String, decorator: &'static str) {
        self.service_params.push(service);
        self.controller_params.push(controller);
        self.call_args.push(arg);
        if !self.decorators.contains(&decorator) {
            self.decorators.push(decorator);
        }
    }
}

struct MethodPlan {
    name: String,
    signature: SignaturePlan,
}

/// Rewrite request accesses in the Service and mirror the signatures onto
/// the Controller.
#[allow(clippy::too_many_arguments)]
pub fn rewrite_requests(
    service_file: &mut SourceFile,
    controller_file: Option<&mut SourceFile>,
    module: &ModuleConfig,
    markers: &MarkersConfig,
    classifier: &dyn AccessClassifier,
    oracle: &dyn TypeOracle,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<RequestRewriteOutcome, SyntaxError> {
    let mut outcome = RequestRewriteOutcome::default();
    let mut edits: Vec<TextEdit> = Vec::new();
    let mut plans: Vec<MethodPlan> = Vec::new();

    {
        let file: &SourceFile = service_file;
        let Some(class) = find_class(file, &module.service.class_name) else {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::MissingCounterpart,
                file.display_path(),
                1,
                format!("class {} not found", module.service.class_name),
            ));
            return Ok(outcome);
        };

        for (name, method) in method_bodies(file, class) {
            if !module.selects(name) {
                continue;
            }
            let params = function_parameters(method);
            let names: Vec<&str> = params
                .iter()
                .filter_map(|p| parameter_name(*p, file.text()))
                .collect();
            if names.len() < 2 || names[0] != REQUEST_IDENT || names[1] != RESPONSE_IDENT {
                tracing::debug!(method = name, "already migrated, skipped");
                continue;
            }

            let mut accesses = FieldAccesses::default();
            let before = edits.len();
            scan_method(file, method, classifier, oracle, &mut accesses, &mut edits, diagnostics);
            outcome.accesses_rewritten += edits.len() - before;

            let signature = plan_signature(&accesses);
            if let Some(formal) = method.child_by_field_name("parameters") {
                edits.push(TextEdit::replace_node(
                    formal,
                    format!("({})", render_params(&signature.service_params)),
                ));
            }
            if let Some(marker) = user_binding_marker(file, method, &accesses, markers) {
                edits.push(marker);
            }

            tracing::info!(method = name, fields = ?accesses.groups, "request accesses rewritten");
            outcome.methods_rewritten.push(name.to_string());
            plans.push(MethodPlan {
                name: name.to_string(),
                signature,
            });
        }
    }
    service_file.apply_edits(edits)?;

    if let Some(controller_file) = controller_file {
        outcome.controller_methods_synced = sync_controller(controller_file, module, &plans, diagnostics)?;
    } else if !plans.is_empty() {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::MissingCounterpart,
            module.controller.file_path.display().to_string(),
            1,
            "controller file not found; controller signatures left unchanged",
        ));
    }

    Ok(outcome)
}

/// Collect request accesses of one method body into `accesses` and `edits`.
fn scan_method(
    file: &SourceFile,
    method: Node<'_>,
    classifier: &dyn AccessClassifier,
    oracle: &dyn TypeOracle,
    accesses: &mut FieldAccesses,
    edits: &mut Vec<TextEdit>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let source = file.text();
    let Some(body) = method.child_by_field_name("body") else {
        return;
    };

    for node in descendants(body) {
        if !matches!(node.kind(), "member_expression" | "subscript_expression") {
            continue;
        }
        let Some(object) = node.child_by_field_name("object") else {
            continue;
        };
        if !is_identifier(object, source, REQUEST_IDENT) {
            continue;
        }

        let segment = access_key(node, source);
        let path = AccessPath {
            text: node_text(outermost_access(node), source),
            segment: segment.as_deref(),
        };
        let Some(group) = classifier.classify(&path) else {
            tracing::error!(access = path.text, line = file.line_of(node), "unexpected request field group");
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnexpectedGroup,
                file.display_path(),
                file.line_of(node),
                format!("unexpected request access `{}`", path.text),
            ));
            continue;
        };

        let field_node = node
            .parent()
            .filter(|p| matches!(p.kind(), "member_expression" | "subscript_expression"))
            .filter(|p| p.child_by_field_name("object").is_some_and(|o| o.id() == node.id()));
        let field = field_node.and_then(|p| access_key(p, source)).unwrap_or_default();

        let typed = matches!(group, FieldGroup::Params | FieldGroup::Query | FieldGroup::Body);
        let ty = match (field_node, field.is_empty() || !typed) {
            (Some(field_node), false) => match oracle.type_of(field_node, source, group, &field) {
                Ok(ty) => ty,
                Err(e) => {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::TypeInference,
                        file.display_path(),
                        file.line_of(field_node),
                        e.to_string(),
                    ));
                    if group == FieldGroup::Params {
                        "string".to_string()
                    } else {
                        "any".to_string()
                    }
                }
            },
            _ => "any".to_string(),
        };

        match (group, field_node) {
            (FieldGroup::Params, Some(field_node)) if is_js_identifier(&field) => {
                accesses.record(group, &field, &ty);
                edits.push(TextEdit::replace_node(field_node, field.clone()));
            }
            (FieldGroup::Params, _) => {
                accesses.record(group, "", "any");
                edits.push(TextEdit::replace_node(node, group.binding_name()));
            }
            (FieldGroup::Query | FieldGroup::Body, _) => {
                accesses.record(group, &field, &ty);
                edits.push(TextEdit::replace_node(node, group.binding_name()));
            }
            (FieldGroup::User | FieldGroup::UserData, _) => {
                accesses.record(group, "", "any");
                edits.push(TextEdit::replace_node(node, group.binding_name()));
            }
        }
    }
}

/// `req.query` -> `query`; `req['query']` -> `query`; `req[key]` -> none.
fn access_key(node: Node<'_>, source: &str) -> Option<String> {
    match node.kind() {
        "member_expression" => node
            .child_by_field_name("property")
            .map(|p| node_text(p, source).to_string()),
        "subscript_expression" => node
            .child_by_field_name("index")
            .and_then(|i| string_literal_value(i, source)),
        _ => None,
    }
}

/// The widest member/subscript chain built on top of `node`.
fn outermost_access(node: Node<'_>) -> Node<'_> {
    let mut current = node;
    while let Some(parent) = current.parent() {
        let extends = matches!(parent.kind(), "member_expression" | "subscript_expression")
            && parent
                .child_by_field_name("object")
                .is_some_and(|o| o.id() == current.id());
        if !extends {
            break;
        }
        current = parent;
    }
    current
}

fn plan_signature(accesses: &FieldAccesses) -> SignaturePlan {
    let mut plan = SignaturePlan::default();

    if let Some(fields) = accesses.get(FieldGroup::Params) {
        let named: Vec<&(String, String)> = fields.iter().filter(|(f, _)| !f.is_empty()).collect();
        let whole = fields.iter().any(|(f, _)| f.is_empty());

        if named.len() > 1 && !whole {
            let names: Vec<&str> = named.iter().map(|(f, _)| f.as_str()).collect();
            let ty = format!(
                "{{ {} }}",
                named
                    .iter()
                    .map(|(f, t)| format!("{f}: {t}"))
                    .collect::<Vec<_>>()
                    .join("; ")
            );
            plan.push(
                ParamSpec::new(format!("{{ {} }}", names.join(", ")), Some(ty.clone())),
                ParamSpec::new("params", Some(ty)).decorated(DecoratorSpec::bare("Param")),
                "params".to_string(),
                "Param",
            );
        } else {
            for (field, ty) in named {
                plan.push(
                    ParamSpec::new(field, Some(ty.clone())),
                    ParamSpec::new(field, Some(ty.clone()))
                        .decorated(DecoratorSpec::new("Param", vec![format!("'{field}'")])),
                    field.clone(),
                    "Param",
                );
            }
            if whole {
                plan.push(
                    ParamSpec::new("params", Some("any".into())),
                    ParamSpec::new("params", Some("any".into())).decorated(DecoratorSpec::bare("Param")),
                    "params".to_string(),
                    "Param",
                );
            }
        }
    }

    for group in [FieldGroup::Body, FieldGroup::Query] {
        let Some(fields) = accesses.get(group) else {
            continue;
        };
        let (Some(decorator), name) = (group.decorator(), group.binding_name()) else {
            continue;
        };
        let ty = object_type(fields);
        plan.push(
            ParamSpec::new(name, Some(ty.clone())),
            ParamSpec::new(name, Some(ty)).decorated(DecoratorSpec::bare(decorator)),
            name.to_string(),
            decorator,
        );
    }

    plan
}

/// `{ email?: any; page?: string; [key: string]: any }`
fn object_type(fields: &[(String, String)]) -> String {
    let mut members: Vec<String> = fields
        .iter()
        .filter(|(f, _)| !f.is_empty())
        .map(|(f, t)| {
            if is_js_identifier(f) {
                format!("{f}?: {t}")
            } else {
                format!("'{f}'?: {t}")
            }
        })
        .collect();
    if members.is_empty() || fields.iter().any(|(f, _)| f.is_empty()) {
        members.push("[key: string]: any".to_string());
    }
    format!("{{ {} }}", members.join("; "))
}

/// A review marker at the top of the body naming the user bindings the
/// rewritten code now expects.
fn user_binding_marker(
    file: &SourceFile,
    method: Node<'_>,
    accesses: &FieldAccesses,
    markers: &MarkersConfig,
) -> Option<TextEdit> {
    let missing: Vec<&str> = [FieldGroup::User, FieldGroup::UserData]
        .into_iter()
        .filter(|g| accesses.get(*g).is_some())
        .map(FieldGroup::binding_name)
        .collect();
    if missing.is_empty() {
        return None;
    }
    let body = method.child_by_field_name("body")?;
    let first = named_children(body).into_iter().next()?;
    let offset = line_start(file.text(), first.start_byte());
    let indent = line_indent(file.text(), first.start_byte());
    Some(TextEdit::insert(
        offset,
        format!("{indent}// {}\n", markers.marker(&format!("Provide {}", missing.join(", ")))),
    ))
}

/// Mirror planned signatures onto the Controller. Returns the number of
/// controller methods updated.
fn sync_controller(
    controller_file: &mut SourceFile,
    module: &ModuleConfig,
    plans: &[MethodPlan],
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<usize, SyntaxError> {
    let mut edits = Vec::new();
    let mut decorators: Vec<&'static str> = Vec::new();
    let mut synced = 0;

    {
        let file: &SourceFile = controller_file;
        let source = file.text();
        let class = find_class(file, &module.controller.class_name);

        for plan in plans {
            let method = class
                .map(|c| method_bodies(file, c))
                .unwrap_or_default()
                .into_iter()
                .find(|(name, _)| *name == plan.name)
                .map(|(_, m)| m);
            let Some(method) = method else {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::MissingCounterpart,
                    file.display_path(),
                    1,
                    format!("controller method `{}` not found", plan.name),
                ));
                continue;
            };

            let expected_callee = format!("this.{}.{}", module.service.var_name, plan.name);
            let call = descendants_of_kind(method, "call_expression").into_iter().find(|call| {
                let callee_matches = call.child_by_field_name("function").is_some_and(|f| {
                    node_text(f, source)
                        .chars()
                        .filter(|c| !c.is_whitespace())
                        .collect::<String>()
                        == expected_callee
                });
                let args = call_arguments(*call);
                callee_matches
                    && args.len() == 2
                    && is_identifier(args[0], source, REQUEST_IDENT)
                    && is_identifier(args[1], source, RESPONSE_IDENT)
            });
            let Some(call) = call else {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::MissingCounterpart,
                    file.display_path(),
                    file.line_of(method),
                    format!("delegating call `{expected_callee}(req, res)` not found"),
                ));
                continue;
            };

            if let (Some(formal), Some(arguments)) = (
                method.child_by_field_name("parameters"),
                call.child_by_field_name("arguments"),
            ) {
                edits.push(TextEdit::replace_node(
                    formal,
                    format!("({})", render_params(&plan.signature.controller_params)),
                ));
                edits.push(TextEdit::replace_node(
                    arguments,
                    format!("({})", plan.signature.call_args.join(", ")),
                ));
                for &d in &plan.signature.decorators {
                    if !decorators.contains(&d) {
                        decorators.push(d);
                    }
                }
                synced += 1;
            }
        }
    }

    controller_file.apply_edits(edits)?;
    if !decorators.is_empty() {
        decorators.sort_unstable();
        reconcile_imports(controller_file, vec![ImportRequirement::named(NEST_COMMON, decorators)])?;
    }
    Ok(synced)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accesses(entries: &[(FieldGroup, &str, &str)]) -> FieldAccesses {
        let mut a = FieldAccesses::default();
        for (g, f, t) in entries {
            a.record(*g, f, t);
        }
        a
    }

    fn render(params: &[ParamSpec]) -> String {
        render_params(params)
    }

    #[test]
    fn single_param_binds_by_name() {
        let plan = plan_signature(&accesses(&[(FieldGroup::Params, "id", "string")]));
        assert_eq!(render(&plan.service_params), "id: string");
        assert_eq!(render(&plan.controller_params), "@Param('id') id: string");
        assert_eq!(plan.call_args, vec!["id"]);
    }

    #[test]
    fn several_params_become_a_struct() {
        let plan = plan_signature(&accesses(&[
            (FieldGroup::Params, "id", "string"),
            (FieldGroup::Params, "postId", "string"),
        ]));
        assert_eq!(
            render(&plan.service_params),
            "{ id, postId }: { id: string; postId: string }"
        );
        assert_eq!(
            render(&plan.controller_params),
            "@Param() params: { id: string; postId: string }"
        );
        assert_eq!(plan.call_args, vec!["params"]);
    }

    #[test]
    fn mixed_params_stay_individual() {
        let plan = plan_signature(&accesses(&[
            (FieldGroup::Params, "id", "string"),
            (FieldGroup::Params, "", "any"),
        ]));
        assert_eq!(render(&plan.service_params), "id: string, params: any");
        assert_eq!(
            render(&plan.controller_params),
            "@Param('id') id: string, @Param() params: any"
        );
    }

    #[test]
    fn body_and_query_order_and_types() {
        let plan = plan_signature(&accesses(&[
            (FieldGroup::Query, "page", "string"),
            (FieldGroup::Body, "email", "any"),
            (FieldGroup::Body, "", "any"),
            (FieldGroup::Params, "id", "string"),
        ]));
        assert_eq!(
            render(&plan.service_params),
            "id: string, body: { email?: any; [key: string]: any }, query: { page?: string }"
        );
        assert_eq!(plan.call_args, vec!["id", "body", "query"]);
        assert_eq!(plan.decorators, vec!["Param", "Body", "Query"]);
    }

    #[test]
    fn recorded_types_upgrade_from_any() {
        let a = accesses(&[(FieldGroup::Query, "page", "any"), (FieldGroup::Query, "page", "number")]);
        assert_eq!(a.get(FieldGroup::Query).unwrap(), &[("page".to_string(), "number".to_string())]);
    }

    #[test]
    fn object_type_quotes_non_identifiers() {
        assert_eq!(
            object_type(&[("x-api-key".into(), "any".into())]),
            "{ 'x-api-key'?: any }"
        );
        assert_eq!(object_type(&[("".into(), "any".into())]), "{ [key: string]: any }");
    }
}
