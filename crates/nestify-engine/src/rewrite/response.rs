//! Response rewriter.
//!
//! Error pass: `res.status(404).json(p)` -> `throw new NotFoundException(p)`,
//! with the matching swagger decorator added to the Controller method.
//! Success pass: `res.status(200).json(p)` -> `return p`, `res.json(null)` ->
//! `return`.

use nestify_core::config::ModuleConfig;
use nestify_core::constants::{NEST_COMMON, NEST_SWAGGER, RESPONSE_IDENT};
use nestify_core::errors::{Diagnostic, DiagnosticKind, SyntaxError};
use tree_sitter::Node;

use crate::components::component::method_bodies;
use crate::components::find_class;
use crate::imports::{reconcile_imports, ImportRequirement};
use crate::syntax::nodes::{decorator_name, descendants_of_kind, member_decorators, node_text};
use crate::syntax::text::{line_indent, line_start};
use crate::syntax::{SourceFile, TextEdit};

use super::chain::{match_response_chain, ChainMatch, Payload, StatusResponseChain, TsNode};
use super::status::ErrorKind;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseRewriteOutcome {
    pub errors_rewritten: usize,
    pub successes_rewritten: usize,
    pub controller_decorators_added: usize,
}

impl ResponseRewriteOutcome {
    pub fn rewrites(&self) -> usize {
        self.errors_rewritten + self.successes_rewritten
    }
}

/// A matched chain at statement level.
struct ChainSite {
    method: String,
    start: usize,
    end: usize,
    semicolon: bool,
    chain: StatusResponseChain,
}

impl ChainSite {
    fn replace_with(&self, statement: String) -> TextEdit {
        let text = if self.semicolon { format!("{statement};") } else { statement };
        TextEdit::replace(self.start, self.end, text)
    }
}

/// Rewrite error responses into thrown exceptions.
pub fn rewrite_error_responses(
    service_file: &mut SourceFile,
    controller_file: Option<&mut SourceFile>,
    module: &ModuleConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<ResponseRewriteOutcome, SyntaxError> {
    let mut outcome = ResponseRewriteOutcome::default();
    let sites = collect_sites(service_file, module, diagnostics, |chain| !chain.is_success());

    let mut edits = Vec::new();
    let mut exceptions: Vec<&'static str> = Vec::new();
    let mut per_method: Vec<(String, Vec<ErrorKind>)> = Vec::new();

    for site in &sites {
        let Some(status) = site.chain.status_code.as_deref() else {
            continue;
        };
        let Payload::Expr(payload) = &site.chain.payload else {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::PatternMismatch,
                service_file.display_path(),
                line_of_offset(service_file.text(), site.start),
                format!("status {status} response without payload left unchanged"),
            ));
            continue;
        };
        let kind = ErrorKind::for_status(status);
        edits.push(site.replace_with(kind.throw_statement(payload)));
        if !exceptions.contains(&kind.exception) {
            exceptions.push(kind.exception);
        }
        match per_method.iter_mut().find(|(name, _)| *name == site.method) {
            Some((_, kinds)) if kinds.contains(&kind) => {}
            Some((_, kinds)) => kinds.push(kind),
            None => per_method.push((site.method.clone(), vec![kind])),
        }
        outcome.errors_rewritten += 1;
    }

    service_file.apply_edits(edits)?;
    if !exceptions.is_empty() {
        exceptions.sort_unstable();
        reconcile_imports(service_file, vec![ImportRequirement::named(NEST_COMMON, exceptions)])?;
    }

    if !per_method.is_empty() {
        match controller_file {
            Some(controller_file) => {
                outcome.controller_decorators_added =
                    decorate_controller(controller_file, module, &per_method, diagnostics)?;
            }
            None => diagnostics.push(Diagnostic::new(
                DiagnosticKind::MissingCounterpart,
                module.controller.file_path.display().to_string(),
                1,
                "controller file not found; response decorators not added",
            )),
        }
    }

    tracing::info!(count = outcome.errors_rewritten, "error responses rewritten");
    Ok(outcome)
}

/// Rewrite success responses into returns.
pub fn rewrite_success_responses(
    service_file: &mut SourceFile,
    module: &ModuleConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<ResponseRewriteOutcome, SyntaxError> {
    let sites = collect_sites(service_file, module, diagnostics, StatusResponseChain::is_success);
    let edits: Vec<TextEdit> = sites
        .iter()
        .map(|site| match &site.chain.payload {
            Payload::Expr(payload) => site.replace_with(format!("return {payload}")),
            Payload::Null => site.replace_with("return".to_string()),
        })
        .collect();

    let outcome = ResponseRewriteOutcome {
        successes_rewritten: edits.len(),
        ..Default::default()
    };
    service_file.apply_edits(edits)?;
    tracing::info!(count = outcome.successes_rewritten, "success responses rewritten");
    Ok(outcome)
}

/// Statement-level chains in selected Service methods that satisfy `wanted`.
/// Wanted chains that are not statement-level produce a diagnostic.
fn collect_sites(
    file: &SourceFile,
    module: &ModuleConfig,
    diagnostics: &mut Vec<Diagnostic>,
    wanted: impl Fn(&StatusResponseChain) -> bool,
) -> Vec<ChainSite> {
    let source = file.text();
    let Some(class) = find_class(file, &module.service.class_name) else {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::MissingCounterpart,
            file.display_path(),
            1,
            format!("class {} not found", module.service.class_name),
        ));
        return Vec::new();
    };

    let mut sites: Vec<ChainSite> = Vec::new();
    for (name, method) in method_bodies(file, class) {
        if !module.selects(name) {
            continue;
        }
        let Some(body) = method.child_by_field_name("body") else {
            continue;
        };
        for call in descendants_of_kind(body, "call_expression") {
            if sites.iter().any(|s| s.start <= call.start_byte() && call.end_byte() <= s.end) {
                continue;
            }
            let ChainMatch::Matched(chain) = match_response_chain(TsNode::new(call, source), RESPONSE_IDENT)
            else {
                continue;
            };
            if !wanted(&chain) {
                continue;
            }
            let Some(statement) = enclosing_statement(call) else {
                tracing::warn!(method = name, line = file.line_of(call), "response call is not a statement");
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::PatternMismatch,
                    file.display_path(),
                    file.line_of(call),
                    format!("`{}` is not statement-level; left unchanged", node_text(call, source)),
                ));
                continue;
            };
            sites.push(ChainSite {
                method: name.to_string(),
                start: statement.start_byte(),
                end: statement.end_byte(),
                semicolon: node_text(statement, source).ends_with(';'),
                chain,
            });
        }
    }
    sites
}

/// `res.json(x);` or `return res.json(x);` around `call`.
fn enclosing_statement(call: Node<'_>) -> Option<Node<'_>> {
    let parent = call.parent()?;
    match parent.kind() {
        "expression_statement" | "return_statement" => Some(parent),
        _ => None,
    }
}

fn line_of_offset(text: &str, offset: usize) -> u32 {
    text[..offset].matches('\n').count() as u32 + 1
}

/// Add swagger response decorators to Controller methods. Returns the number
/// of decorators added.
fn decorate_controller(
    controller_file: &mut SourceFile,
    module: &ModuleConfig,
    per_method: &[(String, Vec<ErrorKind>)],
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<usize, SyntaxError> {
    let mut edits = Vec::new();
    let mut imports: Vec<&'static str> = Vec::new();

    {
        let file: &SourceFile = controller_file;
        let source = file.text();
        let methods = find_class(file, &module.controller.class_name)
            .map(|class| method_bodies(file, class))
            .unwrap_or_default();

        for (name, kinds) in per_method {
            let Some((_, method)) = methods.iter().find(|(n, _)| *n == name.as_str()) else {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::MissingCounterpart,
                    file.display_path(),
                    1,
                    format!("controller method `{name}` not found; response decorators not added"),
                ));
                continue;
            };

            let present: Vec<String> = member_decorators(*method)
                .into_iter()
                .map(|d| compact(node_text(d, source)))
                .collect();
            let anchor = signature_start(*method);
            let offset = line_start(source, anchor);
            let indent = line_indent(source, anchor);

            let mut block = String::new();
            for kind in kinds {
                let rendered = kind.decorator().render();
                let duplicate = present.iter().any(|p| {
                    if kind.is_generic() {
                        *p == compact(&rendered)
                    } else {
                        p.trim_start_matches('@').split('(').next() == Some(kind.decorator_name())
                    }
                });
                if duplicate {
                    continue;
                }
                block.push_str(indent);
                block.push_str(&rendered);
                block.push('\n');
                if !imports.contains(&kind.decorator_name()) {
                    imports.push(kind.decorator_name());
                }
            }
            if !block.is_empty() {
                edits.push(TextEdit::insert(offset, block));
            }
        }
    }

    let added: usize = edits
        .iter()
        .map(|e: &TextEdit| e.replacement.lines().count())
        .sum();
    controller_file.apply_edits(edits)?;
    if !imports.is_empty() {
        imports.sort_unstable();
        reconcile_imports(controller_file, vec![ImportRequirement::named(NEST_SWAGGER, imports)])?;
    }
    Ok(added)
}

/// First token of the method after its decorators.
fn signature_start(method: Node<'_>) -> usize {
    let mut cursor = method.walk();
    let first = method
        .children(&mut cursor)
        .find(|c| !matches!(c.kind(), "decorator" | "comment"));
    first.map_or(method.start_byte(), |n| n.start_byte())
}

fn compact(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}
