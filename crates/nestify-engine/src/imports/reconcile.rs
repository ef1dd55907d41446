//! Merge import requirements into a source file.

use nestify_core::errors::SyntaxError;

use crate::syntax::text::line_indent;
use crate::syntax::{SourceFile, TextEdit};

use super::existing::{existing_imports, ExistingImport};
use super::{dedupe_requirements, rewrite_internal_module_path, ImportKind, ImportRequirement};

/// What a reconciliation pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportMergeOutcome {
    pub declarations_added: usize,
    pub symbols_added: usize,
}

impl ImportMergeOutcome {
    pub fn changed(&self) -> bool {
        self.declarations_added > 0 || self.symbols_added > 0
    }
}

/// Merge `requirements` into the file's import list.
///
/// Each requirement is matched against an existing declaration on the same
/// module path with a compatible clause. A named match only gains its missing
/// symbols; a namespace/default match with a different binding gets a new
/// declaration alongside; no match appends a declaration after the last
/// import. Requirements are applied one at a time and the file is re-parsed
/// in between, so later requirements see earlier merges.
pub fn reconcile_imports(
    file: &mut SourceFile,
    requirements: Vec<ImportRequirement>,
) -> Result<ImportMergeOutcome, SyntaxError> {
    let mut outcome = ImportMergeOutcome::default();

    for req in dedupe_requirements(requirements) {
        if let ImportKind::Named(ref names) = req.kind {
            if names.is_empty() {
                continue;
            }
        }

        let imports = existing_imports(file);
        let matched = find_match(&imports, &req).cloned();

        let edit = match matched {
            Some(existing) => merge_into(file, &existing, &req, &mut outcome),
            None => {
                outcome.declarations_added += 1;
                Some(append_declaration(file, &imports, &req))
            }
        };

        if let Some(edit) = edit {
            tracing::debug!(
                path = %file.display_path(),
                module = %req.module_path,
                "merging import"
            );
            file.apply_edits(vec![edit])?;
        }
    }

    Ok(outcome)
}

fn find_match<'a>(imports: &'a [ExistingImport], req: &ImportRequirement) -> Option<&'a ExistingImport> {
    let same_path = |path: &str| {
        imports
            .iter()
            .find(|i| i.module_path == path && i.matches_kind(&req.kind))
    };
    same_path(&req.module_path).or_else(|| {
        rewrite_internal_module_path(&req.module_path).and_then(|rewritten| same_path(&rewritten))
    })
}

fn merge_into(
    file: &SourceFile,
    existing: &ExistingImport,
    req: &ImportRequirement,
    outcome: &mut ImportMergeOutcome,
) -> Option<TextEdit> {
    match &req.kind {
        ImportKind::Named(names) => {
            let missing: Vec<&String> = names.iter().filter(|n| !existing.named.contains(n)).collect();
            if missing.is_empty() {
                return None;
            }
            outcome.symbols_added += missing.len();
            let missing: Vec<&str> = missing.iter().map(|s| s.as_str()).collect();

            match existing.last_specifier_end {
                Some(anchor) => {
                    let (clause_start, clause_end) = existing.named_clause?;
                    let clause = &file.text()[clause_start..clause_end];
                    let separator = if clause.contains('\n') {
                        format!(",\n{}", line_indent(file.text(), anchor))
                    } else {
                        ", ".to_string()
                    };
                    let insertion = missing
                        .iter()
                        .map(|name| format!("{separator}{name}"))
                        .collect::<String>();
                    Some(TextEdit::insert(anchor, insertion))
                }
                None => {
                    // `import {} from '...'`
                    let (clause_start, clause_end) = existing.named_clause?;
                    Some(TextEdit::replace(
                        clause_start,
                        clause_end,
                        format!("{{ {} }}", missing.join(", ")),
                    ))
                }
            }
        }
        ImportKind::Default(binding) => {
            if existing.default_binding.as_deref() == Some(binding.as_str()) {
                None
            } else {
                outcome.declarations_added += 1;
                Some(insert_after(existing.end_byte, req))
            }
        }
        ImportKind::Namespace(binding) => {
            if existing.namespace_binding.as_deref() == Some(binding.as_str()) {
                None
            } else {
                outcome.declarations_added += 1;
                Some(insert_after(existing.end_byte, req))
            }
        }
    }
}

fn insert_after(offset: usize, req: &ImportRequirement) -> TextEdit {
    TextEdit::insert(offset, format!("\n{}", req.render()))
}

fn append_declaration(file: &SourceFile, imports: &[ExistingImport], req: &ImportRequirement) -> TextEdit {
    match imports.last() {
        Some(last) => insert_after(last.end_byte, req),
        None => {
            let separator = if file.text().trim().is_empty() {
                "\n"
            } else {
                "\n\n"
            };
            TextEdit::insert(0, format!("{}{}", req.render(), separator))
        }
    }
}
