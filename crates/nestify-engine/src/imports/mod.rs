//! Import reconciliation.
//!
//! Desired imports are expressed as `ImportRequirement`s, normalized by
//! `dedupe_requirements`, and merged into a file's existing import list by
//! `reconcile_imports`. Merging is idempotent and order-insensitive: the
//! resulting set of declarations does not depend on the order requirements
//! arrive in.

pub mod existing;
pub mod paths;
pub mod reconcile;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

pub use existing::{existing_imports, ExistingImport};
pub use paths::{rebase_relative_specifier, rewrite_internal_module_path};
pub use reconcile::{reconcile_imports, ImportMergeOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImportKind {
    Named(Vec<String>),
    Default(String),
    Namespace(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportRequirement {
    pub module_path: String,
    pub kind: ImportKind,
}

impl ImportRequirement {
    pub fn named<I, S>(module_path: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            module_path: module_path.into(),
            kind: ImportKind::Named(names.into_iter().map(Into::into).collect()),
        }
    }

    pub fn default_import(module_path: impl Into<String>, binding: impl Into<String>) -> Self {
        Self {
            module_path: module_path.into(),
            kind: ImportKind::Default(binding.into()),
        }
    }

    pub fn namespace(module_path: impl Into<String>, binding: impl Into<String>) -> Self {
        Self {
            module_path: module_path.into(),
            kind: ImportKind::Namespace(binding.into()),
        }
    }

    /// Render as a standalone import declaration.
    pub fn render(&self) -> String {
        match &self.kind {
            ImportKind::Named(names) => {
                format!("import {{ {} }} from '{}';", names.join(", "), self.module_path)
            }
            ImportKind::Default(binding) => {
                format!("import {} from '{}';", binding, self.module_path)
            }
            ImportKind::Namespace(binding) => {
                format!("import * as {} from '{}';", binding, self.module_path)
            }
        }
    }
}

/// Collapse requirements so each module path contributes one named
/// requirement (symbols unioned in first-seen order) and each distinct
/// default/namespace binding appears once.
pub fn dedupe_requirements(requirements: Vec<ImportRequirement>) -> Vec<ImportRequirement> {
    let mut out: Vec<ImportRequirement> = Vec::new();
    let mut seen_bindings: FxHashSet<(String, ImportKind)> = FxHashSet::default();

    for req in requirements {
        match req.kind {
            ImportKind::Named(names) => {
                let existing = out.iter_mut().find(|r| {
                    r.module_path == req.module_path && matches!(r.kind, ImportKind::Named(_))
                });
                match existing {
                    Some(ImportRequirement {
                        kind: ImportKind::Named(current),
                        ..
                    }) => {
                        for name in names {
                            if !current.contains(&name) {
                                current.push(name);
                            }
                        }
                    }
                    _ => {
                        let mut unique: Vec<String> = Vec::with_capacity(names.len());
                        for name in names {
                            if !unique.contains(&name) {
                                unique.push(name);
                            }
                        }
                        out.push(ImportRequirement {
                            module_path: req.module_path,
                            kind: ImportKind::Named(unique),
                        });
                    }
                }
            }
            kind => {
                if seen_bindings.insert((req.module_path.clone(), kind.clone())) {
                    out.push(ImportRequirement {
                        module_path: req.module_path,
                        kind,
                    });
                }
            }
        }
    }
    out
}
