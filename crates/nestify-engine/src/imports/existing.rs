//! Structural view of a file's existing import declarations.

use tree_sitter::Node;

use crate::syntax::nodes::{named_children, node_text, significant_children, string_literal_value};
use crate::syntax::SourceFile;

use super::{ImportKind, ImportRequirement};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingImport {
    pub module_path: String,
    pub default_binding: Option<String>,
    pub namespace_binding: Option<String>,
    /// Imported names (the exported name, not the local alias).
    pub named: Vec<String>,
    /// Byte range of the `{ ... }` clause, when present.
    pub named_clause: Option<(usize, usize)>,
    /// End byte of the last specifier inside the named clause.
    pub last_specifier_end: Option<usize>,
    pub type_only: bool,
    pub start_byte: usize,
    pub end_byte: usize,
}

impl ExistingImport {
    fn from_node(node: Node<'_>, source: &str) -> Option<Self> {
        let module_path = string_literal_value(node.child_by_field_name("source")?, source)?;
        let mut import = Self {
            module_path,
            default_binding: None,
            namespace_binding: None,
            named: Vec::new(),
            named_clause: None,
            last_specifier_end: None,
            type_only: false,
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
        };

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "type" => import.type_only = true,
                "import_clause" => import.read_clause(child, source),
                _ => {}
            }
        }
        Some(import)
    }

    fn read_clause(&mut self, clause: Node<'_>, source: &str) {
        for part in named_children(clause) {
            match part.kind() {
                "identifier" => self.default_binding = Some(node_text(part, source).to_string()),
                "namespace_import" => {
                    self.namespace_binding = significant_children(part)
                        .into_iter()
                        .find(|c| c.kind() == "identifier")
                        .map(|id| node_text(id, source).to_string());
                }
                "named_imports" => {
                    self.named_clause = Some((part.start_byte(), part.end_byte()));
                    for spec in named_children(part) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        if let Some(name) = spec.child_by_field_name("name") {
                            self.named.push(node_text(name, source).to_string());
                        }
                        self.last_specifier_end = Some(spec.end_byte());
                    }
                }
                _ => {}
            }
        }
    }

    /// Whether this declaration can absorb a requirement of the given kind.
    /// Declarations mixing a namespace import with named imports, and
    /// type-only declarations, never match.
    pub fn matches_kind(&self, kind: &ImportKind) -> bool {
        if self.type_only {
            return false;
        }
        if self.namespace_binding.is_some() && self.named_clause.is_some() {
            return false;
        }
        match kind {
            ImportKind::Named(_) => self.named_clause.is_some(),
            ImportKind::Default(_) => self.default_binding.is_some(),
            ImportKind::Namespace(_) => self.namespace_binding.is_some(),
        }
    }

    /// Requirements equivalent to this declaration, for copying imports
    /// from one file into another. Side-effect imports yield nothing.
    pub fn to_requirements(&self) -> Vec<ImportRequirement> {
        let mut reqs = Vec::new();
        if let Some(ref binding) = self.default_binding {
            reqs.push(ImportRequirement::default_import(&self.module_path, binding));
        }
        if let Some(ref binding) = self.namespace_binding {
            reqs.push(ImportRequirement::namespace(&self.module_path, binding));
        }
        if !self.named.is_empty() {
            reqs.push(ImportRequirement::named(&self.module_path, self.named.clone()));
        }
        reqs
    }
}

/// All import declarations at the top level of a file, in source order.
pub fn existing_imports(file: &SourceFile) -> Vec<ExistingImport> {
    named_children(file.root())
        .into_iter()
        .filter(|n| n.kind() == "import_statement")
        .filter_map(|n| ExistingImport::from_node(n, file.text()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_every_clause_shape() {
        let src = "import express, * as ns from 'express';\nimport { A, B as C } from './a';\nimport type { T } from './t';\nimport 'reflect-metadata';\n";
        let f = SourceFile::from_text("a.ts", src).unwrap();
        let imports = existing_imports(&f);
        assert_eq!(imports.len(), 4);

        assert_eq!(imports[0].default_binding.as_deref(), Some("express"));
        assert_eq!(imports[0].namespace_binding.as_deref(), Some("ns"));
        assert_eq!(imports[1].named, vec!["A", "B"]);
        assert!(imports[1].matches_kind(&ImportKind::Named(vec![])));
        assert!(imports[2].type_only);
        assert!(!imports[2].matches_kind(&ImportKind::Named(vec![])));
        assert!(imports[3].to_requirements().is_empty());
    }
}
