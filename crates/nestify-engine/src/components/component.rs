//! Component repository: class lookup, creation and method insertion.
//!
//! All presence checks live here. A class is created only when no class of
//! that name exists, and a method is added only when the class has no member
//! of that name, which is what makes reruns of the mover idempotent.

use nestify_core::errors::SyntaxError;
use tree_sitter::Node;

use crate::syntax::nodes::{descendants_of_kind, method_name, named_children, node_text};
use crate::syntax::printer::{ClassSpec, MethodSpec};
use crate::syntax::{SourceFile, TextEdit};

/// Handle on a named class inside a source file. Holds no node references,
/// so it stays valid across edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentHandle {
    class_name: String,
    created: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodInsertion {
    Added,
    AlreadyPresent,
}

/// Find a class declaration (exported or not) by name.
pub fn find_class<'t>(file: &'t SourceFile, class_name: &str) -> Option<Node<'t>> {
    descendants_of_kind(file.root(), "class_declaration")
        .into_iter()
        .find(|class| {
            class
                .child_by_field_name("name")
                .is_some_and(|n| file.node_text(n) == class_name)
        })
}

/// Return a handle on the class named by `spec`, appending a rendering of
/// `spec` to the file when the class does not exist yet.
pub fn find_or_create_component(
    file: &mut SourceFile,
    spec: &ClassSpec,
) -> Result<ComponentHandle, SyntaxError> {
    if find_class(file, &spec.name).is_some() {
        return Ok(ComponentHandle {
            class_name: spec.name.clone(),
            created: false,
        });
    }
    tracing::info!(class = %spec.name, path = %file.display_path(), "creating component");
    file.append_block(&spec.render())?;
    Ok(ComponentHandle {
        class_name: spec.name.clone(),
        created: true,
    })
}

impl ComponentHandle {
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn was_created(&self) -> bool {
        self.created
    }

    /// Names of the methods currently declared on the class.
    pub fn method_names(&self, file: &SourceFile) -> Vec<String> {
        let Some(body) = self.body(file) else {
            return Vec::new();
        };
        named_children(body)
            .into_iter()
            .filter(|m| m.kind() == "method_definition")
            .filter_map(|m| method_name(m, file.text()).map(String::from))
            .collect()
    }

    pub fn has_method(&self, file: &SourceFile, name: &str) -> bool {
        self.method_names(file).iter().any(|m| m == name)
    }

    /// Method node by name.
    pub fn method<'t>(&self, file: &'t SourceFile, name: &str) -> Option<Node<'t>> {
        named_children(self.body(file)?)
            .into_iter()
            .filter(|m| m.kind() == "method_definition")
            .find(|m| method_name(*m, file.text()) == Some(name))
    }

    /// Append a method at the end of the class body unless a method with the
    /// same name already exists.
    pub fn add_method(
        &self,
        file: &mut SourceFile,
        method: &MethodSpec,
    ) -> Result<MethodInsertion, SyntaxError> {
        if self.has_method(file, &method.name) {
            tracing::info!(
                class = %self.class_name,
                method = %method.name,
                "method already present, skipped"
            );
            return Ok(MethodInsertion::AlreadyPresent);
        }
        let Some(body) = self.body(file) else {
            return Err(SyntaxError::TreeSitterError {
                path: file.path().to_path_buf(),
                message: format!("class {} has no body", self.class_name),
            });
        };

        let members = named_children(body);
        let has_members = members.iter().any(|m| m.kind() != "comment");
        let content_end = members
            .last()
            .map(|m| m.end_byte())
            .unwrap_or(body.start_byte() + 1);
        let close = body.end_byte() - 1;

        let separator = if has_members { "\n\n" } else { "\n" };
        let edit = TextEdit::replace(content_end, close, format!("{separator}{}\n", method.render()));
        file.apply_edits(vec![edit])?;
        tracing::debug!(class = %self.class_name, method = %method.name, "method added");
        Ok(MethodInsertion::Added)
    }

    fn body<'t>(&self, file: &'t SourceFile) -> Option<Node<'t>> {
        find_class(file, &self.class_name)?.child_by_field_name("body")
    }
}

/// Text of every method body in the class, keyed by method name.
pub fn method_bodies<'t>(file: &'t SourceFile, class: Node<'t>) -> Vec<(&'t str, Node<'t>)> {
    let Some(body) = class.child_by_field_name("body") else {
        return Vec::new();
    };
    named_children(body)
        .into_iter()
        .filter(|m| m.kind() == "method_definition")
        .filter_map(|m| Some((node_text(m.child_by_field_name("name")?, file.text()), m)))
        .collect()
}
