//! Static type queries for request fields.
//!
//! The engine has no type checker. `LocalTypeOracle` answers from evidence
//! in the surrounding code: explicit assertions and annotations, comparisons
//! against literals, and the generic arguments of an annotated request
//! parameter. Callers degrade to `any` when the oracle has no answer.

use tree_sitter::Node;

use crate::syntax::nodes::{find_ancestor, function_parameters, named_children, node_text, significant_children};

use super::classify::FieldGroup;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InferenceError {
    #[error("no type evidence for `{expression}`")]
    NoEvidence { expression: String },
}

pub trait TypeOracle {
    /// Type of the expression `node` (a request field access).
    fn type_of(
        &self,
        node: Node<'_>,
        source: &str,
        group: FieldGroup,
        field: &str,
    ) -> Result<String, InferenceError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTypeOracle;

impl TypeOracle for LocalTypeOracle {
    fn type_of(
        &self,
        node: Node<'_>,
        source: &str,
        group: FieldGroup,
        field: &str,
    ) -> Result<String, InferenceError> {
        if let Some(ty) = asserted_type(node, source)
            .or_else(|| declared_type(node, source))
            .or_else(|| compared_literal_type(node, source))
            .or_else(|| request_generic_type(node, source, group, field))
        {
            return Ok(ty);
        }
        Err(InferenceError::NoEvidence {
            expression: node_text(node, source).to_string(),
        })
    }
}

/// `req.body.age as number`
fn asserted_type(node: Node<'_>, source: &str) -> Option<String> {
    let parent = node.parent()?;
    if !matches!(parent.kind(), "as_expression" | "satisfies_expression") {
        return None;
    }
    let children = significant_children(parent);
    if children.first()?.id() != node.id() {
        return None;
    }
    children.get(1).map(|t| node_text(*t, source).to_string())
}

/// `const age: number = req.body.age`
fn declared_type(node: Node<'_>, source: &str) -> Option<String> {
    let parent = node.parent()?;
    if parent.kind() != "variable_declarator" || parent.child_by_field_name("value")?.id() != node.id() {
        return None;
    }
    let annotation = parent.child_by_field_name("type")?;
    significant_children(annotation)
        .first()
        .map(|t| node_text(*t, source).to_string())
}

/// `req.query.page === '1'`
fn compared_literal_type(node: Node<'_>, source: &str) -> Option<String> {
    let parent = node.parent()?;
    if parent.kind() != "binary_expression" {
        return None;
    }
    let operator = parent.child_by_field_name("operator")?;
    if !matches!(node_text(operator, source), "===" | "!==" | "==" | "!=") {
        return None;
    }
    let left = parent.child_by_field_name("left")?;
    let right = parent.child_by_field_name("right")?;
    let other = if left.id() == node.id() { right } else { left };
    let ty = match other.kind() {
        "string" | "template_string" => "string",
        "number" => "number",
        "true" | "false" => "boolean",
        _ => return None,
    };
    Some(ty.to_string())
}

/// `req: Request<{ id: string }, any, { email: string }, { page: string }>`
fn request_generic_type(node: Node<'_>, source: &str, group: FieldGroup, field: &str) -> Option<String> {
    if field.is_empty() {
        return None;
    }
    let index = match group {
        FieldGroup::Params => 0,
        FieldGroup::Body => 2,
        FieldGroup::Query => 3,
        FieldGroup::User | FieldGroup::UserData => return None,
    };
    let function = find_ancestor(
        node,
        &["method_definition", "function_declaration", "arrow_function", "function_expression"],
    )?;
    let request_param = function_parameters(function).into_iter().next()?;
    let annotation = request_param.child_by_field_name("type")?;
    let generic = significant_children(annotation)
        .into_iter()
        .find(|t| t.kind() == "generic_type")?;
    let arguments = generic.child_by_field_name("type_arguments").or_else(|| {
        named_children(generic)
            .into_iter()
            .find(|c| c.kind() == "type_arguments")
    })?;
    let object_type = significant_children(arguments).into_iter().nth(index)?;
    if object_type.kind() != "object_type" {
        return None;
    }
    named_children(object_type)
        .into_iter()
        .filter(|m| m.kind() == "property_signature")
        .find(|m| {
            m.child_by_field_name("name")
                .is_some_and(|n| node_text(n, source) == field)
        })
        .and_then(|m| m.child_by_field_name("type"))
        .and_then(|t| significant_children(t).first().map(|t| node_text(*t, source).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::nodes::descendants_of_kind;
    use crate::syntax::SourceFile;

    /// Type of the first `req.<group>.<field>` access in `src`.
    fn infer(src: &str, group: FieldGroup, field: &str) -> Result<String, InferenceError> {
        let f = SourceFile::from_text("a.ts", src).unwrap();
        let access = descendants_of_kind(f.root(), "member_expression")
            .into_iter()
            .find(|m| {
                let text = f.node_text(*m);
                text == format!("req.{}.{field}", group.binding_name())
            })
            .unwrap();
        LocalTypeOracle.type_of(access, f.text(), group, field)
    }

    #[test]
    fn assertion_and_annotation() {
        assert_eq!(
            infer("function f(req) { const a = req.body.age as number }", FieldGroup::Body, "age").unwrap(),
            "number"
        );
        assert_eq!(
            infer("function f(req) { const a: Date = req.body.at }", FieldGroup::Body, "at").unwrap(),
            "Date"
        );
    }

    #[test]
    fn literal_comparison() {
        assert_eq!(
            infer("function f(req) { if (req.query.page === '1') {} }", FieldGroup::Query, "page").unwrap(),
            "string"
        );
        assert_eq!(
            infer("function f(req) { if (5 == req.query.limit) {} }", FieldGroup::Query, "limit").unwrap(),
            "number"
        );
        assert_eq!(
            infer("function f(req) { if (req.body.on !== true) {} }", FieldGroup::Body, "on").unwrap(),
            "boolean"
        );
    }

    #[test]
    fn request_generic_arguments() {
        let src = "async function f(req: Request<{ id: string }, any, { email: string }, { page: number }>, res) { use(req.query.page) }";
        assert_eq!(infer(src, FieldGroup::Query, "page").unwrap(), "number");
    }

    #[test]
    fn no_evidence_is_an_error() {
        let err = infer("function f(req) { call(req.body.email) }", FieldGroup::Body, "email").unwrap_err();
        assert!(matches!(err, InferenceError::NoEvidence { .. }));
    }
}
