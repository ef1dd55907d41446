//! Node helpers over the tree-sitter TypeScript grammar.

use rustc_hash::FxHashSet;
use tree_sitter::Node;

/// Get the text of a node from source.
pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

/// All named children of a node.
pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Named children excluding comments.
pub fn significant_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    named_children(node)
        .into_iter()
        .filter(|c| c.kind() != "comment")
        .collect()
}

/// Preorder list of `node` and all of its descendants.
pub fn descendants<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    let mut cursor = node.walk();
    while let Some(current) = stack.pop() {
        out.push(current);
        let children: Vec<Node<'t>> = current.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    out
}

/// Preorder descendants of a given kind.
pub fn descendants_of_kind<'t>(node: Node<'t>, kind: &str) -> Vec<Node<'t>> {
    descendants(node)
        .into_iter()
        .filter(|n| n.kind() == kind)
        .collect()
}

/// Rows, relative to `base_row`, that begin inside a multi-line string or
/// template literal under `node`. Their leading and trailing whitespace is
/// part of the literal value.
pub fn literal_continuation_rows(node: Node<'_>, base_row: usize) -> FxHashSet<usize> {
    descendants(node)
        .into_iter()
        .filter(|n| matches!(n.kind(), "template_string" | "string"))
        .flat_map(|n| n.start_position().row + 1..=n.end_position().row)
        .filter_map(|row| row.checked_sub(base_row))
        .collect()
}

/// Argument nodes of a `call_expression`.
pub fn call_arguments<'t>(call: Node<'t>) -> Vec<Node<'t>> {
    call.child_by_field_name("arguments")
        .map(significant_children)
        .unwrap_or_default()
}

/// For `obj.prop` returns `(obj, "prop")`.
pub fn member_parts<'t, 's>(node: Node<'t>, source: &'s str) -> Option<(Node<'t>, &'s str)> {
    if node.kind() != "member_expression" {
        return None;
    }
    let object = node.child_by_field_name("object")?;
    let property = node.child_by_field_name("property")?;
    Some((object, node_text(property, source)))
}

/// For `callee.method(...)` returns `(callee, "method")`.
pub fn method_call_parts<'t, 's>(call: Node<'t>, source: &'s str) -> Option<(Node<'t>, &'s str)> {
    if call.kind() != "call_expression" {
        return None;
    }
    member_parts(call.child_by_field_name("function")?, source)
}

pub fn is_identifier(node: Node<'_>, source: &str, name: &str) -> bool {
    node.kind() == "identifier" && node_text(node, source) == name
}

/// Value of a plain string literal (`'x'`, `"x"`, or a template without
/// substitutions).
pub fn string_literal_value(node: Node<'_>, source: &str) -> Option<String> {
    match node.kind() {
        "string" => unquote(node_text(node, source)),
        "template_string" => {
            let has_substitution = named_children(node)
                .iter()
                .any(|c| c.kind() == "template_substitution");
            if has_substitution {
                None
            } else {
                unquote(node_text(node, source))
            }
        }
        _ => None,
    }
}

/// Strip one level of matching quotes.
pub fn unquote(raw: &str) -> Option<String> {
    let mut chars = raw.chars();
    let first = chars.next()?;
    if !matches!(first, '\'' | '"' | '`') || raw.len() < 2 || !raw.ends_with(first) {
        return None;
    }
    Some(raw[1..raw.len() - 1].to_string())
}

/// Nearest ancestor of one of the given kinds.
pub fn find_ancestor<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    let mut current = node.parent();
    while let Some(parent) = current {
        if kinds.contains(&parent.kind()) {
            return Some(parent);
        }
        current = parent.parent();
    }
    None
}

/// Identifier-like name of a function/method parameter node.
pub fn parameter_name<'s>(param: Node<'_>, source: &'s str) -> Option<&'s str> {
    match param.kind() {
        "required_parameter" | "optional_parameter" => param
            .child_by_field_name("pattern")
            .map(|p| node_text(p, source)),
        "identifier" => Some(node_text(param, source)),
        _ => None,
    }
}

/// Type text of a `type_annotation` node (without the leading colon).
pub fn annotation_type_text<'s>(annotation: Node<'_>, source: &'s str) -> Option<&'s str> {
    if annotation.kind() != "type_annotation" {
        return Some(node_text(annotation, source));
    }
    significant_children(annotation)
        .first()
        .map(|t| node_text(*t, source))
}

/// Parameter nodes of a function-like node (function declaration,
/// function expression, arrow function, method definition).
pub fn function_parameters<'t>(function: Node<'t>) -> Vec<Node<'t>> {
    if let Some(params) = function.child_by_field_name("parameters") {
        return significant_children(params)
            .into_iter()
            .filter(|p| p.kind() != "decorator")
            .collect();
    }
    function
        .child_by_field_name("parameter")
        .into_iter()
        .collect()
}

/// Whether a function-like node carries the `async` keyword.
pub fn is_async(function: Node<'_>) -> bool {
    let mut cursor = function.walk();
    let is_async = function
        .children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == "async");
    is_async
}

/// Name of a method definition.
pub fn method_name<'s>(method: Node<'_>, source: &'s str) -> Option<&'s str> {
    method
        .child_by_field_name("name")
        .map(|n| node_text(n, source))
}

/// Decorators attached to a class member. The grammar places member
/// decorators as siblings preceding the member inside the class body.
pub fn member_decorators<'t>(member: Node<'t>) -> Vec<Node<'t>> {
    let mut decorators = Vec::new();
    let mut cursor = member.walk();
    decorators.extend(
        member
            .children(&mut cursor)
            .filter(|c| c.kind() == "decorator"),
    );
    let mut current = member.prev_named_sibling();
    while let Some(sibling) = current {
        match sibling.kind() {
            "decorator" => decorators.push(sibling),
            "comment" => {}
            _ => break,
        }
        current = sibling.prev_named_sibling();
    }
    decorators
}

/// Name of a decorator: `@Get(':id')` -> `Get`.
pub fn decorator_name<'s>(decorator: Node<'_>, source: &'s str) -> Option<&'s str> {
    let expr = significant_children(decorator).into_iter().next()?;
    let callee = if expr.kind() == "call_expression" {
        expr.child_by_field_name("function")?
    } else {
        expr
    };
    Some(node_text(callee, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SourceFile;

    #[test]
    fn unquote_literals() {
        assert_eq!(unquote("'/api'").as_deref(), Some("/api"));
        assert_eq!(unquote("\"x\"").as_deref(), Some("x"));
        assert_eq!(unquote("`y`").as_deref(), Some("y"));
        assert_eq!(unquote("'"), None);
        assert_eq!(unquote("abc"), None);
    }

    #[test]
    fn template_with_substitution_is_not_a_literal() {
        let f = SourceFile::from_text("a.ts", "f(`a${b}`, `plain`);\n").unwrap();
        let call = descendants_of_kind(f.root(), "call_expression")[0];
        let args = call_arguments(call);
        assert_eq!(string_literal_value(args[0], f.text()), None);
        assert_eq!(string_literal_value(args[1], f.text()).as_deref(), Some("plain"));
    }

    #[test]
    fn continuation_rows_of_multiline_literals() {
        let src = "const a = 1;\nconst q = `x\n  y\nz`;\nconst s = 'one';\n";
        let f = SourceFile::from_text("a.ts", src).unwrap();
        let mut rows: Vec<usize> = literal_continuation_rows(f.root(), 0).into_iter().collect();
        rows.sort();
        assert_eq!(rows, [2, 3]);
        let mut relative: Vec<usize> = literal_continuation_rows(f.root(), 1).into_iter().collect();
        relative.sort();
        assert_eq!(relative, [1, 2]);
    }

    #[test]
    fn method_call_parts_of_chain() {
        let f = SourceFile::from_text("a.ts", "res.status(404).json(x);\n").unwrap();
        let calls = descendants_of_kind(f.root(), "call_expression");
        let (receiver, method) = method_call_parts(calls[0], f.text()).unwrap();
        assert_eq!(method, "json");
        assert_eq!(node_text(receiver, f.text()), "res.status(404)");
    }

    #[test]
    fn member_decorators_are_preceding_siblings() {
        let src = "class A {\n  @Get(':id')\n  // note\n  @ApiOkResponse()\n  async show() {}\n}\n";
        let f = SourceFile::from_text("a.ts", src).unwrap();
        let method = descendants_of_kind(f.root(), "method_definition")[0];
        let mut names: Vec<&str> = member_decorators(method)
            .into_iter()
            .filter_map(|d| decorator_name(d, f.text()))
            .collect();
        names.sort();
        assert_eq!(names, vec!["ApiOkResponse", "Get"]);
        assert!(is_async(method));
    }
}
