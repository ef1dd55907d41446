//! Response-builder call chains.
//!
//! Grammar, matched outermost call first:
//!
//! ```text
//! chain  := target.json(payload?)
//! target := res | res.status(code)
//! ```
//!
//! Payload-before-status chains and chains with intermediate calls are
//! `Unmatched` and left alone.

use tree_sitter::Node;

use crate::syntax::nodes::{call_arguments, node_text};

/// The expression view the matcher needs.
pub trait ExprNode: Sized + Copy {
    /// `(callee, arguments)` for a call expression.
    fn call_parts(&self) -> Option<(Self, Vec<Self>)>;
    /// `(object, property)` for a property access.
    fn member_parts(&self) -> Option<(Self, String)>;
    fn identifier(&self) -> Option<String>;
    fn is_null(&self) -> bool;
    /// Digits of a plain integer literal.
    fn integer_literal(&self) -> Option<String>;
    fn text(&self) -> String;
}

/// A tree-sitter node paired with its source.
#[derive(Debug, Clone, Copy)]
pub struct TsNode<'t, 's> {
    pub node: Node<'t>,
    pub source: &'s str,
}

impl<'t, 's> TsNode<'t, 's> {
    pub fn new(node: Node<'t>, source: &'s str) -> Self {
        Self { node, source }
    }

    fn wrap(&self, node: Node<'t>) -> Self {
        Self::new(node, self.source)
    }
}

impl ExprNode for TsNode<'_, '_> {
    fn call_parts(&self) -> Option<(Self, Vec<Self>)> {
        if self.node.kind() != "call_expression" {
            return None;
        }
        let callee = self.node.child_by_field_name("function")?;
        let args = call_arguments(self.node).into_iter().map(|a| self.wrap(a)).collect();
        Some((self.wrap(callee), args))
    }

    fn member_parts(&self) -> Option<(Self, String)> {
        if self.node.kind() != "member_expression" {
            return None;
        }
        let object = self.node.child_by_field_name("object")?;
        let property = self.node.child_by_field_name("property")?;
        Some((self.wrap(object), node_text(property, self.source).to_string()))
    }

    fn identifier(&self) -> Option<String> {
        (self.node.kind() == "identifier").then(|| self.text())
    }

    fn is_null(&self) -> bool {
        self.node.kind() == "null"
    }

    fn integer_literal(&self) -> Option<String> {
        let text = self.text();
        (self.node.kind() == "number" && !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()))
            .then_some(text)
    }

    fn text(&self) -> String {
        node_text(self.node, self.source).to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Expr(String),
    /// `json(null)` or `json()`.
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponseChain {
    pub status_code: Option<String>,
    pub payload: Payload,
}

impl StatusResponseChain {
    /// Status absent or in the 2xx range.
    pub fn is_success(&self) -> bool {
        self.status_code
            .as_deref()
            .map_or(true, |code| code.starts_with('2') && code.len() == 3)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainMatch {
    Matched(StatusResponseChain),
    Unmatched,
}

/// Match `node` against the response chain grammar rooted at `target`.
pub fn match_response_chain<N: ExprNode>(node: N, target: &str) -> ChainMatch {
    let Some((callee, args)) = node.call_parts() else {
        return ChainMatch::Unmatched;
    };
    let Some((receiver, method)) = callee.member_parts() else {
        return ChainMatch::Unmatched;
    };
    if method != "json" {
        return ChainMatch::Unmatched;
    }
    let payload = match args.as_slice() {
        [] => Payload::Null,
        [arg] if arg.is_null() => Payload::Null,
        [arg] => Payload::Expr(arg.text()),
        _ => return ChainMatch::Unmatched,
    };
    match match_target(receiver, target) {
        Some(status_code) => ChainMatch::Matched(StatusResponseChain { status_code, payload }),
        None => ChainMatch::Unmatched,
    }
}

/// `Some(None)` for the bare target, `Some(Some(code))` for
/// `target.status(code)`.
fn match_target<N: ExprNode>(node: N, target: &str) -> Option<Option<String>> {
    if node.identifier().as_deref() == Some(target) {
        return Some(None);
    }
    let (callee, args) = node.call_parts()?;
    let (object, method) = callee.member_parts()?;
    if method != "status" || object.identifier().as_deref() != Some(target) {
        return None;
    }
    match args.as_slice() {
        [code] => code.integer_literal().map(Some),
        _ => None,
    }
}
