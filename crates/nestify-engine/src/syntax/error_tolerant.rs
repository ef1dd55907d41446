//! Error-tolerant parsing: locate ERROR nodes so extraction can skip them.

use tree_sitter::Node;

/// 1-based line span of a syntax error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorSpan {
    pub start_line: u32,
    pub end_line: u32,
}

impl ErrorSpan {
    fn from_ts_node(node: &Node) -> Self {
        Self {
            start_line: node.start_position().row as u32 + 1,
            end_line: node.end_position().row as u32 + 1,
        }
    }
}

/// Count ERROR and MISSING nodes in a tree-sitter tree.
pub fn count_errors(root: Node) -> (u32, Vec<ErrorSpan>) {
    let mut count = 0u32;
    let mut spans = Vec::new();
    if root.has_error() {
        collect_errors(root, &mut count, &mut spans);
    }
    (count, spans)
}

fn collect_errors(node: Node, count: &mut u32, spans: &mut Vec<ErrorSpan>) {
    if node.is_error() || node.is_missing() {
        *count += 1;
        spans.push(ErrorSpan::from_ts_node(&node));
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() || child.is_missing() {
            collect_errors(child, count, spans);
        }
    }
}

/// Check if a node is inside an ERROR subtree.
pub fn is_in_error(node: &Node) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        if parent.is_error() {
            return true;
        }
        current = parent.parent();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SourceFile;

    #[test]
    fn clean_source_has_no_errors() {
        let f = SourceFile::from_text("a.ts", "const a = 1;\n").unwrap();
        assert_eq!(count_errors(f.root()).0, 0);
    }

    #[test]
    fn broken_source_reports_spans() {
        let f = SourceFile::from_text("a.ts", "const a = ;\nfunction (\n").unwrap();
        let (count, spans) = count_errors(f.root());
        assert!(count > 0);
        assert_eq!(spans.len(), count as usize);
    }
}
