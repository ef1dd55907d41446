//! Review-marker annotator.
//!
//! Every line of a class method that still uses `req` or `res` gets a
//! marker comment on the line above it, so leftovers stand out in review.

use std::collections::BTreeSet;

use nestify_core::config::MarkersConfig;
use nestify_core::constants::{REQUEST_IDENT, RESPONSE_IDENT};
use nestify_core::errors::SyntaxError;
use tree_sitter::Node;

use crate::components::component::method_bodies;
use crate::syntax::nodes::{descendants, descendants_of_kind, node_text};
use crate::syntax::text::{line_indent, line_start, previous_line};
use crate::syntax::{SourceFile, TextEdit};

const MARKER_MESSAGE: &str = "Check req/res";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotateOutcome {
    pub markers_added: usize,
    /// Lines that already carried the marker.
    pub lines_skipped: usize,
}

/// Insert review markers above every line using `req`/`res`.
pub fn annotate_request_response(
    file: &mut SourceFile,
    markers: &MarkersConfig,
) -> Result<AnnotateOutcome, SyntaxError> {
    let marker_line = format!("// {}", markers.marker(MARKER_MESSAGE));
    let mut outcome = AnnotateOutcome::default();

    let edits: Vec<TextEdit> = {
        let source = file.text();
        let mut lines: BTreeSet<usize> = BTreeSet::new();
        for class in descendants_of_kind(file.root(), "class_declaration") {
            for (name, method) in method_bodies(file, class) {
                let Some(body) = method.child_by_field_name("body") else {
                    continue;
                };
                for node in descendants(body).into_iter().filter(|n| is_use(*n, source)) {
                    tracing::debug!(method = name, line = file.line_of(node), "request/response use");
                    lines.insert(line_start(source, node.start_byte()));
                }
            }
        }

        lines
            .into_iter()
            .filter(|&offset| {
                let marked = previous_line(source, offset).is_some_and(|l| l.trim() == marker_line);
                if marked {
                    outcome.lines_skipped += 1;
                }
                !marked
            })
            .map(|offset| {
                let indent = line_indent(source, offset);
                TextEdit::insert(offset, format!("{indent}{marker_line}\n"))
            })
            .collect()
    };

    outcome.markers_added = edits.len();
    file.apply_edits(edits)?;
    tracing::info!(
        path = %file.display_path(),
        added = outcome.markers_added,
        skipped = outcome.lines_skipped,
        "review markers inserted"
    );
    Ok(outcome)
}

/// `req`/`res` as a value, including `{ req }` shorthand, but not as a
/// parameter being declared.
fn is_use(node: Node<'_>, source: &str) -> bool {
    if !matches!(node.kind(), "identifier" | "shorthand_property_identifier") {
        return false;
    }
    let text = node_text(node, source);
    if text != REQUEST_IDENT && text != RESPONSE_IDENT {
        return false;
    }
    !node.parent().is_some_and(|p| {
        let field = match p.kind() {
            "required_parameter" | "optional_parameter" => "pattern",
            "arrow_function" => "parameter",
            _ => return false,
        };
        p.child_by_field_name(field).is_some_and(|decl| decl.id() == node.id())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVICE: &str = "\
export class UsersService {
  async show(id: string) {
    const user = await User.findById(id);
    res.set('x', 'y');
    audit({ req, user });
    const cb = (req) => 1;
    const cb2 = res => 2;
    return user;
  }
}
";

    fn annotate(src: &str) -> (String, AnnotateOutcome) {
        let mut file = SourceFile::from_text("users.service.ts", src).unwrap();
        let outcome = annotate_request_response(&mut file, &MarkersConfig::default()).unwrap();
        (file.text().to_string(), outcome)
    }

    #[test]
    fn marks_each_using_line_once() {
        let (out, outcome) = annotate(SERVICE);
        assert_eq!(outcome.markers_added, 2);
        assert!(out.contains(
            "    // TODO(NestJS Migration): Check req/res\n    res.set('x', 'y');"
        ));
        assert!(out.contains(
            "    // TODO(NestJS Migration): Check req/res\n    audit({ req, user });"
        ));
        assert!(!out.contains("Check req/res\n    const cb"));
    }

    #[test]
    fn rerun_is_idempotent() {
        let (once, _) = annotate(SERVICE);
        let (twice, outcome) = annotate(&once);
        assert_eq!(once, twice);
        assert_eq!(outcome.markers_added, 0);
        assert_eq!(outcome.lines_skipped, 2);
    }

    #[test]
    fn untouched_without_uses() {
        let src = "export class A {\n  m() {\n    return 1;\n  }\n}\n";
        let (out, outcome) = annotate(src);
        assert_eq!(out, src);
        assert_eq!(outcome.markers_added, 0);
    }
}
