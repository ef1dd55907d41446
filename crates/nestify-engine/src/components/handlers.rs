//! Discovery of exported handler functions in an Express route file.

use rustc_hash::FxHashSet;
use tree_sitter::Node;

use crate::syntax::nodes::{
    annotation_type_text, function_parameters, is_async, literal_continuation_rows, named_children,
    node_text, parameter_name,
};
use crate::syntax::text::{block_inner, dedent};
use crate::syntax::SourceFile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerParam {
    pub name: String,
    /// Declared type, or `any` when missing or expressed through `import(...)`.
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFunction {
    pub name: String,
    pub params: Vec<HandlerParam>,
    /// JSDoc blocks immediately preceding the declaration, dedented.
    pub docs: Vec<String>,
    /// Statements of the body, dedented except inside multi-line literals.
    /// Expression bodies become `return <expr>;`.
    pub body: String,
    /// Declared return type; `void` and `Promise<void>` normalize to `None`.
    pub return_type: Option<String>,
    pub is_async: bool,
    pub line: u32,
}

/// Top-level exported functions: `export function f`, `export const f = () => ..`,
/// `export const f = function ..`, and local declarations re-exported through
/// `export { f }`.
pub fn discover_handlers(file: &SourceFile) -> Vec<HandlerFunction> {
    let source = file.text();
    let top_level = named_children(file.root());
    let exported_names = export_clause_names(&top_level, source);

    let mut handlers = Vec::new();
    for statement in &top_level {
        let (declaration, doc_anchor, exported) = if statement.kind() == "export_statement" {
            match statement.child_by_field_name("declaration") {
                Some(decl) => (decl, *statement, true),
                None => continue,
            }
        } else {
            (*statement, *statement, false)
        };

        match declaration.kind() {
            "function_declaration" => {
                let Some(name) = declaration.child_by_field_name("name") else {
                    continue;
                };
                let name = node_text(name, source);
                if exported || exported_names.contains(name) {
                    handlers.push(build_handler(file, name, declaration, doc_anchor));
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                for declarator in named_children(declaration) {
                    if declarator.kind() != "variable_declarator" {
                        continue;
                    }
                    let (Some(name), Some(value)) = (
                        declarator.child_by_field_name("name"),
                        declarator.child_by_field_name("value"),
                    ) else {
                        continue;
                    };
                    if !matches!(value.kind(), "arrow_function" | "function_expression" | "function") {
                        continue;
                    }
                    let name = node_text(name, source);
                    if exported || exported_names.contains(name) {
                        handlers.push(build_handler(file, name, value, doc_anchor));
                    }
                }
            }
            _ => {}
        }
    }
    tracing::debug!(path = %file.display_path(), count = handlers.len(), "discovered handlers");
    handlers
}

fn export_clause_names<'s>(top_level: &[Node<'_>], source: &'s str) -> FxHashSet<&'s str> {
    let mut names = FxHashSet::default();
    for statement in top_level {
        if statement.kind() != "export_statement" || statement.child_by_field_name("source").is_some() {
            continue;
        }
        for clause in named_children(*statement) {
            if clause.kind() != "export_clause" {
                continue;
            }
            for spec in named_children(clause) {
                if let Some(name) = spec.child_by_field_name("name") {
                    names.insert(node_text(name, source));
                }
            }
        }
    }
    names
}

fn build_handler(file: &SourceFile, name: &str, function: Node<'_>, doc_anchor: Node<'_>) -> HandlerFunction {
    let source = file.text();

    let params = function_parameters(function)
        .into_iter()
        .filter_map(|p| {
            let name = parameter_name(p, source)?.to_string();
            let ty = p
                .child_by_field_name("type")
                .and_then(|t| annotation_type_text(t, source))
                .filter(|t| !t.contains("import"))
                .unwrap_or("any")
                .to_string();
            Some(HandlerParam { name, ty })
        })
        .collect();

    let body = match function.child_by_field_name("body") {
        Some(body) if body.kind() == "statement_block" => {
            let verbatim = literal_continuation_rows(body, body.start_position().row);
            block_inner(node_text(body, source), &verbatim)
        }
        Some(expr) => {
            let verbatim = literal_continuation_rows(expr, expr.start_position().row);
            format!("return {};", dedent(node_text(expr, source), &verbatim))
        }
        None => String::new(),
    };

    let return_type = function
        .child_by_field_name("return_type")
        .and_then(|t| annotation_type_text(t, source))
        .map(str::trim)
        .filter(|t| !matches!(*t, "void" | "Promise<void>"))
        .map(String::from);

    HandlerFunction {
        name: name.to_string(),
        params,
        docs: leading_jsdoc(doc_anchor, source),
        body,
        return_type,
        is_async: is_async(function),
        line: file.line_of(function),
    }
}

/// JSDoc comments directly preceding a statement, in source order.
fn leading_jsdoc(statement: Node<'_>, source: &str) -> Vec<String> {
    let mut docs = Vec::new();
    let mut current = statement.prev_sibling();
    while let Some(sibling) = current {
        if sibling.kind() != "comment" {
            break;
        }
        let text = node_text(sibling, source);
        if text.starts_with("/**") {
            docs.push(normalize_doc(text));
        }
        current = sibling.prev_sibling();
    }
    docs.reverse();
    docs
}

/// Re-align continuation lines of a block comment to a single leading space.
fn normalize_doc(doc: &str) -> String {
    doc.lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                line.trim().to_string()
            } else {
                format!(" {}", line.trim())
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discover(src: &str) -> Vec<HandlerFunction> {
        let f = SourceFile::from_text("users.ts", src).unwrap();
        discover_handlers(&f)
    }

    #[test]
    fn exported_function_declaration() {
        let handlers = discover(
            "/**\n * Lists users.\n */\nexport async function list(req: express.Request, res: express.Response): Promise<void> {\n  const users = await User.find()\n  return res.json(users)\n}\n",
        );
        assert_eq!(handlers.len(), 1);
        let h = &handlers[0];
        assert_eq!(h.name, "list");
        assert!(h.is_async);
        assert_eq!(h.params[0], HandlerParam { name: "req".into(), ty: "express.Request".into() });
        assert_eq!(h.return_type, None);
        assert_eq!(h.body, "const users = await User.find()\nreturn res.json(users)");
        assert_eq!(h.docs, vec!["/**\n * Lists users.\n */".to_string()]);
    }

    #[test]
    fn arrow_and_function_expressions() {
        let handlers = discover(
            "export const show = async (req, res) => res.json(1)\nexport const create = function (req: Request, res: Response): Promise<User> { return 1 }\n",
        );
        assert_eq!(handlers.len(), 2);
        assert_eq!(handlers[0].params[0].ty, "any");
        assert_eq!(handlers[0].params[1].ty, "any");
        assert_eq!(handlers[0].body, "return res.json(1);");
        assert_eq!(handlers[1].return_type.as_deref(), Some("Promise<User>"));
        assert!(!handlers[1].is_async);
    }

    #[test]
    fn export_clause_and_private_functions() {
        let handlers = discover(
            "function helper() {}\nasync function remove(req, res) {}\nconst update = async (req, res) => {}\nexport { remove, update }\n",
        );
        let names: Vec<&str> = handlers.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["remove", "update"]);
    }
}
