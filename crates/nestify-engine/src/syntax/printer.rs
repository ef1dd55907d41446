//! Rendering of generated declarations.
//!
//! Generated code uses two-space indentation, single quotes and
//! semicolons, matching the NestJS scaffolding conventions.

use std::path::Path;

use rustc_hash::FxHashSet;

use super::nodes::literal_continuation_rows;
use super::source_file::parse_typescript;
use super::text::{indent_lines, indent_lines_except};

pub const INDENT: &str = "  ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratorSpec {
    pub name: String,
    pub arguments: Vec<String>,
}

impl DecoratorSpec {
    pub fn new(name: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    pub fn bare(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn render(&self) -> String {
        format!("@{}({})", self.name, self.arguments.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub ty: Option<String>,
    pub decorators: Vec<DecoratorSpec>,
    /// e.g. `private readonly`
    pub modifiers: Option<String>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, ty: Option<String>) -> Self {
        Self {
            name: name.into(),
            ty,
            decorators: Vec::new(),
            modifiers: None,
        }
    }

    pub fn decorated(mut self, decorator: DecoratorSpec) -> Self {
        self.decorators.push(decorator);
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for d in &self.decorators {
            out.push_str(&d.render());
            out.push(' ');
        }
        if let Some(ref m) = self.modifiers {
            out.push_str(m);
            out.push(' ');
        }
        out.push_str(&self.name);
        if let Some(ref ty) = self.ty {
            out.push_str(": ");
            out.push_str(ty);
        }
        out
    }
}

pub fn render_params(params: &[ParamSpec]) -> String {
    params
        .iter()
        .map(ParamSpec::render)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A `/** ... */` block from plain lines.
pub fn render_doc_block(lines: &[String]) -> String {
    let mut out = String::from("/**\n");
    for line in lines {
        if line.is_empty() {
            out.push_str(" *\n");
        } else {
            out.push_str(" * ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push_str(" */");
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSpec {
    pub name: String,
    /// Lines of a generated doc block, emitted first.
    pub docs: Vec<String>,
    /// Pre-existing comment blocks copied verbatim after the generated docs.
    pub raw_docs: Vec<String>,
    pub decorators: Vec<DecoratorSpec>,
    pub params: Vec<ParamSpec>,
    pub return_type: Option<String>,
    pub is_async: bool,
    /// Statements, unindented.
    pub body: String,
}

impl MethodSpec {
    /// Render at class-member indentation (no trailing newline).
    pub fn render(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if !self.docs.is_empty() {
            parts.push(render_doc_block(&self.docs));
        }
        parts.extend(self.raw_docs.iter().cloned());
        parts.extend(self.decorators.iter().map(DecoratorSpec::render));

        let mut signature = String::new();
        if self.is_async {
            signature.push_str("async ");
        }
        signature.push_str(&self.name);
        signature.push('(');
        signature.push_str(&render_params(&self.params));
        signature.push(')');
        if let Some(ref rt) = self.return_type {
            signature.push_str(": ");
            signature.push_str(rt);
        }
        if self.body.trim().is_empty() {
            signature.push_str(" {}");
            parts.push(signature);
            return indent_lines(&parts.join("\n"), INDENT);
        }
        signature.push_str(" {");
        parts.push(signature);
        let body = indent_lines_except(&self.body, &INDENT.repeat(2), &body_literal_rows(&self.body));
        format!("{}\n{body}\n{INDENT}}}", indent_lines(&parts.join("\n"), INDENT))
    }
}

/// Lines of a method body that continue a multi-line literal.
fn body_literal_rows(body: &str) -> FxHashSet<usize> {
    parse_typescript(Path::new("body.ts"), body)
        .map(|tree| literal_continuation_rows(tree.root_node(), 0))
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSpec {
    pub name: String,
    pub docs: Vec<String>,
    pub decorators: Vec<DecoratorSpec>,
    pub constructor_params: Vec<ParamSpec>,
}

impl ClassSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docs: Vec::new(),
            decorators: Vec::new(),
            constructor_params: Vec::new(),
        }
    }

    pub fn render(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if !self.docs.is_empty() {
            parts.push(render_doc_block(&self.docs));
        }
        parts.extend(self.decorators.iter().map(DecoratorSpec::render));
        if self.constructor_params.is_empty() {
            parts.push(format!("export class {} {{\n}}", self.name));
        } else {
            let params = self
                .constructor_params
                .iter()
                .map(|p| {
                    let mut lines: Vec<String> =
                        p.decorators.iter().map(DecoratorSpec::render).collect();
                    let bare = ParamSpec {
                        decorators: Vec::new(),
                        ..p.clone()
                    };
                    lines.push(format!("{},", bare.render()));
                    indent_lines(&lines.join("\n"), &INDENT.repeat(2))
                })
                .collect::<Vec<_>>()
                .join("\n");
            parts.push(format!(
                "export class {} {{\n{INDENT}constructor(\n{params}\n{INDENT}) {{}}\n}}",
                self.name
            ));
        }
        parts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_decorated_param() {
        let p = ParamSpec::new("id", Some("string".into()))
            .decorated(DecoratorSpec::new("Param", vec!["'id'".into()]));
        assert_eq!(p.render(), "@Param('id') id: string");
    }

    #[test]
    fn renders_method_with_docs_and_body() {
        let m = MethodSpec {
            name: "show".into(),
            docs: vec!["TODO: check".into()],
            raw_docs: vec![],
            decorators: vec![DecoratorSpec::new("Get", vec!["':id'".into()])],
            params: vec![ParamSpec::new("req", Some("any".into()))],
            return_type: None,
            is_async: true,
            body: "const a = 1;\nreturn a;".into(),
        };
        assert_eq!(
            m.render(),
            "  /**\n   * TODO: check\n   */\n  @Get(':id')\n  async show(req: any) {\n    const a = 1;\n    return a;\n  }"
        );
    }

    #[test]
    fn renders_class_with_injected_constructor() {
        let mut class = ClassSpec::new("UsersController");
        class.decorators.push(DecoratorSpec::new("Controller", vec!["'users'".into()]));
        class.constructor_params.push(ParamSpec {
            name: "usersService".into(),
            ty: Some("UsersService".into()),
            decorators: vec![DecoratorSpec::new("Inject", vec!["UsersService".into()])],
            modifiers: Some("private readonly".into()),
        });
        assert_eq!(
            class.render(),
            "@Controller('users')\nexport class UsersController {\n  constructor(\n    @Inject(UsersService)\n    private readonly usersService: UsersService,\n  ) {}\n}"
        );
    }
}
