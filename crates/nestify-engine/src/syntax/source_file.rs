//! In-memory TypeScript source file backed by a tree-sitter tree.

use std::path::{Path, PathBuf};

use nestify_core::errors::SyntaxError;
use tree_sitter::{Node, Parser, Tree};

use super::error_tolerant::count_errors;

/// A replacement of the byte range `start..end` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

impl TextEdit {
    pub fn replace(start: usize, end: usize, replacement: impl Into<String>) -> Self {
        Self {
            start,
            end,
            replacement: replacement.into(),
        }
    }

    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::replace(offset, offset, text)
    }

    pub fn replace_node(node: Node<'_>, replacement: impl Into<String>) -> Self {
        Self::replace(node.start_byte(), node.end_byte(), replacement)
    }
}

pub struct SourceFile {
    path: PathBuf,
    text: String,
    tree: Tree,
    /// Text as loaded from disk; `None` when the file did not exist.
    original: Option<String>,
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("path", &self.path)
            .field("len", &self.text.len())
            .field("modified", &self.is_modified())
            .finish()
    }
}

impl SourceFile {
    /// Load and parse an existing file.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SyntaxError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path).map_err(|e| SyntaxError::io(&path, e))?;
        let mut file = Self::from_text(path, text)?;
        file.original = Some(file.text.clone());
        Ok(file)
    }

    /// Load a file, or start from an empty one when it does not exist yet.
    pub fn load_or_create(path: impl Into<PathBuf>) -> Result<Self, SyntaxError> {
        let path = path.into();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "starting new source file");
            Self::from_text(path, String::new())
        }
    }

    /// Parse in-memory text. The file counts as new (unsaved) until `save`.
    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Result<Self, SyntaxError> {
        let path = path.into();
        let text = text.into();
        let tree = parse_typescript(&path, &text)?;
        let (errors, _) = count_errors(tree.root_node());
        if errors > 0 {
            tracing::warn!(path = %path.display(), errors, "source parsed with syntax errors");
        }
        Ok(Self {
            path,
            text,
            tree,
            original: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Display form of the path used in diagnostics.
    pub fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn node_text(&self, node: Node<'_>) -> &str {
        &self.text[node.byte_range()]
    }

    /// 1-based line of a node.
    pub fn line_of(&self, node: Node<'_>) -> u32 {
        node.start_position().row as u32 + 1
    }

    /// New files count as modified once they hold any text.
    pub fn is_modified(&self) -> bool {
        match self.original.as_deref() {
            Some(original) => original != self.text,
            None => !self.text.is_empty(),
        }
    }

    /// Apply a batch of non-overlapping edits and re-parse.
    /// Edits are applied from the end of the file backwards so earlier
    /// offsets stay valid. Returns the number of edits applied.
    pub fn apply_edits(&mut self, mut edits: Vec<TextEdit>) -> Result<usize, SyntaxError> {
        if edits.is_empty() {
            return Ok(0);
        }
        edits.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));

        let mut lower_bound = self.text.len();
        for edit in &edits {
            if edit.start > edit.end || edit.end > self.text.len() {
                return Err(SyntaxError::EditOutOfBounds {
                    path: self.path.clone(),
                    start: edit.start,
                    end: edit.end,
                    len: self.text.len(),
                });
            }
            if edit.end > lower_bound {
                return Err(SyntaxError::OverlappingEdit {
                    path: self.path.clone(),
                    start: edit.start,
                    end: edit.end,
                });
            }
            lower_bound = edit.start;
        }

        for edit in &edits {
            self.text.replace_range(edit.start..edit.end, &edit.replacement);
        }
        self.reparse()?;
        Ok(edits.len())
    }

    /// Replace the whole text and re-parse.
    pub fn set_text(&mut self, text: String) -> Result<(), SyntaxError> {
        self.text = text;
        self.reparse()
    }

    /// Append text at the end of the file, separated by a blank line when
    /// the file already has content.
    pub fn append_block(&mut self, block: &str) -> Result<(), SyntaxError> {
        let mut text = std::mem::take(&mut self.text);
        let trimmed_len = text.trim_end().len();
        text.truncate(trimmed_len);
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        text.push_str(block);
        if !text.ends_with('\n') {
            text.push('\n');
        }
        self.set_text(text)
    }

    fn reparse(&mut self) -> Result<(), SyntaxError> {
        self.tree = parse_typescript(&self.path, &self.text)?;
        Ok(())
    }

    /// Persist the file when modified. The text is written to a sibling
    /// temporary file and renamed over the target. Returns whether a write
    /// happened.
    pub fn save(&mut self) -> Result<bool, SyntaxError> {
        if !self.is_modified() {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| SyntaxError::io(parent, e))?;
            }
        }
        let mut tmp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        tmp_name.push(".nestify-tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        std::fs::write(&tmp_path, &self.text).map_err(|e| SyntaxError::io(&tmp_path, e))?;
        if let Err(e) = std::fs::rename(&tmp_path, &self.path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(SyntaxError::io(&self.path, e));
        }
        self.original = Some(self.text.clone());
        tracing::debug!(path = %self.path.display(), "saved");
        Ok(true)
    }
}

/// Parse TypeScript (or TSX, by extension) source text.
pub fn parse_typescript(path: &Path, text: &str) -> Result<Tree, SyntaxError> {
    let language: tree_sitter::Language = match path.extension().and_then(|e| e.to_str()) {
        Some("tsx") => tree_sitter_typescript::LANGUAGE_TSX.into(),
        _ => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
    };
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| SyntaxError::GrammarNotFound {
            message: e.to_string(),
        })?;
    parser
        .parse(text, None)
        .ok_or_else(|| SyntaxError::TreeSitterError {
            path: path.to_path_buf(),
            message: "parser returned no tree".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(text: &str) -> SourceFile {
        SourceFile::from_text("test.ts", text).unwrap()
    }

    #[test]
    fn edits_apply_back_to_front() {
        let mut f = file("const a = 1;\nconst b = 2;\n");
        let applied = f
            .apply_edits(vec![
                TextEdit::replace(6, 7, "x"),
                TextEdit::replace(19, 20, "y"),
            ])
            .unwrap();
        assert_eq!(applied, 2);
        assert_eq!(f.text(), "const x = 1;\nconst y = 2;\n");
        assert_eq!(f.root().kind(), "program");
    }

    #[test]
    fn overlapping_edits_are_rejected() {
        let mut f = file("const a = 1;\n");
        let err = f
            .apply_edits(vec![TextEdit::replace(0, 8, "x"), TextEdit::replace(6, 10, "y")])
            .unwrap_err();
        assert!(matches!(err, SyntaxError::OverlappingEdit { .. }));
        assert_eq!(f.text(), "const a = 1;\n");
    }

    #[test]
    fn inserts_at_same_offset_keep_both() {
        let mut f = file("ab");
        f.apply_edits(vec![TextEdit::insert(1, "X"), TextEdit::insert(2, "Y")])
            .unwrap();
        assert_eq!(f.text(), "aXbY");
    }

    #[test]
    fn append_block_separates_with_blank_line() {
        let mut f = file("import x from 'x';\n\n\n");
        f.append_block("export class A {}").unwrap();
        assert_eq!(f.text(), "import x from 'x';\n\nexport class A {}\n");

        let mut empty = file("");
        empty.append_block("export class A {}").unwrap();
        assert_eq!(empty.text(), "export class A {}\n");
    }

    #[test]
    fn save_writes_only_when_modified() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested/out.ts");
        let mut f = SourceFile::load_or_create(&path).unwrap();
        assert!(!f.save().unwrap());
        assert!(!path.exists());

        f.append_block("export const a = 1;").unwrap();
        assert!(f.save().unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "export const a = 1;\n");
        assert!(!f.save().unwrap());

        let reloaded = SourceFile::load(&path).unwrap();
        assert!(!reloaded.is_modified());
    }
}
