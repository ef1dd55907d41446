//! Syntax tree access layer.
//!
//! TypeScript sources are parsed with tree-sitter. Mutation is expressed as
//! byte-range `TextEdit`s applied to the source text, followed by a re-parse,
//! so node handles never outlive an edit.

pub mod error_tolerant;
pub mod nodes;
pub mod printer;
pub mod source_file;
pub mod text;

pub use source_file::{SourceFile, TextEdit};
