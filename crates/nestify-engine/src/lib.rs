//! Migration engine: turns Express handler-style routes into a NestJS
//! Service/Controller pair.
//!
//! The engine is single-threaded. Each step loads the files it touches,
//! mutates them in memory through byte-range edits, and persists them
//! together at the end of the step.

pub mod annotate;
pub mod components;
pub mod imports;
pub mod pipeline;
pub mod rewrite;
pub mod routes;
pub mod syntax;

pub use pipeline::{MigrationContext, MigrationStep, Migrator, StepReport};
