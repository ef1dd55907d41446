//! Request and response rewriting inside migrated Service methods.

pub mod chain;
pub mod classify;
pub mod request;
pub mod response;
pub mod status;
pub mod types;

pub use classify::{AccessClassifier, AccessPath, DefaultClassifier, FieldGroup};
pub use request::{rewrite_requests, RequestRewriteOutcome};
pub use response::{rewrite_error_responses, rewrite_success_responses, ResponseRewriteOutcome};
pub use types::{LocalTypeOracle, TypeOracle};
