//! Workflow documents for mend
//!
//! Load, walk, patch and atomically save JSON workflow exports.
//!
//! # Core Concepts
//!
//! - [`WorkflowDocument`]: the whole export as an order-preserving JSON tree
//! - [`NodeSelector`]: pick nodes by id, name or name fragment
//! - [`rewrite_strings`]: recursive keyed string rewriting
//! - [`PatchPlan`]: rule sets bound to node fields
//! - [`DocumentIo`]: size-limited reads and temp-then-rename writes

pub mod document;
pub mod error;
pub mod extract;
pub mod io;
pub mod plan;
pub mod walker;

pub use document::{NodeSelector, WorkflowDocument};
pub use error::{DocumentError, DocumentResult};
pub use extract::extract_document;
pub use io::{write_atomic, DocumentIo};
pub use plan::{CodeEdit, PatchPlan, PlanOutcome, DEFAULT_CODE_FIELD};
pub use walker::{rewrite_strings, KeyFilter};
