//! Remote workflow patching for mend
//!
//! `GET {base}/{id}` → apply a [`mend_document::PatchPlan`] in memory →
//! `PUT {base}/{id}` only when something changed.
//!
//! # Core Concepts
//!
//! - [`WorkflowStore`]: async fetch/store seam (mocked in tests)
//! - [`HttpWorkflowStore`]: `reqwest` implementation with token header and timeout
//! - [`PatchCycle`]: per-document cycle with collect-and-continue reporting
//! - [`outbound_payload`]: strip server-assigned fields before PUT

pub mod cycle;
pub mod error;
pub mod payload;
pub mod store;

pub use cycle::{push_document, PatchCycle, WorkflowRef};
pub use error::{RemoteError, RemoteResult};
pub use payload::{outbound_payload, WRITABLE_KEYS};
pub use store::{HttpWorkflowStore, RemoteConfig, WorkflowStore, DEFAULT_AUTH_HEADER, DEFAULT_TIMEOUT};
