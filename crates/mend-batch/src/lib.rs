//! Batch drivers for mend
//!
//! Every driver walks a [`FileSet`] one file at a time and records a
//! [`mend_core::RunReport`] entry per file. A failing file is reported and
//! skipped; only an unresolvable file set aborts the run.
//!
//! - [`BatchEditor`]: rule set over text files (static sites)
//! - [`TextNormalizer`]: UTF-16 / BOM files to plain UTF-8
//! - [`DocumentBatch`]: load, edit and save JSON workflow documents

pub mod documents;
pub mod editor;
pub mod error;
pub mod fileset;
pub mod normalize;

pub use documents::DocumentBatch;
pub use editor::{BatchEditor, FileOutcome};
pub use error::BatchError;
pub use fileset::FileSet;
pub use normalize::TextNormalizer;
