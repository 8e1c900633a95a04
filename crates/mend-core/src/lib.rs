//! mend core
//!
//! Text-level building blocks shared by every mend driver.
//!
//! # Core Concepts
//!
//! - [`ReplacementRule`]: literal or regex substitution with optional guards
//! - [`RuleSet`]: ordered edits applied to an accumulated result
//! - [`RepairTable`]: canonical, idempotent mis-decoding repairs
//! - [`FieldRemoval`]: structural removal of one field from a concatenated prompt
//! - [`RunReport`]: collect-and-continue outcome ledger
//!
//! # Example
//!
//! ```rust
//! use mend_core::{RepairTable, ReplacementRule, RuleSet};
//!
//! let table = RepairTable::canonical();
//! assert_eq!(table.repair("art\u{c3}\u{ad}culo"), "artículo");
//!
//! let rules = RuleSet::new()
//!     .with(ReplacementRule::literal("navy", "#0033A0", "#14213D").unwrap());
//! let outcome = rules.apply("color: #0033A0");
//! assert!(outcome.changed);
//! ```

#![warn(unreachable_pub)]

pub mod encoding;
pub mod error;
pub mod presets;
pub mod report;
pub mod rule;
pub mod template;

pub use encoding::{decode_text, DecodedText, RepairTable, SourceEncoding};
pub use error::{DecodeError, RuleError};
pub use presets::{preset, presets, PRESET_NAMES};
pub use report::{RunReport, UnitOutcome, UnitStatus};
pub use rule::{compile_specs, Edit, Guard, PatchOutcome, Pattern, ReplacementRule, RuleKind, RuleSet, RuleSpec};
pub use template::{ConcatTemplate, FieldRemoval};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
