//! Per-unit outcomes and the end-of-run summary
//!
//! Every driver (file batch, document batch, remote cycle) records one
//! [`UnitOutcome`] per file or document. Failures never abort the run; they
//! are collected here and reported at the end.

use std::fmt;

/// What happened to one unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStatus {
    /// Content was rewritten (or would be, in a dry run)
    Changed {
        /// Edits or nodes that produced the change
        detail: Vec<String>,
    },
    /// Nothing matched; nothing written
    Unchanged,
    /// Deliberately not processed
    Skipped(String),
    /// Processing failed; nothing written
    Failed(String),
}

/// Outcome for a named unit (path or document id)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOutcome {
    /// Path or document id
    pub unit: String,
    /// Result
    pub status: UnitStatus,
}

/// Collected outcomes of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    outcomes: Vec<UnitOutcome>,
    dry_run: bool,
}

impl RunReport {
    /// Empty report
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty report flagged as dry run
    #[inline]
    #[must_use]
    pub fn dry_run() -> Self {
        Self {
            outcomes: Vec::new(),
            dry_run: true,
        }
    }

    /// Whether nothing was written
    #[inline]
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Record an outcome
    pub fn record(&mut self, unit: impl Into<String>, status: UnitStatus) {
        self.outcomes.push(UnitOutcome {
            unit: unit.into(),
            status,
        });
    }

    /// Record a change
    pub fn changed(&mut self, unit: impl Into<String>, detail: Vec<String>) {
        self.record(unit, UnitStatus::Changed { detail });
    }

    /// Record a no-op
    pub fn unchanged(&mut self, unit: impl Into<String>) {
        self.record(unit, UnitStatus::Unchanged);
    }

    /// Record a skip
    pub fn skipped(&mut self, unit: impl Into<String>, reason: impl Into<String>) {
        self.record(unit, UnitStatus::Skipped(reason.into()));
    }

    /// Record a failure
    pub fn failed(&mut self, unit: impl Into<String>, error: impl fmt::Display) {
        self.record(unit, UnitStatus::Failed(error.to_string()));
    }

    /// Append another report's outcomes
    pub fn merge(&mut self, other: RunReport) {
        self.outcomes.extend(other.outcomes);
    }

    /// All outcomes in processing order
    #[inline]
    #[must_use]
    pub fn outcomes(&self) -> &[UnitOutcome] {
        &self.outcomes
    }

    /// Number of changed units
    #[must_use]
    pub fn changed_count(&self) -> usize {
        self.count(|s| matches!(s, UnitStatus::Changed { .. }))
    }

    /// Number of unchanged units
    #[must_use]
    pub fn unchanged_count(&self) -> usize {
        self.count(|s| matches!(s, UnitStatus::Unchanged))
    }

    /// Number of skipped units
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(|s| matches!(s, UnitStatus::Skipped(_)))
    }

    /// Number of failed units
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(|s| matches!(s, UnitStatus::Failed(_)))
    }

    /// Whether any unit failed
    #[inline]
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }

    /// Failed units with their messages
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            UnitStatus::Failed(msg) => Some((o.unit.as_str(), msg.as_str())),
            _ => None,
        })
    }

    /// One-line count summary
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "{}{} changed, {} unchanged, {} skipped, {} failed",
            if self.dry_run { "[dry run] " } else { "" },
            self.changed_count(),
            self.unchanged_count(),
            self.skipped_count(),
            self.failed_count()
        )
    }

    fn count(&self, pred: impl Fn(&UnitStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            match &outcome.status {
                UnitStatus::Changed { detail } if detail.is_empty() => {
                    writeln!(f, "  changed    {}", outcome.unit)?;
                }
                UnitStatus::Changed { detail } => {
                    writeln!(f, "  changed    {} ({})", outcome.unit, detail.join(", "))?;
                }
                UnitStatus::Unchanged => writeln!(f, "  unchanged  {}", outcome.unit)?,
                UnitStatus::Skipped(reason) => {
                    writeln!(f, "  skipped    {}: {reason}", outcome.unit)?;
                }
                UnitStatus::Failed(msg) => writeln!(f, "  FAILED     {}: {msg}", outcome.unit)?,
            }
        }
        write!(f, "{}", self.summary_line())
    }
}
