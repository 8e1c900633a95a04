//! Fetch → patch → store cycle
//!
//! One document at a time: GET, apply the plan in memory and PUT only when
//! something changed. Failures are local to the document.

use crate::error::RemoteResult;
use crate::payload::outbound_payload;
use crate::store::WorkflowStore;
use mend_core::RunReport;
use mend_document::{PatchPlan, PlanOutcome, WorkflowDocument};
use serde::Deserialize;
use std::fmt;

/// Configured remote document
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowRef {
    /// Server id
    pub id: String,
    /// Label for reports
    #[serde(default)]
    pub name: Option<String>,
}

impl WorkflowRef {
    /// Reference by id only
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

impl fmt::Display for WorkflowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} ({})", self.id),
            None => f.write_str(&self.id),
        }
    }
}

/// Runs a [`PatchPlan`] against remote documents
#[derive(Debug)]
pub struct PatchCycle<S> {
    store: S,
    plan: PatchPlan,
    dry_run: bool,
}

impl<S: WorkflowStore> PatchCycle<S> {
    /// Cycle over `store`
    #[must_use]
    pub fn new(store: S, plan: PatchPlan) -> Self {
        Self {
            store,
            plan,
            dry_run: false,
        }
    }

    /// Fetch and patch but never PUT
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Underlying store
    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Patch one document
    ///
    /// # Errors
    /// GET failure, an uneditable document, or PUT failure (with status and
    /// body). The edited copy is dropped on error.
    pub async fn run_one(&self, id: &str) -> RemoteResult<PlanOutcome> {
        let mut doc = WorkflowDocument::from_value(self.store.fetch(id).await?);
        let outcome = self.plan.apply(&mut doc)?;
        if !outcome.changed() {
            return Ok(outcome);
        }
        if !self.dry_run {
            let payload = outbound_payload(doc.root());
            self.store.store(id, &payload).await?;
        }
        Ok(outcome)
    }

    /// Patch every document in order, collecting outcomes
    pub async fn run_all(&self, workflows: &[WorkflowRef]) -> RunReport {
        let mut report = if self.dry_run {
            RunReport::dry_run()
        } else {
            RunReport::new()
        };
        for workflow in workflows {
            let unit = workflow.to_string();
            match self.run_one(&workflow.id).await {
                Ok(outcome) if outcome.changed() => {
                    tracing::info!(
                        workflow = %unit,
                        nodes = ?outcome.changed_nodes,
                        rules = ?outcome.fired,
                        dry_run = self.dry_run,
                        "workflow updated"
                    );
                    report.changed(unit, outcome.changed_nodes);
                }
                Ok(_) => {
                    tracing::info!(workflow = %unit, "no change, skipping PUT");
                    report.unchanged(unit);
                }
                Err(err) => {
                    tracing::error!(workflow = %unit, error = %err, "workflow failed");
                    report.failed(unit, err);
                }
            }
        }
        report
    }
}

/// Upload a local document under `id`, stripped to its writable keys
///
/// # Errors
/// PUT failure.
pub async fn push_document<S>(store: &S, id: &str, doc: &WorkflowDocument) -> RemoteResult<()>
where
    S: WorkflowStore + ?Sized,
{
    let payload = outbound_payload(doc.root());
    store.store(id, &payload).await?;
    tracing::info!(workflow = id, "document pushed");
    Ok(())
}
