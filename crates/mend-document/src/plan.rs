//! Field-level code edits applied to a document

use crate::document::{NodeSelector, WorkflowDocument};
use crate::error::DocumentResult;
use mend_core::RuleSet;

/// Default node parameter holding embedded code
pub const DEFAULT_CODE_FIELD: &str = "jsCode";

/// Rules for one field of the selected nodes
#[derive(Debug, Clone)]
pub struct CodeEdit {
    /// Which nodes
    pub selector: NodeSelector,
    /// Which `parameters` entry
    pub field: String,
    /// What to do to it
    pub rules: RuleSet,
}

impl CodeEdit {
    /// Edit of the default code field
    #[must_use]
    pub fn new(selector: NodeSelector, rules: RuleSet) -> Self {
        Self {
            selector,
            field: DEFAULT_CODE_FIELD.to_string(),
            rules,
        }
    }

    /// Target another field
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }
}

/// What a plan changed in one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanOutcome {
    /// Nodes whose field changed, in edit order
    pub changed_nodes: Vec<String>,
    /// Rules that fired, in edit order
    pub fired: Vec<String>,
}

impl PlanOutcome {
    /// Whether the document changed
    #[inline]
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.changed_nodes.is_empty()
    }
}

/// Ordered code edits
#[derive(Debug, Clone, Default)]
pub struct PatchPlan {
    edits: Vec<CodeEdit>,
}

impl PatchPlan {
    /// Plan from edits
    #[must_use]
    pub fn new(edits: Vec<CodeEdit>) -> Self {
        Self { edits }
    }

    /// Number of edits
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Whether the plan has no edits
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Apply every edit to `doc` in memory
    ///
    /// A selector that matches nothing is not an error.
    ///
    /// # Errors
    /// `MissingNodes` when the document has no node collection.
    pub fn apply(&self, doc: &mut WorkflowDocument) -> DocumentResult<PlanOutcome> {
        let mut outcome = PlanOutcome::default();
        for edit in &self.edits {
            let mut fired = Vec::new();
            let nodes = doc.edit_node_fields(&edit.selector, &edit.field, |code| {
                let patched = edit.rules.apply(code);
                if !patched.changed {
                    return None;
                }
                fired.extend(patched.fired);
                Some(patched.text)
            })?;
            if nodes.is_empty() {
                tracing::debug!(selector = %edit.selector, field = %edit.field, "no change");
                continue;
            }
            for node in nodes {
                if !outcome.changed_nodes.contains(&node) {
                    outcome.changed_nodes.push(node);
                }
            }
            for name in fired {
                if !outcome.fired.contains(&name) {
                    outcome.fired.push(name);
                }
            }
        }
        Ok(outcome)
    }
}
