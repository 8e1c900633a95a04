//! Batch driver over JSON workflow documents

use crate::fileset::FileSet;
use crate::error::BatchError;
use mend_document::{DocumentError, DocumentIo, WorkflowDocument};
use mend_core::RunReport;

/// Loads, edits and saves documents one at a time
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentBatch {
    io: DocumentIo,
    dry_run: bool,
}

impl DocumentBatch {
    /// Driver over `io`
    #[inline]
    #[must_use]
    pub fn new(io: DocumentIo) -> Self {
        Self { io, dry_run: false }
    }

    /// Edit but never save
    #[inline]
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Apply `edit` to every document
    ///
    /// `edit` returns labels of what changed; an empty list means the document
    /// is left as it is on disk. A failing document is reported and skipped.
    ///
    /// # Errors
    /// Only when the file set itself cannot be resolved.
    pub fn run<F>(&self, files: &FileSet, mut edit: F) -> Result<RunReport, BatchError>
    where
        F: FnMut(&mut WorkflowDocument) -> Result<Vec<String>, DocumentError>,
    {
        let mut report = if self.dry_run {
            RunReport::dry_run()
        } else {
            RunReport::new()
        };
        for path in files.resolve()? {
            let unit = path.display().to_string();
            let result = self.io.load(&path).and_then(|mut doc| {
                let changed = edit(&mut doc)?;
                if !changed.is_empty() && !self.dry_run {
                    self.io.save(&path, &doc)?;
                }
                Ok(changed)
            });
            match result {
                Ok(changed) if changed.is_empty() => {
                    tracing::debug!(document = %unit, "no change");
                    report.unchanged(unit);
                }
                Ok(changed) => {
                    tracing::info!(document = %unit, changed = ?changed, dry_run = self.dry_run, "document updated");
                    report.changed(unit, changed);
                }
                Err(err) => {
                    tracing::error!(document = %unit, error = %err, "document failed");
                    report.failed(unit, err);
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mend_document::NodeSelector;
    use mend_test_utils::{temp_dir, two_node_workflow, write_fixture, write_text};

    #[test]
    fn edits_and_saves_changed_documents() {
        let dir = temp_dir();
        let path = write_fixture(dir.path(), "wf.json", &two_node_workflow());
        let report = DocumentBatch::default()
            .run(&FileSet::explicit([path.clone()]), |doc| {
                doc.set_node_field(&NodeSelector::Id("b".into()), "jsCode", "W")?;
                Ok(vec!["Beta".into()])
            })
            .unwrap();
        assert_eq!(report.changed_count(), 1);
        let saved = mend_test_utils::read_json(&path);
        assert_eq!(saved["nodes"][1]["parameters"]["jsCode"], "W");
    }

    #[test]
    fn parse_failure_is_reported_and_file_kept() {
        let dir = temp_dir();
        let bad = write_text(dir.path(), "bad.json", "{ nope");
        let good = write_fixture(dir.path(), "good.json", &two_node_workflow());
        let report = DocumentBatch::default()
            .run(&FileSet::explicit([bad.clone(), good]), |_| Ok(Vec::new()))
            .unwrap();
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.unchanged_count(), 1);
        assert_eq!(std::fs::read_to_string(&bad).unwrap(), "{ nope");
    }
}
