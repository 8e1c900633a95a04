//! Static file-set batch editor
//!
//! Each file is read whole, run through the rule set and written back only
//! if the text changed. One bad file never stops the batch.

use crate::error::BatchError;
use crate::fileset::FileSet;
use mend_core::{RuleSet, RunReport};
use mend_document::write_atomic;
use std::path::Path;

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Rewritten (unless dry run); names of the rules that fired
    Changed(Vec<String>),
    /// No rule matched
    Unchanged,
}

/// Applies one rule set to every file of a set
#[derive(Debug, Clone)]
pub struct BatchEditor {
    rules: RuleSet,
    dry_run: bool,
}

impl BatchEditor {
    /// Editor for `rules`
    #[must_use]
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            dry_run: false,
        }
    }

    /// Transform but never write
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Edit one file
    ///
    /// # Errors
    /// Read, UTF-8 decoding or write failure.
    pub fn edit_file(&self, path: &Path) -> Result<FileOutcome, BatchError> {
        let bytes = std::fs::read(path).map_err(|e| BatchError::io_error(path, e))?;
        let text = std::str::from_utf8(&bytes).map_err(|e| {
            BatchError::encoding_error(
                path,
                mend_core::DecodeError::InvalidUtf8 {
                    valid_up_to: e.valid_up_to(),
                },
            )
        })?;
        let outcome = self.rules.apply(text);
        if !outcome.changed {
            return Ok(FileOutcome::Unchanged);
        }
        if !self.dry_run {
            write_atomic(path, outcome.text.as_bytes())?;
        }
        Ok(FileOutcome::Changed(outcome.fired))
    }

    /// Edit every file, collecting outcomes
    ///
    /// # Errors
    /// Only when the file set itself cannot be resolved.
    pub fn run(&self, files: &FileSet) -> Result<RunReport, BatchError> {
        let paths = files.resolve()?;
        let mut report = if self.dry_run {
            RunReport::dry_run()
        } else {
            RunReport::new()
        };
        for path in &paths {
            let unit = path.display().to_string();
            match self.edit_file(path) {
                Ok(FileOutcome::Changed(fired)) => {
                    tracing::info!(file = %unit, rules = ?fired, dry_run = self.dry_run, "file updated");
                    report.changed(unit, fired);
                }
                Ok(FileOutcome::Unchanged) => {
                    tracing::debug!(file = %unit, "no change");
                    report.unchanged(unit);
                }
                Err(err) => {
                    tracing::error!(file = %unit, error = %err, "file failed");
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
    use mend_core::ReplacementRule;
    use mend_test_utils::{temp_dir, write_bytes, write_text};

    fn navy() -> RuleSet {
        RuleSet::new().with(ReplacementRule::literal("navy", "#0033A0", "#14213D").unwrap())
    }

    #[test]
    fn changed_file_is_rewritten() {
        let dir = temp_dir();
        let path = write_text(dir.path(), "a.html", "<p style=\"color:#0033A0\">");
        let outcome = BatchEditor::new(navy()).edit_file(&path).unwrap();
        assert_eq!(outcome, FileOutcome::Changed(vec!["navy".into()]));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "<p style=\"color:#14213D\">"
        );
    }

    #[test]
    fn dry_run_leaves_file() {
        let dir = temp_dir();
        let path = write_text(dir.path(), "a.html", "#0033A0");
        let editor = BatchEditor::new(navy()).dry_run(true);
        assert!(matches!(editor.edit_file(&path).unwrap(), FileOutcome::Changed(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "#0033A0");
    }

    #[cfg(unix)]
    #[test]
    fn edited_file_keeps_its_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = temp_dir();
        let path = write_text(dir.path(), "index.html", "<p style=\"color:#0033A0\">");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let outcome = BatchEditor::new(navy()).edit_file(&path).unwrap();
        assert!(matches!(outcome, FileOutcome::Changed(_)));
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn invalid_utf8_is_an_encoding_error() {
        let dir = temp_dir();
        let path = write_bytes(dir.path(), "latin1.html", b"caf\xe9 #0033A0");
        let err = BatchEditor::new(navy()).edit_file(&path).unwrap_err();
        assert!(matches!(err, BatchError::Encoding { .. }));
        assert_eq!(std::fs::read(&path).unwrap(), b"caf\xe9 #0033A0");
    }

    #[test]
    fn failures_do_not_stop_the_batch() {
        let dir = temp_dir();
        let bad = write_bytes(dir.path(), "a.html", b"\xff\xfe\xfd");
        let good = write_text(dir.path(), "b.html", "#0033A0");
        let set = FileSet::explicit([bad, good.clone()]);
        let report = BatchEditor::new(navy()).run(&set).unwrap();
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.changed_count(), 1);
        assert_eq!(std::fs::read_to_string(&good).unwrap(), "#14213D");
    }
}
