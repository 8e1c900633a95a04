//! Re-encode text files as plain UTF-8
//!
//! UTF-16 (either byte order, BOM-marked) is decoded and a UTF-8 BOM is
//! dropped. Files that are already plain UTF-8 are not touched.

use crate::error::BatchError;
use crate::fileset::FileSet;
use mend_core::{decode_text, RunReport, SourceEncoding};
use mend_document::write_atomic;
use std::path::Path;

/// Batch UTF-8 normalizer
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer {
    dry_run: bool,
}

impl TextNormalizer {
    /// Normalizer that writes
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode but never write
    #[inline]
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Normalize one file; returns the encoding it was converted from
    ///
    /// # Errors
    /// Read, decode or write failure.
    pub fn normalize_file(&self, path: &Path) -> Result<Option<SourceEncoding>, BatchError> {
        let bytes = std::fs::read(path).map_err(|e| BatchError::io_error(path, e))?;
        let decoded = decode_text(&bytes).map_err(|e| BatchError::encoding_error(path, e))?;
        if !decoded.needs_rewrite() {
            return Ok(None);
        }
        if !self.dry_run {
            write_atomic(path, decoded.text.as_bytes())?;
        }
        Ok(Some(decoded.source))
    }

    /// Normalize every file, collecting outcomes
    ///
    /// # Errors
    /// Only when the file set itself cannot be resolved.
    pub fn run(&self, files: &FileSet) -> Result<RunReport, BatchError> {
        let mut report = if self.dry_run {
            RunReport::dry_run()
        } else {
            RunReport::new()
        };
        for path in files.resolve()? {
            let unit = path.display().to_string();
            match self.normalize_file(&path) {
                Ok(Some(source)) => {
                    tracing::info!(file = %unit, from = ?source, "re-encoded as UTF-8");
                    report.changed(unit, vec![format!("from {source:?}")]);
                }
                Ok(None) => report.unchanged(unit),
                Err(err) => {
                    tracing::error!(file = %unit, error = %err, "file failed");
                    report.failed(unit, err);
                }
            }
        }
        Ok(report)
    }
}
