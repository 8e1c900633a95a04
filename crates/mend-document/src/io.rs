//! Document ingress and egress
//!
//! [`DocumentIo`] is the only place documents touch the filesystem:
//! - read (size limit, BOM-aware decoding, JSON parse)
//! - write (pretty JSON through [`write_atomic`])

use crate::document::WorkflowDocument;
use crate::error::{DocumentError, DocumentResult};
use mend_core::decode_text;
use std::io::Write;
use std::path::Path;

/// Filesystem boundary for workflow documents
#[derive(Debug, Clone, Copy)]
pub struct DocumentIo {
    /// Maximum file size to read (bytes)
    max_file_size: u64,
}

impl Default for DocumentIo {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentIo {
    /// Reader with the default 10MB limit
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10MB
        }
    }

    /// Override the size limit
    #[inline]
    #[must_use]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Read a file as text, accepting UTF-8 or BOM-marked UTF-16
    ///
    /// # Errors
    /// IO, size limit or decoding failure.
    pub fn read_text(&self, path: &Path) -> DocumentResult<String> {
        let size = std::fs::metadata(path)
            .map_err(|e| DocumentError::io_error(path, e))?
            .len();
        if size > self.max_file_size {
            return Err(DocumentError::TooLarge {
                path: path.to_path_buf(),
                size,
                max: self.max_file_size,
            });
        }
        let bytes = std::fs::read(path).map_err(|e| DocumentError::io_error(path, e))?;
        let decoded = decode_text(&bytes).map_err(|e| DocumentError::encoding_error(path, e))?;
        Ok(decoded.text)
    }

    /// Load and parse a document
    ///
    /// # Errors
    /// See [`Self::read_text`]; `Parse` when the text is not JSON.
    pub fn load(&self, path: &Path) -> DocumentResult<WorkflowDocument> {
        let text = self.read_text(path)?;
        let doc = WorkflowDocument::parse(&text, &path.display().to_string())?;
        tracing::debug!(path = %path.display(), bytes = text.len(), "document loaded");
        Ok(doc)
    }

    /// Serialize and atomically replace `path`
    ///
    /// # Errors
    /// Serialization or IO failure; on error the old file is intact.
    pub fn save(&self, path: &Path, doc: &WorkflowDocument) -> DocumentResult<()> {
        let text = doc.to_pretty_string()?;
        write_atomic(path, text.as_bytes())?;
        tracing::debug!(path = %path.display(), bytes = text.len(), "document saved");
        Ok(())
    }
}

/// Write `bytes` to a temporary file beside `path`, then rename over it
///
/// An existing target keeps its permissions.
///
/// # Errors
/// `DocumentError::Io` for the temporary file or the rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> DocumentResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp =
        tempfile::NamedTempFile::new_in(dir).map_err(|e| DocumentError::io_error(dir, e))?;
    tmp.write_all(bytes)
        .map_err(|e| DocumentError::io_error(tmp.path(), e))?;
    // an overwrite keeps the target's access mode
    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(|e| DocumentError::io_error(tmp.path(), e))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| DocumentError::io_error(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| DocumentError::io_error(path, e.error))?;
    Ok(())
}
