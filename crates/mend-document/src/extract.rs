//! Recover a workflow JSON object from a tool dump
//!
//! Dumps look like `Retrieved workflow: <name>\n\n{ ... }`, sometimes with
//! trailing chatter. The preamble form is tried first, then the outermost
//! `{ ... }` span.

use crate::document::WorkflowDocument;
use crate::error::{DocumentError, DocumentResult};

const PREAMBLE: &str = "Retrieved workflow: ";

/// Extract the document embedded in `dump`; `origin` names it in errors
///
/// # Errors
/// `NoJson` when no object is present; `Parse` when it does not parse.
pub fn extract_document(dump: &str, origin: &str) -> DocumentResult<WorkflowDocument> {
    if let Some(body) = after_preamble(dump) {
        if let Ok(doc) = WorkflowDocument::parse(body.trim(), origin) {
            return Ok(doc);
        }
    }
    let (Some(start), Some(end)) = (dump.find('{'), dump.rfind('}')) else {
        return Err(DocumentError::NoJson(origin.to_string()));
    };
    if end < start {
        return Err(DocumentError::NoJson(origin.to_string()));
    }
    WorkflowDocument::parse(&dump[start..=end], origin)
}

/// Text after `Retrieved workflow: <line>` and a blank line
fn after_preamble(dump: &str) -> Option<&str> {
    let at = dump.find(PREAMBLE)?;
    let rest = &dump[at + PREAMBLE.len()..];
    let line_end = rest.find('\n')?;
    let rest = &rest[line_end + 1..];
    rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))
}
