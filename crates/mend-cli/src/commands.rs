//! Subcommand drivers
//!
//! Each command turns its inputs into a [`RunReport`]. Per-unit errors land in
//! the report; only an unusable file set is returned as an error.

use mend_batch::{BatchEditor, BatchError, DocumentBatch, FileSet, TextNormalizer};
use mend_core::{RepairTable, RuleSet, RunReport};
use mend_document::{
    extract_document, rewrite_strings, DocumentIo, DocumentResult, KeyFilter, NodeSelector, PatchPlan,
};
use mend_remote::{push_document, PatchCycle, WorkflowRef, WorkflowStore, WRITABLE_KEYS};
use serde_json::Value;
use std::borrow::Cow;
use std::path::Path;

fn report_for(dry_run: bool) -> RunReport {
    if dry_run {
        RunReport::dry_run()
    } else {
        RunReport::new()
    }
}

/// Replace `parameters.<field>` of the selected node with `code`
///
/// When every selected node, `activeVersion` copies included, already holds
/// `code`, the document is reported unchanged and the file is not rewritten.
#[must_use]
pub fn set_code(doc_path: &Path, selector: &NodeSelector, field: &str, code: &str, dry_run: bool) -> RunReport {
    let mut report = report_for(dry_run);
    let unit = doc_path.display().to_string();
    match set_code_in(doc_path, selector, field, code, dry_run) {
        Ok(Some(written)) => {
            tracing::info!(document = %unit, %selector, field, written, dry_run, "code replaced");
            report.changed(unit, vec![format!("{selector}: {field}")]);
        }
        Ok(None) => {
            tracing::info!(document = %unit, %selector, field, "code already current");
            report.unchanged(unit);
        }
        Err(err) => {
            tracing::error!(document = %unit, error = %err, "set-code failed");
            report.failed(unit, err);
        }
    }
    report
}

fn set_code_in(
    doc_path: &Path,
    selector: &NodeSelector,
    field: &str,
    code: &str,
    dry_run: bool,
) -> DocumentResult<Option<usize>> {
    let io = DocumentIo::new();
    let mut doc = io.load(doc_path)?;
    let current: Vec<Option<&str>> = doc
        .all_nodes()
        .filter(|node| selector.matches(node))
        .map(|node| {
            node.get("parameters")
                .and_then(|p| p.get(field))
                .and_then(Value::as_str)
        })
        .collect();
    if !current.is_empty() && current.iter().all(|value| *value == Some(code)) {
        return Ok(None);
    }
    let written = doc.set_node_field(selector, field, code)?;
    if !dry_run {
        io.save(doc_path, &doc)?;
    }
    Ok(Some(written))
}

/// Repair mis-decoded UTF-8 in the strings `filter` selects
///
/// # Errors
/// Only when the file set cannot be resolved.
pub fn repair_encoding(files: &FileSet, filter: &KeyFilter, dry_run: bool) -> Result<RunReport, BatchError> {
    let table = RepairTable::canonical();
    DocumentBatch::new(DocumentIo::new())
        .dry_run(dry_run)
        .run(files, |doc| {
            let repaired = rewrite_strings(
                doc.root_mut(),
                |key, text| filter.accepts(key) && table.is_corrupted(text),
                |text| match table.repair(text) {
                    Cow::Owned(fixed) => Some(fixed),
                    Cow::Borrowed(_) => None,
                },
            );
            if repaired == 0 {
                Ok(Vec::new())
            } else {
                Ok(vec![format!("{repaired} strings repaired")])
            }
        })
}

/// Re-encode files as plain UTF-8
///
/// # Errors
/// Only when the file set cannot be resolved.
pub fn normalize_text(files: &FileSet, dry_run: bool) -> Result<RunReport, BatchError> {
    TextNormalizer::new().dry_run(dry_run).run(files)
}

/// Apply `rules` to every file of a site
///
/// # Errors
/// Only when the file set cannot be resolved.
pub fn edit_site(rules: RuleSet, files: &FileSet, dry_run: bool) -> Result<RunReport, BatchError> {
    if rules.is_empty() {
        tracing::warn!("no site rules configured; nothing will change");
    }
    BatchEditor::new(rules).dry_run(dry_run).run(files)
}

/// Apply `plan` to local workflow exports
///
/// # Errors
/// Only when the file set cannot be resolved.
pub fn patch_local(plan: &PatchPlan, files: &FileSet, dry_run: bool) -> Result<RunReport, BatchError> {
    DocumentBatch::new(DocumentIo::new())
        .dry_run(dry_run)
        .run(files, |doc| Ok(plan.apply(doc)?.changed_nodes))
}

/// Fetch, patch and store each workflow
pub async fn patch_remote<S: WorkflowStore>(
    store: S,
    plan: PatchPlan,
    workflows: &[WorkflowRef],
    dry_run: bool,
) -> RunReport {
    PatchCycle::new(store, plan)
        .dry_run(dry_run)
        .run_all(workflows)
        .await
}

/// Upload a local export under `id`
pub async fn push<S>(store: &S, file: &Path, id: &str, dry_run: bool) -> RunReport
where
    S: WorkflowStore + ?Sized,
{
    let mut report = report_for(dry_run);
    let unit = format!("{} -> {id}", file.display());
    let doc = match DocumentIo::new().load(file) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::error!(document = %unit, error = %err, "push failed");
            report.failed(unit, err);
            return report;
        }
    };
    let sent: Vec<String> = WRITABLE_KEYS
        .iter()
        .filter(|key| doc.root().get(**key).is_some())
        .map(|key| (*key).to_string())
        .collect();
    if dry_run {
        tracing::info!(document = %unit, keys = ?sent, "dry run, not pushing");
        report.changed(unit, sent);
        return report;
    }
    match push_document(store, id, &doc).await {
        Ok(()) => report.changed(unit, sent),
        Err(err) => {
            tracing::error!(document = %unit, error = %err, "push failed");
            report.failed(unit, err);
        }
    }
    report
}

/// Recover the workflow embedded in `dump` and write it to `out`
#[must_use]
pub fn extract(dump: &Path, out: &Path, dry_run: bool) -> RunReport {
    let mut report = report_for(dry_run);
    let unit = out.display().to_string();
    let io = DocumentIo::new();
    let result = io.read_text(dump).and_then(|text| {
        let doc = extract_document(&text, &dump.display().to_string())?;
        let rendered = doc.to_pretty_string()?;
        if std::fs::read_to_string(out).is_ok_and(|existing| existing == rendered) {
            return Ok(None);
        }
        if !dry_run {
            io.save(out, &doc)?;
        }
        Ok(Some(doc.name().unwrap_or("<unnamed>").to_string()))
    });
    match result {
        Ok(Some(name)) => {
            tracing::info!(from = %dump.display(), to = %unit, workflow = %name, dry_run, "workflow extracted");
            report.changed(unit, vec![name]);
        }
        Ok(None) => report.unchanged(unit),
        Err(err) => {
            tracing::error!(from = %dump.display(), error = %err, "extract failed");
            report.failed(unit, err);
        }
    }
    report
}
