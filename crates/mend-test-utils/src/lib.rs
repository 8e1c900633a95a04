//! Testing utilities for mend workspace
//!
//! Shared workflow fixtures and filesystem helpers.

#![allow(missing_docs)]

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prompt code in the shape the workflow code nodes use
pub const PROMPT_CODE: &str = r#"const item = $input.first().json;
const imageList = [
  'https://images.unsplash.com/a.jpg',
  'https://images.unsplash.com/b.jpg'
].join('\n');
const userPrompt =
  'RESPONDE con JSON:\n' +
  '{\n' +
  '  "title": "Titulo SEO max 60 chars",\n' +
  '  "image_url": "Elige URL segun categoria:\n' + imageList + '\nNUNCA uses photo-XXXX.",\n' +
  '  "region": "Sierra|Costa"\n' +
  '}\n';
return [{ json: { prompt: userPrompt, item } }];
"#;

/// Two code nodes `a` (`X`) and `b` (`Y`)
pub fn two_node_workflow() -> Value {
    json!({
        "name": "two nodes",
        "nodes": [
            { "id": "a", "name": "Alpha", "type": "n8n-nodes-base.code", "parameters": { "jsCode": "X" } },
            { "id": "b", "name": "Beta", "type": "n8n-nodes-base.code", "parameters": { "jsCode": "Y" } }
        ],
        "connections": {}
    })
}

/// Workflow as returned by the API: server fields plus an `activeVersion` copy
pub fn prompt_workflow() -> Value {
    let nodes = json!([
        { "id": "trigger", "name": "Cron", "type": "n8n-nodes-base.scheduleTrigger", "parameters": {} },
        { "id": "preparar-prompt", "name": "Preparar Prompt Receta", "type": "n8n-nodes-base.code",
          "parameters": { "jsCode": PROMPT_CODE } },
        { "id": "llm", "name": "Generar Articulo", "type": "n8n-nodes-base.httpRequest",
          "parameters": { "jsonBody": "={\"model\": \"gpt\"}" } }
    ]);
    json!({
        "id": "wf-recipes",
        "name": "Recetas",
        "active": true,
        "createdAt": "2025-01-05T10:00:00.000Z",
        "updatedAt": "2025-01-06T10:00:00.000Z",
        "nodes": nodes.clone(),
        "connections": { "Cron": { "main": [[{ "node": "Preparar Prompt Receta", "type": "main", "index": 0 }]] } },
        "settings": { "executionOrder": "v1" },
        "staticData": null,
        "activeVersion": { "versionId": "v7", "nodes": nodes }
    })
}

/// Workflow whose strings carry mis-decoded UTF-8
pub fn corrupted_workflow() -> Value {
    json!({
        "name": "Turismo",
        "nodes": [
            { "id": "t1", "name": "Preparar Prompt Turismo", "parameters": {
                "jsCode": "// Gu\u{c3}\u{ad}a de viaje\nconst t = 'art\u{c3}\u{ad}culo';",
                "notes": "informaci\u{c3}\u{b3}n"
            } },
            { "id": "t2", "name": "Llamar API", "parameters": {
                "jsonBody": "={\"q\": \"\u{c2}\u{bf}Qu\u{c3}\u{a9}?\"}",
                "tags": ["espa\u{c3}\u{b1}ol"]
            } }
        ]
    })
}

/// Pretty JSON with trailing newline, as the document writer produces it
pub fn to_pretty(value: &Value) -> String {
    let mut text = serde_json::to_string_pretty(value).unwrap();
    text.push('\n');
    text
}

/// Write `value` as pretty JSON under `dir`
pub fn write_fixture(dir: &Path, name: &str, value: &Value) -> PathBuf {
    write_text(dir, name, &to_pretty(value))
}

/// Write raw text under `dir`
pub fn write_text(dir: &Path, name: &str, text: &str) -> PathBuf {
    write_bytes(dir, name, text.as_bytes())
}

/// Write raw bytes under `dir`
pub fn write_bytes(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Fresh temporary directory
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Read a JSON file back into a value
pub fn read_json(path: &Path) -> Value {
    let text = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&text).unwrap()
}
