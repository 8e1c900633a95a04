//! Outbound payload for workflow updates
//!
//! The API rejects server-assigned fields on PUT, so only writable top-level
//! keys are sent.

use serde_json::{Map, Value};

/// Top-level keys accepted on update, in output order
pub const WRITABLE_KEYS: &[&str] = &["name", "nodes", "connections", "settings", "staticData", "meta"];

/// Copy the writable keys of `doc`; `settings` defaults to `{}`
#[must_use]
pub fn outbound_payload(doc: &Value) -> Value {
    let mut out = Map::new();
    for key in WRITABLE_KEYS {
        if let Some(value) = doc.get(*key) {
            out.insert((*key).to_string(), value.clone());
        }
    }
    out.entry("settings")
        .or_insert_with(|| Value::Object(Map::new()));
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mend_test_utils::prompt_workflow;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn strips_server_fields() {
        let payload = outbound_payload(&prompt_workflow());
        let keys: Vec<_> = payload.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["name", "nodes", "connections", "settings", "staticData"]);
        assert_eq!(payload["settings"], json!({ "executionOrder": "v1" }));
    }

    #[test]
    fn settings_default_to_empty_object() {
        let payload = outbound_payload(&json!({ "id": "x", "name": "n", "nodes": [], "active": false }));
        assert_eq!(payload, json!({ "name": "n", "nodes": [], "settings": {} }));
    }
}
