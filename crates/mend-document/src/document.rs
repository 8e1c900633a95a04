//! Workflow document model
//!
//! A [`WorkflowDocument`] is the whole JSON export held as a `serde_json`
//! value. Key order survives a load/save round trip (`preserve_order`).
//! Nodes live in the top-level `nodes` array and, for documents fetched from
//! the API, in a second copy under `activeVersion.nodes`; node edits touch both.

use crate::error::{DocumentError, DocumentResult};
use serde_json::Value;
use std::fmt;

/// How a node is picked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSelector {
    /// Exact `id`
    Id(String),
    /// Exact `name`
    Name(String),
    /// `name` containing a substring
    NameContains(String),
    /// Exact `id` or exact `name`
    IdOrName(String),
}

impl NodeSelector {
    /// Whether `node` is selected
    #[must_use]
    pub fn matches(&self, node: &Value) -> bool {
        let id = node.get("id").and_then(Value::as_str);
        let name = node.get("name").and_then(Value::as_str);
        match self {
            Self::Id(want) => id == Some(want.as_str()),
            Self::Name(want) => name == Some(want.as_str()),
            Self::NameContains(part) => name.is_some_and(|n| n.contains(part.as_str())),
            Self::IdOrName(want) => id == Some(want.as_str()) || name == Some(want.as_str()),
        }
    }
}

impl fmt::Display for NodeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id '{id}'"),
            Self::Name(name) => write!(f, "name '{name}'"),
            Self::NameContains(part) => write!(f, "name containing '{part}'"),
            Self::IdOrName(key) => write!(f, "id or name '{key}'"),
        }
    }
}

/// JSON workflow export
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowDocument {
    root: Value,
}

impl WorkflowDocument {
    /// Parse document text; `origin` names the source in errors
    ///
    /// # Errors
    /// `DocumentError::Parse` if `text` is not valid JSON.
    pub fn parse(text: &str, origin: &str) -> DocumentResult<Self> {
        let root = serde_json::from_str(text)
            .map_err(|e| DocumentError::parse_error(origin, e.to_string()))?;
        Ok(Self { root })
    }

    /// Wrap an already parsed value
    #[inline]
    #[must_use]
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Root value
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Mutable root value
    #[inline]
    pub fn root_mut(&mut self) -> &mut Value {
        &mut self.root
    }

    /// Unwrap into the root value
    #[inline]
    #[must_use]
    pub fn into_value(self) -> Value {
        self.root
    }

    /// Two-space pretty JSON, non-ASCII unescaped, trailing newline
    ///
    /// # Errors
    /// `DocumentError::Serialize` if the value cannot be encoded.
    pub fn to_pretty_string(&self) -> DocumentResult<String> {
        let mut text = serde_json::to_string_pretty(&self.root)
            .map_err(|e| DocumentError::Serialize(e.to_string()))?;
        text.push('\n');
        Ok(text)
    }

    /// Get value at path (dot notation)
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = &self.root;
        for segment in path.split('.') {
            match current {
                Value::Object(map) => current = map.get(segment)?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Mutable value at path (dot notation)
    pub fn get_path_mut(&mut self, path: &str) -> Option<&mut Value> {
        let mut current = &mut self.root;
        for segment in path.split('.') {
            match current {
                Value::Object(map) => current = map.get_mut(segment)?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Workflow `name`, if any
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.root.get("name").and_then(Value::as_str)
    }

    /// Top-level nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Value> {
        self.root
            .get("nodes")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
    }

    /// Top-level nodes followed by the `activeVersion.nodes` copies
    pub fn all_nodes(&self) -> impl Iterator<Item = &Value> {
        let copies = self
            .get_path("activeVersion.nodes")
            .and_then(Value::as_array)
            .into_iter()
            .flatten();
        self.nodes().chain(copies)
    }

    /// Whether any node collection exists
    #[must_use]
    pub fn has_nodes(&self) -> bool {
        self.get_path("nodes").is_some_and(Value::is_array)
            || self.get_path("activeVersion.nodes").is_some_and(Value::is_array)
    }

    /// First top-level node matching `selector`
    #[must_use]
    pub fn find_node(&self, selector: &NodeSelector) -> Option<&Value> {
        self.nodes().find(|node| selector.matches(node))
    }

    /// `nodes` and `activeVersion.nodes`, as disjoint mutable borrows
    fn node_lists_mut(&mut self) -> Vec<&mut Vec<Value>> {
        let Value::Object(map) = &mut self.root else {
            return Vec::new();
        };
        let mut lists = Vec::with_capacity(2);
        for (key, value) in map.iter_mut() {
            match key.as_str() {
                "nodes" => lists.extend(value.as_array_mut()),
                "activeVersion" => lists.extend(value.get_mut("nodes").and_then(Value::as_array_mut)),
                _ => {}
            }
        }
        lists
    }

    /// Overwrite `parameters.<field>` of every selected node with `value`
    ///
    /// Returns the number of nodes written (copies under `activeVersion`
    /// included).
    ///
    /// # Errors
    /// `MissingNodes` without a node collection; `NotFound` when nothing matched.
    pub fn set_node_field(
        &mut self,
        selector: &NodeSelector,
        field: &str,
        value: &str,
    ) -> DocumentResult<usize> {
        if !self.has_nodes() {
            return Err(DocumentError::MissingNodes);
        }
        let mut written = 0;
        for list in self.node_lists_mut() {
            for node in list.iter_mut().filter(|n| selector.matches(n)) {
                let Some(obj) = node.as_object_mut() else {
                    continue;
                };
                let params = obj
                    .entry("parameters")
                    .or_insert_with(|| Value::Object(serde_json::Map::new()));
                if !params.is_object() {
                    *params = Value::Object(serde_json::Map::new());
                }
                if let Value::Object(params) = params {
                    params.insert(field.to_string(), Value::String(value.to_string()));
                    written += 1;
                }
            }
        }
        if written == 0 {
            return Err(DocumentError::NotFound(selector.to_string()));
        }
        tracing::debug!(%selector, field, written, "node field set");
        Ok(written)
    }

    /// Rewrite the string `parameters.<field>` of every selected node
    ///
    /// `edit` returns `Some(new)` to replace the value. Nodes without the
    /// field, or whose field is not a string, are left alone. Returns the
    /// names of nodes whose value actually changed, deduplicated across the
    /// `activeVersion` copy.
    ///
    /// # Errors
    /// `MissingNodes` without a node collection.
    pub fn edit_node_fields<F>(
        &mut self,
        selector: &NodeSelector,
        field: &str,
        mut edit: F,
    ) -> DocumentResult<Vec<String>>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if !self.has_nodes() {
            return Err(DocumentError::MissingNodes);
        }
        let mut changed = Vec::new();
        for list in self.node_lists_mut() {
            for node in list.iter_mut().filter(|n| selector.matches(n)) {
                let label = node_label(node);
                let Some(slot) = node.get_mut("parameters").and_then(|p| p.get_mut(field)) else {
                    continue;
                };
                let Some(current) = slot.as_str() else {
                    tracing::debug!(node = %label, field, "field is not a string");
                    continue;
                };
                match edit(current) {
                    Some(next) if next != current => {
                        *slot = Value::String(next);
                        if !changed.contains(&label) {
                            changed.push(label);
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(changed)
    }
}

/// Name, falling back to id, for reports
fn node_label(node: &Value) -> String {
    node.get("name")
        .or_else(|| node.get("id"))
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mend_test_utils::{prompt_workflow, two_node_workflow};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parse_rejects_invalid_json() {
        let err = WorkflowDocument::parse("{\"nodes\": [", "broken.json").unwrap_err();
        assert!(matches!(err, DocumentError::Parse { ref origin, .. } if origin == "broken.json"));
    }

    #[test]
    fn pretty_output_keeps_order_and_non_ascii() {
        let doc = WorkflowDocument::parse(r#"{"z": 1, "a": "artículo"}"#, "t").unwrap();
        assert_eq!(
            doc.to_pretty_string().unwrap(),
            "{\n  \"z\": 1,\n  \"a\": \"artículo\"\n}\n"
        );
    }

    #[test]
    fn selectors_match_id_and_name() {
        let node = json!({ "id": "a", "name": "Preparar Prompt" });
        assert!(NodeSelector::Id("a".into()).matches(&node));
        assert!(!NodeSelector::Id("Preparar Prompt".into()).matches(&node));
        assert!(NodeSelector::Name("Preparar Prompt".into()).matches(&node));
        assert!(NodeSelector::NameContains("Prompt".into()).matches(&node));
        assert!(NodeSelector::IdOrName("a".into()).matches(&node));
        assert!(NodeSelector::IdOrName("Preparar Prompt".into()).matches(&node));
        assert!(!NodeSelector::IdOrName("b".into()).matches(&node));
    }

    #[test]
    fn set_field_touches_only_selected_node() {
        let mut doc = WorkflowDocument::from_value(two_node_workflow());
        let written = doc
            .set_node_field(&NodeSelector::Id("a".into()), "jsCode", "Z")
            .unwrap();
        assert_eq!(written, 1);
        assert_eq!(doc.get_path("nodes").unwrap()[0]["parameters"]["jsCode"], "Z");
        assert_eq!(doc.get_path("nodes").unwrap()[1]["parameters"]["jsCode"], "Y");
    }

    #[test]
    fn set_field_reports_missing_node() {
        let mut doc = WorkflowDocument::from_value(two_node_workflow());
        let before = doc.clone();
        let err = doc
            .set_node_field(&NodeSelector::Id("c".into()), "jsCode", "Z")
            .unwrap_err();
        assert!(matches!(err, DocumentError::NotFound(_)));
        assert_eq!(doc, before);
    }

    #[test]
    fn set_field_requires_nodes() {
        let mut doc = WorkflowDocument::from_value(json!({ "name": "empty" }));
        let err = doc
            .set_node_field(&NodeSelector::Id("a".into()), "jsCode", "Z")
            .unwrap_err();
        assert!(matches!(err, DocumentError::MissingNodes));
    }

    #[test]
    fn edits_reach_active_version_copy() {
        let mut doc = WorkflowDocument::from_value(prompt_workflow());
        let changed = doc
            .edit_node_fields(&NodeSelector::NameContains("Prompt".into()), "jsCode", |code| {
                Some(code.replace("imageList", "images"))
            })
            .unwrap();
        assert_eq!(changed, vec!["Preparar Prompt Receta".to_string()]);
        let active = doc.get_path("activeVersion.nodes").unwrap()[1]["parameters"]["jsCode"]
            .as_str()
            .unwrap();
        assert!(!active.contains("imageList"));
    }

    #[test]
    fn identity_edit_reports_nothing() {
        let mut doc = WorkflowDocument::from_value(prompt_workflow());
        let before = doc.clone();
        let changed = doc
            .edit_node_fields(&NodeSelector::NameContains("Prompt".into()), "jsCode", |code| {
                Some(code.to_string())
            })
            .unwrap();
        assert!(changed.is_empty());
        assert_eq!(doc, before);
    }

    #[test]
    fn non_string_fields_are_skipped() {
        let mut doc = WorkflowDocument::from_value(json!({
            "nodes": [{ "id": "a", "name": "A", "parameters": { "jsCode": 42 } }]
        }));
        let changed = doc
            .edit_node_fields(&NodeSelector::Id("a".into()), "jsCode", |_| Some("x".into()))
            .unwrap();
        assert!(changed.is_empty());
    }

    #[test]
    fn all_nodes_include_active_version_copies() {
        let doc = WorkflowDocument::from_value(prompt_workflow());
        assert_eq!(doc.nodes().count(), 3);
        assert_eq!(doc.all_nodes().count(), 6);
        let plain = WorkflowDocument::from_value(two_node_workflow());
        assert_eq!(plain.all_nodes().count(), 2);
    }

    #[test]
    fn get_path_mut_reaches_nested_values() {
        let mut doc = WorkflowDocument::from_value(prompt_workflow());
        *doc.get_path_mut("settings.executionOrder").unwrap() = json!("v0");
        assert_eq!(doc.get_path("settings.executionOrder"), Some(&json!("v0")));
        assert!(doc.get_path_mut("settings.missing").is_none());
    }
}
