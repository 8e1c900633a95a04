use mend_core::{RepairTable, ReplacementRule, RuleSet};
use mend_document::{
    rewrite_strings, CodeEdit, DocumentError, DocumentIo, KeyFilter, NodeSelector, PatchPlan,
    WorkflowDocument,
};
use mend_test_utils::{corrupted_workflow, read_json, temp_dir, two_node_workflow, write_fixture};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::borrow::Cow;

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 áéíóúñ¿¡\"\\\\\n]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-zA-Z_]{1,8}", inner), 0..6).prop_map(|entries| {
                let mut map = Map::new();
                for (k, v) in entries {
                    map.insert(k, v);
                }
                Value::Object(map)
            }),
        ]
    })
}

#[test]
fn scenario_set_code_leaves_other_node_alone() {
    let dir = temp_dir();
    let path = write_fixture(dir.path(), "wf.json", &two_node_workflow());
    let io = DocumentIo::new();

    let mut doc = io.load(&path).unwrap();
    doc.set_node_field(&NodeSelector::IdOrName("a".into()), "jsCode", "Z")
        .unwrap();
    io.save(&path, &doc).unwrap();

    let mut expected = two_node_workflow();
    expected["nodes"][0]["parameters"]["jsCode"] = json!("Z");
    assert_eq!(read_json(&path), expected);
}

#[test]
fn missing_node_writes_nothing() {
    let dir = temp_dir();
    let path = write_fixture(dir.path(), "wf.json", &two_node_workflow());
    let before = std::fs::read_to_string(&path).unwrap();

    let io = DocumentIo::new();
    let mut doc = io.load(&path).unwrap();
    let err = doc
        .set_node_field(&NodeSelector::IdOrName("zzz".into()), "jsCode", "Z")
        .unwrap_err();
    assert!(matches!(err, DocumentError::NotFound(_)));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn encoding_repair_over_selected_keys() {
    let mut doc = WorkflowDocument::from_value(corrupted_workflow());
    let table = RepairTable::canonical();
    let filter = KeyFilter::from_keys(vec!["jsCode".into()]);
    let count = rewrite_strings(doc.root_mut(), |k, _| filter.accepts(k), |s| {
        match table.repair(s) {
            Cow::Owned(fixed) => Some(fixed),
            Cow::Borrowed(_) => None,
        }
    });
    assert_eq!(count, 1);
    let code = doc.get_path("nodes").unwrap()[0]["parameters"]["jsCode"]
        .as_str()
        .unwrap();
    assert_eq!(code, "// Guía de viaje\nconst t = 'artículo';");
}

#[test]
fn unmatched_plan_round_trips_file_bytes() {
    let dir = temp_dir();
    let path = write_fixture(dir.path(), "wf.json", &two_node_workflow());
    let before = std::fs::read_to_string(&path).unwrap();

    let io = DocumentIo::new();
    let mut doc = io.load(&path).unwrap();
    let plan = PatchPlan::new(vec![CodeEdit::new(
        NodeSelector::NameContains("Alpha".into()),
        RuleSet::new().with(ReplacementRule::literal("none", "#0033A0", "#14213D").unwrap()),
    )]);
    assert!(!plan.apply(&mut doc).unwrap().changed());
    io.save(&path, &doc).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

proptest! {
    #[test]
    fn prop_parse_then_print_is_stable(value in json_value()) {
        let text = WorkflowDocument::from_value(value.clone()).to_pretty_string().unwrap();
        let doc = WorkflowDocument::parse(&text, "prop").unwrap();
        prop_assert_eq!(doc.root(), &value);
        prop_assert_eq!(doc.to_pretty_string().unwrap(), text);
    }

    #[test]
    fn prop_rejecting_walk_changes_nothing(value in json_value()) {
        let mut walked = value.clone();
        let count = rewrite_strings(&mut walked, |_, _| false, |s| Some(format!("{s}!")));
        prop_assert_eq!(count, 0);
        prop_assert_eq!(walked, value);
    }
}
