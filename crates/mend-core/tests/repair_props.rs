use mend_core::encoding::CANONICAL_REPAIRS;
use mend_core::{preset, FieldRemoval, RepairTable, RuleSet};
use proptest::prelude::*;

/// Characters that occur in corrupted sequences or their repairs, plus filler
fn repair_alphabet() -> Vec<char> {
    let mut chars: Vec<char> = CANONICAL_REPAIRS
        .iter()
        .flat_map(|(corrupted, correct)| corrupted.chars().chain(correct.chars()))
        .collect();
    chars.extend(['a', 'e', ' ', '"', '\n']);
    chars.sort_unstable();
    chars.dedup();
    chars
}

fn corrupted_text() -> impl Strategy<Value = String> {
    let alphabet = repair_alphabet();
    prop::collection::vec(prop::sample::select(alphabet), 0..40)
        .prop_map(|chars| chars.into_iter().collect())
}

#[test]
fn scenario_accented_word_repairs_once() {
    let table = RepairTable::canonical();
    let once = table.repair("art\u{c3}\u{ad}culo").into_owned();
    assert_eq!(once, "artículo");
    let twice = table.repair(&once);
    assert_eq!(twice, "artículo");
}

#[test]
fn unmatched_rule_reports_unchanged() {
    let rules = preset("palette-classes").unwrap();
    let outcome = rules.apply("<p class=\"text-gray-900\">sin cambios</p>");
    assert!(!outcome.changed);
    assert!(outcome.fired.is_empty());
}

proptest! {
    #[test]
    fn prop_repair_is_idempotent(input in corrupted_text()) {
        let table = RepairTable::canonical();
        let once = table.repair(&input).into_owned();
        let twice = table.repair(&once).into_owned();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_repair_never_grows_text(input in corrupted_text()) {
        let table = RepairTable::canonical();
        prop_assert!(table.repair(&input).chars().count() <= input.chars().count());
    }

    #[test]
    fn prop_repair_leaves_ascii_alone(input in "[ -~\n]{0,64}") {
        let table = RepairTable::canonical();
        prop_assert_eq!(table.repair(&input), input.as_str());
    }

    #[test]
    fn prop_rule_sets_with_repair_are_idempotent(input in corrupted_text()) {
        let rules: RuleSet = preset("encoding-repair").unwrap();
        let once = rules.apply(&input);
        let twice = rules.apply(&once.text);
        prop_assert!(!twice.changed);
    }

    #[test]
    fn prop_field_removal_is_idempotent(
        fields in prop::collection::vec(prop::sample::select(vec!["title", "image_url", "region"]), 1..6)
    ) {
        let mut code = String::from("const p =\n  '{\\n' +\n");
        for field in &fields {
            code.push_str(&format!("  '  \"{field}\": \"v\",\\n' +\n"));
        }
        code.push_str("  '}\\n';\n");

        let removal = FieldRemoval::new("image_url").unwrap();
        let once = removal.apply(&code).into_owned();
        prop_assert!(!once.contains("image_url"));
        prop_assert_eq!(removal.apply(&once), once.as_str());
        let kept = fields.iter().filter(|f| *f != &"image_url").count();
        prop_assert_eq!(once.matches("\": \"v\"").count(), kept);
    }
}
