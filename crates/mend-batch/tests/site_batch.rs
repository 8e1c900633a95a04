use mend_batch::{BatchEditor, FileSet};
use mend_core::{preset, UnitStatus};
use mend_test_utils::{temp_dir, write_text};
use pretty_assertions::assert_eq;
use std::time::{Duration, SystemTime};

const NAVY_PAGE: &str = r#"<html><body><h1 style="color:#0033A0" class="bg-blue-800">Recetas</h1></body></html>"#;
const PLAIN_PAGE: &str = r#"<html><body><p class="text-gray-700">Sopas</p></body></html>"#;

fn mtime(path: &std::path::Path) -> SystemTime {
    std::fs::metadata(path).unwrap().modified().unwrap()
}

#[test]
fn only_the_matching_file_is_rewritten() {
    let dir = temp_dir();
    let a = write_text(dir.path(), "index.html", NAVY_PAGE);
    let b = write_text(dir.path(), "sopas.html", PLAIN_PAGE);
    let c = write_text(dir.path(), "postres.html", PLAIN_PAGE);

    // push the untouched files' mtimes into the past so any rewrite is visible
    let past = SystemTime::now() - Duration::from_secs(3600);
    for path in [&b, &c] {
        std::fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(past)
            .unwrap();
    }
    let before = [mtime(&b), mtime(&c)];

    let set = FileSet::glob(dir.path(), &["*.html"], &[]).unwrap();
    let report = BatchEditor::new(preset("palette-classes").unwrap())
        .run(&set)
        .unwrap();

    assert_eq!(report.changed_count(), 1);
    assert_eq!(report.unchanged_count(), 2);
    assert!(!report.has_failures());

    assert_eq!(
        std::fs::read_to_string(&a).unwrap(),
        r#"<html><body><h1 style="color:#14213D" class="bg-[#0b1324]">Recetas</h1></body></html>"#
    );
    assert_eq!(std::fs::read_to_string(&b).unwrap(), PLAIN_PAGE);
    assert_eq!(std::fs::read_to_string(&c).unwrap(), PLAIN_PAGE);
    assert_eq!([mtime(&b), mtime(&c)], before);
}

#[test]
fn second_run_changes_nothing() {
    let dir = temp_dir();
    write_text(dir.path(), "index.html", NAVY_PAGE);
    let set = FileSet::glob(dir.path(), &["*.html"], &[]).unwrap();
    let editor = BatchEditor::new(preset("palette-classes").unwrap());

    editor.run(&set).unwrap();
    let report = editor.run(&set).unwrap();
    assert_eq!(report.changed_count(), 0);
    assert!(matches!(report.outcomes()[0].status, UnitStatus::Unchanged));
}

#[test]
fn dry_run_reports_without_writing() {
    let dir = temp_dir();
    let a = write_text(dir.path(), "index.html", NAVY_PAGE);
    let set = FileSet::explicit([a.clone()]);
    let report = BatchEditor::new(preset("palette-classes").unwrap())
        .dry_run(true)
        .run(&set)
        .unwrap();
    assert!(report.is_dry_run());
    assert_eq!(report.changed_count(), 1);
    assert_eq!(std::fs::read_to_string(&a).unwrap(), NAVY_PAGE);
}
