use serde_json::json;
use tempfile::TempDir;

use super::*;

fn write_corpus_file(dir: &Path, name: &str, value: &serde_json::Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_vec(value).unwrap()).unwrap();
    path
}

fn annual_report(index: usize, with_notes: bool) -> serde_json::Value {
    let notes_level = if index % 3 == 0 { 2 } else { 1 };
    let mut statements = vec![json!({
        "level": 1,
        "linkname": "Financial Statements",
        "sub_items": [
            { "level": 2, "linkname": "Balance Sheet", "sub_items": [] }
        ]
    })];
    if with_notes {
        statements.push(json!({
            "level": notes_level,
            "linkname": if index % 2 == 0 {
                "Notes to the Financial Statements"
            } else {
                "NOTES TO THE FINANCIAL STATEMENTS."
            },
            "sub_items": []
        }));
    }
    json!({ "level": 0, "linkname": "root", "sub_items": statements })
}

#[test]
fn mining_confidence_reflects_document_share() {
    let dir = TempDir::new().unwrap();
    for index in 0..100 {
        write_corpus_file(
            dir.path(),
            &format!("doc_{index:03}.json"),
            &annual_report(index, index >= 3),
        );
    }

    let files = discover_corpus_files(dir.path()).unwrap();
    assert_eq!(files.len(), 100);

    let outcome = build_pattern_database(&files, "2026-10-16T00:00:00Z".to_string());
    assert_eq!(outcome.database.corpus_size, 100);

    let notes = outcome
        .database
        .get("notestothefinancialstatements")
        .expect("notes pattern mined");
    assert_eq!(notes.total_occurrences, 97);
    assert!((notes.confidence - 0.97).abs() < 1e-9);

    // every third document files the notes at depth 2, the rest at depth 1
    let depth_one = notes.depth_frequency.get(&1).copied().unwrap_or(0);
    let depth_two = notes.depth_frequency.get(&2).copied().unwrap_or(0);
    assert_eq!(depth_one + depth_two, 97);
    assert!(depth_one > depth_two);
    assert_eq!(notes.most_common_depth(), Some(1));
    assert_eq!(notes.original_title_variants.len(), 2);
}

#[test]
fn parents_are_recorded_except_for_first_level_items() {
    let dir = TempDir::new().unwrap();
    let files = vec![
        write_corpus_file(dir.path(), "a.json", &annual_report(1, true)),
        write_corpus_file(dir.path(), "b.json", &annual_report(2, true)),
    ];

    let outcome = build_pattern_database(&files, String::new());
    let database = &outcome.database;

    assert_eq!(
        database.find_most_likely_parent("balancesheet"),
        Some("financialstatements")
    );
    assert_eq!(database.find_most_likely_parent("financialstatements"), None);
    assert_eq!(
        database
            .get("balancesheet")
            .map(|pattern| pattern.typical_parents[0].frequency),
        Some(2)
    );
}

#[test]
fn corrupt_files_are_skipped_not_fatal() {
    let dir = TempDir::new().unwrap();
    let good = write_corpus_file(dir.path(), "good.json", &annual_report(1, true));
    let bad = dir.path().join("bad.json");
    fs::write(&bad, b"{ not json").unwrap();
    let missing = dir.path().join("missing.json");

    let outcome = build_pattern_database(&[bad, good, missing], String::new());
    assert_eq!(outcome.files_discovered, 3);
    assert_eq!(outcome.processed.len(), 1);
    assert_eq!(outcome.warnings.len(), 2);
    assert_eq!(outcome.database.corpus_size, 1);
    assert!((outcome.database.get("balancesheet").unwrap().confidence - 1.0).abs() < 1e-9);
}

#[test]
fn typical_parents_sorted_by_descending_frequency() {
    let root = HierarchyItem::new("root", "", 0).with_children(vec![
        HierarchyItem::new("a", "Notes", 1)
            .with_children(vec![HierarchyItem::new("a1", "Accounting Policies", 2)]),
        HierarchyItem::new("b", "Appendix", 1).with_children(vec![
            HierarchyItem::new("b1", "Accounting Policies", 2),
            HierarchyItem::new("b2", "Accounting policies", 2),
        ]),
    ]);

    let mut accumulator = PatternAccumulator::default();
    accumulator.observe_tree(&root);
    let database = accumulator.finish(1, String::new());

    let policies = database.get("accountingpolicies").unwrap();
    assert_eq!(policies.total_occurrences, 3);
    assert_eq!(policies.typical_parents[0].normalized_title, "appendix");
    assert_eq!(policies.typical_parents[0].frequency, 2);
    assert_eq!(policies.typical_parents[1].normalized_title, "notes");
    assert_eq!(policies.confidence, 3.0);
}

#[test]
fn merge_matches_sequential_accumulation() {
    let first = annual_report(0, true);
    let second = annual_report(1, true);
    let first: HierarchyItem = serde_json::from_value(first).unwrap();
    let second: HierarchyItem = serde_json::from_value(second).unwrap();

    let mut sequential = PatternAccumulator::default();
    sequential.observe_tree(&first);
    sequential.observe_tree(&second);

    let mut left = PatternAccumulator::default();
    left.observe_tree(&first);
    let mut right = PatternAccumulator::default();
    right.observe_tree(&second);

    let merged = left.merge(right).finish(2, String::new());
    assert_eq!(merged, sequential.finish(2, String::new()));
}

#[test]
fn xml_corpus_files_are_understood() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.xml");
    fs::write(
        &path,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<item level="0" linkname="root">
  <sub_items>
    <item id="1" level="1" linkname="Management Report">
      <sub_items>
        <item id="2" level="2" linkname="Risk  Management"/>
      </sub_items>
    </item>
    <item id="3" level="1" linkname="Financial Statements"/>
  </sub_items>
</item>"#,
    )
    .unwrap();

    let corpus_doc = load_corpus_file(&path).unwrap();
    assert_eq!(corpus_doc.item_count(), 3);
    assert_eq!(corpus_doc.root.sub_items[0].sub_items[0].display_text, "Risk Management");

    let outcome = build_pattern_database(&[path], String::new());
    assert_eq!(
        outcome.database.find_most_likely_parent("riskmanagement"),
        Some("managementreport")
    );
}

#[test]
fn discovery_ignores_other_files_and_requires_directory() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("notes.txt"), "x").unwrap();
    write_corpus_file(dir.path(), "b.json", &annual_report(1, true));
    write_corpus_file(dir.path(), "a.json", &annual_report(1, true));

    let files = discover_corpus_files(dir.path()).unwrap();
    let names: Vec<String> = files
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a.json", "b.json"]);

    assert!(discover_corpus_files(&dir.path().join("absent")).is_err());
}
