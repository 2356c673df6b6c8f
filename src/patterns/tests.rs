use std::collections::BTreeMap;

use rusqlite::Connection;

use super::*;

fn pattern(title: &str, occurrences: usize, corpus: usize, depths: &[(u32, usize)]) -> SectionPattern {
    SectionPattern {
        normalized_title: title.to_string(),
        original_title_variants: vec![title.to_string()],
        depth_frequency: depths.iter().copied().collect::<BTreeMap<u32, usize>>(),
        typical_parents: Vec::new(),
        total_occurrences: occurrences,
        confidence: occurrences as f64 / corpus as f64,
    }
}

#[test]
fn most_common_depth_prefers_plurality_then_shallower() {
    let notes = pattern("notes", 97, 100, &[(1, 60), (2, 37)]);
    assert_eq!(notes.most_common_depth(), Some(1));

    let tied = pattern("tied", 4, 100, &[(3, 2), (2, 2)]);
    assert_eq!(tied.most_common_depth(), Some(2));

    let empty = pattern("empty", 0, 100, &[]);
    assert_eq!(empty.most_common_depth(), None);
}

#[test]
fn find_matches_applies_confidence_floor() {
    let database = PatternDatabase::new(
        vec![
            pattern("balancesheet", 80, 100, &[(2, 80)]),
            pattern("notes", 10, 100, &[(1, 10)]),
        ],
        100,
        "2026-01-01T00:00:00Z".to_string(),
    );

    assert_eq!(database.find_matches("balancesheet", 0.5).len(), 1);
    assert!(database.find_matches("notes", 0.5).is_empty());
    assert_eq!(database.find_matches("notes", 0.1).len(), 1);
    assert!(database.find_matches("missing", 0.0).is_empty());
}

#[test]
fn find_most_likely_parent_uses_top_parent() {
    let mut assets = pattern("assets", 5, 10, &[(2, 5)]);
    assets.typical_parents = vec![
        ParentFrequency {
            normalized_title: "balancesheet".to_string(),
            frequency: 4,
        },
        ParentFrequency {
            normalized_title: "notes".to_string(),
            frequency: 1,
        },
    ];
    let database = PatternDatabase::new(vec![assets], 10, String::new());

    assert_eq!(database.find_most_likely_parent("assets"), Some("balancesheet"));
    assert_eq!(database.find_most_likely_parent("liabilities"), None);
}

#[test]
fn shares_are_relative_to_recorded_observations() {
    let mut assets = pattern("assets", 4, 10, &[(2, 3), (3, 1)]);
    assets.typical_parents = vec![ParentFrequency {
        normalized_title: "balancesheet".to_string(),
        frequency: 4,
    }];

    assert!((assets.depth_share(2) - 0.75).abs() < 1e-9);
    assert_eq!(assets.depth_share(5), 0.0);
    assert_eq!(assets.parent_share("balancesheet"), 1.0);
    assert_eq!(assets.parent_share("notes"), 0.0);
}

#[test]
fn patterns_are_ordered_by_confidence() {
    let database = PatternDatabase::new(
        vec![
            pattern("b", 1, 10, &[(1, 1)]),
            pattern("a", 9, 10, &[(1, 9)]),
            pattern("c", 1, 10, &[(1, 1)]),
        ],
        10,
        String::new(),
    );
    let titles: Vec<&str> = database
        .patterns
        .iter()
        .map(|pattern| pattern.normalized_title.as_str())
        .collect();
    assert_eq!(titles, vec!["a", "b", "c"]);
    assert_eq!(database.get("c").map(|p| p.total_occurrences), Some(1));
}

#[test]
fn sqlite_store_persists_full_database() {
    let mut connection = Connection::open_in_memory().unwrap();
    ensure_schema(&connection).unwrap();

    let mut notes = pattern("notestothefinancialstatements", 97, 100, &[(1, 90), (2, 7)]);
    notes.original_title_variants = vec![
        "Notes to the Financial Statements".to_string(),
        "NOTES TO THE FINANCIAL STATEMENTS".to_string(),
    ];
    notes.typical_parents = vec![ParentFrequency {
        normalized_title: "financialstatements".to_string(),
        frequency: 7,
    }];
    let database = PatternDatabase::new(vec![notes], 100, "2026-10-16T00:00:00Z".to_string());

    save_pattern_database(&mut connection, &database).unwrap();
    // saving twice replaces rather than duplicates
    save_pattern_database(&mut connection, &database).unwrap();

    let loaded = load_pattern_database(&connection).unwrap();
    assert_eq!(loaded, database);
}

#[test]
fn loading_an_unbuilt_database_fails() {
    let connection = Connection::open_in_memory().unwrap();
    ensure_schema(&connection).unwrap();
    assert!(load_pattern_database(&connection).is_err());
}
