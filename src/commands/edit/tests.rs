use proptest::prelude::*;

use super::*;

fn record(index: usize, text: &str, level: usize) -> HeaderRecord {
    HeaderRecord {
        id: format!("hdr-{index}"),
        depth_label: "h2".to_string(),
        display_text: text.to_string(),
        position_path: format!("/html[1]/body[1]/h2[{index}]"),
        is_used: false,
        is_excluded: false,
        indent_level: level,
    }
}

fn flat(levels: &[usize]) -> HeaderList {
    let records = levels
        .iter()
        .enumerate()
        .map(|(index, &level)| record(index + 1, &format!("Header {}", index + 1), level))
        .collect();
    HeaderList::new(records, Limits::default())
}

fn levels(list: &HeaderList) -> Vec<usize> {
    list.records().iter().map(|record| record.indent_level).collect()
}

fn preorder_ids(tree: &HierarchyTree) -> Vec<String> {
    tree.preorder()
        .into_iter()
        .map(|index| tree.node(index).id.clone())
        .collect()
}

#[test]
fn first_record_can_never_be_indented() {
    let mut list = flat(&[0, 0]);
    let err = list.indent(&["hdr-1"]).unwrap_err();
    assert!(matches!(err, EditError::NoPredecessor { .. }));
    assert_eq!(levels(&list), vec![0, 0]);
}

#[test]
fn indent_moves_structural_children_along() {
    let mut list = flat(&[0, 0, 1, 2, 0]);
    list.indent(&["hdr-2"]).unwrap();
    assert_eq!(levels(&list), vec![0, 1, 2, 3, 0]);

    list.outdent(&["hdr-2"]).unwrap();
    assert_eq!(levels(&list), vec![0, 0, 1, 2, 0]);
}

#[test]
fn indent_rejects_gaps() {
    let mut list = flat(&[0, 1, 1]);
    let err = list.indent(&["hdr-2"]).unwrap_err();
    assert_eq!(
        err,
        EditError::Gap {
            id: "hdr-2".to_string(),
            text: "Header 2".to_string(),
            level: 2,
            previous_level: 0,
        }
    );
    assert!(err.to_string().contains("Header 2"));

    // indenting a later sibling under its predecessor is fine
    list.indent(&["hdr-3"]).unwrap();
    assert_eq!(levels(&list), vec![0, 1, 2]);
}

#[test]
fn indent_respects_maximum_depth_for_record_and_children() {
    let limits = Limits {
        max_depth: 3,
        ..Limits::default()
    };
    let records = vec![
        record(1, "A", 0),
        record(2, "B", 1),
        record(3, "C", 2),
        record(4, "D", 1),
        record(5, "E", 2),
    ];
    let mut list = HeaderList::new(records, limits);

    let err = list.indent(&["hdr-3"]).unwrap_err();
    assert!(matches!(err, EditError::AtMaximumDepth { max_level: 2, .. }));

    let err = list.indent(&["hdr-4"]).unwrap_err();
    assert!(matches!(err, EditError::ChildTooDeep { ref child_id, .. } if child_id == "hdr-5"));
    assert_eq!(levels(&list), vec![0, 1, 2, 1, 2]);
}

#[test]
fn outdent_rejects_top_level_records() {
    let mut list = flat(&[0, 1]);
    let err = list.outdent(&["hdr-1"]).unwrap_err();
    assert!(matches!(err, EditError::AtTopLevel { .. }));
}

#[test]
fn failed_selection_leaves_list_unchanged() {
    let mut list = flat(&[0, 0, 0, 0]);
    let before = list.clone();

    // hdr-2 would pass on its own; hdr-1 cannot move
    let err = list.indent(&["hdr-2", "hdr-1"]).unwrap_err();
    assert!(matches!(err, EditError::NoPredecessor { .. }));
    assert_eq!(list, before);

    let err = list.exclude(&["hdr-3", "missing"]).unwrap_err();
    assert_eq!(err, EditError::UnknownHeader { id: "missing".to_string() });
    assert_eq!(list, before);
}

#[test]
fn selected_descendants_move_once_with_their_ancestor() {
    let mut list = flat(&[0, 0, 1, 0]);
    list.indent(&["hdr-2", "hdr-3"]).unwrap();
    assert_eq!(levels(&list), vec![0, 1, 2, 0]);

    // consecutive siblings indent one after another
    let mut list = flat(&[0, 0, 0]);
    list.indent(&["hdr-2", "hdr-3"]).unwrap();
    assert_eq!(levels(&list), vec![0, 1, 1]);
}

#[test]
fn excluded_records_are_skipped_by_moves_and_flattening() {
    let mut list = flat(&[0, 0, 0, 0]);
    list.exclude(&["hdr-2"]).unwrap();
    list.indent(&["hdr-3"]).unwrap();
    assert_eq!(levels(&list), vec![0, 0, 1, 0]);

    let err = list.indent(&["hdr-2"]).unwrap_err();
    assert!(matches!(err, EditError::Excluded { .. }));

    let tree = list.flatten_to_tree().unwrap();
    assert_eq!(preorder_ids(&tree), vec!["hdr-1", "hdr-3", "hdr-4"]);
    let third = tree.preorder()[1];
    assert_eq!(tree.node(third).depth, 2);
    assert_eq!(tree.parent_text(third), Some("Header 1"));

    list.include(&["hdr-2"]).unwrap();
    list.reset_all();
    assert_eq!(levels(&list), vec![0, 0, 0, 0]);
    assert!(list.records().iter().all(|record| !record.is_excluded));
}

#[test]
fn flatten_nests_by_most_recent_shallower_record() {
    let list = flat(&[0, 1, 2, 1, 0, 1]);
    let tree = list.flatten_to_tree().unwrap();

    assert_eq!(preorder_ids(&tree), vec!["hdr-1", "hdr-2", "hdr-3", "hdr-4", "hdr-5", "hdr-6"]);
    let depths: Vec<usize> = tree
        .preorder()
        .into_iter()
        .map(|index| tree.node(index).depth)
        .collect();
    assert_eq!(depths, vec![1, 2, 3, 2, 1, 2]);
    assert_eq!(tree.children(ROOT).len(), 2);
}

#[test]
fn orphaned_levels_become_first_level_nodes_in_order() {
    let list = flat(&[0, 3, 4, 1]);
    assert_eq!(list.violations().len(), 1);

    let tree = list.flatten_to_tree().unwrap();
    assert_eq!(preorder_ids(&tree), vec!["hdr-1", "hdr-2", "hdr-3", "hdr-4"]);
    let order = tree.preorder();
    assert_eq!(tree.node(order[1]).depth, 1);
    assert_eq!(tree.node(order[2]).depth, 2);
    assert_eq!(tree.node(order[3]).depth, 1);
}

#[test]
fn records_beyond_the_depth_limit_are_lifted_when_flattening() {
    let limits = Limits {
        max_depth: 2,
        ..Limits::default()
    };
    let records = vec![record(1, "A", 0), record(2, "B", 1), record(3, "C", 2), record(4, "D", 0)];
    let list = HeaderList::new(records, limits);
    assert_eq!(list.violations().len(), 1);

    let tree = list.flatten_to_tree().unwrap();
    assert_eq!(preorder_ids(&tree), vec!["hdr-1", "hdr-2", "hdr-3", "hdr-4"]);
    let depths: Vec<usize> = tree
        .preorder()
        .into_iter()
        .map(|index| tree.node(index).depth)
        .collect();
    assert_eq!(depths, vec![1, 2, 2, 1]);
}

#[test]
fn operations_parse_from_command_line_strings() {
    assert_eq!(
        "indent:hdr-2, hdr-3".parse::<EditOp>().unwrap(),
        EditOp::Indent(vec!["hdr-2".to_string(), "hdr-3".to_string()])
    );
    assert_eq!("RESET".parse::<EditOp>().unwrap(), EditOp::Reset);
    assert!("indent:".parse::<EditOp>().is_err());
    assert!("promote:hdr-1".parse::<EditOp>().is_err());
    assert!("hdr-1".parse::<EditOp>().is_err());

    let mut list = flat(&[0, 0]);
    list.apply(&"indent:hdr-2".parse().unwrap()).unwrap();
    assert_eq!(levels(&list), vec![0, 1]);
}

fn op_strategy() -> impl Strategy<Value = (u8, Vec<usize>)> {
    (0u8..5, prop::collection::vec(0usize..16, 1..3))
}

fn ids_for(list: &HeaderList, picks: &[usize]) -> Vec<String> {
    let count = list.records().len();
    picks
        .iter()
        .map(|pick| list.records()[pick % count].id.clone())
        .collect()
}

proptest! {
    #[test]
    fn indent_and_outdent_never_open_a_gap(
        count in 1usize..12,
        max_depth in 2usize..6,
        ops in prop::collection::vec(op_strategy(), 0..40),
    ) {
        let records = (1..=count).map(|index| record(index, "H", 0)).collect();
        let mut list = HeaderList::new(records, Limits { max_depth, ..Limits::default() });

        for (kind, picks) in ops {
            let ids = ids_for(&list, &picks);
            let before = list.clone();
            let result = if kind % 2 == 0 { list.indent(&ids) } else { list.outdent(&ids) };

            match result {
                Ok(()) => prop_assert!(list.violations().is_empty(), "{:?}", levels(&list)),
                Err(_) => prop_assert_eq!(&list, &before),
            }
        }
    }

    #[test]
    fn flattening_preserves_document_order(
        count in 1usize..12,
        ops in prop::collection::vec(op_strategy(), 0..40),
    ) {
        let records = (1..=count).map(|index| record(index, "H", 0)).collect();
        let mut list = HeaderList::new(records, Limits { max_depth: 4, ..Limits::default() });

        for (kind, picks) in ops {
            let ids = ids_for(&list, &picks);
            let before = list.clone();
            let result = match kind {
                0 => list.indent(&ids),
                1 => list.outdent(&ids),
                2 => list.exclude(&ids),
                3 => list.include(&ids),
                _ => list.indent(&ids[..1]),
            };
            if result.is_err() {
                prop_assert_eq!(&list, &before);
            }
        }

        let expected: Vec<String> = list
            .records()
            .iter()
            .filter(|record| !record.is_excluded)
            .map(|record| record.id.clone())
            .collect();
        let tree = list.flatten_to_tree().unwrap();
        prop_assert_eq!(preorder_ids(&tree), expected);
    }
}
