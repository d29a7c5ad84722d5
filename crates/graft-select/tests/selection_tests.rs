use graft_core::{Node, NodeId, SelectionState, SourceTree, WorkItem};
use graft_select::{item_count, work_items, Selection, SelectionSnapshot};

/// root/{A(folder, child: a1(file))}
fn single_folder_tree() -> SourceTree {
    SourceTree::from_nodes(vec![
        Node::new_folder("A", "A", "").with_children(vec![Node::new_file("a1", "a1", "A")]),
    ])
    .unwrap()
}

/// root/{B(folder, children:[c1(file), c2(file)])}
fn two_file_tree() -> SourceTree {
    SourceTree::from_nodes(vec![Node::new_folder("B", "B", "").with_children(vec![
        Node::new_file("c1", "c1", "B"),
        Node::new_file("c2", "c2", "B"),
    ])])
    .unwrap()
}

/// A deeper tree with empty folders, nested folders and root-level files.
fn mixed_tree() -> SourceTree {
    SourceTree::from_nodes(vec![
        Node::new_folder("docs", "docs", "").with_children(vec![
            Node::new_folder("drafts", "drafts", "docs").with_children(vec![
                Node::new_folder("old", "old", "docs/drafts").with_children(vec![
                    Node::new_file("old1", "v1.txt", "docs/drafts/old"),
                    Node::new_file("old2", "v2.txt", "docs/drafts/old"),
                ]),
                Node::new_file("d1", "plan.txt", "docs/drafts"),
            ]),
            Node::new_folder("empty", "empty", "docs"),
            Node::new_file("readme", "readme.md", "docs"),
        ]),
        Node::new_folder("photos", "photos", "").with_children(vec![
            Node::new_file("p1", "a.jpg", "photos"),
            Node::new_file("p2", "b.jpg", "photos"),
            Node::new_file("p3", "c.jpg", "photos"),
        ]),
        Node::new_file("notes", "notes.txt", ""),
    ])
    .unwrap()
}

fn id(s: &str) -> NodeId {
    NodeId::new(s)
}

#[test]
fn test_select_all_counts_every_node() {
    for tree in [single_folder_tree(), two_file_tree(), mixed_tree()] {
        let mut selection = Selection::new(&tree);
        selection.set_all(&tree, SelectionState::All);
        assert_eq!(item_count(&tree, &selection), tree.node_count());
    }
}

#[test]
fn test_deselect_all_counts_nothing() {
    for tree in [single_folder_tree(), two_file_tree(), mixed_tree()] {
        let mut selection = Selection::new(&tree);
        selection.set_all(&tree, SelectionState::All);
        selection.set_all(&tree, SelectionState::None);
        assert_eq!(item_count(&tree, &selection), 0);
        assert!(work_items(&tree, &selection).is_empty());
    }
}

#[test]
fn test_leaf_cycles_back_after_two_clicks() {
    let tree = mixed_tree();
    for leaf in ["notes", "empty", "p2", "old1"] {
        let mut selection = Selection::new(&tree);
        assert_eq!(selection.cycle(&tree, &id(leaf)), SelectionState::All);
        assert_eq!(selection.cycle(&tree, &id(leaf)), SelectionState::None);
        assert_eq!(item_count(&tree, &selection), 0);
    }
}

#[test]
fn test_folder_cycles_back_after_three_clicks() {
    let tree = mixed_tree();
    for folder in ["docs", "drafts", "old", "photos"] {
        let mut selection = Selection::new(&tree);
        assert_eq!(selection.cycle(&tree, &id(folder)), SelectionState::All);
        assert_eq!(selection.cycle(&tree, &id(folder)), SelectionState::FolderOnly);
        assert_eq!(selection.cycle(&tree, &id(folder)), SelectionState::None);
    }
}

#[test]
fn test_down_propagation() {
    let tree = mixed_tree();
    let mut selection = Selection::new(&tree);
    let docs = id("docs");

    selection.cycle(&tree, &docs);
    for descendant in tree.descendant_ids(&docs) {
        assert_eq!(selection.get(&descendant), SelectionState::All);
    }

    selection.cycle(&tree, &docs);
    assert_eq!(selection.get(&docs), SelectionState::FolderOnly);
    for descendant in tree.descendant_ids(&docs) {
        assert_eq!(selection.get(&descendant), SelectionState::None);
    }

    selection.cycle(&tree, &docs);
    selection.cycle(&tree, &docs);
    selection
        .set_explicit(&tree, &docs, SelectionState::None)
        .unwrap();
    for descendant in tree.descendant_ids(&docs) {
        assert_eq!(selection.get(&descendant), SelectionState::None);
    }
}

#[test]
fn test_up_recomputation_to_all() {
    let tree = mixed_tree();
    let mut selection = Selection::new(&tree);

    for photo in ["p1", "p2"] {
        selection.cycle(&tree, &id(photo));
        assert_eq!(selection.get(&id("photos")), SelectionState::Partial);
    }
    selection.cycle(&tree, &id("p3"));
    assert_eq!(selection.get(&id("photos")), SelectionState::All);

    // Fully covered folders collapse back to a single work item.
    assert_eq!(
        work_items(&tree, &selection),
        vec![WorkItem::all(id("photos"))]
    );
    assert_eq!(item_count(&tree, &selection), 4);
}

#[test]
fn test_up_recomputation_reaches_the_top() {
    let tree = mixed_tree();
    let mut selection = Selection::new(&tree);

    selection.cycle(&tree, &id("old1"));
    assert_eq!(selection.get(&id("old")), SelectionState::Partial);
    assert_eq!(selection.get(&id("drafts")), SelectionState::Partial);
    assert_eq!(selection.get(&id("docs")), SelectionState::Partial);

    selection.cycle(&tree, &id("old1"));
    assert_eq!(selection.get(&id("old")), SelectionState::None);
    assert_eq!(selection.get(&id("drafts")), SelectionState::None);
    assert_eq!(selection.get(&id("docs")), SelectionState::None);
}

#[test]
fn test_work_items_never_nest_under_all() {
    let tree = mixed_tree();
    let mut selection = Selection::new(&tree);
    selection.cycle(&tree, &id("drafts"));
    selection.cycle(&tree, &id("readme"));
    selection.cycle(&tree, &id("p1"));
    selection.cycle(&tree, &id("docs"));

    let items = work_items(&tree, &selection);
    for item in &items {
        if item.selection_type == SelectionState::All {
            let below = tree.descendant_ids(&item.node_id);
            assert!(items.iter().all(|other| !below.contains(&other.node_id)));
        }
    }
}

#[test]
fn test_scenario_folder_all() {
    let tree = single_folder_tree();
    let mut selection = Selection::new(&tree);

    assert_eq!(selection.cycle(&tree, &id("A")), SelectionState::All);
    assert_eq!(item_count(&tree, &selection), 2);
    assert_eq!(work_items(&tree, &selection), vec![WorkItem::all(id("A"))]);
}

#[test]
fn test_scenario_folder_only() {
    let tree = single_folder_tree();
    let mut selection = Selection::new(&tree);

    selection.cycle(&tree, &id("A"));
    assert_eq!(selection.cycle(&tree, &id("A")), SelectionState::FolderOnly);
    assert_eq!(selection.get(&id("a1")), SelectionState::None);
    assert_eq!(item_count(&tree, &selection), 1);
    assert_eq!(
        work_items(&tree, &selection),
        vec![WorkItem::folder_only(id("A"))]
    );
}

#[test]
fn test_scenario_single_child() {
    let tree = two_file_tree();
    let mut selection = Selection::new(&tree);

    assert_eq!(selection.cycle(&tree, &id("c1")), SelectionState::All);
    assert_eq!(selection.get(&id("B")), SelectionState::Partial);
    assert_eq!(item_count(&tree, &selection), 1);
    assert_eq!(work_items(&tree, &selection), vec![WorkItem::all(id("c1"))]);
}

#[test]
fn test_unknown_id_is_a_no_op() {
    let tree = two_file_tree();
    let mut selection = Selection::new(&tree);
    selection.cycle(&tree, &id("c1"));
    let before = selection.snapshot(&tree);

    assert_eq!(selection.cycle(&tree, &id("ghost")), SelectionState::None);
    assert!(selection.try_cycle(&tree, &id("ghost")).is_err());
    assert_eq!(selection.snapshot(&tree), before);
}

#[test]
fn test_snapshot_round_trip_through_json() {
    let tree = mixed_tree();
    let mut selection = Selection::new(&tree);
    selection.cycle(&tree, &id("drafts"));
    selection.cycle(&tree, &id("drafts"));
    selection.cycle(&tree, &id("p2"));

    let snapshot = selection.snapshot(&tree);
    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(json.contains("\"drafts\":\"folder-only\""));

    let parsed: SelectionSnapshot = serde_json::from_str(&json).unwrap();
    let mut restored = Selection::new(&tree);
    assert_eq!(restored.restore(&tree, &parsed), snapshot.len());
    assert_eq!(restored.plan(&tree), selection.plan(&tree));
}

#[test]
fn test_restore_skips_unknown_ids() {
    let tree = two_file_tree();
    let mut snapshot = SelectionSnapshot::default();
    snapshot.0.insert(id("c2"), SelectionState::All);
    snapshot.0.insert(id("elsewhere"), SelectionState::All);

    let mut selection = Selection::new(&tree);
    assert_eq!(selection.restore(&tree, &snapshot), 1);
    assert_eq!(selection.selected_count(&tree), 1);
}

#[test]
fn test_initialize_discards_previous_tree() {
    let first = two_file_tree();
    let second = single_folder_tree();
    let mut selection = Selection::new(&first);
    selection.set_all(&first, SelectionState::All);

    selection.initialize(&second);
    assert_eq!(selection.get(&id("c1")), SelectionState::None);
    assert_eq!(selection.get(&id("A")), SelectionState::None);
}
