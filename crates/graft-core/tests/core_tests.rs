use graft_core::{
    ConfigError, ConfigFile, GraftConfig, Node, NodeId, NodeKind, RenameMapping, SelectionState,
    SourceTree, TreeError, WorkItem,
};

fn sample_tree() -> SourceTree {
    SourceTree::from_nodes(vec![
        Node::new_folder("d1", "Docs", "").with_children(vec![
            Node::new_folder("d2", "2023", "Docs")
                .with_children(vec![Node::new_file("f1", "plan.txt", "Docs/2023")]),
            Node::new_file("f2", "index.md", "Docs"),
        ]),
        Node::new_file("f3", "todo.txt", ""),
    ])
    .unwrap()
}

#[test]
fn test_node_kinds() {
    let file = Node::new_file("f", "a.txt", "x");
    let folder = Node::new_folder("d", "x", "");

    assert_eq!(file.kind, NodeKind::File);
    assert_eq!(file.path, "x/a.txt");
    assert!(folder.is_folder());
    assert!(folder.is_leaf());
}

#[test]
fn test_tree_lookups() {
    let tree = sample_tree();

    assert_eq!(tree.node_count(), 5);
    assert_eq!(tree.find_by_path("/Docs/2023/plan.txt").unwrap().id, NodeId::new("f1"));
    assert_eq!(tree.parent_of(&"f1".into()).unwrap().name, "2023");
    assert!(tree.parent_of(&"f3".into()).is_none());
    assert_eq!(
        tree.descendant_ids(&"d1".into()),
        vec![NodeId::new("d2"), NodeId::new("f1"), NodeId::new("f2")]
    );
}

#[test]
fn test_tree_json_round_trip_keeps_indices() {
    let tree = sample_tree();
    let json = serde_json::to_string(&tree).unwrap();
    let back: SourceTree = serde_json::from_str(&json).unwrap();

    assert_eq!(back.node_count(), tree.node_count());
    assert_eq!(back.find_by_path("Docs/index.md").unwrap().id, NodeId::new("f2"));
}

#[test]
fn test_tree_json_is_validated() {
    let json = r#"{"nodes":[{"id":"a","name":"a","kind":"file","path":"a"},
                            {"id":"a","name":"b","kind":"file","path":"b"}]}"#;
    assert!(serde_json::from_str::<SourceTree>(json).is_err());

    let err = SourceTree::from_nodes(vec![
        Node::new_file("x", "x", "").with_children(vec![Node::new_file("y", "y", "x")]),
    ])
    .unwrap_err();
    assert!(matches!(err, TreeError::FileWithChildren { .. }));
}

#[test]
fn test_work_item_constructors() {
    let all = WorkItem::all("n".into());
    assert!(all.include_children);
    assert_eq!(all.selection_type, SelectionState::All);

    let folder = WorkItem::folder_only("n".into());
    assert!(!folder.include_children);
    assert!(folder.selection_type.includes_self());
}

#[test]
fn test_config_file_to_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        source = "src"
        destination = "dst"
        keep_remote_copy_naming = true
        mappings = [{ from = "", to = "Backup " }]
        "#,
    )
    .unwrap();

    let config: GraftConfig = ConfigFile::load(&path).unwrap().into_builder().build().unwrap();
    assert_eq!(config.destination.as_str(), "dst");
    assert!(config.keep_remote_copy_naming);
    assert_eq!(config.mappings, vec![RenameMapping::prepend("Backup ")]);
}

#[test]
fn test_config_file_rejects_garbage() {
    let err = ConfigFile::from_toml_str("source = [").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }));
}
