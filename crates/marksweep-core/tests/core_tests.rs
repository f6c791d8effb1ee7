use marksweep_core::{
    BookmarkTree, CheckConfig, CheckStatus, ImportWarning, LinkCheckResult, NodeId, NodeKind,
    RetryBackoff, TreeBuilder, WarningKind,
};
use strum::IntoEnumIterator;

fn bookmarks() -> BookmarkTree {
    let mut builder = TreeBuilder::new("root");
    let toolbar = builder.add_folder(builder.root(), "Toolbar").unwrap();
    let news = builder.add_folder(toolbar, "News").unwrap();
    builder
        .add_link(news, "LWN", "https://lwn.net/", None)
        .unwrap();
    builder
        .add_link(toolbar, "Rust", "https://www.rust-lang.org/", None)
        .unwrap();
    builder.warn(ImportWarning::new("/Toolbar", "example", WarningKind::EmptyUrl));
    builder.build()
}

#[test]
fn test_node_id_operations() {
    let id1 = NodeId::new(42);
    let id2 = NodeId::new(42);

    assert_eq!(id1, id2);
    assert_eq!(id1.0, 42);
    assert_eq!(id1.index(), 42);
    assert_eq!(id1.to_string(), "#42");
    assert!(NodeId::new(1) < NodeId::new(2));
}

#[test]
fn test_tree_navigation() {
    let tree = bookmarks();

    let lwn = tree.links().find(|n| n.title == "LWN").unwrap();
    let ancestors: Vec<&str> = tree.ancestors(lwn.id).map(|n| n.title.as_str()).collect();
    assert_eq!(ancestors, vec!["News", "Toolbar", "root"]);
    assert_eq!(tree.folder_path(lwn.id), "/Toolbar/News");
    assert_eq!(lwn.depth, 3);

    let toolbar_children: Vec<&str> = tree
        .children(NodeId::new(1))
        .map(|n| n.title.as_str())
        .collect();
    assert_eq!(toolbar_children, vec!["News", "Rust"]);

    assert!(tree.contains_link(lwn.id));
    assert!(!tree.contains_link(NodeId::new(1)));
    assert!(!tree.contains_link(NodeId::new(100)));
    assert_eq!(tree.folders().count(), 3);
}

#[test]
fn test_tree_serializes() {
    let tree = bookmarks();
    let json = serde_json::to_value(&tree).unwrap();

    assert_eq!(json["stats"]["total_links"], 2);
    assert_eq!(json["stats"]["total_folders"], 2);
    assert_eq!(json["nodes"][3]["kind"]["type"], "link");
    assert_eq!(json["nodes"][3]["kind"]["url"], "https://lwn.net/");
    assert_eq!(json["warnings"][0]["kind"], "EmptyUrl");
}

#[test]
fn test_node_kind_predicates() {
    let tree = bookmarks();
    let root = tree.root();
    assert!(root.is_folder());
    assert!(root.kind.is_folder());
    assert!(root.url().is_none());
    assert_eq!(root.child_count(), 1);

    let rust = tree.links().last().unwrap();
    assert!(matches!(rust.kind, NodeKind::Link { .. }));
    assert!(rust.children().is_empty());
}

#[test]
fn test_check_status_names() {
    let names: Vec<String> = CheckStatus::iter().map(|s| s.to_string()).collect();
    assert_eq!(names, vec!["alive", "dead", "error", "skipped"]);
    assert_eq!(CheckStatus::Dead.as_ref(), "dead");

    let failures: Vec<CheckStatus> = CheckStatus::iter().filter(|s| s.is_failure()).collect();
    assert_eq!(failures, vec![CheckStatus::Dead, CheckStatus::Error]);
}

#[test]
fn test_link_check_result_json() {
    let result = LinkCheckResult::alive(200, 1).with_final_url("https://example.com/new");
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "alive");
    assert_eq!(json["http_status"], 200);
    assert_eq!(json["final_url"], "https://example.com/new");
    assert!(json.get("error_detail").is_none());

    let skipped = serde_json::to_value(LinkCheckResult::skipped("unsupported scheme")).unwrap();
    assert_eq!(skipped["attempts"], 0);
    assert!(skipped.get("http_status").is_none());
}

#[test]
fn test_check_config_from_toml_like_json() {
    let config: CheckConfig = serde_json::from_str(
        r#"{
            "timeout_seconds": 3.5,
            "retry_backoff": {"kind": "fixed", "delay_ms": 100},
            "limit": 20
        }"#,
    )
    .unwrap();

    assert_eq!(config.retry_backoff, RetryBackoff::Fixed { delay_ms: 100 });
    assert_eq!(config.limit, Some(20));
    assert_eq!(config.max_concurrency, 16);
    assert!(config.user_agent.starts_with("marksweep/"));
}
