use marksweep_analyze::{
    DuplicateConfig, DuplicateFinder, GroupKind, InconsistentReportError, LinkCheckResult,
    NodeId, UrlMatching, assemble, find_duplicate_folders, find_duplicate_links,
};
use marksweep_core::{BookmarkTree, TreeBuilder};
use marksweep_import::build;
use serde_json::json;

const LINK1: &str = "https://one.example/";
const LINK2: &str = "https://two.example/";

/// A{link1, link2}, B{link2, link1}, C{link1}.
fn three_folders() -> BookmarkTree {
    build(&json!({
        "children": [
            {"title": "A", "children": [
                {"title": "one", "url": LINK1},
                {"title": "two", "url": LINK2}
            ]},
            {"title": "B", "children": [
                {"title": "two (again)", "url": LINK2},
                {"title": "one (again)", "url": LINK1}
            ]},
            {"title": "C", "children": [
                {"title": "one only", "url": LINK1}
            ]}
        ]
    }))
    .unwrap()
}

fn id_of(tree: &BookmarkTree, title: &str) -> NodeId {
    tree.nodes().find(|n| n.title == title).unwrap().id
}

#[test]
fn test_end_to_end_folder_groups() {
    let tree = three_folders();
    let folders = find_duplicate_folders(&tree);

    assert_eq!(folders.len(), 1);
    assert_eq!(folders[0].kind, GroupKind::Folder);
    assert_eq!(folders[0].members, vec![id_of(&tree, "A"), id_of(&tree, "B")]);
    assert_eq!(folders[0].representative_title, "A");
    assert_eq!(folders[0].url_count, 2);
    assert!(!folders[0].contains(id_of(&tree, "C")));
}

#[test]
fn test_end_to_end_link_groups() {
    let tree = three_folders();
    let links = find_duplicate_links(&tree);

    assert_eq!(links.len(), 2);
    assert_eq!(links[0].key, LINK1);
    assert_eq!(links[0].count(), 3);
    assert_eq!(links[1].key, LINK2);
    assert_eq!(links[1].count(), 2);
}

#[test]
fn test_single_url_never_grouped() {
    let tree = build(&json!({
        "children": [
            {"title": "a", "url": LINK1},
            {"title": "b", "url": LINK2}
        ]
    }))
    .unwrap();
    assert!(find_duplicate_links(&tree).is_empty());
}

#[test]
fn test_k_links_form_one_group() {
    let children: Vec<_> = (0..5)
        .map(|i| json!({"title": format!("copy {i}"), "url": LINK1}))
        .collect();
    let tree = build(&json!({ "children": children })).unwrap();

    let groups = find_duplicate_links(&tree);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].count(), 5);
    assert_eq!(groups[0].redundant_count(), 4);
    assert!(groups[0].members.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_empty_folders_never_grouped() {
    let tree = build(&json!({
        "children": [
            {"title": "empty", "children": []},
            {"title": "also empty", "children": [
                {"title": "nested empty", "children": []}
            ]}
        ]
    }))
    .unwrap();
    assert!(find_duplicate_folders(&tree).is_empty());
}

#[test]
fn test_structure_and_depth_ignored() {
    // Same URL set, different titles, order and nesting.
    let tree = build(&json!({
        "children": [
            {"title": "Flat", "children": [
                {"title": "x", "url": LINK1},
                {"title": "y", "url": LINK2}
            ]},
            {"title": "Deep", "children": [
                {"title": "inner", "children": [
                    {"title": "y", "url": LINK2},
                    {"title": "deeper", "children": [
                        {"title": "x", "url": LINK1}
                    ]}
                ]}
            ]}
        ]
    }))
    .unwrap();

    let groups = find_duplicate_folders(&tree);
    assert_eq!(groups.len(), 1);
    // "inner" covers the same set as "Deep" and is grouped independently.
    assert_eq!(
        groups[0].members,
        vec![id_of(&tree, "Flat"), id_of(&tree, "Deep"), id_of(&tree, "inner")]
    );
}

#[test]
fn test_repeated_urls_inside_folder_collapse() {
    let tree = build(&json!({
        "children": [
            {"title": "twice", "children": [
                {"title": "x", "url": LINK1},
                {"title": "x", "url": LINK1}
            ]},
            {"title": "once", "children": [
                {"title": "x", "url": LINK1}
            ]}
        ]
    }))
    .unwrap();

    let groups = find_duplicate_folders(&tree);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].url_count, 1);
}

#[test]
fn test_root_is_not_a_candidate() {
    let tree = build(&json!({
        "children": [
            {"title": "only", "children": [{"title": "x", "url": LINK1}]}
        ]
    }))
    .unwrap();
    // The root and "only" share a signature, but the root is the export itself.
    assert!(find_duplicate_folders(&tree).is_empty());
}

#[test]
fn test_detection_is_idempotent() {
    let tree = three_folders();
    let finder = DuplicateFinder::new();
    let first = finder.find_duplicates(&tree);
    let second = finder.find_duplicates(&tree);
    assert_eq!(first, second);
}

#[test]
fn test_empty_tree() {
    let tree = TreeBuilder::new("").build();
    let report = DuplicateFinder::new().find_duplicates(&tree);
    assert!(!report.has_duplicates());
    assert_eq!(report.group_count(), 0);
    assert_eq!(report.links_analyzed, 0);
}

#[test]
fn test_report_counts() {
    let tree = three_folders();
    let report = DuplicateFinder::new().find_duplicates(&tree);
    assert_eq!(report.links_analyzed, 5);
    assert_eq!(report.folders_analyzed, 3);
    assert_eq!(report.redundant_links, 3);
    assert_eq!(report.group_count(), 3);
}

#[test]
fn test_min_folder_urls() {
    let tree = build(&json!({
        "children": [
            {"title": "a", "children": [{"title": "x", "url": LINK1}]},
            {"title": "b", "children": [{"title": "x", "url": LINK1}]}
        ]
    }))
    .unwrap();
    let finder = DuplicateFinder::with_config(
        DuplicateConfig::builder()
            .min_folder_urls(2usize)
            .build()
            .unwrap(),
    );
    assert!(finder.find_duplicate_folders(&tree).is_empty());
}

#[test]
fn test_normalized_folder_matching() {
    let tree = build(&json!({
        "children": [
            {"title": "a", "children": [{"title": "x", "url": "https://ONE.example:443/path/"}]},
            {"title": "b", "children": [{"title": "x", "url": "https://one.example/path"}]}
        ]
    }))
    .unwrap();

    assert!(find_duplicate_folders(&tree).is_empty());

    let finder = DuplicateFinder::with_config(DuplicateConfig {
        url_matching: UrlMatching::Normalized,
        ..DuplicateConfig::default()
    });
    assert_eq!(finder.find_duplicate_folders(&tree).len(), 1);
}

#[test]
fn test_assemble_report() {
    let tree = three_folders();
    let dupes = DuplicateFinder::new().find_duplicates(&tree);
    let results: Vec<_> = tree
        .links()
        .map(|link| {
            let result = if link.url() == Some(LINK1) {
                LinkCheckResult::alive(200, 1)
            } else {
                LinkCheckResult::error("connection refused", 3)
            };
            (link.id, result)
        })
        .collect();

    let report = assemble(&tree, dupes.link_groups, dupes.folder_groups, results).unwrap();

    assert_eq!(report.summary().checked, 5);
    assert_eq!(report.summary().alive, 3);
    assert_eq!(report.summary().error, 2);
    assert_eq!(report.summary().link_groups, 2);
    assert_eq!(report.summary().folder_groups, 1);
    assert_eq!(report.link_groups().count(), 2);
    assert_eq!(report.folder_groups().count(), 1);
    assert!(report.has_duplicates());
    assert!(report.has_failures());
    assert_eq!(report.dead_links().count(), 0);
    assert_eq!(report.failures().count(), 2);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["summary"]["alive"], 3);
    assert_eq!(json["duplicate_groups"][0]["kind"], "link");
}

#[test]
fn test_assemble_rejects_unknown_group_member() {
    let tree = three_folders();
    let mut groups = find_duplicate_links(&tree);
    groups[0].members.push(NodeId::new(999));

    let err = assemble(&tree, groups, Vec::new(), Vec::<(NodeId, LinkCheckResult)>::new()).unwrap_err();
    assert_eq!(
        err,
        InconsistentReportError::UnknownGroupMember {
            id: NodeId::new(999)
        }
    );
}

/// root -> {A, B}, where B was filled before A: B{x, y} then A{y, x}.
fn filled_out_of_order() -> BookmarkTree {
    let mut builder = TreeBuilder::new("");
    let root = builder.root();
    let a = builder.add_folder(root, "A").unwrap();
    let b = builder.add_folder(root, "B").unwrap();
    builder.add_link(b, "x in B", "https://x/", None).unwrap();
    builder.add_link(b, "y in B", "https://y/", None).unwrap();
    builder.add_link(a, "y in A", "https://y/", None).unwrap();
    builder.add_link(a, "x in A", "https://x/", None).unwrap();
    builder.build()
}

#[test]
fn test_groups_follow_walk_order_not_id_order() {
    let tree = filled_out_of_order();

    let links = find_duplicate_links(&tree);
    let keys: Vec<&str> = links.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys, vec!["https://y/", "https://x/"]);
    assert_eq!(links[0].members, vec![NodeId::new(4), NodeId::new(5)]);
    assert_eq!(links[1].members, vec![NodeId::new(3), NodeId::new(6)]);
    assert_eq!(links[0].representative_title, "y in B");

    let folders = find_duplicate_folders(&tree);
    assert_eq!(folders.len(), 1);
    assert_eq!(folders[0].members, vec![NodeId::new(1), NodeId::new(2)]);
    assert!(folders[0].contains(NodeId::new(2)));
}

#[test]
fn test_assemble_rejects_folder_in_link_group() {
    let tree = three_folders();
    let mut groups = find_duplicate_links(&tree);
    let folder = id_of(&tree, "A");
    groups[0].members.insert(0, folder);

    let err = assemble(&tree, groups, Vec::new(), Vec::<(NodeId, LinkCheckResult)>::new()).unwrap_err();
    assert_eq!(
        err,
        InconsistentReportError::WrongMemberKind {
            id: folder,
            expected: "link",
        }
    );
}
