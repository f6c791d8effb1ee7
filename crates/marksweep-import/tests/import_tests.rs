use marksweep_import::{ExportImporter, MalformedExportError, NodeId, WarningKind, parse_export};
use serde_json::json;

fn firefox_backup() -> serde_json::Value {
    json!({
        "guid": "root________",
        "title": "",
        "index": 0,
        "dateAdded": 1_539_000_000_000_000i64,
        "lastModified": 1_539_000_000_000_000i64,
        "id": 1,
        "typeCode": 2,
        "type": "text/x-moz-place-container",
        "root": "placesRoot",
        "children": [
            {
                "guid": "menu________",
                "title": "menu",
                "index": 0,
                "id": 2,
                "typeCode": 2,
                "type": "text/x-moz-place-container",
                "root": "bookmarksMenuFolder",
                "children": [
                    {
                        "guid": "aaaaaaaaaaaa",
                        "title": "Mozilla",
                        "index": 0,
                        "dateAdded": 1_539_000_000_000_000i64,
                        "id": 10,
                        "typeCode": 1,
                        "type": "text/x-moz-place",
                        "uri": "https://www.mozilla.org/"
                    },
                    {
                        "guid": "bbbbbbbbbbbb",
                        "title": "",
                        "index": 1,
                        "id": 11,
                        "typeCode": 3,
                        "type": "text/x-moz-place-separator"
                    },
                    {
                        "guid": "cccccccccccc",
                        "title": "Empty",
                        "index": 2,
                        "id": 12,
                        "typeCode": 2,
                        "type": "text/x-moz-place-container"
                    }
                ]
            },
            {
                "guid": "toolbar_____",
                "title": "toolbar",
                "index": 1,
                "id": 3,
                "typeCode": 2,
                "type": "text/x-moz-place-container",
                "children": [
                    {
                        "guid": "dddddddddddd",
                        "title": "Mozilla again",
                        "index": 0,
                        "id": 13,
                        "typeCode": 1,
                        "type": "text/x-moz-place",
                        "uri": "https://www.mozilla.org/"
                    }
                ]
            }
        ]
    })
}

#[test]
fn test_firefox_backup_import() {
    let tree = ExportImporter::new().import_value(&firefox_backup()).unwrap();

    let stats = tree.stats();
    assert_eq!(stats.total_links, 2);
    assert_eq!(stats.total_folders, 3);
    assert_eq!(stats.separators_skipped, 1);
    assert_eq!(stats.unique_urls, 1);

    let mozilla = tree
        .links()
        .find(|n| n.title == "Mozilla")
        .expect("link imported");
    assert_eq!(mozilla.url(), Some("https://www.mozilla.org/"));
    assert_eq!(tree.folder_path(mozilla.id), "/menu");
    match &mozilla.kind {
        marksweep_import::NodeKind::Link { added_at, .. } => {
            assert_eq!(added_at.map(|t| t.timestamp()), Some(1_539_000_000));
        }
        other => panic!("expected link, got {other:?}"),
    }
}

#[test]
fn test_ids_are_preorder() {
    let tree = ExportImporter::new().import_value(&firefox_backup()).unwrap();
    let ids: Vec<NodeId> = tree.walk().map(|e| e.node.id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
    assert_eq!(ids.len(), tree.len());
}

#[test]
fn test_unknown_moz_type_rejected() {
    let err = ExportImporter::new()
        .import_value(&json!({
            "children": [{"title": "x", "type": "text/x-moz-place-livemark"}]
        }))
        .unwrap_err();
    assert!(matches!(err, MalformedExportError::UnknownType { .. }));
}

#[test]
fn test_moz_link_requires_uri() {
    let err = ExportImporter::new()
        .import_value(&json!({
            "children": [{"title": "x", "type": "text/x-moz-place"}]
        }))
        .unwrap_err();
    assert!(matches!(
        err,
        MalformedExportError::MissingField { field: "uri", .. }
    ));
}

#[test]
fn test_entry_without_shape_rejected() {
    let err = parse_export(r#"{"children": [{"title": "mystery"}]}"#).unwrap_err();
    match err {
        MalformedExportError::UnknownEntry { path } => assert_eq!(path, "/[0]"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_invalid_json_reported() {
    let err = parse_export("{\"children\": [").unwrap_err();
    assert!(matches!(err, MalformedExportError::Json(_)));
}

#[test]
fn test_empty_url_is_warning() {
    let tree = parse_export(r#"{"children": [{"title": "blank", "url": ""}]}"#).unwrap();
    assert_eq!(tree.stats().total_links, 1);
    assert_eq!(tree.warnings()[0].kind, WarningKind::EmptyUrl);
}

#[test]
fn test_deep_nesting_does_not_overflow() {
    let mut value = json!({"title": "leaf", "url": "https://deep.example/"});
    for depth in 0..2_000 {
        value = json!({"title": format!("level {depth}"), "children": [value]});
    }
    let export = json!({"children": [value]});

    let tree = ExportImporter::new().import_value(&export).unwrap();
    assert_eq!(tree.stats().total_links, 1);
    assert_eq!(tree.stats().max_depth, 2_001);
}
