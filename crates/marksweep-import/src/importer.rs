//! JSON export to tree conversion.

use std::rc::Rc;

use serde_json::{Map, Value};

use marksweep_core::{BookmarkTree, ImportWarning, MalformedExportError, NodeId, TreeBuilder};

use crate::timestamp::parse_timestamp;

const MOZ_PREFIX: &str = "text/x-moz-place";
const MOZ_CONTAINER: &str = "text/x-moz-place-container";
const MOZ_PLACE: &str = "text/x-moz-place";
const MOZ_SEPARATOR: &str = "text/x-moz-place-separator";

/// Parse a JSON document and build a tree from it.
pub fn parse_export(json: &str) -> Result<BookmarkTree, MalformedExportError> {
    ExportImporter::new().import_str(json)
}

/// Build a tree from an already-parsed export.
pub fn build(raw_export: &Value) -> Result<BookmarkTree, MalformedExportError> {
    ExportImporter::new().import_value(raw_export)
}

/// Converts bookmark exports into [`BookmarkTree`]s.
///
/// Node ids are assigned in pre-order, starting with the root at 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportImporter;

/// Classified export entry.
enum Entry<'a> {
    Folder {
        title: &'a str,
        children: &'a [Value],
        key: Option<String>,
    },
    Link {
        title: &'a str,
        url: &'a str,
        added: Option<&'a Value>,
    },
    Separator,
}

/// Pending entry on the traversal stack.
struct Frame<'a> {
    value: &'a Value,
    parent: NodeId,
    index: usize,
    /// Identity keys of the enclosing folders.
    lineage: Rc<Vec<String>>,
}

impl ExportImporter {
    /// Create a new importer.
    pub fn new() -> Self {
        Self
    }

    /// Parse and import a JSON document.
    pub fn import_str(&self, json: &str) -> Result<BookmarkTree, MalformedExportError> {
        let value: Value = serde_json::from_str(json)?;
        self.import_value(&value)
    }

    /// Import an already-parsed JSON document.
    pub fn import_value(&self, raw: &Value) -> Result<BookmarkTree, MalformedExportError> {
        let root = raw.as_object().ok_or(MalformedExportError::RootNotObject)?;
        let children = children_of(root, Location::Root)?.ok_or(MalformedExportError::MissingField {
            path: "/".to_string(),
            field: "children",
        })?;
        let root_title = root.get("title").and_then(Value::as_str).unwrap_or_default();

        let mut builder = TreeBuilder::new(root_title);
        let root_lineage = Rc::new(identity_key(root).into_iter().collect::<Vec<_>>());
        let mut stack = frames(children, builder.root(), &root_lineage);

        while let Some(frame) = stack.pop() {
            let location = Location::Entry {
                builder: &builder,
                parent: frame.parent,
                index: frame.index,
            };

            match classify(frame.value, location)? {
                Entry::Separator => builder.record_separator(),
                Entry::Link { title, url, added } => {
                    let added_at = match added {
                        None | Some(Value::Null) => None,
                        Some(raw) => {
                            let parsed = parse_timestamp(raw);
                            if parsed.is_none() {
                                let folder = builder.path_to(frame.parent);
                                builder.warn(ImportWarning::invalid_timestamp(
                                    &folder,
                                    &raw.to_string(),
                                ));
                            }
                            parsed
                        }
                    };
                    if url.is_empty() {
                        let folder = builder.path_to(frame.parent);
                        builder.warn(ImportWarning::empty_url(&folder, title));
                    }
                    builder.add_link(frame.parent, title, url, added_at)?;
                }
                Entry::Folder {
                    title,
                    children,
                    key,
                } => {
                    let lineage = match key {
                        Some(key) if frame.lineage.contains(&key) => {
                            return Err(MalformedExportError::Cycle {
                                path: join_path(&builder.path_to(frame.parent), title),
                                key,
                            });
                        }
                        Some(key) => {
                            let mut lineage = frame.lineage.as_ref().clone();
                            lineage.push(key);
                            Rc::new(lineage)
                        }
                        None => Rc::clone(&frame.lineage),
                    };
                    let id = builder.add_folder(frame.parent, title)?;
                    stack.extend(frames(children, id, &lineage));
                }
            }
        }

        let tree = builder.build();
        let stats = tree.stats();
        tracing::debug!(
            links = stats.total_links,
            folders = stats.total_folders,
            separators = stats.separators_skipped,
            warnings = tree.warnings().len(),
            "imported bookmark export"
        );
        Ok(tree)
    }
}

/// Position of an entry in the export, rendered only when reported.
#[derive(Clone, Copy)]
enum Location<'b> {
    Root,
    Entry {
        builder: &'b TreeBuilder,
        parent: NodeId,
        index: usize,
    },
}

impl Location<'_> {
    fn render(self) -> String {
        match self {
            Location::Root => "/".to_string(),
            Location::Entry {
                builder,
                parent,
                index,
            } => format!("{}[{index}]", builder.path_to(parent)),
        }
    }
}

/// Stack frames for `children`, reversed so they pop in export order.
fn frames<'a>(children: &'a [Value], parent: NodeId, lineage: &Rc<Vec<String>>) -> Vec<Frame<'a>> {
    children
        .iter()
        .enumerate()
        .rev()
        .map(|(index, value)| Frame {
            value,
            parent,
            index,
            lineage: Rc::clone(lineage),
        })
        .collect()
}

fn classify<'a>(value: &'a Value, path: Location<'_>) -> Result<Entry<'a>, MalformedExportError> {
    let obj = value
        .as_object()
        .ok_or_else(|| MalformedExportError::UnknownEntry {
            path: path.render(),
        })?;

    if let Some(kind) = obj.get("type").and_then(Value::as_str)
        && kind.starts_with(MOZ_PREFIX)
    {
        return match kind {
            MOZ_CONTAINER => Ok(Entry::Folder {
                title: required_str(obj, "title", path)?,
                children: children_of(obj, path)?.unwrap_or_default(),
                key: identity_key(obj),
            }),
            MOZ_PLACE => Ok(Entry::Link {
                title: required_str(obj, "title", path)?,
                url: required_str(obj, "uri", path)?,
                added: obj.get("dateAdded"),
            }),
            MOZ_SEPARATOR => Ok(Entry::Separator),
            other => Err(MalformedExportError::UnknownType {
                path: path.render(),
                kind: other.to_string(),
            }),
        };
    }

    if obj.contains_key("url") {
        Ok(Entry::Link {
            title: required_str(obj, "title", path)?,
            url: required_str(obj, "url", path)?,
            added: obj.get("date_added"),
        })
    } else if let Some(children) = children_of(obj, path)? {
        Ok(Entry::Folder {
            title: required_str(obj, "title", path)?,
            children,
            key: identity_key(obj),
        })
    } else {
        Err(MalformedExportError::UnknownEntry {
            path: path.render(),
        })
    }
}

fn required_str<'a>(
    obj: &'a Map<String, Value>,
    field: &'static str,
    path: Location<'_>,
) -> Result<&'a str, MalformedExportError> {
    match obj.get(field) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(MalformedExportError::InvalidField {
            path: path.render(),
            field,
            expected: "a string",
        }),
        None => Err(MalformedExportError::MissingField {
            path: path.render(),
            field,
        }),
    }
}

fn children_of<'a>(
    obj: &'a Map<String, Value>,
    path: Location<'_>,
) -> Result<Option<&'a [Value]>, MalformedExportError> {
    match obj.get("children") {
        None => Ok(None),
        Some(Value::Array(children)) => Ok(Some(children.as_slice())),
        Some(_) => Err(MalformedExportError::InvalidField {
            path: path.render(),
            field: "children",
            expected: "an array",
        }),
    }
}

/// Stable identity of a folder: its `guid`, else its `id`.
fn identity_key(obj: &Map<String, Value>) -> Option<String> {
    match obj.get("guid").or_else(|| obj.get("id"))? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn join_path(base: &str, title: &str) -> String {
    if base == "/" {
        format!("/{title}")
    } else {
        format!("{base}/{title}")
    }
}
