//! Arena-backed bookmark tree and statistics.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::error::{ImportWarning, MalformedExportError};
use crate::node::{BookmarkNode, NodeId, NodeKind};

/// Summary statistics for an imported tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    /// Total number of links.
    pub total_links: u64,
    /// Total number of folders, excluding the root.
    pub total_folders: u64,
    /// Separators dropped during import.
    pub separators_skipped: u64,
    /// Number of distinct URLs.
    pub unique_urls: u64,
    /// Maximum depth reached.
    pub max_depth: u32,
}

/// Complete imported bookmark tree.
///
/// Nodes live in a flat arena indexed by [`NodeId`]; parents are referenced
/// by id. The tree is read-only once built.
#[derive(Debug, Clone, Serialize)]
pub struct BookmarkTree {
    nodes: Vec<BookmarkNode>,
    stats: TreeStats,
    warnings: Vec<ImportWarning>,
    imported_at: DateTime<Utc>,
}

impl BookmarkTree {
    /// The root folder.
    pub fn root(&self) -> &BookmarkNode {
        &self.nodes[0]
    }

    /// Look up a node by id.
    pub fn get(&self, id: NodeId) -> Option<&BookmarkNode> {
        self.nodes.get(id.index())
    }

    /// Total number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the root has no children.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &BookmarkNode> {
        self.nodes.iter()
    }

    /// All nodes in pre-order, root first.
    ///
    /// Matches id order for imported trees, but not for trees built with
    /// [`TreeBuilder`] in some other order.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![NodeId::new(0)],
        }
    }

    /// All links in pre-order.
    pub fn links(&self) -> impl Iterator<Item = &BookmarkNode> {
        self.preorder().filter(|n| n.is_link())
    }

    /// All folders in pre-order, root included.
    pub fn folders(&self) -> impl Iterator<Item = &BookmarkNode> {
        self.preorder().filter(|n| n.is_folder())
    }

    /// Check whether `id` names a link in this tree.
    pub fn contains_link(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(BookmarkNode::is_link)
    }

    /// Direct children of a folder.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &BookmarkNode> {
        self.get(id)
            .map(BookmarkNode::children)
            .unwrap_or_default()
            .iter()
            .filter_map(|child| self.get(*child))
    }

    /// Ancestors of a node, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.get(id).and_then(|n| n.parent),
        }
    }

    /// Slash-separated titles of the folders enclosing `id`.
    ///
    /// The root contributes nothing, so top-level entries live at `/`.
    pub fn folder_path(&self, id: NodeId) -> String {
        let mut titles: Vec<&str> = self
            .ancestors(id)
            .filter(|n| n.parent.is_some())
            .map(|n| n.title.as_str())
            .collect();
        titles.reverse();
        format!("/{}", titles.join("/"))
    }

    /// URLs of every link below `id`, in pre-order.
    pub fn descendant_urls(&self, id: NodeId) -> Vec<&str> {
        let mut urls = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.get(current) else {
                continue;
            };
            match &node.kind {
                NodeKind::Link { url, .. } => urls.push(url.as_str()),
                NodeKind::Folder { children } => stack.extend(children.iter().rev()),
            }
        }
        urls
    }

    /// Pre-order traversal yielding each node with its ancestor path.
    ///
    /// Every call starts a fresh traversal.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            tree: self,
            stack: vec![NodeId::new(0)],
        }
    }

    /// Summary statistics.
    pub fn stats(&self) -> &TreeStats {
        &self.stats
    }

    /// Warnings encountered during import.
    pub fn warnings(&self) -> &[ImportWarning] {
        &self.warnings
    }

    /// Check if there were any warnings during import.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// When the tree was built.
    pub fn imported_at(&self) -> DateTime<Utc> {
        self.imported_at
    }
}

/// Iterator over a node's ancestors, nearest first.
pub struct Ancestors<'a> {
    tree: &'a BookmarkTree,
    next: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a BookmarkNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.tree.get(self.next?)?;
        self.next = node.parent;
        Some(node)
    }
}

/// Node-only pre-order traversal created by [`BookmarkTree::preorder`].
pub struct Preorder<'a> {
    tree: &'a BookmarkTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a BookmarkNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.tree.get(self.stack.pop()?)?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

/// One step of a tree walk.
#[derive(Debug, Clone)]
pub struct WalkEntry<'a> {
    /// The visited node.
    pub node: &'a BookmarkNode,
    /// Ids of the enclosing folders, root first.
    pub ancestors: Vec<NodeId>,
}

/// Lazy pre-order traversal created by [`BookmarkTree::walk`].
pub struct Walk<'a> {
    tree: &'a BookmarkTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = WalkEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.tree.get(id)?;
        self.stack.extend(node.children().iter().rev());

        let mut ancestors: Vec<NodeId> = self.tree.ancestors(id).map(|n| n.id).collect();
        ancestors.reverse();

        Some(WalkEntry { node, ancestors })
    }
}

/// Incremental constructor for [`BookmarkTree`].
///
/// Every added node is a fresh arena slot attached to an existing folder,
/// so the result is acyclic by construction.
#[derive(Debug)]
pub struct TreeBuilder {
    nodes: Vec<BookmarkNode>,
    separators_skipped: u64,
    warnings: Vec<ImportWarning>,
}

impl TreeBuilder {
    /// Start a tree whose root folder has the given title.
    pub fn new(root_title: impl Into<CompactString>) -> Self {
        let root = BookmarkNode {
            id: NodeId::new(0),
            title: root_title.into(),
            parent: None,
            depth: 0,
            kind: NodeKind::Folder {
                children: Vec::new(),
            },
        };
        Self {
            nodes: vec![root],
            separators_skipped: 0,
            warnings: Vec::new(),
        }
    }

    /// Id of the root folder.
    pub fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    /// Add a folder under `parent`.
    pub fn add_folder(
        &mut self,
        parent: NodeId,
        title: impl Into<CompactString>,
    ) -> Result<NodeId, MalformedExportError> {
        self.attach(
            parent,
            title.into(),
            NodeKind::Folder {
                children: Vec::new(),
            },
        )
    }

    /// Add a link under `parent`.
    pub fn add_link(
        &mut self,
        parent: NodeId,
        title: impl Into<CompactString>,
        url: impl Into<CompactString>,
        added_at: Option<DateTime<Utc>>,
    ) -> Result<NodeId, MalformedExportError> {
        self.attach(
            parent,
            title.into(),
            NodeKind::Link {
                url: url.into(),
                added_at,
            },
        )
    }

    /// Count a separator that was dropped.
    pub fn record_separator(&mut self) {
        self.separators_skipped += 1;
    }

    /// Record a non-fatal import warning.
    pub fn warn(&mut self, warning: ImportWarning) {
        self.warnings.push(warning);
    }

    /// Slash-separated titles from the root down to `id`, inclusive.
    ///
    /// The root contributes nothing, so `path_to(root)` is `/`.
    pub fn path_to(&self, id: NodeId) -> String {
        let mut titles = Vec::new();
        let mut next = Some(id);
        while let Some(node) = next.and_then(|current| self.nodes.get(current.index())) {
            if node.parent.is_some() {
                titles.push(node.title.as_str());
            }
            next = node.parent;
        }
        titles.reverse();
        format!("/{}", titles.join("/"))
    }

    fn attach(
        &mut self,
        parent: NodeId,
        title: CompactString,
        kind: NodeKind,
    ) -> Result<NodeId, MalformedExportError> {
        let id = NodeId::new(self.nodes.len() as u64);
        let parent_node = self
            .nodes
            .get_mut(parent.index())
            .ok_or(MalformedExportError::UnknownNode { id: parent })?;
        let depth = parent_node.depth + 1;
        match &mut parent_node.kind {
            NodeKind::Folder { children } => children.push(id),
            NodeKind::Link { .. } => return Err(MalformedExportError::NotAFolder { id: parent }),
        }
        self.nodes.push(BookmarkNode {
            id,
            title,
            parent: Some(parent),
            depth,
            kind,
        });
        Ok(id)
    }

    /// Finish the tree and compute its statistics.
    pub fn build(self) -> BookmarkTree {
        let mut stats = TreeStats {
            separators_skipped: self.separators_skipped,
            ..TreeStats::default()
        };
        let mut urls: HashSet<&str> = HashSet::new();

        for node in &self.nodes {
            stats.max_depth = stats.max_depth.max(node.depth);
            match &node.kind {
                NodeKind::Link { url, .. } => {
                    stats.total_links += 1;
                    urls.insert(url.as_str());
                }
                NodeKind::Folder { .. } if node.parent.is_some() => stats.total_folders += 1,
                NodeKind::Folder { .. } => {}
            }
        }
        stats.unique_urls = urls.len() as u64;

        BookmarkTree {
            nodes: self.nodes,
            stats,
            warnings: self.warnings,
            imported_at: Utc::now(),
        }
    }
}
