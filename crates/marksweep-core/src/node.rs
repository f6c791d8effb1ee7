//! Bookmark node types.

use std::fmt;

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Unique identifier for a node within a tree.
///
/// Identifiers double as arena indices: the root is always `NodeId(0)` and
/// every later node gets the next free slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Create a new NodeId from a u64.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Position of this node in the tree arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Type of bookmark node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// A bookmarked URL.
    Link {
        /// Target URL, used verbatim as the duplicate key.
        url: CompactString,
        /// When the bookmark was created, if the export recorded it.
        added_at: Option<DateTime<Utc>>,
    },
    /// A folder holding other nodes.
    Folder {
        /// Child ids in export order.
        children: Vec<NodeId>,
    },
}

impl NodeKind {
    /// Check if this is a link.
    pub fn is_link(&self) -> bool {
        matches!(self, NodeKind::Link { .. })
    }

    /// Check if this is a folder.
    pub fn is_folder(&self) -> bool {
        matches!(self, NodeKind::Folder { .. })
    }
}

/// A single folder or link in the tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkNode {
    /// Unique identifier for this node.
    pub id: NodeId,

    /// Display title.
    pub title: CompactString,

    /// Owning folder (None for the root).
    pub parent: Option<NodeId>,

    /// Distance from the root (root = 0).
    pub depth: u32,

    /// Node type and associated data.
    pub kind: NodeKind,
}

impl BookmarkNode {
    /// Check if this node is a link.
    pub fn is_link(&self) -> bool {
        self.kind.is_link()
    }

    /// Check if this node is a folder.
    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }

    /// The URL of a link, `None` for folders.
    pub fn url(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Link { url, .. } => Some(url.as_str()),
            NodeKind::Folder { .. } => None,
        }
    }

    /// Direct children of a folder; empty for links.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Folder { children } => children,
            NodeKind::Link { .. } => &[],
        }
    }

    /// Get the number of direct children.
    pub fn child_count(&self) -> usize {
        self.children().len()
    }
}
