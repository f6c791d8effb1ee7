//! Bookmark export parsing for marksweep.
//!
//! This crate turns a browser's JSON bookmark export into a
//! [`BookmarkTree`]. Two shapes are understood:
//!
//! - **Generic**: a root object with `children`; folders carry `title` and
//!   `children`, links carry `title`, `url` and an optional `date_added`.
//! - **Firefox backup**: entries tagged with a `type` of
//!   `text/x-moz-place-container`, `text/x-moz-place` (URL in `uri`) or
//!   `text/x-moz-place-separator`.
//!
//! # Example
//!
//! ```rust
//! use marksweep_import::parse_export;
//!
//! let json = r#"{
//!     "children": [
//!         {"title": "Rust", "url": "https://www.rust-lang.org/"},
//!         {"title": "Reading", "children": []}
//!     ]
//! }"#;
//!
//! let tree = parse_export(json).unwrap();
//! assert_eq!(tree.stats().total_links, 1);
//! assert_eq!(tree.stats().total_folders, 1);
//! ```

mod importer;
mod timestamp;

pub use importer::{ExportImporter, build, parse_export};
pub use timestamp::parse_timestamp;

// Re-export core types for convenience
pub use marksweep_core::{
    BookmarkNode, BookmarkTree, ImportWarning, MalformedExportError, NodeId, NodeKind, TreeStats,
    WarningKind,
};
