//! Analysis algorithms for marksweep.
//!
//! This crate provides the analysis side of a run:
//!
//! - **Duplicate detection** - links sharing a URL, folders whose
//!   descendant URL sets match
//! - **Report assembly** - merges duplicate groups and link check results
//!   into one immutable [`Report`]
//!
//! # Duplicate Detection
//!
//! Link groups come from a single URL multimap pass. Folder groups compare
//! content signatures: each folder's set of descendant URLs, built
//! bottom-up and digested with BLAKE3.
//!
//! ```rust
//! use marksweep_analyze::DuplicateFinder;
//! use marksweep_import::parse_export;
//!
//! let tree = parse_export(r#"{"children": [
//!     {"title": "A", "children": [{"title": "x", "url": "https://x.example/"}]},
//!     {"title": "B", "children": [{"title": "x", "url": "https://x.example/"}]}
//! ]}"#).unwrap();
//!
//! let report = DuplicateFinder::new().find_duplicates(&tree);
//! assert_eq!(report.link_groups.len(), 1);
//! assert_eq!(report.folder_groups.len(), 1);
//! ```
//!
//! # Report Assembly
//!
//! ```rust,ignore
//! let report = assemble(&tree, dupes.link_groups, dupes.folder_groups, outcome.results)?;
//! for (id, result) in report.failures() {
//!     println!("{}: {}", tree.folder_path(id), result.status);
//! }
//! ```

mod duplicates;
mod normalize;
mod report;

pub use duplicates::{
    DuplicateConfig, DuplicateConfigBuilder, DuplicateFinder, DuplicateGroup, DuplicateReport,
    GroupKind, SignatureHash, UrlMatching, find_duplicate_folders, find_duplicate_links,
};
pub use normalize::normalize_url;
pub use report::{Report, ReportSummary, assemble};

// Re-export core types
pub use marksweep_core::{BookmarkTree, InconsistentReportError, LinkCheckResult, NodeId};
