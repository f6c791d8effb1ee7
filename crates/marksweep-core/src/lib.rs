//! Core types and traits for marksweep.
//!
//! This crate provides the fundamental data structures used throughout
//! the marksweep workspace: the arena-backed bookmark tree, link check
//! results, the error taxonomy, and checker configuration.

mod config;
mod error;
mod node;
mod status;
mod tree;

pub use config::{CheckConfig, CheckConfigBuilder, RetryBackoff};
pub use error::{ImportWarning, InconsistentReportError, MalformedExportError, WarningKind};
pub use node::{BookmarkNode, NodeId, NodeKind};
pub use status::{CheckStatus, LinkCheckResult};
pub use tree::{Ancestors, BookmarkTree, Preorder, TreeBuilder, TreeStats, Walk, WalkEntry};
