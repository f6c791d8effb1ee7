//! Error types for import and report assembly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::node::NodeId;

/// Errors that make a bookmark export unusable.
///
/// Any of these aborts the import; no partial tree is produced.
#[derive(Debug, Error)]
pub enum MalformedExportError {
    /// The document is not valid JSON.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The top-level value is not an object.
    #[error("Export root must be a JSON object")]
    RootNotObject,

    /// A required field is absent.
    #[error("Missing required field `{field}` at {path}")]
    MissingField { path: String, field: &'static str },

    /// A field is present but has the wrong shape.
    #[error("Field `{field}` at {path} must be {expected}")]
    InvalidField {
        path: String,
        field: &'static str,
        expected: &'static str,
    },

    /// An entry has neither `url` nor `children`.
    #[error("Entry at {path} is neither a folder nor a link")]
    UnknownEntry { path: String },

    /// A Firefox entry carries an unrecognized `type`.
    #[error("Unknown bookmark type `{kind}` at {path}")]
    UnknownType { path: String, kind: String },

    /// A folder repeats the identifier of one of its own ancestors.
    #[error("Folder at {path} repeats the identifier `{key}` of one of its ancestors")]
    Cycle { path: String, key: String },

    /// Children were attached to something that is not a folder.
    #[error("Node {id} is not a folder and cannot hold children")]
    NotAFolder { id: NodeId },

    /// A referenced node does not exist.
    #[error("Node {id} does not exist")]
    UnknownNode { id: NodeId },
}

/// Internal invariant violations found while assembling a report.
///
/// These indicate a caller bug rather than bad input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InconsistentReportError {
    /// A check result names an id the tree does not contain.
    #[error("Check result references unknown link {id}")]
    UnknownLink { id: NodeId },

    /// A check result names a folder.
    #[error("Check result references {id}, which is a folder")]
    NotALink { id: NodeId },

    /// Two check results were supplied for the same link.
    #[error("Link {id} has more than one check result")]
    DuplicateResult { id: NodeId },

    /// A duplicate group lists an id the tree does not contain.
    #[error("Duplicate group member {id} is not in the tree")]
    UnknownGroupMember { id: NodeId },

    /// A duplicate group member is not of the group's kind.
    #[error("Duplicate group member {id} is not a {expected}")]
    WrongMemberKind { id: NodeId, expected: &'static str },
}

/// Kind of import warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// `date_added` could not be interpreted and was dropped.
    InvalidTimestamp,
    /// A link has an empty URL.
    EmptyUrl,
}

/// Non-fatal observation made during import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportWarning {
    /// Folder path of the offending entry.
    pub path: String,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ImportWarning {
    /// Create a new import warning.
    pub fn new(path: impl Into<String>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create an invalid timestamp warning.
    pub fn invalid_timestamp(path: impl Into<String>, raw: &str) -> Self {
        Self {
            message: format!("Unreadable date_added value: {raw}"),
            path: path.into(),
            kind: WarningKind::InvalidTimestamp,
        }
    }

    /// Create an empty URL warning.
    pub fn empty_url(path: impl Into<String>, title: &str) -> Self {
        Self {
            message: format!("Bookmark \"{title}\" has an empty URL"),
            path: path.into(),
            kind: WarningKind::EmptyUrl,
        }
    }
}
