//! Checker setup errors.

use thiserror::Error;

/// Errors that prevent a [`LinkChecker`](crate::LinkChecker) from being built.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The HTTP client rejected the configuration.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
