//! Link liveness checking for marksweep.
//!
//! This crate probes bookmark URLs over HTTP with bounded concurrency,
//! retries transient failures, and publishes progress snapshots on a
//! broadcast channel. Per-link failures are reported as data in
//! [`LinkCheckResult`], never as errors.

mod checker;
mod error;
mod progress;

pub use checker::{CheckOutcome, LinkChecker};
pub use error::CheckError;
pub use progress::CheckProgress;

// Re-export core types
pub use marksweep_core::{CheckConfig, CheckStatus, LinkCheckResult, RetryBackoff};
pub use tokio_util::sync::CancellationToken;

/// Buffer size for progress updates.
pub const PROGRESS_CHANNEL_SIZE: usize = 100;
