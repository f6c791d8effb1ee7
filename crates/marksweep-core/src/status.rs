//! Per-link check outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

/// Classification of a single link check.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CheckStatus {
    /// The server answered with a non-error status.
    Alive,
    /// The server answered with 4xx or 5xx.
    Dead,
    /// No answer after all retries, or a non-HTTP client failure.
    Error,
    /// Not probed: unsupported URL, limit reached, or run cancelled.
    Skipped,
}

impl CheckStatus {
    /// Whether this status counts as a failed link.
    pub fn is_failure(self) -> bool {
        matches!(self, CheckStatus::Dead | CheckStatus::Error)
    }
}

/// Outcome of checking one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkCheckResult {
    /// Final classification.
    pub status: CheckStatus,

    /// HTTP status of the last response, if any was received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,

    /// Description of the last failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,

    /// When the check finished.
    pub checked_at: DateTime<Utc>,

    /// Number of network attempts made (0 when skipped).
    pub attempts: u32,

    /// Where redirects ended up, when different from the original URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
}

impl LinkCheckResult {
    /// A reachable link.
    pub fn alive(http_status: u16, attempts: u32) -> Self {
        Self::new(CheckStatus::Alive, Some(http_status), None, attempts)
    }

    /// A link answering with an error status.
    pub fn dead(http_status: u16, attempts: u32) -> Self {
        Self::new(CheckStatus::Dead, Some(http_status), None, attempts)
    }

    /// A link that could not be fetched.
    pub fn error(detail: impl Into<String>, attempts: u32) -> Self {
        Self::new(CheckStatus::Error, None, Some(detail.into()), attempts)
    }

    /// A link that was never probed.
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::new(CheckStatus::Skipped, None, Some(reason.into()), 0)
    }

    /// Record where redirects ended up.
    pub fn with_final_url(mut self, final_url: impl Into<String>) -> Self {
        self.final_url = Some(final_url.into());
        self
    }

    fn new(
        status: CheckStatus,
        http_status: Option<u16>,
        error_detail: Option<String>,
        attempts: u32,
    ) -> Self {
        Self {
            status,
            http_status,
            error_detail,
            checked_at: Utc::now(),
            attempts,
            final_url: None,
        }
    }

    /// Check if the link is reachable.
    pub fn is_alive(&self) -> bool {
        self.status == CheckStatus::Alive
    }

    /// Check if the link is dead or errored.
    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }
}
