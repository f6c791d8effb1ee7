//! Link checker configuration types.

use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Delay policy between retries of a transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetryBackoff {
    /// Retry immediately.
    None,
    /// Wait the same amount before every retry.
    Fixed { delay_ms: u64 },
    /// Double the wait after every retry, up to `max_ms`.
    Exponential { base_ms: u64, max_ms: u64 },
}

impl RetryBackoff {
    /// Delay before the given retry (1 = first retry).
    pub fn delay(&self, retry: u32) -> Duration {
        match *self {
            RetryBackoff::None => Duration::ZERO,
            RetryBackoff::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            RetryBackoff::Exponential { base_ms, max_ms } => {
                let factor = 1u64.checked_shl(retry.saturating_sub(1)).unwrap_or(u64::MAX);
                Duration::from_millis(base_ms.saturating_mul(factor).min(max_ms))
            }
        }
    }
}

impl Default for RetryBackoff {
    fn default() -> Self {
        RetryBackoff::Exponential {
            base_ms: 500,
            max_ms: 8_000,
        }
    }
}

/// Configuration for link checking.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct CheckConfig {
    /// Per-attempt timeout in seconds.
    #[builder(default = "10.0")]
    pub timeout_seconds: f64,

    /// How many times a transient failure is retried.
    #[builder(default = "2")]
    pub max_retries: u32,

    /// Delay policy between retries.
    #[builder(default)]
    pub retry_backoff: RetryBackoff,

    /// Follow 3xx responses to their target.
    #[builder(default = "true")]
    pub follow_redirects: bool,

    /// Redirect hops allowed before giving up.
    #[builder(default = "10")]
    pub max_redirects: usize,

    /// Upper bound on simultaneous in-flight checks.
    #[builder(default = "16")]
    pub max_concurrency: usize,

    /// User-Agent header sent with every request.
    #[builder(default = "default_user_agent()")]
    pub user_agent: String,

    /// Probe at most this many distinct URLs (None = all).
    #[builder(default)]
    pub limit: Option<usize>,
}

fn default_user_agent() -> String {
    concat!("marksweep/", env!("CARGO_PKG_VERSION")).to_string()
}

impl CheckConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(timeout) = self.timeout_seconds {
            if !timeout.is_finite() || timeout <= 0.0 {
                return Err("Timeout must be a positive number of seconds".to_string());
            }
        }
        if self.max_concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }
        Ok(())
    }
}

impl CheckConfig {
    /// Create a new check config builder.
    pub fn builder() -> CheckConfigBuilder {
        CheckConfigBuilder::default()
    }

    /// Per-attempt timeout as a [`Duration`].
    ///
    /// Values that cannot form a duration fall back to the default.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_seconds)
            .ok()
            .filter(|d| !d.is_zero())
            .unwrap_or(Duration::from_secs(10))
    }

    /// Concurrency bound, never below one.
    pub fn concurrency(&self) -> usize {
        self.max_concurrency.max(1)
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10.0,
            max_retries: 2,
            retry_backoff: RetryBackoff::default(),
            follow_redirects: true,
            max_redirects: 10,
            max_concurrency: 16,
            user_agent: default_user_agent(),
            limit: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = CheckConfig::builder()
            .timeout_seconds(2.5)
            .max_retries(4u32)
            .follow_redirects(false)
            .max_concurrency(8usize)
            .build()
            .unwrap();

        assert_eq!(config.timeout(), Duration::from_millis(2500));
        assert_eq!(config.max_retries, 4);
        assert!(!config.follow_redirects);
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.limit, None);
    }

    #[test]
    fn test_config_builder_rejects_zero_concurrency() {
        let result = CheckConfig::builder().max_concurrency(0usize).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_builder_rejects_negative_timeout() {
        let result = CheckConfig::builder().timeout_seconds(-1.0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_defaults_match_default() {
        assert_eq!(CheckConfig::builder().build().unwrap(), CheckConfig::default());
    }

    #[test]
    fn test_exponential_backoff() {
        let backoff = RetryBackoff::Exponential {
            base_ms: 100,
            max_ms: 350,
        };
        assert_eq!(backoff.delay(1), Duration::from_millis(100));
        assert_eq!(backoff.delay(2), Duration::from_millis(200));
        assert_eq!(backoff.delay(3), Duration::from_millis(350));
        assert_eq!(backoff.delay(70), Duration::from_millis(350));
    }

    #[test]
    fn test_fixed_and_none_backoff() {
        assert_eq!(
            RetryBackoff::Fixed { delay_ms: 250 }.delay(5),
            Duration::from_millis(250)
        );
        assert_eq!(RetryBackoff::None.delay(1), Duration::ZERO);
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: CheckConfig =
            serde_json::from_str(r#"{"max_retries": 0, "retry_backoff": {"kind": "none"}}"#)
                .unwrap();
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.retry_backoff, RetryBackoff::None);
        assert_eq!(config.max_concurrency, 16);
    }
}
