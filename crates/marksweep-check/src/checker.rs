//! HTTP link checker.
//!
//! Each URL is probed with HEAD first, falling back to GET for servers that
//! refuse HEAD. Timeouts, connection failures and connections dropped by the
//! peer are retried with the configured backoff; every other failure is final.

use std::collections::HashMap;
use std::error::Error as _;
use std::io::ErrorKind;
use std::pin::pin;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use url::Url;

use marksweep_core::{BookmarkTree, CheckConfig, LinkCheckResult, NodeId};

use crate::error::CheckError;
use crate::progress::CheckProgress;
use crate::PROGRESS_CHANNEL_SIZE;

const SKIP_CANCELLED: &str = "check cancelled";
const SKIP_LIMIT: &str = "check limit reached";

/// Results of checking every link in a tree.
#[derive(Debug, Clone, Default)]
pub struct CheckOutcome {
    /// One result per link id in the tree.
    pub results: HashMap<NodeId, LinkCheckResult>,
    /// The run stopped before every selected URL was probed.
    pub cancelled: bool,
    /// Distinct URLs that were actually probed.
    pub urls_probed: usize,
}

impl CheckOutcome {
    /// The result for one link.
    pub fn get(&self, id: NodeId) -> Option<&LinkCheckResult> {
        self.results.get(&id)
    }

    /// Number of links with a result.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of dead or errored links.
    pub fn failure_count(&self) -> usize {
        self.results.values().filter(|r| r.is_failure()).count()
    }
}

/// Outcome of one HTTP exchange.
struct Probe {
    status: StatusCode,
    final_url: Url,
}

/// Async link checker sharing one HTTP client across all probes.
#[derive(Debug)]
pub struct LinkChecker {
    client: Client,
    config: CheckConfig,
    progress_tx: broadcast::Sender<CheckProgress>,
}

impl LinkChecker {
    /// Build a checker and its HTTP client from `config`.
    pub fn new(config: CheckConfig) -> Result<Self, CheckError> {
        let redirect = if config.follow_redirects {
            Policy::limited(config.max_redirects)
        } else {
            Policy::none()
        };

        let client = Client::builder()
            .timeout(config.timeout())
            .redirect(redirect)
            .user_agent(config.user_agent.clone())
            .build()?;

        let (progress_tx, _) = broadcast::channel(PROGRESS_CHANNEL_SIZE);

        Ok(Self {
            client,
            config,
            progress_tx,
        })
    }

    /// The configuration this checker was built with.
    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Receive progress snapshots from [`check_tree`](Self::check_tree).
    pub fn subscribe(&self) -> broadcast::Receiver<CheckProgress> {
        self.progress_tx.subscribe()
    }

    /// Probe a single URL.
    ///
    /// URLs that do not parse or use a scheme other than http(s) are skipped
    /// without touching the network.
    pub async fn check(&self, url: &str) -> LinkCheckResult {
        let target = match Url::parse(url) {
            Ok(target) if matches!(target.scheme(), "http" | "https") => target,
            Ok(target) => {
                return LinkCheckResult::skipped(format!(
                    "unsupported scheme `{}`",
                    target.scheme()
                ));
            }
            Err(err) => return LinkCheckResult::skipped(format!("invalid URL: {err}")),
        };

        let mut attempts = 0;
        let result = loop {
            attempts += 1;
            match self.probe(&target).await {
                Ok(probe) => break classify(&target, probe, attempts),
                Err(err) if is_transient(&err) && attempts <= self.config.max_retries => {
                    let delay = self.config.retry_backoff.delay(attempts);
                    tracing::debug!(
                        url,
                        attempt = attempts,
                        ?delay,
                        error = %err,
                        "retrying transient failure"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    if !is_transient(&err) {
                        tracing::warn!(url, error = %err, "request failed");
                    }
                    break LinkCheckResult::error(describe(&err), attempts);
                }
            }
        };

        tracing::debug!(url, status = %result.status, attempts, "link checked");
        result
    }

    /// Check every link in `tree`.
    ///
    /// Each distinct URL is probed once and its result shared by every link
    /// carrying it. Cancelling `cancel` stops new probes and drops in-flight
    /// ones; links without a result are then reported as skipped, so every
    /// link id in the tree is present in the outcome.
    pub async fn check_tree(&self, tree: &BookmarkTree, cancel: CancellationToken) -> CheckOutcome {
        let started = Instant::now();

        let mut by_url: IndexMap<&str, Vec<NodeId>> = IndexMap::new();
        for link in tree.links() {
            if let Some(url) = link.url() {
                by_url.entry(url).or_default().push(link.id);
            }
        }

        let limit = self.config.limit.unwrap_or(usize::MAX).min(by_url.len());
        let total_links: usize = by_url.values().map(Vec::len).sum();
        let mut progress = CheckProgress::new(total_links);
        let mut results = HashMap::with_capacity(total_links);
        let mut urls_probed = 0;

        tracing::debug!(
            links = total_links,
            urls = by_url.len(),
            limit,
            concurrency = self.config.concurrency(),
            "starting link check"
        );

        let probes = stream::iter(by_url.keys().take(limit).map(|url| async move {
            let result = self.check(url).await;
            (*url, result)
        }))
        .buffer_unordered(self.config.concurrency())
        .take_until(cancel.cancelled());
        let mut probes = pin!(probes);

        while let Some((url, result)) = probes.next().await {
            urls_probed += 1;
            if let Some(ids) = by_url.get(url) {
                for id in ids {
                    progress.record(&result);
                    results.insert(*id, result.clone());
                }
            }
            progress.current_url = Some(url.to_string());
            progress.elapsed = started.elapsed();
            let _ = self.progress_tx.send(progress.clone());
        }

        let cancelled = urls_probed < limit;
        if cancelled {
            tracing::info!(
                probed = urls_probed,
                remaining = limit - urls_probed,
                "link check cancelled"
            );
        }

        for (index, (_, ids)) in by_url.iter().enumerate() {
            let reason = if index < limit {
                SKIP_CANCELLED
            } else {
                SKIP_LIMIT
            };
            for id in ids {
                results.entry(*id).or_insert_with(|| {
                    let skipped = LinkCheckResult::skipped(reason);
                    progress.record(&skipped);
                    skipped
                });
            }
        }

        progress.current_url = None;
        progress.elapsed = started.elapsed();
        let _ = self.progress_tx.send(progress);

        CheckOutcome {
            results,
            cancelled,
            urls_probed,
        }
    }

    /// HEAD, then GET if the server does not support HEAD.
    async fn probe(&self, target: &Url) -> Result<Probe, reqwest::Error> {
        let response = self.client.head(target.clone()).send().await?;
        let response = match response.status() {
            StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED => {
                tracing::trace!(url = %target, status = %response.status(), "HEAD refused, retrying with GET");
                self.client.get(target.clone()).send().await?
            }
            _ => response,
        };

        Ok(Probe {
            status: response.status(),
            final_url: response.url().clone(),
        })
    }
}

fn classify(target: &Url, probe: Probe, attempts: u32) -> LinkCheckResult {
    let code = probe.status.as_u16();
    let result = if code < 400 {
        LinkCheckResult::alive(code, attempts)
    } else {
        LinkCheckResult::dead(code, attempts)
    };

    if probe.final_url != *target {
        result.with_final_url(probe.final_url)
    } else {
        result
    }
}

/// Timeouts, connection failures (DNS included) and dropped connections may
/// succeed on retry.
fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || (err.is_request() && is_dropped_connection(err))
}

/// The peer reset or closed the connection before the response completed.
fn is_dropped_connection(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>()
            && matches!(
                io.kind(),
                ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::BrokenPipe
                    | ErrorKind::UnexpectedEof
            )
        {
            return true;
        }
        if cause
            .downcast_ref::<hyper::Error>()
            .is_some_and(hyper::Error::is_incomplete_message)
        {
            return true;
        }
        source = cause.source();
    }
    false
}

/// One-line description including the underlying cause.
fn describe(err: &reqwest::Error) -> String {
    let summary = if err.is_timeout() {
        "request timed out"
    } else if err.is_connect() {
        "connection failed"
    } else if is_dropped_connection(err) {
        "connection dropped"
    } else if err.is_redirect() {
        "too many redirects"
    } else {
        "request failed"
    };

    let mut detail = summary.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    detail
}
