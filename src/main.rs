//! marksweep - Find duplicate and dead links in browser bookmark exports.
//!
//! Usage:
//!   marksweep report FILE       Duplicates plus link check
//!   marksweep duplicates FILE   Duplicate links and folders only
//!   marksweep check FILE        Link check only
//!   marksweep --help            Show help

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, ensure};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use marksweep_analyze::{
    DuplicateConfig, DuplicateFinder, DuplicateReport, Report, UrlMatching, assemble,
};
use marksweep_check::{CheckConfig, CheckOutcome, CheckProgress, LinkChecker};
use marksweep_core::{BookmarkTree, NodeId};
use marksweep_import::parse_export;

#[derive(Parser)]
#[command(
    name = "marksweep",
    version,
    about = "Find duplicate and dead links in browser bookmark exports",
    long_about = "marksweep reads a JSON bookmark export (generic or Firefox backup), \
                  reports links and folders that duplicate each other, and probes \
                  every link over HTTP.\n\n\
                  Exit status: +1 when any link failed, +2 when duplicates were found."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find duplicates and check every link
    Report {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        duplicates: DuplicateArgs,
        #[command(flatten)]
        check: CheckArgs,
    },

    /// Find duplicate links and folders
    Duplicates {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        duplicates: DuplicateArgs,
    },

    /// Check every link
    Check {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        check: CheckArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Bookmark export to read
    file: PathBuf,

    /// TOML config file with [check] and [duplicates] tables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Args)]
struct DuplicateArgs {
    /// Compare URLs after case, port and trailing-slash normalization
    #[arg(long)]
    normalize_urls: bool,
}

#[derive(Args)]
struct CheckArgs {
    /// Probe at most this many distinct URLs
    #[arg(short, long)]
    limit: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(short, long)]
    timeout: Option<f64>,

    /// Retries for timeouts and connection failures
    #[arg(short, long)]
    retries: Option<u32>,

    /// Maximum simultaneous requests
    #[arg(long)]
    concurrency: Option<usize>,

    /// Do not follow redirects
    #[arg(long)]
    no_redirects: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Optional TOML configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    check: CheckConfig,
    duplicates: DuplicateConfig,
}

impl DuplicateArgs {
    fn apply(&self, config: &mut DuplicateConfig) {
        if self.normalize_urls {
            config.url_matching = UrlMatching::Normalized;
        }
    }
}

impl CheckArgs {
    fn apply(&self, config: &mut CheckConfig) -> Result<()> {
        if let Some(limit) = self.limit {
            config.limit = Some(limit);
        }
        if let Some(timeout) = self.timeout {
            config.timeout_seconds = timeout;
        }
        if let Some(retries) = self.retries {
            config.max_retries = retries;
        }
        if let Some(concurrency) = self.concurrency {
            config.max_concurrency = concurrency;
        }
        if self.no_redirects {
            config.follow_redirects = false;
        }

        ensure!(
            config.timeout_seconds.is_finite() && config.timeout_seconds > 0.0,
            "Timeout must be a positive number of seconds"
        );
        ensure!(config.max_concurrency > 0, "Concurrency must be at least 1");
        Ok(())
    }
}

/// Which phases a run performs.
struct Plan {
    duplicates: Option<DuplicateConfig>,
    check: Option<CheckConfig>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let (input, plan) = match cli.command {
        Command::Report {
            input,
            duplicates,
            check,
        } => {
            let mut config = load_config(input.config.as_deref())?;
            duplicates.apply(&mut config.duplicates);
            check.apply(&mut config.check)?;
            let plan = Plan {
                duplicates: Some(config.duplicates),
                check: Some(config.check),
            };
            (input, plan)
        }
        Command::Duplicates { input, duplicates } => {
            let mut config = load_config(input.config.as_deref())?;
            duplicates.apply(&mut config.duplicates);
            let plan = Plan {
                duplicates: Some(config.duplicates),
                check: None,
            };
            (input, plan)
        }
        Command::Check { input, check } => {
            let mut config = load_config(input.config.as_deref())?;
            check.apply(&mut config.check)?;
            let plan = Plan {
                duplicates: None,
                check: Some(config.check),
            };
            (input, plan)
        }
    };

    let tree = Arc::new(load_tree(&input.file)?);
    let (report, cancelled) = run(Arc::clone(&tree), plan).await?;

    match input.format {
        OutputFormat::Text => print_report(&tree, &report, cancelled),
        OutputFormat::Json => {
            let output = JsonOutput::new(&tree, &report, cancelled);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    let mut code = 0u8;
    if report.has_failures() {
        code += 1;
    }
    if report.has_duplicates() {
        code += 2;
    }
    Ok(ExitCode::from(code))
}

/// Read the TOML config file, or defaults when none is given.
fn load_config(path: Option<&Path>) -> Result<ConfigFile> {
    let Some(path) = path else {
        return Ok(ConfigFile::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

/// Read and import a bookmark export.
fn load_tree(path: &Path) -> Result<BookmarkTree> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let tree = parse_export(&json).with_context(|| format!("Invalid export {}", path.display()))?;

    let stats = tree.stats();
    eprintln!(
        "Loaded {} bookmarks ({} unique links) in {} folders from {}",
        stats.total_links,
        stats.unique_urls,
        stats.total_folders,
        path.display()
    );
    for warning in tree.warnings() {
        eprintln!("warning: {}: {}", warning.path, warning.message);
    }

    Ok(tree)
}

/// Run detection on a blocking thread while the checker runs.
async fn run(tree: Arc<BookmarkTree>, plan: Plan) -> Result<(Report, bool)> {
    let detection = plan.duplicates.map(|config| {
        let tree = Arc::clone(&tree);
        let finder = DuplicateFinder::with_config(config);
        tokio::task::spawn_blocking(move || finder.find_duplicates(&tree))
    });

    let outcome = match plan.check {
        Some(config) => Some(check_links(&tree, config).await?),
        None => None,
    };

    let duplicates = match detection {
        Some(handle) => handle.await.context("Duplicate detection failed")?,
        None => DuplicateReport::default(),
    };

    let cancelled = outcome.as_ref().is_some_and(|o| o.cancelled);
    let results = outcome.map(|o| o.results).unwrap_or_default();
    let report = assemble(
        &tree,
        duplicates.link_groups,
        duplicates.folder_groups,
        results,
    )
    .context("Failed to assemble report")?;

    Ok((report, cancelled))
}

/// Check every link, cancelling on Ctrl-C.
async fn check_links(tree: &BookmarkTree, config: CheckConfig) -> Result<CheckOutcome> {
    let checker = LinkChecker::new(config).context("Failed to set up link checker")?;
    let cancel = CancellationToken::new();

    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, finishing up...");
            on_interrupt.cancel();
        }
    });

    eprintln!("Checking {} unique links...", tree.stats().unique_urls);
    let printer = spawn_progress(checker.subscribe());
    let outcome = checker.check_tree(tree, cancel).await;
    drop(checker);
    printer.await.context("Progress printer failed")?;

    Ok(outcome)
}

/// Print progress snapshots to stderr until the checker goes away.
fn spawn_progress(mut rx: broadcast::Receiver<CheckProgress>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut printed = false;
        loop {
            match rx.recv().await {
                Ok(progress) => {
                    eprint!(
                        "\r {}/{} links ({:.0}%), {} failed",
                        progress.checked,
                        progress.total,
                        progress.percentage(),
                        progress.failures()
                    );
                    printed = true;
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        if printed {
            eprintln!();
        }
    })
}

/// Print a human-readable report.
fn print_report(tree: &BookmarkTree, report: &Report, cancelled: bool) {
    let summary = report.summary();

    println!();
    println!("{}", "─".repeat(70));
    println!(" Bookmark Report");
    println!("{}", "─".repeat(70));
    println!(
        " {} links, {} unique URLs, {} folders",
        summary.total_links, summary.unique_urls, summary.total_folders
    );
    println!();

    if report.has_duplicates() {
        if summary.link_groups > 0 {
            println!(
                " Duplicate links: {} URLs, {} redundant bookmarks",
                summary.link_groups, summary.redundant_links
            );
            for group in report.link_groups() {
                println!("   {} ({}x)", group.key, group.count());
                for id in &group.members {
                    println!("     {}", describe_node(tree, *id));
                }
            }
            println!();
        }

        if summary.folder_groups > 0 {
            println!(" Duplicate folders: {} groups", summary.folder_groups);
            for group in report.folder_groups() {
                let paths = group
                    .members
                    .iter()
                    .map(|id| folder_display_path(tree, *id))
                    .join(", ");
                println!("   {} URLs: {}", group.url_count, paths);
            }
            println!();
        }
    } else {
        println!(" No duplicates found.");
        println!();
    }

    if summary.checked > 0 {
        println!(
            " Link check: {} alive, {} dead, {} errors, {} skipped",
            summary.alive, summary.dead, summary.error, summary.skipped
        );
        if cancelled {
            println!(" Check was interrupted; unchecked links are reported as skipped.");
        }
        for (id, result) in report.failures() {
            let outcome = match (result.http_status, &result.error_detail) {
                (Some(code), _) => format!("{} {}", result.status, code),
                (None, Some(detail)) => format!("{}: {}", result.status, detail),
                (None, None) => result.status.to_string(),
            };
            let url = tree.get(id).and_then(|n| n.url()).unwrap_or_default();
            println!("   [{}] {}", outcome, url);
            println!("     {}", describe_node(tree, id));
        }
        println!();
    }
}

/// JSON output: the report plus the nodes its ids refer to.
#[derive(Serialize)]
struct JsonOutput<'a> {
    #[serde(flatten)]
    report: &'a Report,
    cancelled: bool,
    nodes: Vec<NodeView<'a>>,
}

#[derive(Debug, Serialize)]
struct NodeView<'a> {
    id: NodeId,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    /// Enclosing folders.
    folder: String,
}

impl<'a> JsonOutput<'a> {
    fn new(tree: &'a BookmarkTree, report: &'a Report, cancelled: bool) -> Self {
        let ids: BTreeSet<NodeId> = report
            .link_results()
            .keys()
            .copied()
            .chain(
                report
                    .duplicate_groups()
                    .iter()
                    .flat_map(|g| g.members.iter().copied()),
            )
            .collect();

        let nodes = ids
            .into_iter()
            .filter_map(|id| tree.get(id))
            .map(|node| NodeView {
                id: node.id,
                title: node.title.as_str(),
                url: node.url(),
                folder: tree.folder_path(node.id),
            })
            .collect();

        Self {
            report,
            cancelled,
            nodes,
        }
    }
}

/// Folder path and title of a node.
fn describe_node(tree: &BookmarkTree, id: NodeId) -> String {
    let title = tree.get(id).map(|n| n.title.as_str()).unwrap_or_default();
    format!("{} \"{}\"", tree.folder_path(id), title)
}

/// Full path of a folder, including its own title.
fn folder_display_path(tree: &BookmarkTree, id: NodeId) -> String {
    let title = tree.get(id).map(|n| n.title.as_str()).unwrap_or_default();
    match tree.folder_path(id).as_str() {
        "/" => format!("/{title}"),
        parent => format!("{parent}/{title}"),
    }
}
