//! Report assembly.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Serialize;

use marksweep_core::{BookmarkTree, CheckStatus, InconsistentReportError, LinkCheckResult, NodeId};

use crate::duplicates::{DuplicateGroup, GroupKind};

/// Summary counts for a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    /// Links in the tree.
    pub total_links: u64,
    /// Folders in the tree, root excluded.
    pub total_folders: u64,
    /// Distinct URLs in the tree.
    pub unique_urls: u64,
    /// Links with a check result.
    pub checked: u64,
    pub alive: u64,
    pub dead: u64,
    pub error: u64,
    pub skipped: u64,
    /// Number of link groups.
    pub link_groups: u64,
    /// Number of folder groups.
    pub folder_groups: u64,
    /// Links that could be removed keeping one per URL.
    pub redundant_links: u64,
}

/// Immutable result of one run.
///
/// Built once by [`assemble`]; there are no setters.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    generated_at: DateTime<Utc>,
    summary: ReportSummary,
    duplicate_groups: Vec<DuplicateGroup>,
    link_results: BTreeMap<NodeId, LinkCheckResult>,
}

impl Report {
    /// When the report was assembled.
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Summary counts.
    pub fn summary(&self) -> &ReportSummary {
        &self.summary
    }

    /// All groups, link groups first.
    pub fn duplicate_groups(&self) -> &[DuplicateGroup] {
        &self.duplicate_groups
    }

    pub fn link_groups(&self) -> impl Iterator<Item = &DuplicateGroup> {
        self.groups_of(GroupKind::Link)
    }

    pub fn folder_groups(&self) -> impl Iterator<Item = &DuplicateGroup> {
        self.groups_of(GroupKind::Folder)
    }

    /// Check results keyed by link id.
    pub fn link_results(&self) -> &BTreeMap<NodeId, LinkCheckResult> {
        &self.link_results
    }

    /// The check result for one link.
    pub fn result_for(&self, id: NodeId) -> Option<&LinkCheckResult> {
        self.link_results.get(&id)
    }

    /// Links that answered with an error status, in id order.
    pub fn dead_links(&self) -> impl Iterator<Item = (NodeId, &LinkCheckResult)> {
        self.with_status(|status| status == CheckStatus::Dead)
    }

    /// Dead links and links that could not be fetched, in id order.
    pub fn failures(&self) -> impl Iterator<Item = (NodeId, &LinkCheckResult)> {
        self.with_status(CheckStatus::is_failure)
    }

    /// Check if any duplicate group was found.
    pub fn has_duplicates(&self) -> bool {
        !self.duplicate_groups.is_empty()
    }

    /// Check if any link is dead or errored.
    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    fn groups_of(&self, kind: GroupKind) -> impl Iterator<Item = &DuplicateGroup> {
        self.duplicate_groups.iter().filter(move |g| g.kind == kind)
    }

    fn with_status(
        &self,
        keep: impl Fn(CheckStatus) -> bool,
    ) -> impl Iterator<Item = (NodeId, &LinkCheckResult)> {
        self.link_results
            .iter()
            .filter(move |(_, result)| keep(result.status))
            .map(|(id, result)| (*id, result))
    }
}

/// Merge duplicate groups and check results into a [`Report`].
///
/// Every result must name a distinct link in `tree`, and every group member
/// must name a node of the group's kind; anything else is a caller bug.
pub fn assemble(
    tree: &BookmarkTree,
    link_groups: Vec<DuplicateGroup>,
    folder_groups: Vec<DuplicateGroup>,
    results: impl IntoIterator<Item = (NodeId, LinkCheckResult)>,
) -> Result<Report, InconsistentReportError> {
    let mut link_results = BTreeMap::new();
    for (id, result) in results {
        match tree.get(id) {
            None => return Err(InconsistentReportError::UnknownLink { id }),
            Some(node) if !node.is_link() => {
                return Err(InconsistentReportError::NotALink { id });
            }
            Some(_) => {
                if link_results.insert(id, result).is_some() {
                    return Err(InconsistentReportError::DuplicateResult { id });
                }
            }
        }
    }

    for group in link_groups.iter().chain(&folder_groups) {
        for &id in &group.members {
            let node = tree
                .get(id)
                .ok_or(InconsistentReportError::UnknownGroupMember { id })?;
            let fits = match group.kind {
                GroupKind::Link => node.is_link(),
                GroupKind::Folder => node.is_folder(),
            };
            if !fits {
                return Err(InconsistentReportError::WrongMemberKind {
                    id,
                    expected: group.kind.into(),
                });
            }
        }
    }

    let counts = link_results.values().map(|r| r.status).counts();
    let count = |status: CheckStatus| counts.get(&status).copied().unwrap_or(0) as u64;
    let stats = tree.stats();

    let summary = ReportSummary {
        total_links: stats.total_links,
        total_folders: stats.total_folders,
        unique_urls: stats.unique_urls,
        checked: link_results.len() as u64,
        alive: count(CheckStatus::Alive),
        dead: count(CheckStatus::Dead),
        error: count(CheckStatus::Error),
        skipped: count(CheckStatus::Skipped),
        link_groups: link_groups.len() as u64,
        folder_groups: folder_groups.len() as u64,
        redundant_links: link_groups
            .iter()
            .map(|g| g.redundant_count() as u64)
            .sum(),
    };

    let mut duplicate_groups = link_groups;
    duplicate_groups.extend(folder_groups);

    Ok(Report {
        generated_at: Utc::now(),
        summary,
        duplicate_groups,
        link_results,
    })
}
