//! Duplicate link and folder detection.
//!
//! Links are grouped by URL in a single multimap pass. Folders are compared
//! by content signature, the set of URLs below them:
//! 1. Build every folder's URL set bottom-up in one reverse pre-order pass
//! 2. Digest each non-empty set with BLAKE3 (parallel)
//! 3. Group folders sharing a digest
//!
//! Groups are ordered by the pre-order position of their first member, so the
//! output only depends on the tree.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

use derive_builder::Builder;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use marksweep_core::{BookmarkTree, NodeId, NodeKind};

use crate::normalize::normalize_url;

/// How link URLs are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlMatching {
    /// Byte-for-byte equality.
    #[default]
    Exact,
    /// Compare after [`normalize_url`].
    Normalized,
}

/// Configuration for duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct DuplicateConfig {
    /// URL comparison mode.
    #[builder(default)]
    pub url_matching: UrlMatching,

    /// Folders with fewer distinct URLs than this are not compared.
    #[builder(default = "1")]
    pub min_folder_urls: usize,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            url_matching: UrlMatching::Exact,
            min_folder_urls: 1,
        }
    }
}

impl DuplicateConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.min_folder_urls == Some(0) {
            return Err("Folders need at least one URL to be compared".to_string());
        }
        Ok(())
    }
}

impl DuplicateConfig {
    /// Create a new config builder.
    pub fn builder() -> DuplicateConfigBuilder {
        DuplicateConfigBuilder::default()
    }

    fn url_key<'a>(&self, url: &'a str) -> Cow<'a, str> {
        match self.url_matching {
            UrlMatching::Exact => Cow::Borrowed(url),
            UrlMatching::Normalized => normalize_url(url),
        }
    }
}

/// What a duplicate group contains.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GroupKind {
    Link,
    Folder,
}

/// BLAKE3 digest of a folder's content signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignatureHash([u8; 32]);

impl SignatureHash {
    /// Digest a sorted URL set.
    ///
    /// Each URL is length-prefixed so `["ab", "c"]` and `["a", "bc"]` differ.
    pub fn of<'a>(urls: impl IntoIterator<Item = &'a str>) -> Self {
        let mut hasher = blake3::Hasher::new();
        for url in urls {
            hasher.update(&(url.len() as u64).to_le_bytes());
            hasher.update(url.as_bytes());
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// Lowercase hex form.
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for SignatureHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Nodes that duplicate each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Link or folder group.
    pub kind: GroupKind,

    /// The shared URL for link groups, the signature digest for folder groups.
    pub key: String,

    /// Member ids, ascending. Always at least two.
    pub members: Vec<NodeId>,

    /// Title of the first member.
    pub representative_title: String,

    /// Distinct URLs covered by the group.
    pub url_count: usize,
}

impl DuplicateGroup {
    /// Get the number of members.
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Members that could go if one were kept.
    pub fn redundant_count(&self) -> usize {
        self.members.len().saturating_sub(1)
    }

    /// Check whether `id` belongs to this group.
    pub fn contains(&self, id: NodeId) -> bool {
        self.members.binary_search(&id).is_ok()
    }
}

/// Results from duplicate analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Links sharing a URL.
    pub link_groups: Vec<DuplicateGroup>,

    /// Folders sharing a content signature.
    pub folder_groups: Vec<DuplicateGroup>,

    /// Number of links analyzed.
    pub links_analyzed: u64,

    /// Number of folders compared (non-empty, root excluded).
    pub folders_analyzed: u64,

    /// Links that could be removed keeping one per URL.
    pub redundant_links: u64,
}

impl DuplicateReport {
    /// Check if any duplicates were found.
    pub fn has_duplicates(&self) -> bool {
        !self.link_groups.is_empty() || !self.folder_groups.is_empty()
    }

    /// Total number of groups of both kinds.
    pub fn group_count(&self) -> usize {
        self.link_groups.len() + self.folder_groups.len()
    }
}

/// Group links sharing an exact URL.
pub fn find_duplicate_links(tree: &BookmarkTree) -> Vec<DuplicateGroup> {
    DuplicateFinder::new().find_duplicate_links(tree)
}

/// Group folders whose descendant URL sets are equal.
pub fn find_duplicate_folders(tree: &BookmarkTree) -> Vec<DuplicateGroup> {
    DuplicateFinder::new().find_duplicate_folders(tree)
}

/// Duplicate link and folder finder.
#[derive(Debug, Clone, Default)]
pub struct DuplicateFinder {
    config: DuplicateConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new duplicate finder with custom config.
    pub fn with_config(config: DuplicateConfig) -> Self {
        Self { config }
    }

    /// Run both link and folder detection.
    pub fn find_duplicates(&self, tree: &BookmarkTree) -> DuplicateReport {
        let link_groups = self.find_duplicate_links(tree);
        let (folder_groups, folders_analyzed) = self.folder_groups(tree);
        let redundant_links = link_groups
            .iter()
            .map(|g| g.redundant_count() as u64)
            .sum();

        tracing::debug!(
            link_groups = link_groups.len(),
            folder_groups = folder_groups.len(),
            redundant_links,
            "duplicate detection finished"
        );

        DuplicateReport {
            link_groups,
            folder_groups,
            links_analyzed: tree.stats().total_links,
            folders_analyzed,
            redundant_links,
        }
    }

    /// Group links by URL key. URLs seen once are omitted.
    pub fn find_duplicate_links(&self, tree: &BookmarkTree) -> Vec<DuplicateGroup> {
        let mut by_url: IndexMap<Cow<'_, str>, Vec<NodeId>> = IndexMap::new();
        for node in tree.links() {
            if let Some(url) = node.url() {
                by_url
                    .entry(self.config.url_key(url))
                    .or_default()
                    .push(node.id);
            }
        }

        by_url
            .into_iter()
            .filter(|(_, members)| members.len() > 1)
            .map(|(url, mut members)| {
                members.sort_unstable();
                DuplicateGroup {
                    kind: GroupKind::Link,
                    representative_title: title_of(tree, members[0]),
                    key: url.into_owned(),
                    members,
                    url_count: 1,
                }
            })
            .collect()
    }

    /// Group folders by content signature. Empty folders and the root are
    /// never candidates.
    pub fn find_duplicate_folders(&self, tree: &BookmarkTree) -> Vec<DuplicateGroup> {
        self.folder_groups(tree).0
    }

    fn folder_groups(&self, tree: &BookmarkTree) -> (Vec<DuplicateGroup>, u64) {
        let signatures = self.signatures(tree);

        let candidates: Vec<(NodeId, &BTreeSet<Cow<'_, str>>)> = tree
            .folders()
            .filter(|folder| folder.parent.is_some())
            .filter_map(|folder| {
                let set = signatures.get(folder.id.index())?;
                (!set.is_empty() && set.len() >= self.config.min_folder_urls)
                    .then_some((folder.id, set))
            })
            .collect();

        let hashed: Vec<(NodeId, SignatureHash, usize)> = candidates
            .par_iter()
            .map(|(id, set)| {
                (
                    *id,
                    SignatureHash::of(set.iter().map(|url| url.as_ref())),
                    set.len(),
                )
            })
            .collect();

        // `hashed` keeps candidate (pre-order) order, so insertion order is
        // the walk position of each group's earliest member.
        let mut by_hash: IndexMap<SignatureHash, (Vec<NodeId>, usize)> = IndexMap::new();
        for (id, hash, url_count) in hashed {
            by_hash
                .entry(hash)
                .or_insert_with(|| (Vec::new(), url_count))
                .0
                .push(id);
        }

        let groups = by_hash
            .into_iter()
            .filter(|(_, (members, _))| members.len() > 1)
            .map(|(hash, (mut members, url_count))| {
                members.sort_unstable();
                DuplicateGroup {
                    kind: GroupKind::Folder,
                    key: hash.to_hex(),
                    representative_title: title_of(tree, members[0]),
                    members,
                    url_count,
                }
            })
            .collect();

        (groups, candidates.len() as u64)
    }

    /// URL set below every node, indexed by node id.
    ///
    /// A child is always added after its parent, so walking ids backwards
    /// finishes every child before its parent.
    fn signatures<'t>(&self, tree: &'t BookmarkTree) -> Vec<BTreeSet<Cow<'t, str>>> {
        let nodes: Vec<_> = tree.nodes().collect();
        let mut sets: Vec<BTreeSet<Cow<'t, str>>> = vec![BTreeSet::new(); nodes.len()];

        for node in nodes.iter().rev() {
            let Some(parent) = node.parent else {
                continue;
            };
            match &node.kind {
                NodeKind::Link { url, .. } => {
                    let key = self.config.url_key(url.as_str());
                    sets[parent.index()].insert(key);
                }
                NodeKind::Folder { .. } => {
                    let own = sets[node.id.index()].clone();
                    sets[parent.index()].extend(own);
                }
            }
        }
        sets
    }
}

fn title_of(tree: &BookmarkTree, id: NodeId) -> String {
    tree.get(id)
        .map(|node| node.title.to_string())
        .unwrap_or_default()
}
