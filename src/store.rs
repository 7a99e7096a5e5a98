//! Store query interface consumed by the export engine
//!
//! The versioned object store is an external collaborator. This module
//! specifies it as a capability trait so the engine can be driven by a
//! production store (e.g. a Moab-style preservation store) or by an
//! in-memory fake in tests, without depending on any store's internals.
//!
//! A store holds one object: a dense sequence of immutable, numbered
//! version snapshots. It must answer three kinds of questions:
//!
//! 1. **Inventory queries**: which files exist at version N (full state)
//!    or were introduced at exactly version N (additions), each carrying a
//!    checksum signature
//! 2. **Structural diffs**: a grouped change report between two versions'
//!    file trees, classified into added/modified/deleted/renamed subsets
//! 3. **Metadata**: the version list, the current version pointer, and
//!    optional human-readable version messages
//!
//! Stores backed by a real directory tree may additionally expose their
//! object root, which enables the disk rehash variant.

use crate::error::Result;
use crate::types::{ChangeType, DigestAlgorithm, VersionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Inventory query modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryKind {
    /// Every path extant at the queried version (the live tree)
    Full,
    /// Only paths newly introduced or re-contented at exactly that version
    Additions,
}

/// Checksum signature of one file content, as recorded by the store
///
/// A store may record any subset of the supported algorithms. The engine
/// extracts the single algorithm it was asked for; a signature missing
/// that digest surfaces as a store error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSignature {
    /// MD5 digest, lowercase hex
    pub md5: Option<String>,
    /// SHA-1 digest, lowercase hex
    pub sha1: Option<String>,
    /// SHA-256 digest, lowercase hex
    pub sha256: Option<String>,
}

impl FileSignature {
    /// Signature carrying a single algorithm's digest
    pub fn single(algorithm: DigestAlgorithm, digest: impl Into<String>) -> Self {
        let mut signature = Self::default();
        signature.set(algorithm, digest);
        signature
    }

    /// Compute a full signature (all supported algorithms) over in-memory data
    pub fn from_data(data: &[u8]) -> Self {
        Self {
            md5: Some(DigestAlgorithm::Md5.hash_data(data)),
            sha1: Some(DigestAlgorithm::Sha1.hash_data(data)),
            sha256: Some(DigestAlgorithm::Sha256.hash_data(data)),
        }
    }

    /// Set one algorithm's digest
    pub fn set(&mut self, algorithm: DigestAlgorithm, digest: impl Into<String>) {
        let digest = Some(digest.into());
        match algorithm {
            DigestAlgorithm::Md5 => self.md5 = digest,
            DigestAlgorithm::Sha1 => self.sha1 = digest,
            DigestAlgorithm::Sha256 => self.sha256 = digest,
        }
    }

    /// The digest recorded for an algorithm, if any
    pub fn digest(&self, algorithm: DigestAlgorithm) -> Option<&str> {
        match algorithm {
            DigestAlgorithm::Md5 => self.md5.as_deref(),
            DigestAlgorithm::Sha1 => self.sha1.as_deref(),
            DigestAlgorithm::Sha256 => self.sha256.as_deref(),
        }
    }
}

/// One row of an inventory listing: a relative path and its signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    /// Path relative to the version's content root
    pub path: String,
    /// Checksum signature of the file's content
    pub signature: FileSignature,
}

impl InventoryEntry {
    /// Create an inventory row
    pub fn new(path: impl Into<String>, signature: FileSignature) -> Self {
        Self {
            path: path.into(),
            signature,
        }
    }
}

/// Structural diff between two versions' file trees
///
/// Changes are grouped by file category (e.g. "content" vs "metadata"),
/// each group subdivided into change-classified subsets. Groups reporting
/// zero differences are carried as-is; the delta engine skips them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionDiffReport {
    /// Per-category change groups
    pub groups: Vec<GroupDiff>,
}

/// Changes within one file category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDiff {
    /// Category identifier, e.g. "content" or "metadata"
    pub group_id: String,
    /// Total number of differing files in this group
    pub difference_count: usize,
    /// Change-classified subsets
    pub subsets: Vec<DiffSubset>,
}

/// Files sharing one change classification within a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffSubset {
    /// The change classification of every file in this subset
    pub change: ChangeType,
    /// The changed files
    pub files: Vec<DiffFile>,
}

/// One changed file within a diff subset
///
/// Added files carry only `other_path`; deleted files only `basis_path`;
/// modified and renamed files may carry both. Signatures are in reported
/// order: one for added/deleted/renamed, two (prior then current) for
/// modified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffFile {
    /// Path in the basis (prior) version, if the file existed there
    pub basis_path: Option<String>,
    /// Path in the other (target) version, if the file exists there
    pub other_path: Option<String>,
    /// Checksum signatures in reported order
    pub signatures: Vec<FileSignature>,
}

/// Point-in-time read access to one versioned object
///
/// Implementations must present a consistent view of a fixed set of
/// finalized versions: the engine assumes a single reader and never
/// retries failed queries (retry policy, if any, belongs to the store).
pub trait VersionStore {
    /// Stable identifier of the object
    fn id(&self) -> &str;

    /// Ordered version list; must be a dense 1-based sequence
    fn versions(&self) -> Result<Vec<VersionId>>;

    /// The most recent version
    fn current_version(&self) -> Result<VersionId> {
        self.versions()?
            .last()
            .copied()
            .ok_or_else(|| crate::error::OcflateError::store("object has no versions"))
    }

    /// Inventory listing for one version in the requested mode
    fn inventory(&self, version: VersionId, kind: InventoryKind) -> Result<Vec<InventoryEntry>>;

    /// Structural diff between two versions' file trees
    fn diff(&self, base: VersionId, target: VersionId) -> Result<VersionDiffReport>;

    /// Human-readable per-version messages from auxiliary metadata
    ///
    /// Stores without version metadata return an empty map.
    fn version_messages(&self) -> Result<BTreeMap<VersionId, String>> {
        Ok(BTreeMap::new())
    }

    /// On-disk object root, for stores backed by a real directory tree
    ///
    /// Required only by the disk rehash variant.
    fn object_root(&self) -> Option<&Path> {
        None
    }
}
