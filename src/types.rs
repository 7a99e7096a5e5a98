//! Core data types for OCFL inventory construction
//!
//! This module contains the artifacts the export engine produces and the
//! value types shared across its components.
//!
//! ## Overview
//!
//! - **Digests**: [`DigestAlgorithm`] - the fixed set of supported checksum
//!   algorithms, with file and in-memory hashing helpers
//! - **Artifacts**: [`Manifest`] (and its single-version [`State`] form),
//!   [`Fixity`], [`Delta`], [`History`] - the blocks of an OCFL inventory
//! - **Changes**: [`ChangeType`], [`FileChange`] - typed per-file change
//!   records with the one-or-two checksum invariant enforced at
//!   construction
//!
//! All artifacts are derived, read-only values recomputed on demand from
//! the underlying store. They use `BTreeMap` keys and sorted path vectors
//! so serialization is reproducible across runs.

use crate::error::{OcflateError, Result};
use md5::Md5;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Version identifier: positive, 1-based, dense. Version 1 always exists.
pub type VersionId = u32;

/// Mapping from relative file path to an ordered list of checksums.
///
/// This is the shape the store's inventory queries produce. The checksum
/// list has length 1 for a single-version listing; it is a list only for
/// structural uniformity with merge operations.
pub type Inventory = BTreeMap<String, Vec<String>>;

/// Checksum algorithms supported by the engine.
///
/// The algorithm is always an explicit parameter to checksum-dependent
/// calls; there is no engine-level mutable digest setting. Unknown
/// algorithm names are rejected at parse time, before any store query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// MD5 (legacy fixity only)
    Md5,
    /// SHA-1 (legacy fixity only)
    Sha1,
    /// SHA-256 (recommended for OCFL manifests)
    Sha256,
}

impl DigestAlgorithm {
    /// Canonical lowercase name, as used in OCFL inventory documents
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "md5",
            DigestAlgorithm::Sha1 => "sha1",
            DigestAlgorithm::Sha256 => "sha256",
        }
    }

    /// Hash in-memory data, returning a lowercase hex digest
    pub fn hash_data(&self, data: &[u8]) -> String {
        match self {
            DigestAlgorithm::Md5 => hex::encode(Md5::digest(data)),
            DigestAlgorithm::Sha1 => hex::encode(Sha1::digest(data)),
            DigestAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
        }
    }

    /// Hash a file's content using buffered I/O, returning a lowercase hex digest
    pub fn hash_file(&self, path: &Path) -> Result<String> {
        let file = File::open(path)?;
        match self {
            DigestAlgorithm::Md5 => hash_reader::<Md5>(file),
            DigestAlgorithm::Sha1 => hash_reader::<Sha1>(file),
            DigestAlgorithm::Sha256 => hash_reader::<Sha256>(file),
        }
    }
}

/// Stream a file through a hasher with an 8KB buffer
fn hash_reader<D: Digest>(mut file: File) -> Result<String> {
    let mut hasher = D::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

impl FromStr for DigestAlgorithm {
    type Err = OcflateError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "md5" => Ok(DigestAlgorithm::Md5),
            "sha1" => Ok(DigestAlgorithm::Sha1),
            "sha256" => Ok(DigestAlgorithm::Sha256),
            other => Err(OcflateError::UnsupportedDigest(other.to_string())),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checksum-to-paths mapping spanning versions 1..N of an object
///
/// The manifest is the deduplicated content map of an OCFL inventory:
/// every distinct file content (keyed by checksum) maps to the set of
/// version-prefixed paths that carry it. A path appears under exactly one
/// checksum; a checksum may own many paths (content shared across versions
/// or across unrelated files).
///
/// Paths are kept sorted and unique so two manifests built from the same
/// store state compare and serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, Vec<String>>,
}

/// Single-version form of [`Manifest`]: checksum-to-paths for one
/// version's live file tree, with unprefixed paths.
pub type State = Manifest;

impl Manifest {
    /// Create an empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path` as carrying the content identified by `checksum`
    ///
    /// Duplicate paths under one checksum are dropped; paths are kept in
    /// sorted order.
    pub fn insert(&mut self, checksum: impl Into<String>, path: impl Into<String>) {
        let paths = self.entries.entry(checksum.into()).or_default();
        let path = path.into();
        if let Err(pos) = paths.binary_search(&path) {
            paths.insert(pos, path);
        }
    }

    /// Paths recorded under a checksum, if any
    pub fn paths(&self, checksum: &str) -> Option<&[String]> {
        self.entries.get(checksum).map(|v| v.as_slice())
    }

    /// Whether the manifest records the given checksum
    pub fn contains(&self, checksum: &str) -> bool {
        self.entries.contains_key(checksum)
    }

    /// Number of distinct checksums
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of paths across all checksums
    pub fn path_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Iterate over (checksum, paths) entries in checksum order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Invert into a path-to-checksum view
    ///
    /// Valid because a path appears under exactly one checksum.
    pub fn by_path(&self) -> BTreeMap<&str, &str> {
        let mut map = BTreeMap::new();
        for (checksum, paths) in &self.entries {
            for path in paths {
                map.insert(path.as_str(), checksum.as_str());
            }
        }
        map
    }
}

/// Algorithm-labeled wrapper around manifests, the OCFL fixity block
///
/// Each entry is a complete manifest computed under that entry's
/// algorithm, independent of the inventory's primary digest algorithm.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Fixity {
    blocks: BTreeMap<DigestAlgorithm, Manifest>,
}

impl Fixity {
    /// Create a fixity block with a single algorithm entry
    pub fn single(algorithm: DigestAlgorithm, manifest: Manifest) -> Self {
        let mut blocks = BTreeMap::new();
        blocks.insert(algorithm, manifest);
        Self { blocks }
    }

    /// Add or replace the manifest for an algorithm
    pub fn insert(&mut self, algorithm: DigestAlgorithm, manifest: Manifest) {
        self.blocks.insert(algorithm, manifest);
    }

    /// Manifest recorded for an algorithm, if any
    pub fn get(&self, algorithm: DigestAlgorithm) -> Option<&Manifest> {
        self.blocks.get(&algorithm)
    }

    /// Whether no algorithm entries are present
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Classification of a file change between two adjacent versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// File newly introduced in the target version
    Added,
    /// File content changed between versions
    Modified,
    /// File removed in the target version
    Deleted,
    /// File moved to a new path with identical content
    Renamed,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeType::Added => "added",
            ChangeType::Modified => "modified",
            ChangeType::Deleted => "deleted",
            ChangeType::Renamed => "renamed",
        };
        f.write_str(name)
    }
}

/// A single per-file change record: one path and its checksums
///
/// Added, deleted and renamed entries carry exactly one checksum;
/// modified entries carry two, prior then current. The invariant is
/// enforced at construction.
///
/// Serializes as a single-entry map `{path: [checksums]}` to match the
/// inventory delta wire shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    path: String,
    checksums: Vec<String>,
}

impl FileChange {
    /// Change record with a single checksum (added/deleted/renamed)
    pub fn single(path: impl Into<String>, checksum: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            checksums: vec![checksum.into()],
        }
    }

    /// Change record with prior and current checksums (modified)
    pub fn pair(
        path: impl Into<String>,
        prior: impl Into<String>,
        current: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            checksums: vec![prior.into(), current.into()],
        }
    }

    /// Build a change record from a store-reported digest list
    ///
    /// Fails unless the list has exactly one or two digests.
    pub fn from_digests(
        change: ChangeType,
        path: impl Into<String>,
        checksums: Vec<String>,
    ) -> Result<Self> {
        let path = path.into();
        if checksums.is_empty() || checksums.len() > 2 {
            return Err(OcflateError::InvalidChangeEntry {
                path,
                change,
                count: checksums.len(),
            });
        }
        Ok(Self { path, checksums })
    }

    /// The change's path of record
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Checksums in reported order (prior first for two-checksum entries)
    pub fn checksums(&self) -> &[String] {
        &self.checksums
    }
}

impl Serialize for FileChange {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.path, &self.checksums)?;
        map.end()
    }
}

impl fmt::Display for FileChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.checksums.as_slice() {
            [only] => write!(f, "{} {}", self.path, only),
            [prior, current] => write!(f, "{} {} -> {}", self.path, prior, current),
            _ => unreachable!("FileChange carries 1 or 2 checksums"),
        }
    }
}

/// Classified changes between a version and its immediate predecessor
///
/// Change-types are populated lazily: a classification with no
/// occurrences is absent, not present with an empty list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Delta {
    changes: BTreeMap<ChangeType, Vec<FileChange>>,
}

impl Delta {
    /// Create an empty delta
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a change record under its classification
    pub fn push(&mut self, change: ChangeType, file: FileChange) {
        self.changes.entry(change).or_default().push(file);
    }

    /// Change records for a classification, if any occurred
    pub fn get(&self, change: ChangeType) -> Option<&[FileChange]> {
        self.changes.get(&change).map(|v| v.as_slice())
    }

    /// Whether no changes were recorded
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Iterate over (change-type, records) in classification order
    pub fn iter(&self) -> impl Iterator<Item = (ChangeType, &[FileChange])> {
        self.changes.iter().map(|(k, v)| (*k, v.as_slice()))
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (change, files) in &self.changes {
            writeln!(f, "{}:", change)?;
            for file in files {
                writeln!(f, "  {}", file)?;
            }
        }
        Ok(())
    }
}

/// Per-version deltas covering every version from 1 to current
///
/// Version 1 is seeded as all-added since it has no predecessor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct History {
    versions: BTreeMap<VersionId, Delta>,
}

impl History {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the delta for a version
    pub fn insert(&mut self, version: VersionId, delta: Delta) {
        self.versions.insert(version, delta);
    }

    /// Delta for a version, if recorded
    pub fn get(&self, version: VersionId) -> Option<&Delta> {
        self.versions.get(&version)
    }

    /// Number of versions covered
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Whether the history covers no versions
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Iterate over (version, delta) pairs in version order
    pub fn iter(&self) -> impl Iterator<Item = (VersionId, &Delta)> {
        self.versions.iter().map(|(k, v)| (*k, v))
    }
}

impl Extend<(VersionId, Delta)> for History {
    fn extend<T: IntoIterator<Item = (VersionId, Delta)>>(&mut self, iter: T) {
        self.versions.extend(iter);
    }
}

impl fmt::Display for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (version, delta) in &self.versions {
            writeln!(f, "v{}", version)?;
            for line in delta.to_string().lines() {
                writeln!(f, "  {}", line)?;
            }
        }
        Ok(())
    }
}
