//! Disk rehash variant and fixity audit
//!
//! The manifest builder trusts the checksums the store recorded. This
//! module provides the distrusting alternative: walk the object's version
//! directories on disk, rehash every regular file locally, and fold the
//! results into a manifest of the same shape. Diffing the two manifests
//! against each other validates the store's recorded fixity, and can
//! rebuild a manifest when the store's own metadata is unavailable.
//!
//! A recomputed checksum that disagrees with the recorded one is a result
//! to report, not a fatal error; [`FixityAnomaly`] records are returned to
//! the caller, who decides policy.

use crate::error::{OcflateError, Result};
use crate::export::{Exporter, CONTENT_DIRECTORY};
use crate::store::VersionStore;
use crate::types::{DigestAlgorithm, Manifest};
use crate::utils::{relative_unix_path, version_dirname};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// A disagreement between recorded and recomputed fixity for one path
///
/// `recorded` is the checksum the store's metadata claims; `computed` is
/// the checksum of the bytes actually on disk. Either side may be absent:
/// a path present only in metadata, or only on disk, is also an anomaly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixityAnomaly {
    /// Version-prefixed path relative to the object root
    pub path: String,
    /// Checksum recorded by the store, if the path is known to it
    pub recorded: Option<String>,
    /// Checksum recomputed from disk, if the file exists
    pub computed: Option<String>,
}

impl<'a, S: VersionStore> Exporter<'a, S> {
    /// Build a manifest by rehashing the object's files on disk
    ///
    /// Walks every version directory under the store's object root (using
    /// the store's declared version list, not a re-derived scan), lists
    /// every regular file beneath each version's content area, computes
    /// its checksum locally, and folds the results with the same dedup
    /// rule as [`Exporter::manifest`]. Against a store whose recorded
    /// checksums match the on-disk bytes, the two manifests are equal.
    ///
    /// # Errors
    ///
    /// - [`OcflateError::NoObjectRoot`] if the store is not disk-backed
    /// - [`OcflateError::Io`] / [`OcflateError::WalkDir`] on read failures
    pub fn manifest_from_disk(&self, algorithm: DigestAlgorithm) -> Result<Manifest>
    where
        S: Sync,
    {
        let root = self.store.object_root().ok_or(OcflateError::NoObjectRoot)?;
        debug!(object = self.id(), root = %root.display(), %algorithm, "rehashing from disk");

        let mut files: Vec<PathBuf> = Vec::new();
        for &version in &self.versions {
            let content_dir = root.join(version_dirname(version)).join(CONTENT_DIRECTORY);
            // A version that only changed metadata may have no content area.
            if !content_dir.is_dir() {
                continue;
            }
            for entry in WalkDir::new(&content_dir) {
                let entry = entry?;
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
        }
        trace!(files = files.len(), "hashing walked files");

        // Hash in parallel; fold into the shared accumulator single-threaded.
        let hashed = files
            .par_iter()
            .map(|path| {
                let digest = algorithm.hash_file(path)?;
                let relative = relative_unix_path(root, path)?;
                Ok((digest, relative))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut manifest = Manifest::new();
        for (digest, path) in hashed {
            manifest.insert(digest, path);
        }
        Ok(manifest)
    }

    /// Audit recorded fixity against recomputed checksums
    ///
    /// Builds the manifest twice, once from the store's recorded checksums
    /// and once by rehashing disk, and compares them path by path. An
    /// empty result means every recorded checksum matches the bytes on
    /// disk.
    pub fn check_fixity(&self, algorithm: DigestAlgorithm) -> Result<Vec<FixityAnomaly>>
    where
        S: Sync,
    {
        let recorded = self.manifest(algorithm)?;
        let computed = self.manifest_from_disk(algorithm)?;

        let recorded_by_path = recorded.by_path();
        let computed_by_path = computed.by_path();

        let paths: BTreeSet<&str> = recorded_by_path
            .keys()
            .chain(computed_by_path.keys())
            .copied()
            .collect();

        let mut anomalies = Vec::new();
        for path in paths {
            let recorded = recorded_by_path.get(path).copied();
            let computed = computed_by_path.get(path).copied();
            if recorded != computed {
                anomalies.push(FixityAnomaly {
                    path: path.to_string(),
                    recorded: recorded.map(String::from),
                    computed: computed.map(String::from),
                });
            }
        }
        Ok(anomalies)
    }
}
