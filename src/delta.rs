//! Delta engine and history aggregator
//!
//! These are independent read paths used for reporting and auditing; the
//! manifest and state builders do not depend on them.
//!
//! The delta engine re-keys the store's grouped structural diff into a
//! checksum-indexed change report: change-type to a list of per-file
//! records, each carrying the file's path of record and its one or two
//! checksums. The history aggregator drives the delta engine across every
//! adjacent version pair, seeding version 1 (which has no predecessor) as
//! all-added.
//!
//! Version pairs are independent of each other, so the aggregator computes
//! them in parallel and merges the results in version order.

use crate::error::{OcflateError, Result};
use crate::store::{InventoryKind, VersionStore};
use crate::types::{ChangeType, Delta, DigestAlgorithm, FileChange, History, VersionId};
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::export::Exporter;

impl<'a, S: VersionStore> Exporter<'a, S> {
    /// Compute the changes between `version` and the version immediately prior
    ///
    /// Obtains the store's structural diff between `version - 1` and
    /// `version`, drops groups reporting zero differences, and re-keys
    /// every changed file by its change classification. Added, deleted and
    /// renamed entries carry one checksum; modified entries carry two,
    /// prior then current. Change-types with no occurrences are absent
    /// from the result.
    ///
    /// The reported path is group-qualified. When a diff entry carries a
    /// non-empty basis (prior) path, that path takes precedence over the
    /// new path; the identity of record for modified, deleted and renamed
    /// files is the pre-change path.
    ///
    /// # Errors
    ///
    /// - [`OcflateError::NoPriorVersion`] if `version <= 1`
    /// - [`OcflateError::VersionOutOfRange`] if `version` exceeds current
    /// - [`OcflateError::MissingDigest`] if a signature lacks the requested digest
    pub fn delta(&self, version: VersionId, algorithm: DigestAlgorithm) -> Result<Delta> {
        if version <= 1 {
            return Err(OcflateError::NoPriorVersion(version));
        }
        self.check_version(version)?;
        debug!(object = self.id(), version, %algorithm, "computing delta");

        let report = self.store.diff(version - 1, version)?;
        let mut delta = Delta::new();

        for group in &report.groups {
            if group.difference_count == 0 {
                continue;
            }
            trace!(
                group = %group.group_id,
                differences = group.difference_count,
                "folding diff group"
            );

            for subset in &group.subsets {
                for file in &subset.files {
                    let path = match file.basis_path.as_deref() {
                        Some(basis) if !basis.is_empty() => basis,
                        _ => file.other_path.as_deref().ok_or_else(|| {
                            OcflateError::store(format!(
                                "{} diff entry in group {:?} has neither basis nor other path",
                                subset.change, group.group_id
                            ))
                        })?,
                    };
                    let qualified = format!("{}/{}", group.group_id, path);

                    let mut checksums = Vec::with_capacity(file.signatures.len());
                    for signature in &file.signatures {
                        let digest = signature.digest(algorithm).ok_or_else(|| {
                            OcflateError::MissingDigest {
                                path: qualified.clone(),
                                algorithm,
                            }
                        })?;
                        checksums.push(digest.to_string());
                    }

                    delta.push(
                        subset.change,
                        FileChange::from_digests(subset.change, qualified, checksums)?,
                    );
                }
            }
        }
        Ok(delta)
    }

    /// Compute deltas for every version from 1 to current
    ///
    /// Version 1 is seeded from its full inventory: every file is
    /// classified as added, in the same record shape the delta engine
    /// produces. Inventory listings carry no group identifier, so version
    /// 1 entries use the bare inventory path while entries for later
    /// versions are group-qualified (e.g. `a.txt` vs `content/a.txt`).
    ///
    /// Later versions are diffed against their predecessors in parallel;
    /// any single failure aborts the whole aggregate, since the history is
    /// only meaningful as a contiguous run.
    pub fn history(&self, algorithm: DigestAlgorithm) -> Result<History>
    where
        S: Sync,
    {
        debug!(object = self.id(), current = self.current, %algorithm, "building history");
        let mut history = History::new();

        // Version 1 has no predecessor: its entire inventory is additions.
        let initial = self.inventory(1, InventoryKind::Full, algorithm)?;
        let mut first = Delta::new();
        for (path, checksums) in initial {
            first.push(
                ChangeType::Added,
                FileChange::from_digests(ChangeType::Added, path, checksums)?,
            );
        }
        history.insert(1, first);

        if self.current > 1 {
            let rest = (2..=self.current)
                .into_par_iter()
                .map(|version| Ok((version, self.delta(version, algorithm)?)))
                .collect::<Result<Vec<_>>>()?;
            history.extend(rest);
        }
        Ok(history)
    }
}
