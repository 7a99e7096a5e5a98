//! The export engine: manifest, state and fixity builders
//!
//! [`Exporter`] wraps a [`VersionStore`] and derives the OCFL inventory
//! blocks from it:
//!
//! - **Manifest** (checksum to version-prefixed paths, spanning versions
//!   1..N): folds each version's additions-only inventory into one
//!   deduplicated content map
//! - **State** (checksum to unprefixed paths for one version): inverts a
//!   single version's full inventory
//! - **Fixity**: a manifest computed under a secondary algorithm, wrapped
//!   under that algorithm's name
//!
//! The digest algorithm is an explicit parameter to every
//! checksum-dependent call, so one `Exporter` can serve concurrent builds
//! under different algorithms without interference.
//!
//! ## Examples
//!
//! ```rust,ignore
//! use ocflate::{DigestAlgorithm, Exporter};
//!
//! let exporter = Exporter::new(&store)?;
//! let manifest = exporter.manifest(DigestAlgorithm::Sha256)?;
//! let state = exporter.state(exporter.current_version(), DigestAlgorithm::Sha256)?;
//! let fixity = exporter.fixity(DigestAlgorithm::Md5)?;
//! ```

use crate::error::{OcflateError, Result};
use crate::store::{InventoryKind, VersionStore};
use crate::types::{DigestAlgorithm, Fixity, Inventory, Manifest, State, VersionId};
use crate::utils::version_dirname;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Directory under each version that holds content files, per OCFL layout
pub const CONTENT_DIRECTORY: &str = "data";

/// Read-only export engine over one versioned object
///
/// Construction validates the store's version list (dense, 1-based,
/// non-empty) once; all builders reuse the cached list. The engine holds
/// no mutable state, so a shared reference can drive parallel builds.
#[derive(Debug)]
pub struct Exporter<'a, S: VersionStore> {
    pub(crate) store: &'a S,
    pub(crate) versions: Vec<VersionId>,
    pub(crate) current: VersionId,
}

impl<'a, S: VersionStore> Exporter<'a, S> {
    /// Create an exporter over `store`, validating its version list
    ///
    /// # Errors
    ///
    /// Returns [`OcflateError::InvalidVersionList`] if the store reports
    /// no versions or a sequence that is not exactly 1..=N.
    pub fn new(store: &'a S) -> Result<Self> {
        let versions = store.versions()?;
        let current = match versions.last() {
            Some(&last) => last,
            None => {
                return Err(OcflateError::InvalidVersionList(format!(
                    "object {} has no versions",
                    store.id()
                )))
            }
        };
        let expected: Vec<VersionId> = (1..=current).collect();
        if versions != expected {
            return Err(OcflateError::InvalidVersionList(format!(
                "object {} versions are not a dense 1-based sequence: {:?}",
                store.id(),
                versions
            )));
        }
        debug!(object = store.id(), current, "opened exporter");
        Ok(Self {
            store,
            versions,
            current,
        })
    }

    /// Stable identifier of the underlying object
    pub fn id(&self) -> &str {
        self.store.id()
    }

    /// The object's version list (always 1..=current)
    pub fn versions(&self) -> &[VersionId] {
        &self.versions
    }

    /// The object's most recent version
    pub fn current_version(&self) -> VersionId {
        self.current
    }

    /// Human-readable per-version messages from the store's auxiliary metadata
    pub fn version_messages(&self) -> Result<BTreeMap<VersionId, String>> {
        self.store.version_messages()
    }

    pub(crate) fn check_version(&self, version: VersionId) -> Result<()> {
        if version < 1 || version > self.current {
            return Err(OcflateError::VersionOutOfRange {
                version,
                current: self.current,
            });
        }
        Ok(())
    }

    /// Inventory of one version under one algorithm
    ///
    /// Fetches the store's listing in the requested mode and extracts the
    /// requested algorithm's digest from each signature. Each path maps to
    /// a one-element checksum list, for structural uniformity with merged
    /// shapes downstream.
    ///
    /// # Errors
    ///
    /// - [`OcflateError::VersionOutOfRange`] if `version` is outside 1..=current
    /// - [`OcflateError::MissingDigest`] if a signature lacks the requested digest
    pub fn inventory(
        &self,
        version: VersionId,
        kind: InventoryKind,
        algorithm: DigestAlgorithm,
    ) -> Result<Inventory> {
        self.check_version(version)?;
        let entries = self.store.inventory(version, kind)?;

        let mut inventory = Inventory::new();
        for entry in entries {
            let digest = entry
                .signature
                .digest(algorithm)
                .ok_or_else(|| OcflateError::MissingDigest {
                    path: entry.path.clone(),
                    algorithm,
                })?
                .to_string();
            inventory.insert(entry.path, vec![digest]);
        }
        Ok(inventory)
    }

    /// Build the manifest covering all versions up to current
    pub fn manifest(&self, algorithm: DigestAlgorithm) -> Result<Manifest> {
        self.manifest_until(self.current, algorithm)
    }

    /// Build a partial manifest covering versions 1..=`version`
    ///
    /// Folds each version's additions-only inventory into one checksum to
    /// version-prefixed-paths map. A checksum recurring at a later version
    /// under a different path accumulates both paths under one key; that
    /// content dedup across time is the manifest's principal value. Useful
    /// for back-filling earlier version directories with valid inventories.
    pub fn manifest_until(
        &self,
        version: VersionId,
        algorithm: DigestAlgorithm,
    ) -> Result<Manifest> {
        self.check_version(version)?;
        debug!(object = self.id(), upto = version, %algorithm, "building manifest");

        let mut manifest = Manifest::new();
        for v in 1..=version {
            let additions = self.inventory(v, InventoryKind::Additions, algorithm)?;
            let prefix = version_dirname(v);
            trace!(version = v, files = additions.len(), "folding additions");

            for (path, checksums) in additions {
                // Additions mode reports exactly one checksum per path.
                if let Some(checksum) = checksums.into_iter().next() {
                    manifest.insert(checksum, format!("{}/{}/{}", prefix, CONTENT_DIRECTORY, path));
                }
            }
        }
        Ok(manifest)
    }

    /// Build the state block for one version
    ///
    /// Inverts the version's full inventory (path to checksum) into
    /// checksum to paths. State reflects the live tree at that version, so
    /// paths are not version-prefixed.
    pub fn state(&self, version: VersionId, algorithm: DigestAlgorithm) -> Result<State> {
        debug!(object = self.id(), version, %algorithm, "building state");
        let full = self.inventory(version, InventoryKind::Full, algorithm)?;

        let mut state = State::new();
        for (path, checksums) in full {
            if let Some(checksum) = checksums.into_iter().next() {
                state.insert(checksum, path);
            }
        }
        Ok(state)
    }

    /// State blocks for every version, keyed by version number
    pub fn states(&self, algorithm: DigestAlgorithm) -> Result<BTreeMap<VersionId, State>> {
        let mut states = BTreeMap::new();
        for &version in &self.versions {
            states.insert(version, self.state(version, algorithm)?);
        }
        Ok(states)
    }

    /// Build the fixity block for the complete object
    pub fn fixity(&self, algorithm: DigestAlgorithm) -> Result<Fixity> {
        self.fixity_until(self.current, algorithm)
    }

    /// Build a fixity block covering versions 1..=`version`
    ///
    /// A fixity block is a manifest computed under `algorithm`, wrapped
    /// under that algorithm's name. It is attached alongside a manifest
    /// built under the inventory's primary algorithm; the two builds are
    /// independent.
    pub fn fixity_until(&self, version: VersionId, algorithm: DigestAlgorithm) -> Result<Fixity> {
        Ok(Fixity::single(
            algorithm,
            self.manifest_until(version, algorithm)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::OcflateError;
    use crate::store::InventoryKind;
    use crate::tests::fixture::{empty_store, sample_store, single_version_store};
    use crate::types::DigestAlgorithm;
    use crate::Exporter;

    const ALG: DigestAlgorithm = DigestAlgorithm::Sha256;

    #[test]
    fn test_new_rejects_empty_store() {
        let store = empty_store();
        let err = Exporter::new(&store).unwrap_err();
        assert!(matches!(err, OcflateError::InvalidVersionList(_)));
    }

    #[test]
    fn test_inventory_modes() {
        let store = sample_store();
        let exporter = Exporter::new(&store).unwrap();

        let full = exporter.inventory(2, InventoryKind::Full, ALG).unwrap();
        assert_eq!(full.len(), 2);
        assert_eq!(full["a.txt"], vec!["h3".to_string()]);

        let additions = exporter.inventory(2, InventoryKind::Additions, ALG).unwrap();
        assert_eq!(additions.len(), 2); // b.txt is new, a.txt re-contented
        assert_eq!(additions["b.txt"], vec!["h2".to_string()]);
    }

    #[test]
    fn test_manifest_scenario() {
        let store = sample_store();
        let exporter = Exporter::new(&store).unwrap();

        let manifest = exporter.manifest(ALG).unwrap();
        assert_eq!(manifest.paths("h1").unwrap(), &["v0001/data/a.txt"]);
        assert_eq!(manifest.paths("h2").unwrap(), &["v0002/data/b.txt"]);
        assert_eq!(manifest.paths("h3").unwrap(), &["v0002/data/a.txt"]);
    }

    #[test]
    fn test_manifest_until_bounds_fold() {
        let store = sample_store();
        let exporter = Exporter::new(&store).unwrap();

        let partial = exporter.manifest_until(1, ALG).unwrap();
        assert_eq!(partial.len(), 1);
        assert_eq!(partial.paths("h1").unwrap(), &["v0001/data/a.txt"]);

        let err = exporter.manifest_until(3, ALG).unwrap_err();
        assert!(err.is_precondition());
    }

    #[test]
    fn test_manifest_idempotent() {
        let store = sample_store();
        let exporter = Exporter::new(&store).unwrap();
        assert_eq!(exporter.manifest(ALG).unwrap(), exporter.manifest(ALG).unwrap());
    }

    #[test]
    fn test_state_unprefixed() {
        let store = sample_store();
        let exporter = Exporter::new(&store).unwrap();

        let state = exporter.state(2, ALG).unwrap();
        assert_eq!(state.paths("h3").unwrap(), &["a.txt"]);
        assert_eq!(state.paths("h2").unwrap(), &["b.txt"]);
        assert!(state.paths("h1").is_none()); // superseded content is not live

        // Path count equals the store's full listing, never history.
        assert_eq!(state.path_count(), 2);
    }

    #[test]
    fn test_fixity_wraps_secondary_algorithm() {
        let store = single_version_store();
        let exporter = Exporter::new(&store).unwrap();

        let fixity = exporter.fixity(DigestAlgorithm::Md5).unwrap();
        let block = fixity.get(DigestAlgorithm::Md5).unwrap();
        assert_eq!(block, &exporter.manifest(DigestAlgorithm::Md5).unwrap());
        assert!(fixity.get(DigestAlgorithm::Sha256).is_none());
    }

    #[test]
    fn test_missing_digest_is_store_side_error() {
        // sample_store records sha256 digests only
        let store = single_version_store();
        let exporter = Exporter::new(&store).unwrap();
        let err = exporter.manifest(DigestAlgorithm::Sha1).unwrap_err();
        assert!(matches!(err, OcflateError::MissingDigest { .. }));
    }
}
