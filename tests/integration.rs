//! End-to-end tests for ocflate
//!
//! Drives the full export pipeline against a real on-disk object tree:
//! a disk-backed store implementation, manifest/state/history builds,
//! the disk rehash cross-check, and inventory document export.

use ocflate::{
    ChangeType, DiffFile, DiffSubset, DigestAlgorithm, DocumentBuilder, Exporter, FileSignature,
    GroupDiff, InventoryEntry, InventoryKind, Result, User, VersionDiffReport, VersionId,
    VersionStore,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ALG: DigestAlgorithm = DigestAlgorithm::Sha256;

/// Disk-backed store over one object: per-version full listings with
/// signatures computed from the bytes written to disk.
struct DiskObjectStore {
    id: String,
    root: PathBuf,
    listings: Vec<BTreeMap<String, FileSignature>>,
    messages: BTreeMap<VersionId, String>,
}

impl DiskObjectStore {
    fn listing(&self, version: VersionId) -> Result<&BTreeMap<String, FileSignature>> {
        self.listings
            .get(version as usize - 1)
            .ok_or_else(|| ocflate::OcflateError::store(format!("unknown version {}", version)))
    }
}

impl VersionStore for DiskObjectStore {
    fn id(&self) -> &str {
        &self.id
    }

    fn versions(&self) -> Result<Vec<VersionId>> {
        Ok((1..=self.listings.len() as VersionId).collect())
    }

    fn inventory(&self, version: VersionId, kind: InventoryKind) -> Result<Vec<InventoryEntry>> {
        let current = self.listing(version)?;
        let prior = if version > 1 {
            Some(self.listing(version - 1)?)
        } else {
            None
        };
        Ok(current
            .iter()
            .filter(|(path, signature)| match kind {
                InventoryKind::Full => true,
                InventoryKind::Additions => {
                    prior.map_or(true, |p| p.get(*path) != Some(*signature))
                }
            })
            .map(|(path, signature)| InventoryEntry::new(path, signature.clone()))
            .collect())
    }

    fn diff(&self, base: VersionId, target: VersionId) -> Result<VersionDiffReport> {
        let basis = self.listing(base)?;
        let other = self.listing(target)?;

        let mut subsets = Vec::new();
        let added: Vec<DiffFile> = other
            .iter()
            .filter(|(path, _)| !basis.contains_key(*path))
            .map(|(path, signature)| DiffFile {
                basis_path: None,
                other_path: Some(path.clone()),
                signatures: vec![signature.clone()],
            })
            .collect();
        let modified: Vec<DiffFile> = basis
            .iter()
            .filter_map(|(path, old)| {
                other.get(path).filter(|new| *new != old).map(|new| DiffFile {
                    basis_path: Some(path.clone()),
                    other_path: Some(path.clone()),
                    signatures: vec![old.clone(), new.clone()],
                })
            })
            .collect();
        let deleted: Vec<DiffFile> = basis
            .iter()
            .filter(|(path, _)| !other.contains_key(*path))
            .map(|(path, signature)| DiffFile {
                basis_path: Some(path.clone()),
                other_path: None,
                signatures: vec![signature.clone()],
            })
            .collect();

        for (change, files) in [
            (ChangeType::Added, added),
            (ChangeType::Modified, modified),
            (ChangeType::Deleted, deleted),
        ] {
            if !files.is_empty() {
                subsets.push(DiffSubset { change, files });
            }
        }

        let difference_count = subsets.iter().map(|s| s.files.len()).sum();
        Ok(VersionDiffReport {
            groups: vec![GroupDiff {
                group_id: "content".to_string(),
                difference_count,
                subsets,
            }],
        })
    }

    fn version_messages(&self) -> Result<BTreeMap<VersionId, String>> {
        Ok(self.messages.clone())
    }

    fn object_root(&self) -> Option<&Path> {
        Some(&self.root)
    }
}

/// Build a three-version object under `root`:
///
/// - v1: readme.md, a.bin
/// - v2: a.bin re-contented, b.bin added (duplicating v1's a.bin bytes)
/// - v3: readme.md deleted, b.bin re-contented
fn build_object(root: &Path) -> DiskObjectStore {
    let full_listings: Vec<Vec<(&str, &[u8])>> = vec![
        vec![("readme.md", b"# release 1"), ("a.bin", b"AAAA")],
        vec![("readme.md", b"# release 1"), ("a.bin", b"AAAB"), ("b.bin", b"AAAA")],
        vec![("a.bin", b"AAAB"), ("b.bin", b"BBBB")],
    ];

    let mut listings: Vec<BTreeMap<String, FileSignature>> = Vec::new();
    for (index, files) in full_listings.iter().enumerate() {
        let mut listing = BTreeMap::new();
        for &(path, data) in files {
            let signature = FileSignature::from_data(data);
            // Only content new at this version lands in its directory.
            let carried_over = listings
                .last()
                .map_or(false, |prior: &BTreeMap<String, FileSignature>| {
                    prior.get(path) == Some(&signature)
                });
            if !carried_over {
                let target = root
                    .join(format!("v{:04}", index + 1))
                    .join("data")
                    .join(path);
                fs::create_dir_all(target.parent().unwrap()).unwrap();
                fs::write(target, data).unwrap();
            }
            listing.insert(path.to_string(), signature);
        }
        listings.push(listing);
    }

    let mut messages = BTreeMap::new();
    messages.insert(1, "initial accession".to_string());
    messages.insert(3, "withdraw readme".to_string());

    DiskObjectStore {
        id: "urn:example:integration".to_string(),
        root: root.to_path_buf(),
        listings,
        messages,
    }
}

#[test]
fn test_manifest_dedups_content_across_versions() {
    let root = TempDir::new().unwrap();
    let store = build_object(root.path());
    let exporter = Exporter::new(&store).unwrap();

    let manifest = exporter.manifest(ALG).unwrap();
    assert_eq!(
        manifest.paths(&ALG.hash_data(b"AAAA")).unwrap(),
        &["v0001/data/a.bin", "v0002/data/b.bin"]
    );
    assert_eq!(
        manifest.paths(&ALG.hash_data(b"# release 1")).unwrap(),
        &["v0001/data/readme.md"]
    );
    assert_eq!(manifest.len(), 4);
    assert_eq!(manifest.path_count(), 5);
}

#[test]
fn test_state_tracks_live_tree() {
    let root = TempDir::new().unwrap();
    let store = build_object(root.path());
    let exporter = Exporter::new(&store).unwrap();

    let state = exporter.state(3, ALG).unwrap();
    assert_eq!(state.paths(&ALG.hash_data(b"AAAB")).unwrap(), &["a.bin"]);
    assert_eq!(state.paths(&ALG.hash_data(b"BBBB")).unwrap(), &["b.bin"]);
    assert_eq!(state.path_count(), 2);
    assert!(state.paths(&ALG.hash_data(b"# release 1")).is_none());
}

#[test]
fn test_history_across_three_versions() {
    let root = TempDir::new().unwrap();
    let store = build_object(root.path());
    let exporter = Exporter::new(&store).unwrap();

    let history = exporter.history(ALG).unwrap();
    assert_eq!(history.len(), 3);

    let v1 = history.get(1).unwrap();
    assert_eq!(v1.get(ChangeType::Added).unwrap().len(), 2);

    let v2 = history.get(2).unwrap();
    let added = v2.get(ChangeType::Added).unwrap();
    assert_eq!(added[0].path(), "content/b.bin");
    let modified = v2.get(ChangeType::Modified).unwrap();
    assert_eq!(modified[0].path(), "content/a.bin");
    assert_eq!(
        modified[0].checksums(),
        &[ALG.hash_data(b"AAAA"), ALG.hash_data(b"AAAB")]
    );

    let v3 = history.get(3).unwrap();
    assert_eq!(
        v3.get(ChangeType::Deleted).unwrap()[0].path(),
        "content/readme.md"
    );
    assert!(v3.get(ChangeType::Added).is_none());
}

#[test]
fn test_rehash_matches_recorded_checksums() {
    let root = TempDir::new().unwrap();
    let store = build_object(root.path());
    let exporter = Exporter::new(&store).unwrap();

    let rehashed = exporter.manifest_from_disk(ALG).unwrap();
    assert_eq!(rehashed, exporter.manifest(ALG).unwrap());
    assert!(exporter.check_fixity(ALG).unwrap().is_empty());

    // Works under every supported algorithm, not just the primary one.
    let md5 = exporter.manifest_from_disk(DigestAlgorithm::Md5).unwrap();
    assert_eq!(md5, exporter.manifest(DigestAlgorithm::Md5).unwrap());
}

#[test]
fn test_document_export() {
    let root = TempDir::new().unwrap();
    let export_dir = TempDir::new().unwrap();
    let store = build_object(root.path());
    let exporter = Exporter::new(&store).unwrap();

    let document = DocumentBuilder::new(&exporter)
        .fixity_algorithm(DigestAlgorithm::Md5)
        .user(User::new("integration-suite"))
        .build()
        .unwrap();
    let path = document.write_to(export_dir.path()).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(json["id"], "urn:example:integration");
    assert_eq!(json["head"], "v0003");
    assert_eq!(json["digestAlgorithm"], "sha256");
    assert_eq!(json["versions"]["v0001"]["message"], "initial accession");
    assert!(json["versions"]["v0002"].get("message").is_none());
    assert_eq!(json["versions"]["v0003"]["user"]["name"], "integration-suite");
    assert_eq!(
        json["manifest"][ALG.hash_data(b"AAAA")],
        serde_json::json!(["v0001/data/a.bin", "v0002/data/b.bin"])
    );
    assert_eq!(
        json["fixity"]["md5"][DigestAlgorithm::Md5.hash_data(b"BBBB")],
        serde_json::json!(["v0003/data/b.bin"])
    );
}
