//! Inventory document assembly
//!
//! The engine's artifacts (manifest, per-version states, fixity) are
//! combined here into a complete OCFL inventory document: identifier,
//! head-version pointer, digest algorithm label, versions block with
//! per-version created/message/user metadata, and an optional fixity
//! block under a secondary algorithm. The document serializes to
//! `inventory.json` with the field names the OCFL specification uses.
//!
//! ## Examples
//!
//! ```rust,ignore
//! use ocflate::{DigestAlgorithm, DocumentBuilder, Exporter, User};
//!
//! let exporter = Exporter::new(&store)?;
//! let document = DocumentBuilder::new(&exporter)
//!     .fixity_algorithm(DigestAlgorithm::Md5)
//!     .user(User::new("preservation-bot").with_address("bot@example.org"))
//!     .build()?;
//! document.write_to(export_dir)?;
//! ```

use crate::error::Result;
use crate::export::{Exporter, CONTENT_DIRECTORY};
use crate::store::VersionStore;
use crate::types::{DigestAlgorithm, Fixity, Manifest, State};
use crate::utils::{version_dirname, write_json_atomic};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the persisted inventory document
pub const INVENTORY_FILE: &str = "inventory.json";

/// Inventory type URI recorded in the document's `type` field
pub const INVENTORY_TYPE: &str = "https://ocfl.io/1.0/spec/#inventory";

/// The agent recorded against a version block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Human or agent name
    pub name: String,
    /// Contact address, e.g. a mailto URI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl User {
    /// User with a name and no address
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
        }
    }

    /// Attach a contact address
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

/// One version's entry in the inventory's versions block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionBlock {
    /// Creation timestamp, RFC 3339
    #[serde(serialize_with = "serialize_created")]
    pub created: DateTime<Utc>,
    /// Human-readable version message, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Agent that created the version, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// Checksum-to-paths mapping of the version's live tree
    pub state: State,
}

fn serialize_created<S: Serializer>(
    created: &DateTime<Utc>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&created.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// A complete OCFL inventory document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryDocument {
    /// Stable object identifier
    pub id: String,
    /// Inventory type URI
    #[serde(rename = "type")]
    pub spec_type: String,
    /// Primary digest algorithm of the manifest and states
    #[serde(rename = "digestAlgorithm")]
    pub digest_algorithm: DigestAlgorithm,
    /// Version directory name of the most recent version, e.g. `v0003`
    pub head: String,
    /// Directory under each version holding content files
    #[serde(rename = "contentDirectory")]
    pub content_directory: String,
    /// Deduplicated content map spanning all versions
    pub manifest: Manifest,
    /// Per-version blocks keyed by version directory name
    pub versions: BTreeMap<String, VersionBlock>,
    /// Secondary-algorithm fixity block; omitted when empty
    #[serde(skip_serializing_if = "Fixity::is_empty")]
    pub fixity: Fixity,
}

impl InventoryDocument {
    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write `inventory.json` into `dir` atomically, returning its path
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(INVENTORY_FILE);
        write_json_atomic(&path, self)?;
        debug!(object = %self.id, path = %path.display(), "wrote inventory document");
        Ok(path)
    }
}

/// Builder assembling an [`InventoryDocument`] from an [`Exporter`]
///
/// The primary algorithm defaults to SHA-256, the OCFL recommendation.
/// Fixity algorithms are built independently of the primary manifest.
#[derive(Debug)]
pub struct DocumentBuilder<'e, 'a, S: VersionStore> {
    exporter: &'e Exporter<'a, S>,
    algorithm: DigestAlgorithm,
    fixity_algorithms: Vec<DigestAlgorithm>,
    user: Option<User>,
    created: Option<DateTime<Utc>>,
}

impl<'e, 'a, S: VersionStore> DocumentBuilder<'e, 'a, S> {
    /// Start a builder over an exporter
    pub fn new(exporter: &'e Exporter<'a, S>) -> Self {
        Self {
            exporter,
            algorithm: DigestAlgorithm::Sha256,
            fixity_algorithms: Vec::new(),
            user: None,
            created: None,
        }
    }

    /// Set the primary digest algorithm
    pub fn digest_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Add a secondary algorithm to the fixity block
    pub fn fixity_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.fixity_algorithms.push(algorithm);
        self
    }

    /// Record an agent on every version block
    pub fn user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    /// Override the version-block timestamp (defaults to build time)
    pub fn created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    /// Assemble the inventory document
    ///
    /// Builds the manifest and every version's state under the primary
    /// algorithm, attaches version messages from the store's auxiliary
    /// metadata, and builds one additional manifest per requested fixity
    /// algorithm.
    pub fn build(self) -> Result<InventoryDocument> {
        let exporter = self.exporter;
        debug!(object = exporter.id(), algorithm = %self.algorithm, "assembling inventory document");

        let manifest = exporter.manifest(self.algorithm)?;
        let messages = exporter.version_messages()?;
        let created = self.created.unwrap_or_else(Utc::now);

        let mut versions = BTreeMap::new();
        for &version in exporter.versions() {
            versions.insert(
                version_dirname(version),
                VersionBlock {
                    created,
                    message: messages.get(&version).cloned(),
                    user: self.user.clone(),
                    state: exporter.state(version, self.algorithm)?,
                },
            );
        }

        let mut fixity = Fixity::default();
        for &algorithm in &self.fixity_algorithms {
            fixity.insert(algorithm, exporter.manifest(algorithm)?);
        }

        Ok(InventoryDocument {
            id: exporter.id().to_string(),
            spec_type: INVENTORY_TYPE.to_string(),
            digest_algorithm: self.algorithm,
            head: version_dirname(exporter.current_version()),
            content_directory: CONTENT_DIRECTORY.to_string(),
            manifest,
            versions,
            fixity,
        })
    }
}
