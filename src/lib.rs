//! # ocflate - OCFL inventory blocks from versioned preservation stores
//!
//! ocflate converts a versioned, fixity-tracked file-object store (a
//! sequence of immutable version snapshots, each recording which files
//! exist and their checksums) into the building blocks of an
//! [OCFL](https://ocfl.io) inventory.
//!
//! ## Overview
//!
//! Given read access to one versioned object, the engine derives:
//!
//! - **Manifest**: one deduplicated checksum-to-paths map spanning all
//!   versions, built by folding each version's additions-only inventory
//! - **State**: per-version checksum-to-paths maps describing the live
//!   file tree at that version
//! - **Fixity**: a manifest under a secondary checksum algorithm, labeled
//!   by algorithm name
//! - **Delta / History**: per-version change reports classifying files as
//!   added, modified, deleted or renamed, re-keyed by checksum
//! - **Inventory document**: the assembled `inventory.json` with object
//!   id, head pointer, versions block and optional fixity block
//!
//! The store itself is an external collaborator behind the
//! [`VersionStore`] trait; the engine never writes to it and assumes a
//! point-in-time-consistent view of a fixed set of finalized versions.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ocflate::{DigestAlgorithm, DocumentBuilder, Exporter};
//!
//! // `store` is any VersionStore implementation over one object.
//! let exporter = Exporter::new(&store)?;
//!
//! // Individual blocks...
//! let manifest = exporter.manifest(DigestAlgorithm::Sha256)?;
//! let history = exporter.history(DigestAlgorithm::Sha256)?;
//!
//! // ...or the whole inventory document.
//! let document = DocumentBuilder::new(&exporter)
//!     .fixity_algorithm(DigestAlgorithm::Md5)
//!     .build()?;
//! document.write_to(export_dir)?;
//! ```
//!
//! ## Key Concepts
//!
//! ### Versions
//!
//! Versions are positive, 1-based, dense integers; version 1 always
//! exists and has no predecessor. [`Exporter::new`] validates the store's
//! version list once and every builder checks its version argument
//! against it.
//!
//! ### Digest algorithms
//!
//! The supported set is md5, sha1 and sha256. The algorithm is an
//! explicit parameter to every checksum-dependent call rather than engine
//! state, so a manifest build and a fixity build under different
//! algorithms can run concurrently on one [`Exporter`]. Unknown algorithm
//! names fail when parsed, before any store query is issued.
//!
//! ### Trust and rehashing
//!
//! The regular builders trust the checksums the store recorded. For
//! stores backed by a real directory tree, [`Exporter::manifest_from_disk`]
//! rebuilds the manifest by rehashing every file locally, and
//! [`Exporter::check_fixity`] reports per-path disagreements between the
//! two as [`FixityAnomaly`] records - data for the caller's policy, not
//! errors.
//!
//! ## Error Handling
//!
//! All operations return `Result<T, OcflateError>`. Errors are never
//! swallowed or logged internally; configuration errors (bad algorithm
//! name) surface before any store query, precondition errors (version out
//! of range, delta of version 1) surface without retries, and store
//! failures abort the triggering call including any in-flight history
//! aggregate.
//!
//! ## Module Organization
//!
//! - [`export`]: the [`Exporter`] engine - manifest, state and fixity builders
//! - [`delta`]: delta engine and history aggregator
//! - [`rehash`]: disk rehash variant and fixity audit
//! - [`document`]: inventory document assembly and serialization
//! - [`store`]: the [`VersionStore`] capability trait and diff report types
//! - [`types`]: common artifacts and value types
//! - [`error`]: error types and handling

// Public API modules
pub mod delta;
pub mod document;
pub mod error;
pub mod export;
pub mod rehash;
pub mod store;
pub mod types;

// Internal modules (not part of public API)
mod utils;

// Re-export main types for convenience
pub use document::{DocumentBuilder, InventoryDocument, User, VersionBlock};
pub use error::{OcflateError, Result};
pub use export::{Exporter, CONTENT_DIRECTORY};
pub use rehash::FixityAnomaly;
pub use store::{
    DiffFile, DiffSubset, FileSignature, GroupDiff, InventoryEntry, InventoryKind,
    VersionDiffReport, VersionStore,
};
pub use types::*;
