//! Error types for the ocflate library
//!
//! This module defines all error types that can occur while building OCFL
//! inventory blocks from a versioned store. Errors map onto three broad
//! families: configuration errors (a digest algorithm the engine does not
//! support), precondition errors (a version outside the object's range, or
//! a delta requested for version 1), and store errors (the underlying
//! store failed or returned something malformed). All errors propagate
//! synchronously to the caller; nothing is swallowed or logged internally.

use crate::types::{ChangeType, DigestAlgorithm, VersionId};
use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in the ocflate library
pub type Result<T> = std::result::Result<T, OcflateError>;

/// Main error type for all ocflate operations
#[derive(Debug, Error)]
pub enum OcflateError {
    /// I/O errors during file operations (disk rehash, document export)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors during JSON serialization of the inventory document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Walk directory error from the disk rehash walk
    #[error("Walk directory error")]
    WalkDir(#[from] walkdir::Error),

    /// Unsupported digest algorithm name
    #[error("Unsupported digest algorithm: {0} (expected one of md5, sha1, sha256)")]
    UnsupportedDigest(String),

    /// Version outside the object's valid range
    #[error("Version {version} out of range: object has versions 1..={current}")]
    VersionOutOfRange {
        /// Requested version
        version: VersionId,
        /// Most recent version of the object
        current: VersionId,
    },

    /// Delta requested for a version with no predecessor
    #[error("Version {0} has no prior version to compare against")]
    NoPriorVersion(VersionId),

    /// The store's version list is not a dense 1-based sequence
    #[error("Invalid version list: {0}")]
    InvalidVersionList(String),

    /// A file signature is missing the requested algorithm's digest
    #[error("Store signature for {path:?} has no {algorithm} digest")]
    MissingDigest {
        /// Path whose signature is incomplete
        path: String,
        /// Algorithm that was requested
        algorithm: DigestAlgorithm,
    },

    /// A diff entry carried an unexpected number of checksums
    #[error("{change} entry for {path:?} carries {count} checksums (expected 1 or 2)")]
    InvalidChangeEntry {
        /// Path of the offending entry
        path: String,
        /// Change classification reported by the store
        change: ChangeType,
        /// Number of checksums reported
        count: usize,
    },

    /// The store does not expose an on-disk object root
    #[error("Store does not expose an on-disk object root")]
    NoObjectRoot,

    /// A walked file path could not be expressed relative to the object root
    #[error("Path conversion error: {0:?}")]
    PathConversion(PathBuf),

    /// Store query failure (I/O, missing version, corrupt metadata)
    #[error("Store error: {0}")]
    Store(String),
}

impl OcflateError {
    /// Create a store error with a custom message
    pub fn store(msg: impl Into<String>) -> Self {
        OcflateError::Store(msg.into())
    }

    /// Check if this error is a configuration error (no store query was issued)
    pub fn is_configuration(&self) -> bool {
        matches!(self, OcflateError::UnsupportedDigest(_))
    }

    /// Check if this error is a precondition failure on the caller's side
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            OcflateError::VersionOutOfRange { .. }
                | OcflateError::NoPriorVersion(_)
                | OcflateError::NoObjectRoot
        )
    }
}
