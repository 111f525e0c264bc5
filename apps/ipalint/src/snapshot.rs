//! Content-addressed manifests of extracted packages.
//!
//! A snapshot lists every regular file of the extracted tree with its
//! SHA-256 digest and size, plus a descriptor of the archive it came from.
//! Entries keep traversal order (depth-first, siblings sorted by name) so the
//! persisted JSON is reproducible. Hashing runs in parallel; the collected
//! result preserves that order.

use crate::cancel::CancelToken;
use crate::digest::{sha256_file, Sha256Digest};
use crate::error::SnapshotError;
use crate::fsutil;
use crate::package::{Package, Tree};
use crate::size::FileSize;
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Persisted format version written into every snapshot.
pub const SNAPSHOT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: String,
    pub descriptor: Descriptor,
    pub files: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    /// Origin archive file name.
    pub filename: String,
    /// Unix epoch seconds.
    #[serde(rename = "createdAt")]
    pub created_at: u64,
    /// Digest of the whole archive.
    pub sha256: Sha256Digest,
}

/// One file of the extracted tree. Identity is `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    pub sha256: Sha256Digest,
    pub size: FileSize,
}

impl Snapshot {
    /// Hash every file of `tree` and describe `package`, stamped with the
    /// current time. The tree need not contain an app bundle.
    pub fn generate(
        package: &Package,
        tree: &Tree,
        cancel: &CancelToken,
    ) -> Result<Self, SnapshotError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self::generate_at(package, tree, now, cancel)
    }

    pub fn generate_at(
        package: &Package,
        tree: &Tree,
        created_at: u64,
        cancel: &CancelToken,
    ) -> Result<Self, SnapshotError> {
        info!(
            "hashing {} files of {}",
            tree.files.len(),
            package.path.display()
        );
        let files = tree
            .files
            .par_iter()
            .map(|rel| {
                if cancel.is_cancelled() {
                    return Err(SnapshotError::Cancelled);
                }
                let abs = tree.root.join(rel);
                let size = fsutil::file_size(&abs)?;
                Ok(ManifestEntry {
                    path: rel.clone(),
                    sha256: sha256_file(&abs)?,
                    size,
                })
            })
            .collect::<Result<Vec<_>, SnapshotError>>()?;
        if cancel.is_cancelled() {
            return Err(SnapshotError::Cancelled);
        }
        let descriptor = Descriptor {
            filename: package.file_name(),
            created_at,
            sha256: sha256_file(&package.path)?,
        };
        Ok(Self {
            version: SNAPSHOT_VERSION.to_string(),
            descriptor,
            files,
        })
    }

    /// Read a persisted snapshot, rejecting duplicate paths.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let data = fs::read(path)?;
        let snapshot: Snapshot = serde_json::from_slice(&data)?;
        snapshot.check_unique_paths()?;
        debug!(
            "loaded snapshot {} ({} files)",
            path.display(),
            snapshot.files.len()
        );
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, out: &mut dyn Write) -> Result<(), SnapshotError> {
        out.write_all(self.to_json()?.as_bytes())?;
        out.write_all(b"\n")?;
        Ok(())
    }

    pub fn total_size(&self) -> FileSize {
        self.files.iter().map(|f| f.size).sum()
    }

    pub fn check_unique_paths(&self) -> Result<(), SnapshotError> {
        let mut seen = HashSet::with_capacity(self.files.len());
        for entry in &self.files {
            if !seen.insert(entry.path.as_str()) {
                return Err(SnapshotError::DuplicatePath(entry.path.clone()));
            }
        }
        Ok(())
    }
}
