//! Structural comparison of two snapshots.
//!
//! Output groups entries as only-in-first, only-in-second, then changed,
//! each sorted by path. A file counts as changed only when its digest
//! differs.

use crate::digest::Sha256Digest;
use crate::error::SnapshotError;
use crate::size::{FileSize, SizeDelta};
use crate::snapshot::{ManifestEntry, Snapshot};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileDiff {
    OnlyInFirst(ManifestEntry),
    OnlyInSecond(ManifestEntry),
    Changed {
        path: String,
        first_sha256: Sha256Digest,
        first_size: FileSize,
        second_sha256: Sha256Digest,
        second_size: FileSize,
    },
}

impl FileDiff {
    pub fn path(&self) -> &str {
        match self {
            FileDiff::OnlyInFirst(e) | FileDiff::OnlyInSecond(e) => &e.path,
            FileDiff::Changed { path, .. } => path,
        }
    }

    /// Size change going from the first snapshot to the second.
    pub fn size_delta(&self) -> SizeDelta {
        match self {
            FileDiff::OnlyInFirst(e) => FileSize::default().delta(&e.size),
            FileDiff::OnlyInSecond(e) => e.size.delta(&FileSize::default()),
            FileDiff::Changed {
                first_size,
                second_size,
                ..
            } => second_size.delta(first_size),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotDiff {
    pub entries: Vec<FileDiff>,
}

impl SnapshotDiff {
    pub fn only_in_first(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter().filter_map(|d| match d {
            FileDiff::OnlyInFirst(e) => Some(e),
            _ => None,
        })
    }

    pub fn only_in_second(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter().filter_map(|d| match d {
            FileDiff::OnlyInSecond(e) => Some(e),
            _ => None,
        })
    }

    pub fn changed(&self) -> impl Iterator<Item = &FileDiff> {
        self.entries
            .iter()
            .filter(|d| matches!(d, FileDiff::Changed { .. }))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn index(snapshot: &Snapshot) -> Result<BTreeMap<&str, &ManifestEntry>, SnapshotError> {
    let mut map = BTreeMap::new();
    for entry in &snapshot.files {
        if map.insert(entry.path.as_str(), entry).is_some() {
            return Err(SnapshotError::DuplicatePath(entry.path.clone()));
        }
    }
    Ok(map)
}

/// Compare `first` against `second`. Fails on a snapshot holding the same
/// path twice rather than picking one of the entries.
pub fn diff(first: &Snapshot, second: &Snapshot) -> Result<SnapshotDiff, SnapshotError> {
    let a = index(first)?;
    let b = index(second)?;

    let mut entries: Vec<FileDiff> = a
        .iter()
        .filter(|(path, _)| !b.contains_key(*path))
        .map(|(_, e)| FileDiff::OnlyInFirst((*e).clone()))
        .collect();
    entries.extend(
        b.iter()
            .filter(|(path, _)| !a.contains_key(*path))
            .map(|(_, e)| FileDiff::OnlyInSecond((*e).clone())),
    );
    for (path, ea) in &a {
        if let Some(eb) = b.get(path) {
            if ea.sha256 != eb.sha256 {
                entries.push(FileDiff::Changed {
                    path: path.to_string(),
                    first_sha256: ea.sha256.clone(),
                    first_size: ea.size,
                    second_sha256: eb.sha256.clone(),
                    second_size: eb.size,
                });
            }
        }
    }
    Ok(SnapshotDiff { entries })
}
