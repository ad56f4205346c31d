//! Tracked triumph list with JSON file persistence
//!
//! The file holds a single JSON array of record hashes in the order they
//! were tracked, e.g. `[3851137658, 1467429227]`.

use crate::error::{Error, Result};
use crate::manifest::store::write_atomic;
use crate::triumphs::{Hash, Triumph, TriumphTree};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// A tracked hash paired with its triumph in the current tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedTriumph {
    pub hash: Hash,
    pub triumph: Triumph,
}

/// Tracked hashes partitioned against a tree
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTracker {
    pub resolved: Vec<TrackedTriumph>,
    pub unresolved: Vec<Hash>,
}

/// Persistent, ordered set of tracked triumph hashes
pub struct TrackerStore {
    path: PathBuf,
    hashes: RwLock<Vec<Hash>>,
}

impl TrackerStore {
    /// Open the tracker file, starting empty if it is missing or unreadable
    pub async fn new(path: PathBuf) -> Self {
        let hashes = Self::load(&path).await;
        tracing::debug!("Tracker loaded {} hashes from {}", hashes.len(), path.display());
        Self {
            path,
            hashes: RwLock::new(hashes),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tracked hashes in insertion order
    pub async fn list(&self) -> Vec<Hash> {
        self.hashes.read().await.clone()
    }

    pub async fn contains(&self, hash: Hash) -> bool {
        self.hashes.read().await.contains(&hash)
    }

    /// Start tracking a hash. Returns false if it was already tracked.
    pub async fn track(&self, hash: Hash) -> Result<bool> {
        let mut hashes = self.hashes.write().await;
        if hashes.contains(&hash) {
            return Ok(false);
        }
        hashes.push(hash);
        if let Err(e) = self.persist(&hashes).await {
            hashes.pop();
            return Err(e);
        }
        tracing::info!("Tracking triumph {}", hash);
        Ok(true)
    }

    /// Stop tracking a hash. Returns false if it was not tracked.
    pub async fn untrack(&self, hash: Hash) -> Result<bool> {
        let mut hashes = self.hashes.write().await;
        let Some(index) = hashes.iter().position(|h| *h == hash) else {
            return Ok(false);
        };
        hashes.remove(index);
        if let Err(e) = self.persist(&hashes).await {
            hashes.insert(index, hash);
            return Err(e);
        }
        tracing::info!("Untracked triumph {}", hash);
        Ok(true)
    }

    /// Pair each tracked hash with its triumph in `tree`
    pub async fn resolve(&self, tree: &TriumphTree) -> ResolvedTracker {
        let mut resolved = ResolvedTracker::default();
        for hash in self.hashes.read().await.iter().copied() {
            match tree.triumph(hash) {
                Some(triumph) => resolved.resolved.push(TrackedTriumph {
                    hash,
                    triumph: triumph.clone(),
                }),
                None => resolved.unresolved.push(hash),
            }
        }
        resolved
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    async fn load(path: &Path) -> Vec<Hash> {
        let data = match tokio::fs::read_to_string(path).await {
            Ok(data) => data,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to read {}: {}", path.display(), e);
                }
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Hash>>(&data) {
            Ok(mut hashes) => {
                let mut seen = std::collections::HashSet::new();
                hashes.retain(|h| seen.insert(*h));
                hashes
            }
            Err(e) => {
                tracing::warn!("Ignoring corrupt tracker file {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    async fn persist(&self, hashes: &[Hash]) -> Result<()> {
        let data = serde_json::to_string_pretty(hashes)?;
        write_atomic(&self.path, &data).await.map_err(|e| {
            Error::Tracker(format!("failed to write {}: {}", self.path.display(), e))
        })
    }
}
