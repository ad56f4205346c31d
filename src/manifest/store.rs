//! Manifest provider with an on-disk table cache
//!
//! Directory layout:
//! ```text
//! <cache_dir>/
//! └── <version>/
//!     └── <language>/
//!         ├── DestinyPresentationNodeDefinition.json
//!         ├── DestinyRecordDefinition.json
//!         └── DestinyObjectiveDefinition.json
//! ```
//!
//! Tables are downloaded once per manifest version and reused afterwards.
//! A cached table that no longer parses is deleted and downloaded again.

use crate::api::types::ManifestIndex;
use crate::api::DestinyApi;
use crate::error::{Error, Result};
use crate::manifest::types::*;
use crate::triumphs::Hash;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Loaded definitions tagged with their manifest version
struct LoadedManifest {
    version: String,
    definitions: Arc<Definitions>,
}

/// Manifest provider backed by the platform API and a local cache
pub struct ManifestStore {
    api: Arc<dyn DestinyApi>,
    cache_dir: PathBuf,
    language: String,
    loaded: RwLock<Option<LoadedManifest>>,
}

impl ManifestStore {
    pub fn new(api: Arc<dyn DestinyApi>, cache_dir: PathBuf, language: impl Into<String>) -> Self {
        Self {
            api,
            cache_dir,
            language: language.into(),
            loaded: RwLock::new(None),
        }
    }

    /// Version of the definitions currently in memory
    pub async fn version(&self) -> Option<String> {
        self.loaded.read().await.as_ref().map(|m| m.version.clone())
    }

    /// Return current definitions, downloading whatever is missing.
    ///
    /// The manifest index is fetched on every call so a new version is
    /// picked up; tables are only parsed again when the version changes.
    pub async fn load(&self) -> Result<Arc<Definitions>> {
        let index = self.api.get_manifest_index().await?;

        if let Some(loaded) = self.loaded.read().await.as_ref() {
            if loaded.version == index.version {
                return Ok(loaded.definitions.clone());
            }
        }

        tracing::info!(
            "Loading manifest {} ({})",
            index.version,
            self.language
        );
        let dir = self.table_dir(&index.version);
        tokio::fs::create_dir_all(&dir).await?;

        let definitions = Arc::new(Definitions {
            presentation_nodes: self
                .load_table(&index, &dir, PRESENTATION_NODE_TABLE)
                .await?,
            records: self.load_table(&index, &dir, RECORD_TABLE).await?,
            objectives: self.load_table(&index, &dir, OBJECTIVE_TABLE).await?,
        });

        tracing::info!(
            nodes = definitions.presentation_nodes.len(),
            records = definitions.records.len(),
            objectives = definitions.objectives.len(),
            "Manifest {} ready",
            index.version
        );

        *self.loaded.write().await = Some(LoadedManifest {
            version: index.version,
            definitions: definitions.clone(),
        });
        Ok(definitions)
    }

    fn table_dir(&self, version: &str) -> PathBuf {
        self.cache_dir
            .join(sanitize_component(version))
            .join(sanitize_component(&self.language))
    }

    /// Parse a cached table, or download, parse and cache it.
    ///
    /// Only documents that parse are written to the cache.
    async fn load_table<T: DeserializeOwned>(
        &self,
        index: &ManifestIndex,
        dir: &Path,
        table: &str,
    ) -> Result<HashMap<Hash, T>> {
        let content_path = index.table_path(&self.language, table).ok_or_else(|| {
            Error::Manifest(format!(
                "manifest {} has no {} table for language '{}'",
                index.version, table, self.language
            ))
        })?;

        let file = dir.join(format!("{}.json", table));
        match tokio::fs::read_to_string(&file).await {
            Ok(data) => match parse_table(table, &data) {
                Ok(parsed) => {
                    tracing::debug!("Using cached {}", file.display());
                    return Ok(parsed);
                }
                Err(e) => {
                    tracing::warn!("Discarding corrupt cached {}: {}", file.display(), e);
                    if let Err(e) = tokio::fs::remove_file(&file).await {
                        tracing::warn!("Failed to remove {}: {}", file.display(), e);
                    }
                }
            },
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                tracing::warn!("Failed to read cached {}: {}", file.display(), e);
            }
            Err(_) => {}
        }

        tracing::info!("Downloading {}", table);
        let data = self.api.get_content(content_path).await?;
        let parsed = parse_table(table, &data)
            .map_err(|e| Error::Manifest(format!("failed to parse {}: {}", table, e)))?;
        if let Err(e) = write_atomic(&file, &data).await {
            tracing::warn!("Failed to cache {}: {}", file.display(), e);
        }
        Ok(parsed)
    }
}

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Write via a temporary file and rename into place.
///
/// Every call gets its own temporary file, so concurrent writers of the
/// same path never interleave; the last rename wins.
pub(crate) async fn write_atomic(path: &Path, data: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(
        ".{}.{}.tmp",
        std::process::id(),
        TMP_SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    let tmp = path.with_file_name(name);

    let written = match tokio::fs::write(&tmp, data).await {
        Ok(()) => tokio::fs::rename(&tmp, path).await,
        Err(e) => Err(e),
    };
    if written.is_err() {
        let _ = tokio::fs::remove_file(&tmp).await;
    }
    written
}

/// Keep version strings from escaping the cache directory
fn sanitize_component(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}
