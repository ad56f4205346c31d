//! Search/fetch orchestration
//!
//! One build is a linear chain: load manifest → search player → fetch
//! profile records → run the join/flatten engine. The resulting snapshot
//! replaces the current one only when every step succeeded.

use crate::api::{select_player, BungieClient, DestinyApi, PlayerQuery, UserInfoCard};
use crate::config::TrackerConfig;
use crate::error::{Error, Result};
use crate::manifest::ManifestStore;
use crate::triumphs::progress::ProfileRecords;
use crate::triumphs::{build_triumph_tree, survey_states, Hash, StateMask, TriumphTree};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Result of one successful build
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub query: PlayerQuery,
    pub player: UserInfoCard,
    pub manifest_version: Option<String>,
    pub built_at: u64,
    pub tree: Arc<TriumphTree>,
}

impl Snapshot {
    /// Headline numbers and per-category completion
    pub fn summary(&self) -> TreeSummary {
        let tree = &self.tree;
        let categories = tree
            .child_nodes(tree.root)
            .into_iter()
            .map(|category| {
                let (completed, total) = tree.completion(category.hash);
                CategorySummary {
                    hash: category.hash,
                    name: category.name.clone(),
                    completed,
                    total,
                }
            })
            .collect();

        TreeSummary {
            player: self.player.clone(),
            manifest_version: self.manifest_version.clone(),
            built_at: self.built_at,
            root: tree.root,
            node_count: tree.nodes.len(),
            triumph_count: tree.triumphs.len(),
            failure_count: tree.failures.len(),
            earned_score: tree.earned_score(),
            categories,
        }
    }
}

/// Compact view of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeSummary {
    pub player: UserInfoCard,
    pub manifest_version: Option<String>,
    pub built_at: u64,
    pub root: Hash,
    pub node_count: usize,
    pub triumph_count: usize,
    pub failure_count: usize,
    pub earned_score: i64,
    pub categories: Vec<CategorySummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub hash: Hash,
    pub name: String,
    pub completed: usize,
    pub total: usize,
}

/// Builds and holds the current triumph tree
pub struct TriumphService {
    api: Arc<dyn DestinyApi>,
    manifest: ManifestStore,
    root: Hash,
    current: RwLock<Option<Arc<Snapshot>>>,
    /// Held for a whole build so snapshots are installed in request order
    building: Mutex<()>,
}

impl TriumphService {
    pub fn new(api: Arc<dyn DestinyApi>, manifest: ManifestStore, root: Hash) -> Self {
        Self {
            api,
            manifest,
            root,
            current: RwLock::new(None),
            building: Mutex::new(()),
        }
    }

    /// Wire up the platform client and manifest cache from configuration
    pub fn from_config(config: &TrackerConfig) -> Result<Self> {
        let api: Arc<dyn DestinyApi> = Arc::new(BungieClient::new(config.api.clone())?);
        let manifest = ManifestStore::new(
            api.clone(),
            config.manifest.cache_dir.clone(),
            config.manifest.language.clone(),
        );
        Ok(Self::new(api, manifest, config.triumphs.root_node_hash))
    }

    /// Build a fresh tree for a player and make it current.
    ///
    /// On failure the previous snapshot is left untouched. Concurrent calls
    /// run one at a time, so the last caller's snapshot ends up current.
    pub async fn build(&self, query: PlayerQuery) -> Result<Arc<Snapshot>> {
        let _building = self.building.lock().await;
        self.build_locked(query).await
    }

    /// Rebuild with the last successful query
    pub async fn refresh(&self) -> Result<Arc<Snapshot>> {
        let _building = self.building.lock().await;
        let query = self
            .current
            .read()
            .await
            .as_ref()
            .map(|s| s.query.clone())
            .ok_or(Error::NoActiveQuery)?;
        self.build_locked(query).await
    }

    async fn build_locked(&self, query: PlayerQuery) -> Result<Arc<Snapshot>> {
        tracing::info!("Building triumphs for {} on {}", query.username, query.platform);

        let definitions = self.manifest.load().await?;
        let (player, progress) = self.fetch_progress(&query).await?;
        let tree = build_triumph_tree(&definitions, &progress, self.root);

        if !tree.failures.is_empty() {
            tracing::warn!(
                "Triumph tree for {} built with {} failures",
                player.display_name,
                tree.failures.len()
            );
        }
        tracing::info!(
            nodes = tree.nodes.len(),
            triumphs = tree.triumphs.len(),
            "Triumphs ready for {}",
            player.display_name
        );

        let snapshot = Arc::new(Snapshot {
            query,
            player,
            manifest_version: self.manifest.version().await,
            built_at: now_millis(),
            tree: Arc::new(tree),
        });
        *self.current.write().await = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// The current snapshot, if any build has succeeded
    pub async fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.read().await.clone()
    }

    /// Distinct record state codes of a player's progress
    pub async fn survey(&self, query: &PlayerQuery) -> Result<BTreeMap<u32, StateMask>> {
        let (_, progress) = self.fetch_progress(query).await?;
        Ok(survey_states(&progress))
    }

    async fn fetch_progress(&self, query: &PlayerQuery) -> Result<(UserInfoCard, ProfileRecords)> {
        let candidates = self
            .api
            .search_player(query.platform, &query.username)
            .await?;
        let player = select_player(candidates, &query.username)?;
        tracing::debug!(
            "Resolved {} to membership {}/{}",
            query.username,
            player.membership_type,
            player.membership_id
        );

        let progress = self
            .api
            .get_profile_records(player.membership_type, &player.membership_id)
            .await?;
        Ok((player, progress))
    }
}

/// Current time in Unix milliseconds
fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
