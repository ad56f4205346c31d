//! Manifest definition types
//!
//! Only the fields the triumph tree needs are modelled. Unknown fields are
//! ignored and missing optional fields fall back to defaults.

use crate::triumphs::types::Hash;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const PRESENTATION_NODE_TABLE: &str = "DestinyPresentationNodeDefinition";
pub const RECORD_TABLE: &str = "DestinyRecordDefinition";
pub const OBJECTIVE_TABLE: &str = "DestinyObjectiveDefinition";

/// Tables the triumph tree is built from
pub const REQUIRED_TABLES: [&str; 3] = [PRESENTATION_NODE_TABLE, RECORD_TABLE, OBJECTIVE_TABLE];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplayProperties {
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub has_icon: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationNodeChild {
    pub presentation_node_hash: Hash,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordChild {
    pub record_hash: Hash,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PresentationNodeChildren {
    pub presentation_nodes: Vec<PresentationNodeChild>,
    pub records: Vec<RecordChild>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PresentationNodeDefinition {
    pub display_properties: DisplayProperties,
    pub root_view_icon: Option<String>,
    pub scope: i32,
    pub parent_node_hashes: Vec<Hash>,
    pub hash: Hash,
    pub objective_hash: Option<Hash>,
    pub children: PresentationNodeChildren,
}

impl PresentationNodeDefinition {
    pub fn child_node_hashes(&self) -> Vec<Hash> {
        self.children
            .presentation_nodes
            .iter()
            .map(|c| c.presentation_node_hash)
            .collect()
    }

    pub fn child_record_hashes(&self) -> Vec<Hash> {
        self.children.records.iter().map(|c| c.record_hash).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionInfo {
    #[serde(rename = "ScoreValue", default)]
    pub score_value: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordDefinition {
    pub display_properties: DisplayProperties,
    /// 0 = profile-scoped, otherwise character-scoped
    pub scope: i32,
    pub completion_info: Option<CompletionInfo>,
    pub hash: Hash,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectiveDefinition {
    pub hash: Hash,
    pub progress_description: String,
    pub allow_overcompletion: bool,
}

/// The three definition tables, keyed by hash
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    pub presentation_nodes: HashMap<Hash, PresentationNodeDefinition>,
    pub records: HashMap<Hash, RecordDefinition>,
    pub objectives: HashMap<Hash, ObjectiveDefinition>,
}

impl Definitions {
    /// Parse the three raw table documents.
    ///
    /// Entries that fail to parse are skipped with a warning and later show
    /// up as lookup misses in the tree walk.
    pub fn from_json(
        presentation_nodes: &str,
        records: &str,
        objectives: &str,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            presentation_nodes: parse_table(PRESENTATION_NODE_TABLE, presentation_nodes)?,
            records: parse_table(RECORD_TABLE, records)?,
            objectives: parse_table(OBJECTIVE_TABLE, objectives)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.presentation_nodes.is_empty() && self.records.is_empty() && self.objectives.is_empty()
    }
}

/// Parse a `{ "<hash>": definition }` document entry by entry
pub fn parse_table<T: DeserializeOwned>(
    table: &str,
    raw: &str,
) -> serde_json::Result<HashMap<Hash, T>> {
    let entries: HashMap<String, serde_json::Value> = serde_json::from_str(raw)?;
    let mut parsed = HashMap::with_capacity(entries.len());
    for (key, value) in entries {
        let hash = match key.parse::<Hash>() {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!("Skipping {} entry with bad key {}: {}", table, key, e);
                continue;
            }
        };
        match serde_json::from_value(value) {
            Ok(definition) => {
                parsed.insert(hash, definition);
            }
            Err(e) => tracing::warn!("Skipping malformed {} entry {}: {}", table, key, e),
        }
    }
    Ok(parsed)
}
