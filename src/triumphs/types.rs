//! Display-ready triumph types
//!
//! These are the structures handed to the presentation layer: presentation
//! nodes keyed by hash with ordered child lists, and fully populated
//! triumphs with their mapped objectives.

use super::state::StateMask;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Definition hash as used by the manifest and the player payload.
///
/// Serialized as a plain number, and as a decimal string when used as a
/// JSON object key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Hash(pub u32);

impl std::fmt::Display for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Hash {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Hash)
    }
}

impl From<u32> for Hash {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Ordered child references of a presentation node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Children {
    pub presentation_nodes: Vec<Hash>,
    pub records: Vec<Hash>,
}

/// A category, sub-category or section of the triumph hierarchy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationNode {
    pub name: String,
    pub description: String,
    pub has_icon: bool,
    pub icon: Option<String>,
    pub root_view_icon: Option<String>,
    pub scope: i32,
    pub parent_node_hashes: Vec<Hash>,
    pub hash: Hash,
    pub objective_hash: Option<Hash>,
    pub children: Children,
}

impl PresentationNode {
    /// Node with only its hash set, used when the definition is missing
    pub fn placeholder(hash: Hash) -> Self {
        Self {
            hash,
            ..Default::default()
        }
    }
}

/// A sub-goal of a triumph, joined with its definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objective {
    pub objective_hash: Hash,
    pub allow_overcompletion: bool,
    pub completion_value: i64,
    pub progress: i64,
    pub visible: bool,
    pub description: String,
}

impl Objective {
    pub fn is_complete(&self) -> bool {
        self.progress >= self.completion_value
    }
}

/// A single trackable achievement with the player's progress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Triumph {
    pub name: String,
    pub description: String,
    pub icon_path: String,
    pub score_value: i64,
    pub hash: Hash,
    pub state: Option<StateMask>,
    pub objectives: Vec<Objective>,
}

impl Triumph {
    /// Empty triumph carrying only its hash
    pub fn new(hash: Hash) -> Self {
        Self {
            hash,
            ..Default::default()
        }
    }

    /// Whether the player has completed every objective.
    ///
    /// Uses the state mask when present, otherwise the objectives.
    pub fn is_complete(&self) -> bool {
        match self.state {
            Some(state) => state.is_complete(),
            None => !self.objectives.is_empty() && self.objectives.iter().all(Objective::is_complete),
        }
    }
}

/// A local failure recorded while building a tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BuildFailure {
    /// A presentation node could not be fully mapped
    Node { hash: Hash, reason: String },

    /// A triumph could not be fully mapped
    Triumph { hash: Hash, reason: String },

    /// A single objective of a triumph could not be mapped
    #[serde(rename_all = "camelCase")]
    Objective {
        triumph_hash: Hash,
        objective_hash: Hash,
        reason: String,
    },
}

impl std::fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node { hash, reason } => write!(f, "node {}: {}", hash, reason),
            Self::Triumph { hash, reason } => write!(f, "triumph {}: {}", hash, reason),
            Self::Objective {
                triumph_hash,
                objective_hash,
                reason,
            } => write!(
                f,
                "objective {} of triumph {}: {}",
                objective_hash, triumph_hash, reason
            ),
        }
    }
}

/// Result of one join/flatten pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriumphTree {
    pub root: Hash,
    pub nodes: HashMap<Hash, PresentationNode>,
    pub triumphs: HashMap<Hash, Triumph>,
    pub failures: Vec<BuildFailure>,
}

impl TriumphTree {
    pub fn node(&self, hash: Hash) -> Option<&PresentationNode> {
        self.nodes.get(&hash)
    }

    pub fn triumph(&self, hash: Hash) -> Option<&Triumph> {
        self.triumphs.get(&hash)
    }

    pub fn root_node(&self) -> Option<&PresentationNode> {
        self.nodes.get(&self.root)
    }

    /// Child nodes of `hash` in display order
    pub fn child_nodes(&self, hash: Hash) -> Vec<&PresentationNode> {
        self.node(hash)
            .map(|node| {
                node.children
                    .presentation_nodes
                    .iter()
                    .filter_map(|child| self.nodes.get(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Triumphs listed under a section in display order
    pub fn section_triumphs(&self, hash: Hash) -> Vec<&Triumph> {
        self.node(hash)
            .map(|node| {
                node.children
                    .records
                    .iter()
                    .filter_map(|record| self.triumphs.get(record))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Completed and total triumph counts below a node
    pub fn completion(&self, hash: Hash) -> (usize, usize) {
        let Some(node) = self.node(hash) else {
            return (0, 0);
        };
        let mut done = 0;
        let mut total = 0;
        for triumph in node.children.records.iter().filter_map(|r| self.triumphs.get(r)) {
            total += 1;
            if triumph.is_complete() {
                done += 1;
            }
        }
        for child in &node.children.presentation_nodes {
            if *child == hash {
                continue;
            }
            let (d, t) = self.completion(*child);
            done += d;
            total += t;
        }
        (done, total)
    }

    /// Sum of score values of completed triumphs
    pub fn earned_score(&self) -> i64 {
        self.triumphs
            .values()
            .filter(|t| t.is_complete())
            .map(|t| t.score_value)
            .sum()
    }
}
