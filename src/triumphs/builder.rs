//! Join/flatten engine
//!
//! Walks the fixed four-level presentation hierarchy (root → category →
//! sub-category → section → record) and joins every record with the
//! player's progress. Each call returns a fresh [`TriumphTree`].
//!
//! Lookup misses never abort the walk: the affected node or triumph is
//! logged, recorded in [`TriumphTree::failures`], and inserted partially
//! populated.

use super::objective::map_objective;
use super::progress::{ProfileRecords, RecordEntry};
use super::state::StateMask;
use super::types::{BuildFailure, Hash, PresentationNode, Triumph, TriumphTree};
use crate::manifest::types::{Definitions, PresentationNodeDefinition};
use std::collections::HashMap;

/// Prefix for record icon paths
pub const MEDIA_BASE_URL: &str = "https://www.bungie.net";

/// Sections with this display name are registered but never walked
pub const CLASSIFIED_SECTION_NAME: &str = "Classified";

/// Build the display tree for one player
pub fn build_triumph_tree(
    definitions: &Definitions,
    progress: &ProfileRecords,
    root: Hash,
) -> TriumphTree {
    TreeBuilder::new(definitions, progress).build(root)
}

struct TreeBuilder<'a> {
    definitions: &'a Definitions,
    progress: &'a ProfileRecords,
    nodes: HashMap<Hash, PresentationNode>,
    triumphs: HashMap<Hash, Triumph>,
    failures: Vec<BuildFailure>,
}

impl<'a> TreeBuilder<'a> {
    fn new(definitions: &'a Definitions, progress: &'a ProfileRecords) -> Self {
        Self {
            definitions,
            progress,
            nodes: HashMap::new(),
            triumphs: HashMap::new(),
            failures: Vec::new(),
        }
    }

    fn build(mut self, root: Hash) -> TriumphTree {
        let mut root_node = self.map_node(root);

        for category_hash in self.child_nodes(root) {
            let mut category = self.map_node(category_hash);

            for sub_category_hash in self.child_nodes(category_hash) {
                let mut sub_category = self.map_node(sub_category_hash);

                for section_hash in self.child_nodes(sub_category_hash) {
                    let mut section = self.map_node(section_hash);

                    if section.name == CLASSIFIED_SECTION_NAME {
                        tracing::debug!("Skipping classified section {}", section_hash);
                    } else {
                        for record_hash in self.child_records(section_hash) {
                            let triumph = self.make_triumph(record_hash);
                            self.triumphs.insert(record_hash, triumph);
                            section.children.records.push(record_hash);
                        }
                    }

                    sub_category.children.presentation_nodes.push(section_hash);
                    self.nodes.insert(section_hash, section);
                }

                category.children.presentation_nodes.push(sub_category_hash);
                self.nodes.insert(sub_category_hash, sub_category);
            }

            root_node.children.presentation_nodes.push(category_hash);
            self.nodes.insert(category_hash, category);
        }
        self.nodes.insert(root, root_node);

        tracing::debug!(
            nodes = self.nodes.len(),
            triumphs = self.triumphs.len(),
            failures = self.failures.len(),
            "Triumph tree built"
        );

        TriumphTree {
            root,
            nodes: self.nodes,
            triumphs: self.triumphs,
            failures: self.failures,
        }
    }

    fn child_nodes(&self, hash: Hash) -> Vec<Hash> {
        self.definitions
            .presentation_nodes
            .get(&hash)
            .map(PresentationNodeDefinition::child_node_hashes)
            .unwrap_or_default()
    }

    fn child_records(&self, hash: Hash) -> Vec<Hash> {
        self.definitions
            .presentation_nodes
            .get(&hash)
            .map(PresentationNodeDefinition::child_record_hashes)
            .unwrap_or_default()
    }

    /// Copy a node definition with empty child lists
    fn map_node(&mut self, hash: Hash) -> PresentationNode {
        let definitions = self.definitions;
        let Some(definition) = definitions.presentation_nodes.get(&hash) else {
            self.fail(BuildFailure::Node {
                hash,
                reason: "presentation node definition not found".to_string(),
            });
            return PresentationNode::placeholder(hash);
        };

        let display = &definition.display_properties;
        PresentationNode {
            name: display.name.clone(),
            description: display.description.clone(),
            has_icon: display.has_icon,
            icon: display.icon.clone().filter(|_| display.has_icon),
            root_view_icon: definition.root_view_icon.clone().filter(|_| display.has_icon),
            scope: definition.scope,
            parent_node_hashes: definition.parent_node_hashes.clone(),
            hash,
            objective_hash: definition.objective_hash,
            children: Default::default(),
        }
    }

    fn make_triumph(&mut self, hash: Hash) -> Triumph {
        let mut triumph = Triumph::new(hash);
        let definitions = self.definitions;

        let Some(definition) = definitions.records.get(&hash) else {
            self.fail(BuildFailure::Triumph {
                hash,
                reason: "record definition not found".to_string(),
            });
            return triumph;
        };

        let display = &definition.display_properties;
        triumph.name = display.name.clone();
        triumph.description = display.description.clone();
        triumph.icon_path = format!("{}{}", MEDIA_BASE_URL, display.icon.as_deref().unwrap_or(""));
        match &definition.completion_info {
            Some(info) => triumph.score_value = info.score_value,
            None => self.fail(BuildFailure::Triumph {
                hash,
                reason: "record definition has no completion info".to_string(),
            }),
        }

        let progress = self.progress;
        if definition.scope != 0 {
            match progress.first_character_record(hash) {
                Some((character_id, entry)) => {
                    tracing::trace!("Triumph {} filled from character {}", hash, character_id);
                    self.fill(&mut triumph, entry);
                }
                None => self.fail(BuildFailure::Triumph {
                    hash,
                    reason: "no character progress entry".to_string(),
                }),
            }
        } else {
            match progress.profile_record(hash) {
                Some(entry) => self.fill(&mut triumph, entry),
                None => self.fail(BuildFailure::Triumph {
                    hash,
                    reason: "no profile progress entry".to_string(),
                }),
            }
        }

        triumph
    }

    /// Set state and map every objective; failed objectives are recorded
    /// without discarding their siblings
    fn fill(&mut self, triumph: &mut Triumph, entry: &RecordEntry) {
        let record = match entry {
            RecordEntry::Valid(record) => record,
            RecordEntry::Malformed(reason) => {
                self.fail(BuildFailure::Triumph {
                    hash: triumph.hash,
                    reason: format!("malformed progress entry: {}", reason),
                });
                return;
            }
        };
        triumph.state = Some(StateMask::new(record.state));

        let definitions = self.definitions;
        for user_objective in &record.objectives {
            match map_objective(&definitions.objectives, user_objective) {
                Ok(objective) => triumph.objectives.push(objective),
                Err(e) => self.fail(BuildFailure::Objective {
                    triumph_hash: triumph.hash,
                    objective_hash: user_objective.objective_hash,
                    reason: e.to_string(),
                }),
            }
        }
    }

    fn fail(&mut self, failure: BuildFailure) {
        tracing::warn!("Triumph tree: {}", failure);
        self.failures.push(failure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::types::{
        CompletionInfo, DisplayProperties, ObjectiveDefinition, PresentationNodeChild,
        PresentationNodeChildren, RecordChild, RecordDefinition,
    };

    const ROOT: Hash = Hash(1024788583);

    fn node(hash: u32, name: &str, nodes: &[u32], records: &[u32]) -> PresentationNodeDefinition {
        PresentationNodeDefinition {
            display_properties: DisplayProperties {
                name: name.to_string(),
                description: format!("{} description", name),
                icon: Some(format!("/icons/{}.png", hash)),
                has_icon: hash % 2 == 0,
            },
            root_view_icon: Some(format!("/root/{}.png", hash)),
            scope: 0,
            parent_node_hashes: vec![],
            hash: Hash(hash),
            objective_hash: None,
            children: PresentationNodeChildren {
                presentation_nodes: nodes
                    .iter()
                    .map(|h| PresentationNodeChild {
                        presentation_node_hash: Hash(*h),
                    })
                    .collect(),
                records: records.iter().map(|h| RecordChild { record_hash: Hash(*h) }).collect(),
            },
        }
    }

    fn record(hash: u32, scope: i32, score: i64) -> RecordDefinition {
        RecordDefinition {
            display_properties: DisplayProperties {
                name: format!("Record {}", hash),
                description: format!("Do thing {}", hash),
                icon: Some(format!("/common/{}.jpg", hash)),
                has_icon: true,
            },
            scope,
            completion_info: Some(CompletionInfo { score_value: score }),
            hash: Hash(hash),
        }
    }

    /// root → category 10 → sub-categories 20, 21
    ///   20 → sections 30 (records 500, 501), 31 "Classified" (record 502)
    ///   21 → section 32 (records 503 character-scoped, 504 missing def)
    fn definitions() -> Definitions {
        let mut defs = Definitions::default();
        for n in [
            node(ROOT.0, "Triumphs", &[10], &[]),
            node(10, "Account", &[20, 21], &[]),
            node(20, "Exploration", &[30, 31], &[]),
            node(21, "Crucible", &[32], &[]),
            node(30, "Destinations", &[], &[501, 500]),
            node(31, "Classified", &[], &[502]),
            node(32, "Glory", &[], &[503, 504]),
        ] {
            defs.presentation_nodes.insert(n.hash, n);
        }
        for r in [record(500, 0, 10), record(501, 0, 20), record(502, 0, 5), record(503, 1, 15)] {
            defs.records.insert(r.hash, r);
        }
        for (hash, allow) in [(900, false), (901, true)] {
            defs.objectives.insert(
                Hash(hash),
                ObjectiveDefinition {
                    hash: Hash(hash),
                    progress_description: format!("Objective {}", hash),
                    allow_overcompletion: allow,
                },
            );
        }
        defs
    }

    fn progress() -> ProfileRecords {
        serde_json::from_str(
            r#"{
                "profileRecords": {"data": {"records": {
                    "500": {"state": 67, "objectives": [
                        {"objectiveHash": 900, "progress": 15, "completionValue": 10, "visible": true},
                        {"objectiveHash": 901, "progress": 15, "completionValue": 10, "visible": false}
                    ]},
                    "501": {"state": 4, "objectives": [
                        {"objectiveHash": 900, "progress": 2, "completionValue": 10, "visible": true},
                        {"objectiveHash": 999, "progress": 1, "completionValue": 1, "visible": true},
                        {"objectiveHash": 901, "progress": 3, "completionValue": 10, "visible": true}
                    ]},
                    "502": {"state": 4, "objectives": []}
                }}},
                "characterRecords": {"data": {
                    "2305843009300000002": {"records": {"503": {"state": 1, "objectives": [
                        {"objectiveHash": 901, "progress": 11, "completionValue": 10, "visible": true}
                    ]}}},
                    "2305843009300000001": {"records": {"503": {"state": 4, "objectives": [
                        {"objectiveHash": 901, "progress": 1, "completionValue": 10, "visible": true}
                    ]}}}
                }}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_every_reachable_node_present_once() {
        let tree = build_triumph_tree(&definitions(), &progress(), ROOT);
        let mut keys: Vec<u32> = tree.nodes.keys().map(|h| h.0).collect();
        keys.sort();
        assert_eq!(keys, vec![10, 20, 21, 30, 31, 32, ROOT.0]);
        assert_eq!(tree.root, ROOT);
    }

    #[test]
    fn test_child_order_follows_manifest() {
        let tree = build_triumph_tree(&definitions(), &progress(), ROOT);
        assert_eq!(tree.root_node().unwrap().children.presentation_nodes, vec![Hash(10)]);
        assert_eq!(
            tree.node(Hash(10)).unwrap().children.presentation_nodes,
            vec![Hash(20), Hash(21)]
        );
        assert_eq!(
            tree.node(Hash(20)).unwrap().children.presentation_nodes,
            vec![Hash(30), Hash(31)]
        );
        assert_eq!(tree.node(Hash(30)).unwrap().children.records, vec![Hash(501), Hash(500)]);
    }

    #[test]
    fn test_classified_section_registered_but_empty() {
        let tree = build_triumph_tree(&definitions(), &progress(), ROOT);
        let classified = tree.node(Hash(31)).unwrap();
        assert_eq!(classified.name, "Classified");
        assert!(classified.children.records.is_empty());
        assert!(tree.triumph(Hash(502)).is_none());
        assert!(tree
            .node(Hash(20))
            .unwrap()
            .children
            .presentation_nodes
            .contains(&Hash(31)));
    }

    #[test]
    fn test_triumph_fields_copied() {
        let tree = build_triumph_tree(&definitions(), &progress(), ROOT);
        let triumph = tree.triumph(Hash(500)).unwrap();
        assert_eq!(triumph.name, "Record 500");
        assert_eq!(triumph.description, "Do thing 500");
        assert_eq!(triumph.icon_path, "https://www.bungie.net/common/500.jpg");
        assert_eq!(triumph.score_value, 10);
        assert_eq!(triumph.state, Some(StateMask::new(67)));
    }

    #[test]
    fn test_objective_clamp_in_tree() {
        let tree = build_triumph_tree(&definitions(), &progress(), ROOT);
        let objectives = &tree.triumph(Hash(500)).unwrap().objectives;
        assert_eq!(objectives.len(), 2);
        assert_eq!(objectives[0].progress, 10);
        assert_eq!(objectives[1].progress, 15);
        assert!(!objectives[1].visible);
    }

    #[test]
    fn test_bad_objective_keeps_siblings() {
        let tree = build_triumph_tree(&definitions(), &progress(), ROOT);
        let objectives = &tree.triumph(Hash(501)).unwrap().objectives;
        let hashes: Vec<Hash> = objectives.iter().map(|o| o.objective_hash).collect();
        assert_eq!(hashes, vec![Hash(900), Hash(901)]);
        assert!(tree.failures.contains(&BuildFailure::Objective {
            triumph_hash: Hash(501),
            objective_hash: Hash(999),
            reason: "objective definition 999 not found".to_string(),
        }));
    }

    #[test]
    fn test_character_scope_uses_first_character() {
        let tree = build_triumph_tree(&definitions(), &progress(), ROOT);
        let triumph = tree.triumph(Hash(503)).unwrap();
        assert_eq!(triumph.state, Some(StateMask::new(1)));
        assert_eq!(triumph.objectives.len(), 1);
        assert_eq!(triumph.objectives[0].progress, 11);
    }

    #[test]
    fn test_profile_scope_ignores_character_records() {
        let mut defs = definitions();
        defs.records.get_mut(&Hash(503)).unwrap().scope = 0;
        let tree = build_triumph_tree(&defs, &progress(), ROOT);
        let triumph = tree.triumph(Hash(503)).unwrap();
        assert!(triumph.state.is_none());
        assert!(triumph.objectives.is_empty());
        assert!(tree.failures.contains(&BuildFailure::Triumph {
            hash: Hash(503),
            reason: "no profile progress entry".to_string(),
        }));
    }

    #[test]
    fn test_missing_record_definition_is_partial() {
        let tree = build_triumph_tree(&definitions(), &progress(), ROOT);
        let triumph = tree.triumph(Hash(504)).unwrap();
        assert_eq!(*triumph, Triumph::new(Hash(504)));
        assert_eq!(tree.node(Hash(32)).unwrap().children.records, vec![Hash(503), Hash(504)]);
    }

    #[test]
    fn test_missing_node_definition_is_placeholder() {
        let mut defs = definitions();
        defs.presentation_nodes.remove(&Hash(21));
        let tree = build_triumph_tree(&defs, &progress(), ROOT);
        assert_eq!(*tree.node(Hash(21)).unwrap(), PresentationNode::placeholder(Hash(21)));
        assert!(tree.node(Hash(32)).is_none());
        assert!(tree.triumph(Hash(500)).is_some());
        assert!(tree
            .failures
            .iter()
            .any(|f| matches!(f, BuildFailure::Node { hash: Hash(21), .. })));
    }

    #[test]
    fn test_icon_only_when_has_icon() {
        let tree = build_triumph_tree(&definitions(), &progress(), ROOT);
        let with_icon = tree.node(Hash(10)).unwrap();
        assert_eq!(with_icon.icon.as_deref(), Some("/icons/10.png"));
        assert_eq!(with_icon.root_view_icon.as_deref(), Some("/root/10.png"));

        let without_icon = tree.node(Hash(21)).unwrap();
        assert!(!without_icon.has_icon);
        assert!(without_icon.icon.is_none());
        assert!(without_icon.root_view_icon.is_none());
    }

    #[test]
    fn test_record_without_icon_gets_bare_media_base() {
        let mut defs = definitions();
        defs.records.get_mut(&Hash(501)).unwrap().display_properties.icon = None;
        let tree = build_triumph_tree(&defs, &progress(), ROOT);
        assert_eq!(tree.triumph(Hash(501)).unwrap().icon_path, MEDIA_BASE_URL);
    }

    #[test]
    fn test_malformed_progress_entry_is_local() {
        let progress: ProfileRecords = serde_json::from_str(
            r#"{
                "profileRecords": {"data": {"records": {
                    "500": {"state": 67, "objectives": [{"progress": 1}]},
                    "501": {"state": 4, "objectives": [
                        {"objectiveHash": 900, "progress": 2, "completionValue": 10, "visible": true}
                    ]},
                    "502": {"objectives": null}
                }}}
            }"#,
        )
        .unwrap();

        let tree = build_triumph_tree(&definitions(), &progress, ROOT);

        let broken = tree.triumph(Hash(500)).unwrap();
        assert_eq!(broken.name, "Record 500");
        assert_eq!(broken.score_value, 10);
        assert!(broken.state.is_none());
        assert!(broken.objectives.is_empty());
        assert!(tree.failures.iter().any(|f| matches!(
            f,
            BuildFailure::Triumph { hash: Hash(500), reason } if reason.starts_with("malformed progress entry")
        )));

        let sibling = tree.triumph(Hash(501)).unwrap();
        assert_eq!(sibling.state, Some(StateMask::new(4)));
        assert_eq!(sibling.objectives.len(), 1);
    }

    #[test]
    fn test_build_is_idempotent() {
        let defs = definitions();
        let progress = progress();
        let first = build_triumph_tree(&defs, &progress, ROOT);
        let second = build_triumph_tree(&defs, &progress, ROOT);
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_root_yields_single_placeholder() {
        let tree = build_triumph_tree(&Definitions::default(), &ProfileRecords::default(), ROOT);
        assert_eq!(tree.nodes.len(), 1);
        assert!(tree.triumphs.is_empty());
        assert_eq!(tree.failures.len(), 1);
    }

    #[test]
    fn test_tree_completion_counts() {
        let tree = build_triumph_tree(&definitions(), &progress(), ROOT);
        // 500 complete (67 has no ObjectiveNotCompleted bit), 501 not,
        // 503 complete (state 1), 504 has no state and no objectives
        assert_eq!(tree.completion(Hash(30)), (1, 2));
        assert_eq!(tree.completion(ROOT), (2, 4));
        assert_eq!(tree.earned_score(), 25);
    }
}
