//! Shared fixtures: an in-memory platform API with a tiny manifest

use crate::api::types::{ManifestIndex, Platform, UserInfoCard};
use crate::api::DestinyApi;
use crate::error::{Error, Result};
use crate::manifest::types::{OBJECTIVE_TABLE, PRESENTATION_NODE_TABLE, RECORD_TABLE};
use crate::triumphs::progress::ProfileRecords;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const ROOT: u32 = 1024788583;

/// root → 10 → 20 → sections 30 (records 500, 501) and 31 "Classified" (502)
pub const PRESENTATION_NODES: &str = r#"{
    "1024788583": {"displayProperties": {"name": "Triumphs", "hasIcon": false}, "hash": 1024788583,
        "children": {"presentationNodes": [{"presentationNodeHash": 10}], "records": []}},
    "10": {"displayProperties": {"name": "Account", "hasIcon": true, "icon": "/img/10.png"}, "hash": 10,
        "parentNodeHashes": [1024788583],
        "children": {"presentationNodes": [{"presentationNodeHash": 20}]}},
    "20": {"displayProperties": {"name": "Lore"}, "hash": 20, "parentNodeHashes": [10],
        "children": {"presentationNodes": [{"presentationNodeHash": 30}, {"presentationNodeHash": 31}]}},
    "30": {"displayProperties": {"name": "Books"}, "hash": 30, "parentNodeHashes": [20],
        "children": {"records": [{"recordHash": 500}, {"recordHash": 501}]}},
    "31": {"displayProperties": {"name": "Classified"}, "hash": 31, "parentNodeHashes": [20],
        "children": {"records": [{"recordHash": 502}]}}
}"#;

pub const RECORDS: &str = r#"{
    "500": {"displayProperties": {"name": "Reader", "description": "Read a book.", "icon": "/img/500.jpg"},
        "scope": 0, "completionInfo": {"ScoreValue": 10}, "hash": 500},
    "501": {"displayProperties": {"name": "Scholar", "description": "Read every book.", "icon": "/img/501.jpg"},
        "scope": 1, "completionInfo": {"ScoreValue": 40}, "hash": 501},
    "502": {"displayProperties": {"name": "Secret"}, "scope": 0, "completionInfo": {"ScoreValue": 1}, "hash": 502}
}"#;

pub const OBJECTIVES: &str = r#"{
    "900": {"hash": 900, "progressDescription": "Books read", "allowOvercompletion": false, "completionValue": 1}
}"#;

pub const PROFILE: &str = r#"{
    "profileRecords": {"data": {"score": 10, "records": {
        "500": {"state": 67, "objectives": [{"objectiveHash": 900, "progress": 3, "completionValue": 1, "visible": true}]},
        "502": {"state": 4, "objectives": []}
    }}},
    "characterRecords": {"data": {
        "2305843009300000001": {"records": {"501": {"state": 4, "objectives": [
            {"objectiveHash": 900, "progress": 0, "completionValue": 1, "visible": true}
        ]}}}
    }}
}"#;

/// In-memory [`DestinyApi`] serving the fixtures above
pub struct FakeApi {
    pub players: Mutex<Vec<UserInfoCard>>,
    /// Artificial latency of `search_player`, by searched name
    pub search_delays: Mutex<HashMap<String, Duration>>,
    pub profile: Mutex<String>,
    pub fail_profile: AtomicBool,
    pub profile_fetches: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            players: Mutex::new(vec![player("Ghost", "4611686018467000001")]),
            search_delays: Mutex::new(HashMap::new()),
            profile: Mutex::new(PROFILE.to_string()),
            fail_profile: AtomicBool::new(false),
            profile_fetches: AtomicUsize::new(0),
        }
    }
}

pub fn player(name: &str, id: &str) -> UserInfoCard {
    UserInfoCard {
        membership_type: 2,
        membership_id: id.to_string(),
        display_name: name.to_string(),
        icon_path: None,
    }
}

#[async_trait]
impl DestinyApi for FakeApi {
    /// Exact name matches if there are any, otherwise every player
    async fn search_player(&self, _platform: Platform, name: &str) -> Result<Vec<UserInfoCard>> {
        let delay = self.search_delays.lock().unwrap().get(name).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let players = self.players.lock().unwrap().clone();
        let exact: Vec<UserInfoCard> = players
            .iter()
            .filter(|p| p.display_name == name)
            .cloned()
            .collect();
        Ok(if exact.is_empty() { players } else { exact })
    }

    async fn get_profile_records(&self, _: i32, _: &str) -> Result<ProfileRecords> {
        self.profile_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_profile.load(Ordering::SeqCst) {
            return Err(Error::Api {
                code: 1665,
                status: "DestinyPrivacyRestriction".to_string(),
                message: "Profile is private".to_string(),
            });
        }
        let profile = self.profile.lock().unwrap().clone();
        Ok(serde_json::from_str(&profile)?)
    }

    async fn get_manifest_index(&self) -> Result<ManifestIndex> {
        let mut tables = HashMap::new();
        for table in [PRESENTATION_NODE_TABLE, RECORD_TABLE, OBJECTIVE_TABLE] {
            tables.insert(table.to_string(), format!("/json/en/{}.json", table));
        }
        let mut paths = HashMap::new();
        paths.insert("en".to_string(), tables);
        Ok(ManifestIndex {
            version: "test-1".to_string(),
            json_world_component_content_paths: paths,
        })
    }

    async fn get_content(&self, path: &str) -> Result<String> {
        let body = if path.contains(PRESENTATION_NODE_TABLE) {
            PRESENTATION_NODES
        } else if path.contains(RECORD_TABLE) {
            RECORDS
        } else if path.contains(OBJECTIVE_TABLE) {
            OBJECTIVES
        } else {
            return Err(Error::Manifest(format!("unknown content path {}", path)));
        };
        Ok(body.to_string())
    }
}
