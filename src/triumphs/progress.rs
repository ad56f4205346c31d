//! Player progress payload
//!
//! Typed view of the records component of a profile response:
//!
//! ```text
//! {
//!   "profileRecords":   { "data": { "records": { "<hash>": UserRecord } } },
//!   "characterRecords": { "data": { "<characterId>": { "records": { "<hash>": UserRecord } } } }
//! }
//! ```
//!
//! Characters keep their payload order so "first character" is well defined.
//! Record entries are parsed one by one: a malformed entry is kept as
//! [`RecordEntry::Malformed`] instead of failing the whole payload.

use super::types::Hash;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

/// Records component of a profile response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecords {
    #[serde(default)]
    pub profile_records: Option<ComponentResponse<ProfileRecordsData>>,
    #[serde(default)]
    pub character_records: Option<ComponentResponse<CharacterRecordsMap>>,
}

/// Component wrapper; `data` is absent when the profile is private
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentResponse<T> {
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub privacy: Option<i32>,
}

/// Profile-scoped records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecordsData {
    #[serde(default)]
    pub score: i64,
    #[serde(default, deserialize_with = "deserialize_records")]
    pub records: HashMap<Hash, RecordEntry>,
}

/// Character-scoped records of one character
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRecordsData {
    #[serde(default, deserialize_with = "deserialize_records")]
    pub records: HashMap<Hash, RecordEntry>,
}

/// One record entry as received
#[derive(Debug, Clone, PartialEq)]
pub enum RecordEntry {
    Valid(UserRecord),
    /// The entry did not match the expected shape; holds the parse error
    Malformed(String),
}

impl RecordEntry {
    pub fn record(&self) -> Option<&UserRecord> {
        match self {
            Self::Valid(record) => Some(record),
            Self::Malformed(_) => None,
        }
    }
}

impl<'de> Deserialize<'de> for RecordEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match serde_json::from_value(value) {
            Ok(record) => Self::Valid(record),
            Err(e) => Self::Malformed(e.to_string()),
        })
    }
}

impl Serialize for RecordEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Valid(record) => record.serialize(serializer),
            Self::Malformed(_) => serializer.serialize_none(),
        }
    }
}

/// `{ "<hash>": entry }` with bad keys skipped and `null` read as empty
fn deserialize_records<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<HashMap<Hash, RecordEntry>, D::Error> {
    let raw = Option::<HashMap<String, RecordEntry>>::deserialize(deserializer)?.unwrap_or_default();
    let mut records = HashMap::with_capacity(raw.len());
    for (key, entry) in raw {
        match key.parse::<Hash>() {
            Ok(hash) => {
                records.insert(hash, entry);
            }
            Err(e) => tracing::warn!("Skipping progress entry with bad key {}: {}", key, e),
        }
    }
    Ok(records)
}

/// A player's progress on one record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default)]
    pub state: u32,
    #[serde(default)]
    pub objectives: Vec<UserObjective>,
}

/// A player's progress on one objective
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserObjective {
    pub objective_hash: Hash,
    #[serde(default)]
    pub progress: i64,
    #[serde(default)]
    pub completion_value: i64,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub visible: bool,
}

/// Character id → records, in payload order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacterRecordsMap(pub Vec<(String, CharacterRecordsData)>);

impl CharacterRecordsMap {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CharacterRecordsData)> {
        self.0.iter().map(|(id, data)| (id.as_str(), data))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for CharacterRecordsMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, data) in &self.0 {
            map.serialize_entry(id, data)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CharacterRecordsMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = CharacterRecordsMap;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of character ids to records")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((id, data)) = access.next_entry::<String, CharacterRecordsData>()? {
                    entries.push((id, data));
                }
                Ok(CharacterRecordsMap(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

impl ProfileRecords {
    /// The profile-scoped entry for a record
    pub fn profile_record(&self, hash: Hash) -> Option<&RecordEntry> {
        self.profile_records
            .as_ref()?
            .data
            .as_ref()?
            .records
            .get(&hash)
    }

    /// The first character (in payload order) holding an entry for a record
    pub fn first_character_record(&self, hash: Hash) -> Option<(&str, &RecordEntry)> {
        self.characters()?
            .iter()
            .find_map(|(id, data)| data.records.get(&hash).map(|record| (id, record)))
    }

    pub fn characters(&self) -> Option<&CharacterRecordsMap> {
        self.character_records.as_ref()?.data.as_ref()
    }

    /// Every well-formed record entry: profile first, then characters in order
    pub fn all_records(&self) -> impl Iterator<Item = &UserRecord> {
        let profile = self
            .profile_records
            .as_ref()
            .and_then(|c| c.data.as_ref())
            .into_iter()
            .flat_map(|data| data.records.values());
        let characters = self
            .characters()
            .into_iter()
            .flat_map(|chars| chars.iter())
            .flat_map(|(_, data)| data.records.values());
        profile.chain(characters).filter_map(RecordEntry::record)
    }
}
