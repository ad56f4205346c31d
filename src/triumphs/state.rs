//! Record state mask
//!
//! The platform reports each record's state as a bit-mask. The raw value is
//! always kept; the accessors decode the bits of the published record-state
//! enumeration.

use super::progress::ProfileRecords;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bit-mask over a record's raw state code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateMask(u32);

impl StateMask {
    pub const RECORD_REDEEMED: u32 = 1;
    pub const REWARD_UNAVAILABLE: u32 = 1 << 1;
    pub const OBJECTIVE_NOT_COMPLETED: u32 = 1 << 2;
    pub const OBSCURED: u32 = 1 << 3;
    pub const INVISIBLE: u32 = 1 << 4;
    pub const ENTITLEMENT_UNOWNED: u32 = 1 << 5;
    pub const CAN_EQUIP_TITLE: u32 = 1 << 6;

    const NAMED: [(u32, &'static str); 7] = [
        (Self::RECORD_REDEEMED, "RecordRedeemed"),
        (Self::REWARD_UNAVAILABLE, "RewardUnavailable"),
        (Self::OBJECTIVE_NOT_COMPLETED, "ObjectiveNotCompleted"),
        (Self::OBSCURED, "Obscured"),
        (Self::INVISIBLE, "Invisible"),
        (Self::ENTITLEMENT_UNOWNED, "EntitlementUnowned"),
        (Self::CAN_EQUIP_TITLE, "CanEquipTitle"),
    ];

    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, bit: u32) -> bool {
        self.0 & bit == bit
    }

    pub fn is_redeemed(&self) -> bool {
        self.contains(Self::RECORD_REDEEMED)
    }

    pub fn is_complete(&self) -> bool {
        !self.contains(Self::OBJECTIVE_NOT_COMPLETED)
    }

    pub fn is_obscured(&self) -> bool {
        self.contains(Self::OBSCURED)
    }

    pub fn is_invisible(&self) -> bool {
        self.contains(Self::INVISIBLE)
    }

    /// Names of the set bits, lowest first. Unknown bits are ignored.
    pub fn flag_names(&self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl std::fmt::Display for StateMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = self.flag_names();
        if names.is_empty() {
            write!(f, "{} (None)", self.0)
        } else {
            write!(f, "{} ({})", self.0, names.join(" | "))
        }
    }
}

/// Every distinct raw state code in a progress payload.
///
/// Profile records are visited first, then each character in payload order.
pub fn survey_states(progress: &ProfileRecords) -> BTreeMap<u32, StateMask> {
    let mut seen = BTreeMap::new();
    for record in progress.all_records() {
        if !seen.contains_key(&record.state) {
            tracing::debug!("New record state encountered: {}", record.state);
            seen.insert(record.state, StateMask::new(record.state));
        }
    }
    seen
}
