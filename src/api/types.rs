//! Platform API wire types

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Success code of the platform response envelope
pub const SUCCESS_CODE: i32 = 1;

/// Membership type (platform) of a player account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    All,
    Xbox,
    Psn,
    Steam,
    Blizzard,
    Stadia,
    Epic,
}

impl Platform {
    /// Numeric membership type used in request paths
    pub fn membership_type(&self) -> i32 {
        match self {
            Self::All => -1,
            Self::Xbox => 1,
            Self::Psn => 2,
            Self::Steam => 3,
            Self::Blizzard => 4,
            Self::Stadia => 5,
            Self::Epic => 6,
        }
    }

    pub fn from_membership_type(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::All),
            1 => Some(Self::Xbox),
            2 => Some(Self::Psn),
            3 => Some(Self::Steam),
            4 => Some(Self::Blizzard),
            5 => Some(Self::Stadia),
            6 => Some(Self::Epic),
            _ => None,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Xbox => write!(f, "xbox"),
            Self::Psn => write!(f, "psn"),
            Self::Steam => write!(f, "steam"),
            Self::Blizzard => write!(f, "blizzard"),
            Self::Stadia => write!(f, "stadia"),
            Self::Epic => write!(f, "epic"),
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "xbox" | "xbl" => Ok(Self::Xbox),
            "psn" | "playstation" => Ok(Self::Psn),
            "steam" | "pc" => Ok(Self::Steam),
            "blizzard" | "bnet" => Ok(Self::Blizzard),
            "stadia" => Ok(Self::Stadia),
            "epic" => Ok(Self::Epic),
            other => other
                .parse::<i32>()
                .ok()
                .and_then(Self::from_membership_type)
                .ok_or_else(|| format!("unknown platform: {}", s)),
        }
    }
}

/// Player search parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerQuery {
    pub platform: Platform,
    pub username: String,
}

/// A player account returned by search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserInfoCard {
    pub membership_type: i32,
    pub membership_id: String,
    pub display_name: String,
    pub icon_path: Option<String>,
}

/// Response envelope wrapped around every platform payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiEnvelope<T> {
    pub response: Option<T>,
    pub error_code: i32,
    #[serde(default)]
    pub throttle_seconds: i64,
    #[serde(default)]
    pub error_status: String,
    #[serde(default)]
    pub message: String,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the payload, turning non-success codes into errors
    pub fn into_result(self) -> Result<T> {
        if self.throttle_seconds > 0 {
            tracing::warn!("Platform API asked to throttle for {}s", self.throttle_seconds);
        }
        if self.error_code != SUCCESS_CODE {
            return Err(Error::Api {
                code: self.error_code,
                status: self.error_status,
                message: self.message,
            });
        }
        self.response.ok_or_else(|| Error::Api {
            code: self.error_code,
            status: self.error_status,
            message: "response envelope has no payload".to_string(),
        })
    }
}

/// Manifest metadata: version and per-language content paths
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestIndex {
    pub version: String,
    #[serde(default)]
    pub json_world_component_content_paths: HashMap<String, HashMap<String, String>>,
}

impl ManifestIndex {
    /// Content path of one definition table for a language
    pub fn table_path(&self, language: &str, table: &str) -> Option<&str> {
        self.json_world_component_content_paths
            .get(language)?
            .get(table)
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parse() {
        assert_eq!("psn".parse::<Platform>().unwrap(), Platform::Psn);
        assert_eq!("Steam".parse::<Platform>().unwrap(), Platform::Steam);
        assert_eq!("1".parse::<Platform>().unwrap(), Platform::Xbox);
        assert_eq!("-1".parse::<Platform>().unwrap(), Platform::All);
        assert!("gamecube".parse::<Platform>().is_err());
        assert!("9".parse::<Platform>().is_err());
    }

    #[test]
    fn test_platform_membership_type() {
        assert_eq!(Platform::Psn.membership_type(), 2);
        assert_eq!(Platform::from_membership_type(3), Some(Platform::Steam));
        assert_eq!(Platform::Epic.to_string(), "epic");
    }

    #[test]
    fn test_envelope_success() {
        let envelope: ApiEnvelope<Vec<UserInfoCard>> = serde_json::from_str(
            r#"{
                "Response": [{"membershipType": 2, "membershipId": "4611686018467000000", "displayName": "Ghost", "iconPath": "/img/theme/icon.png"}],
                "ErrorCode": 1,
                "ThrottleSeconds": 0,
                "ErrorStatus": "Success",
                "Message": "Ok",
                "MessageData": {}
            }"#,
        )
        .unwrap();
        let players = envelope.into_result().unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].display_name, "Ghost");
        assert_eq!(players[0].membership_type, 2);
    }

    #[test]
    fn test_envelope_error() {
        let envelope: ApiEnvelope<Vec<UserInfoCard>> = serde_json::from_str(
            r#"{"ErrorCode": 2101, "ThrottleSeconds": 0, "ErrorStatus": "ApiInvalidOrExpiredKey", "Message": "Invalid API key"}"#,
        )
        .unwrap();
        match envelope.into_result() {
            Err(Error::Api { code, status, .. }) => {
                assert_eq!(code, 2101);
                assert_eq!(status, "ApiInvalidOrExpiredKey");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[derive(Debug, serde::Deserialize)]
    struct Membership {
        id: String,
    }

    #[test]
    fn test_envelope_payload_without_default() {
        let envelope: ApiEnvelope<Membership> =
            serde_json::from_str(r#"{"Response": {"id": "7"}, "ErrorCode": 1}"#).unwrap();
        assert_eq!(envelope.into_result().unwrap().id, "7");

        let envelope: ApiEnvelope<Membership> = serde_json::from_str(
            r#"{"ErrorCode": 1665, "ErrorStatus": "DestinyPrivacyRestriction", "Message": "private"}"#,
        )
        .unwrap();
        assert!(matches!(envelope.into_result(), Err(Error::Api { code: 1665, .. })));
    }

    #[test]
    fn test_envelope_success_without_payload() {
        let envelope: ApiEnvelope<ManifestIndex> =
            serde_json::from_str(r#"{"ErrorCode": 1, "ErrorStatus": "Success"}"#).unwrap();
        assert!(matches!(envelope.into_result(), Err(Error::Api { code: 1, .. })));
    }

    #[test]
    fn test_manifest_index_table_path() {
        let index: ManifestIndex = serde_json::from_str(
            r#"{
                "version": "221001.22.10.01.1730-1",
                "mobileAssetContentPath": "/common/destiny2_content/sqlite/asset/x.content",
                "jsonWorldComponentContentPaths": {
                    "en": {"DestinyRecordDefinition": "/common/destiny2_content/json/en/DestinyRecordDefinition-1.json"}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(
            index.table_path("en", "DestinyRecordDefinition"),
            Some("/common/destiny2_content/json/en/DestinyRecordDefinition-1.json")
        );
        assert!(index.table_path("fr", "DestinyRecordDefinition").is_none());
        assert!(index.table_path("en", "DestinyObjectiveDefinition").is_none());
    }
}
