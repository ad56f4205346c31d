//! HTTP client for the platform API
//!
//! [`DestinyApi`] is the seam the rest of the crate talks to; [`BungieClient`]
//! is the `reqwest` implementation. No retry, pagination or rate limiting.

use crate::api::types::*;
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::triumphs::progress::ProfileRecords;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Components selector for the records component
pub const RECORDS_COMPONENT: u32 = 900;

/// Remote operations the tracker needs
#[async_trait]
pub trait DestinyApi: Send + Sync {
    /// Search players by platform and display name
    async fn search_player(&self, platform: Platform, name: &str) -> Result<Vec<UserInfoCard>>;

    /// Fetch the records component of a profile
    async fn get_profile_records(
        &self,
        membership_type: i32,
        membership_id: &str,
    ) -> Result<ProfileRecords>;

    /// Fetch manifest metadata
    async fn get_manifest_index(&self) -> Result<ManifestIndex>;

    /// Fetch a raw content document (e.g. a definition table) by path
    async fn get_content(&self, path: &str) -> Result<String>;
}

/// Pick the unique player for a search.
///
/// A single candidate is taken as is; among several, only an exact
/// display-name match counts.
pub fn select_player(candidates: Vec<UserInfoCard>, name: &str) -> Result<UserInfoCard> {
    let count = candidates.len();
    let mut candidates = candidates.into_iter();
    match count {
        0 => Err(Error::PlayerNotFound(name.to_string())),
        1 => candidates
            .next()
            .ok_or_else(|| Error::PlayerNotFound(name.to_string())),
        _ => candidates.find(|c| c.display_name == name).ok_or_else(|| {
            Error::PlayerNotFound(format!("{} ({} candidates, no exact match)", name, count))
        }),
    }
}

pub fn search_url(base_url: &str, platform: Platform, name: &str) -> String {
    format!(
        "{}/Destiny2/SearchDestinyPlayer/{}/{}/",
        base_url.trim_end_matches('/'),
        platform.membership_type(),
        urlencoding::encode(name)
    )
}

pub fn profile_url(base_url: &str, membership_type: i32, membership_id: &str) -> String {
    format!(
        "{}/Destiny2/{}/Profile/{}/?components={}",
        base_url.trim_end_matches('/'),
        membership_type,
        urlencoding::encode(membership_id),
        RECORDS_COMPONENT
    )
}

pub fn manifest_url(base_url: &str) -> String {
    format!("{}/Destiny2/Manifest/", base_url.trim_end_matches('/'))
}

/// `reqwest`-backed platform client
pub struct BungieClient {
    config: ApiConfig,
    client: reqwest::Client,
}

impl BungieClient {
    /// Create a client, reading the API key from the configured env var
    pub fn new(config: ApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        match config.resolve_api_key() {
            Some(key) => {
                let value = HeaderValue::from_str(&key)
                    .map_err(|e| Error::Config(format!("Invalid API key: {}", e)))?;
                headers.insert("X-API-KEY", value);
            }
            None => tracing::warn!(
                "No API key found in ${}; platform requests will be rejected",
                config.api_key_ref
            ),
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// GET a platform endpoint and unwrap its envelope
    async fn get_platform<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<ApiEnvelope<T>>(&body) {
            Ok(envelope) => envelope.into_result(),
            Err(_) if !status.is_success() => Err(Error::Api {
                code: i32::from(status.as_u16()),
                status: status.to_string(),
                message: body.chars().take(200).collect(),
            }),
            Err(e) => Err(Error::Serialization(e)),
        }
    }
}

#[async_trait]
impl DestinyApi for BungieClient {
    async fn search_player(&self, platform: Platform, name: &str) -> Result<Vec<UserInfoCard>> {
        let url = search_url(&self.config.base_url, platform, name);
        self.get_platform(&url).await
    }

    async fn get_profile_records(
        &self,
        membership_type: i32,
        membership_id: &str,
    ) -> Result<ProfileRecords> {
        let url = profile_url(&self.config.base_url, membership_type, membership_id);
        self.get_platform(&url).await
    }

    async fn get_manifest_index(&self) -> Result<ManifestIndex> {
        self.get_platform(&manifest_url(&self.config.base_url)).await
    }

    async fn get_content(&self, path: &str) -> Result<String> {
        let url = format!("{}{}", self.config.media_base_url.trim_end_matches('/'), path);
        tracing::debug!("GET {}", url);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}
