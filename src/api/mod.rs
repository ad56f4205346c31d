//! Platform API module
//!
//! Player search, profile records and manifest downloads over the
//! platform's REST API.

pub mod client;
pub mod types;

pub use client::{select_player, BungieClient, DestinyApi};
pub use types::{ManifestIndex, Platform, PlayerQuery, UserInfoCard};
