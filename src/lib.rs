//! Triumph Tracker - Destiny 2 triumph browser and tracker
//!
//! Joins the game's static manifest (presentation nodes, records and
//! objectives) with a player's record progress into a display-ready tree,
//! and keeps a local list of triumphs the player wants to follow.
//!
//! ## Architecture
//!
//! ```text
//!   search(platform, name)
//!          │
//!  ┌───────▼────────┐   manifest index + tables   ┌────────────────┐
//!  │ TriumphService │ ──────────────────────────▶ │ ManifestStore  │──▶ disk cache
//!  └───────┬────────┘                             └────────────────┘
//!          │ player search, profile records (component 900)
//!  ┌───────▼────────┐
//!  │   DestinyApi   │ ──▶ platform REST API
//!  └───────┬────────┘
//!          │
//!  ┌───────▼────────┐        ┌──────────────┐
//!  │ build_triumph_ │ ─────▶ │ TriumphTree  │ ◀── TrackerStore::resolve
//!  │     tree       │        └──────────────┘
//!  └────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`api`]: Platform API client and wire types
//! - [`manifest`]: Definition tables and the on-disk manifest cache
//! - [`triumphs`]: Join/flatten engine, objective mapping, record states
//! - [`service`]: Search/fetch orchestration
//! - [`tracker`]: Persistent tracked-triumph list
//! - [`server`]: HTTP API
//! - [`config`]: Configuration management

pub mod api;
pub mod config;
pub mod error;
pub mod manifest;
pub mod server;
pub mod service;
pub mod tracker;
pub mod triumphs;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::TrackerConfig;
pub use error::{Error, Result};
pub use service::TriumphService;
pub use triumphs::{build_triumph_tree, TriumphTree};
