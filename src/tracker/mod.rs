//! Tracked triumphs
//!
//! A small persistent list of record hashes the player wants to keep an
//! eye on, resolved against the current tree on demand.

pub mod store;

pub use store::{ResolvedTracker, TrackedTriumph, TrackerStore};
