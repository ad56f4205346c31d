//! Triumphs module: joins manifest definitions with player progress
//!
//! - [`builder`]: the four-level join/flatten walk producing a [`TriumphTree`]
//! - [`objective`]: objective mapping with the over-completion clamp
//! - [`progress`]: typed player progress payload
//! - [`state`]: record state mask and the state survey diagnostic
//! - [`types`]: display-ready nodes, triumphs and objectives

pub mod builder;
pub mod objective;
pub mod progress;
pub mod state;
pub mod types;

pub use builder::{build_triumph_tree, CLASSIFIED_SECTION_NAME, MEDIA_BASE_URL};
pub use objective::{map_objective, ObjectiveError};
pub use progress::ProfileRecords;
pub use state::{survey_states, StateMask};
pub use types::{BuildFailure, Hash, Objective, PresentationNode, Triumph, TriumphTree};
