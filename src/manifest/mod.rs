//! Manifest module: definition tables and the local table cache

pub mod store;
pub mod types;

pub use store::ManifestStore;
pub use types::{Definitions, ObjectiveDefinition, PresentationNodeDefinition, RecordDefinition};
