//! Objective mapper
//!
//! Joins a player's objective progress with its manifest definition and
//! applies the over-completion clamp.

use super::progress::UserObjective;
use super::types::{Hash, Objective};
use crate::manifest::types::ObjectiveDefinition;
use std::collections::HashMap;
use thiserror::Error;

/// Failure to map a single objective
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObjectiveError {
    /// No definition for the objective hash
    #[error("objective definition {0} not found")]
    MissingDefinition(Hash),
}

/// Map one player objective onto its display form.
///
/// When over-completion is disallowed, progress is capped at the completion
/// value. Otherwise the raw progress is kept, even past the threshold.
pub fn map_objective(
    definitions: &HashMap<Hash, ObjectiveDefinition>,
    user_objective: &UserObjective,
) -> Result<Objective, ObjectiveError> {
    let definition = definitions
        .get(&user_objective.objective_hash)
        .ok_or(ObjectiveError::MissingDefinition(user_objective.objective_hash))?;

    let progress = if !definition.allow_overcompletion
        && user_objective.progress > user_objective.completion_value
    {
        user_objective.completion_value
    } else {
        user_objective.progress
    };

    Ok(Objective {
        objective_hash: user_objective.objective_hash,
        allow_overcompletion: definition.allow_overcompletion,
        completion_value: user_objective.completion_value,
        progress,
        visible: user_objective.visible,
        description: definition.progress_description.clone(),
    })
}
