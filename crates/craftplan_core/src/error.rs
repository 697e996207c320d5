//! Error types for the planning core.

use thiserror::Error;

use crate::data::{ItemKey, MachineKey, RecipeId};

/// Result type alias using [`PlanError`].
pub type Result<T> = std::result::Result<T, PlanError>;

/// Top-level error type for all planning errors.
///
/// Only invalid *input* is an error. An unsatisfiable demand or an empty
/// feasible recipe set is represented by an empty result list, never by a
/// variant here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// Reference to an item key the dataset does not contain.
    #[error("Unknown item key: {0}")]
    UnknownItem(ItemKey),

    /// Reference to a machine key the dataset does not contain.
    #[error("Unknown machine key: {0}")]
    UnknownMachine(MachineKey),

    /// Reference to a recipe id the dataset does not contain.
    #[error("Unknown recipe id: {0}")]
    UnknownRecipe(RecipeId),

    /// A demand was given a zero or negative amount.
    #[error("Demand amount for item {0} must be positive")]
    NonPositiveDemand(ItemKey),

    /// A solve was requested with no demands at all.
    #[error("No demands to solve")]
    NoDemands,

    /// Attempted to remove an item still referenced by a recipe.
    #[error("Item {0} is still referenced by recipe {1}")]
    ItemInUse(ItemKey, RecipeId),

    /// Attempted to remove a machine still referenced by a recipe.
    #[error("Machine {0} is still referenced by recipe {1}")]
    MachineInUse(MachineKey, RecipeId),

    /// A dataset entry was registered under a key that already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
}
