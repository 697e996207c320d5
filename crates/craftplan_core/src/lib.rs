//! # Craftplan Core
//!
//! Deterministic production planning core for crafting economies.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Identical plans for identical inputs across platforms
//! - Embedding in UIs, servers, or batch tools without adaptation
//! - Property-based testing of solver invariants
//!
//! ## Crate Structure
//!
//! - [`data`] - Item, machine, and recipe definitions
//! - [`index`] - Produced-item to producing-recipe index
//! - [`demand`] - Demand resolution engine (multi-solution expansion)
//! - [`rate`] - Rate-based line planning (single-choice flow trees)
//! - [`supply`] - Supply allocation optimizer (multi-start greedy)
//! - [`config`] - Planning session configuration
//! - [`rounding`] - Display-time rounding policies
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod data;
pub mod demand;
pub mod error;
pub mod index;
pub mod math;
pub mod rate;
pub mod rounding;
pub mod supply;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::PlanConfig;
    pub use crate::data::{Dataset, Item, ItemKey, ItemStack, Machine, MachineKey, Recipe, RecipeId};
    pub use crate::demand::{Demand, DemandSolver, NeedNode, NeedResult, Solution};
    pub use crate::error::{PlanError, Result};
    pub use crate::index::RecipeIndex;
    pub use crate::math::Fixed;
    pub use crate::rate::{FlowNode, RateReport, RateSolver, RateTarget};
    pub use crate::rounding::{RoundingMode, RoundingPolicy};
    pub use crate::supply::{
        OptimizationCandidate, RecipeAllocation, SupplyEntry, SupplyOptimizer,
    };
}
