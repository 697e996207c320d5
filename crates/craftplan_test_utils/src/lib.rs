//! # Craftplan Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Canned dataset fixtures
//! - Conservation checks for solver results
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod conservation;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
