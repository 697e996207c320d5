//! Planning session configuration.
//!
//! Knobs the surrounding application exposes to the user: how many
//! alternative solution patterns to enumerate, how to round values for
//! display, and how deep to render solution trees. The solver itself
//! only consumes `max_patterns`; the rest is presentation policy that
//! travels with the session.

use serde::{Deserialize, Serialize};

use crate::rounding::RoundingPolicy;

/// Smallest allowed pattern cap.
pub const MIN_PATTERNS: usize = 1;
/// Largest allowed pattern cap.
pub const MAX_PATTERNS: usize = 1000;

/// Default pattern cap.
pub const DEFAULT_PATTERNS: usize = 10;
/// Default display tree depth.
pub const DEFAULT_MAX_DEPTH: usize = 20;

/// Clamp a requested pattern cap into the supported range.
#[must_use]
pub fn clamp_patterns(n: usize) -> usize {
    n.clamp(MIN_PATTERNS, MAX_PATTERNS)
}

/// Configuration for a planning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Upper bound on alternative solutions enumerated per solve.
    pub max_patterns: usize,
    /// Display-time rounding policy.
    pub rounding: RoundingPolicy,
    /// Depth at which tree rendering truncates (display only; the
    /// solver has no depth limit other than cycle blocking).
    pub display_max_depth: usize,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            max_patterns: DEFAULT_PATTERNS,
            rounding: RoundingPolicy::default(),
            display_max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl PlanConfig {
    /// Create a config with a specific pattern cap (clamped).
    #[must_use]
    pub fn with_max_patterns(mut self, n: usize) -> Self {
        self.max_patterns = clamp_patterns(n);
        self
    }

    /// Create a config with a specific rounding policy.
    #[must_use]
    pub fn with_rounding(mut self, rounding: RoundingPolicy) -> Self {
        self.rounding = rounding;
        self
    }
}
