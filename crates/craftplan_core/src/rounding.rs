//! Display-time rounding policy.
//!
//! The solver keeps every internal balance exact; rounding is applied
//! only when a collaborator formats a report, so rounding error never
//! compounds across tree levels.

use serde::{Deserialize, Serialize};

use crate::math::Fixed;

/// How a value is rounded at display time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoundingMode {
    /// No rounding; the exact value is shown.
    #[default]
    None,
    /// Round to nearest, ties away from zero.
    HalfUp,
    /// Round toward positive infinity.
    Up,
    /// Round toward negative infinity.
    Down,
}

/// Maximum decimal places a policy will keep.
///
/// Bounded so `10^decimals` stays a small exact integer.
pub const MAX_DECIMALS: u32 = 6;

/// A rounding policy: a mode plus a decimal-place count.
///
/// Consumed by the presentation layer; the planning engines never apply
/// it to their own balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundingPolicy {
    /// Decimal places to keep (clamped to `0..=MAX_DECIMALS`).
    pub decimals: u32,
    /// Rounding mode.
    pub mode: RoundingMode,
}

impl Default for RoundingPolicy {
    fn default() -> Self {
        Self {
            decimals: 3,
            mode: RoundingMode::None,
        }
    }
}

impl RoundingPolicy {
    /// Create a policy, clamping `decimals` to the supported range.
    #[must_use]
    pub fn new(decimals: u32, mode: RoundingMode) -> Self {
        Self {
            decimals: decimals.min(MAX_DECIMALS),
            mode,
        }
    }

    /// Apply this policy to a value.
    ///
    /// Scaling runs on the raw bits in 128-bit arithmetic, so values
    /// anywhere in the `Fixed` range round without overflow at any
    /// decimal count. A rounded result past the range edge saturates.
    #[must_use]
    pub fn apply(self, value: Fixed) -> Fixed {
        let factor = i128::from(10i64.pow(self.decimals.min(MAX_DECIMALS)));
        let one = 1i128 << 32;
        let half = one / 2;
        let scaled = i128::from(value.to_bits()) * factor;

        // Whole units of 10^-decimals, per the mode.
        let units = match self.mode {
            RoundingMode::None => return value,
            RoundingMode::HalfUp => {
                if scaled >= 0 {
                    (scaled + half).div_euclid(one)
                } else {
                    -((-scaled + half).div_euclid(one))
                }
            }
            RoundingMode::Up => scaled.div_euclid(one) + i128::from(scaled.rem_euclid(one) != 0),
            RoundingMode::Down => scaled.div_euclid(one),
        };

        // Back to fixed-point bits, rounding the division to nearest.
        let numerator = units * one;
        let bits = if numerator >= 0 {
            (numerator + factor / 2) / factor
        } else {
            (numerator - factor / 2) / factor
        };
        match i64::try_from(bits) {
            Ok(bits) => Fixed::from_bits(bits),
            Err(_) if bits < 0 => Fixed::MIN,
            Err(_) => Fixed::MAX,
        }
    }
}
