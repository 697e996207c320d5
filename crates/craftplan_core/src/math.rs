//! Fixed-point math utilities for deterministic planning.
//!
//! All planning arithmetic uses fixed-point numbers to ensure
//! deterministic, drift-free results across platforms. Floating-point
//! operations can produce different results on different CPUs and
//! accumulate rounding error across tree levels.

use std::collections::BTreeMap;

use fixed::types::I32F32;

/// Fixed-point number type for all planning math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Serde support for maps with fixed-point values.
///
/// Report structures carry `BTreeMap<_, Fixed>` ledgers; this adapter
/// serializes the values via their raw bit representation, keeping the
/// map shape intact.
pub mod fixed_map_serde {
    use super::{BTreeMap, Fixed};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a map of fixed-point values via their raw bits.
    pub fn serialize<K, S>(map: &BTreeMap<K, Fixed>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize + Ord,
        S: Serializer,
    {
        let raw: BTreeMap<&K, i64> = map.iter().map(|(k, v)| (k, v.to_bits())).collect();
        raw.serialize(serializer)
    }

    /// Deserialize a map of fixed-point values from their raw bits.
    pub fn deserialize<'de, K, D>(deserializer: D) -> Result<BTreeMap<K, Fixed>, D::Error>
    where
        K: Deserialize<'de> + Ord,
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<K, i64>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|(k, bits)| (k, Fixed::from_bits(bits)))
            .collect())
    }
}

/// Seconds per minute, as a fixed-point constant for throughput math.
pub const SECONDS_PER_MINUTE: i32 = 60;

/// Add `value` to the entry for `key`, creating it at zero if absent.
///
/// The planning engines accumulate per-item ledgers constantly; this is
/// the one shared primitive for doing so.
pub fn add_to<K: Ord>(map: &mut BTreeMap<K, Fixed>, key: K, value: Fixed) {
    *map.entry(key).or_insert(Fixed::ZERO) += value;
}

/// Merge `src` into `dst`, adding amounts per key.
pub fn merge_into<K: Ord + Clone>(dst: &mut BTreeMap<K, Fixed>, src: &BTreeMap<K, Fixed>) {
    for (key, value) in src {
        add_to(dst, key.clone(), *value);
    }
}
