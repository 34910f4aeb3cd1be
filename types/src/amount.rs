//! 256-bit token amounts and fixed-point helpers.
//!
//! On-chain tallies, supplies and voting power are Solidity `uint256` values.
//! They are kept at full integer precision as [`U256`]; nothing in the
//! workspace converts them to floating point before a comparison.

pub use ethnum::U256;

/// Full 512-bit product of `x` and `y` as `(high, low)` words.
pub fn mul_wide(x: U256, y: U256) -> (U256, U256) {
    let (x_hi, x_lo) = x.into_words();
    let (y_hi, y_lo) = y.into_words();

    // Each partial product of two 128-bit limbs fits in 256 bits.
    let lo_lo = U256::new(x_lo) * U256::new(y_lo);
    let hi_lo = U256::new(x_hi) * U256::new(y_lo);
    let lo_hi = U256::new(x_lo) * U256::new(y_hi);
    let hi_hi = U256::new(x_hi) * U256::new(y_hi);

    let (cross, cross_carry) = hi_lo.overflowing_add(lo_hi);
    let (low, low_carry) = lo_lo.overflowing_add(cross << 128u32);

    let mut high = hi_hi + (cross >> 128u32);
    if cross_carry {
        high += U256::ONE << 128u32;
    }
    if low_carry {
        high += U256::ONE;
    }
    (high, low)
}

/// Compute `x * y / denominator` over the full 512-bit product, rounding
/// down.
///
/// Returns `None` when `denominator` is zero or the quotient does not fit
/// in 256 bits.
pub fn mul_div(x: U256, y: U256, denominator: U256) -> Option<U256> {
    if denominator == U256::ZERO {
        return None;
    }
    let (high, low) = mul_wide(x, y);
    if high == U256::ZERO {
        return Some(low / denominator);
    }
    if high >= denominator {
        return None;
    }

    // Shift-subtract long division; `remainder < denominator` throughout.
    let mut remainder = high;
    let mut quotient = U256::ZERO;
    for bit in (0..256u32).rev() {
        let overflow = remainder >> 255u32 != U256::ZERO;
        remainder = (remainder << 1u32) | ((low >> bit) & U256::ONE);
        if overflow || remainder >= denominator {
            remainder = remainder.wrapping_sub(denominator);
            quotient |= U256::ONE << bit;
        }
    }
    Some(quotient)
}

/// Parse a decimal string into a [`U256`].
pub fn parse_decimal(s: &str) -> Option<U256> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    U256::from_str_radix(s, 10).ok()
}

/// Serde adapter encoding a [`U256`] as a decimal string.
///
/// JSON numbers cannot carry 256-bit integers without loss, so amounts
/// travel as strings: `#[serde(with = "agora_types::amount::u256_dec")]`.
pub mod u256_dec {
    use super::{parse_decimal, U256};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_decimal(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid decimal amount: {s}")))
    }
}
