//! Fixed-point rendering of tallies, shares and ratios.
//!
//! Every computation multiplies before dividing in 256-bit integers. Floats
//! never touch a token amount.

use agora_types::{mul_div, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::params::Ratio;

/// Hundredths of a percent: `10000` is 100%.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percent(u64);

impl Percent {
    pub const ZERO: Self = Self(0);
    pub const HUNDRED: Self = Self(10_000);

    pub fn from_hundredths(hundredths: u64) -> Self {
        Self(hundredths)
    }

    pub fn hundredths(&self) -> u64 {
        self.0
    }

    fn from_u256(value: U256) -> Self {
        if value > U256::from(u64::MAX) {
            Self(u64::MAX)
        } else {
            Self(value.as_u64())
        }
    }
}

impl fmt::Display for Percent {
    /// Two decimals, trailing zeros dropped: `1234` → `12.34%`, `5000` → `50%`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        match self.0 % 100 {
            0 => write!(f, "{whole}%"),
            frac if frac % 10 == 0 => write!(f, "{whole}.{}%", frac / 10),
            frac => write!(f, "{whole}.{frac:02}%"),
        }
    }
}

/// Share of each option in yes + no + abstain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotePercentages {
    pub yes: Percent,
    pub no: Percent,
    pub abstain: Percent,
}

/// `part / whole` in hundredths of a percent, zero when `whole` is zero.
fn share(part: U256, whole: U256) -> Percent {
    if whole == U256::ZERO {
        return Percent::ZERO;
    }
    let scaled = mul_div(part, U256::new(10_000), whole).unwrap_or(U256::MAX);
    Percent::from_u256(scaled)
}

/// `parts` and their sum, with the same low bits dropped from every part
/// until the sum fits in 256 bits.
fn fit_total<const N: usize>(mut parts: [U256; N]) -> ([U256; N], U256) {
    loop {
        let total = parts
            .iter()
            .try_fold(U256::ZERO, |sum, part| sum.checked_add(*part));
        if let Some(total) = total {
            return (parts, total);
        }
        for part in &mut parts {
            *part >>= 1u32;
        }
    }
}

pub fn vote_percentages(yes: U256, no: U256, abstain: U256) -> VotePercentages {
    let ([yes, no, abstain], total) = fit_total([yes, no, abstain]);
    VotePercentages {
        yes: share(yes, total),
        no: share(no, total),
        abstain: share(abstain, total),
    }
}

/// Yes share of yes + no; what the support threshold is compared against.
pub fn support_percentage(yes: U256, no: U256) -> Percent {
    let ([yes, _], total) = fit_total([yes, no]);
    share(yes, total)
}

/// Cast weight as a share of the minimum participation, 100% once the
/// minimum is met exactly. A zero minimum is always met.
pub fn participation_percentage(total: U256, min_voting_power: U256) -> Percent {
    if min_voting_power == U256::ZERO {
        return Percent::HUNDRED;
    }
    share(total, min_voting_power)
}

/// Progress of the veto tally toward the veto threshold, in hundredths of a
/// percent: `1000 * veto / ((past_supply * min_veto_ratio) / 10^7)`.
///
/// Zero whenever the supply or the ratio is unknown or zero, or when the
/// threshold itself rounds to zero. Past 100% the value keeps growing.
pub fn veto_percentage(
    veto_tally: U256,
    past_supply: Option<U256>,
    min_veto_ratio: Option<Ratio>,
) -> Percent {
    let (Some(supply), Some(ratio)) = (past_supply, min_veto_ratio) else {
        return Percent::ZERO;
    };
    if supply == U256::ZERO || ratio.is_zero() {
        return Percent::ZERO;
    }

    let Some(denominator) = mul_div(supply, ratio.as_u256(), U256::new(10_000_000)) else {
        return Percent::ZERO;
    };
    if denominator == U256::ZERO {
        return Percent::ZERO;
    }

    let scaled = mul_div(veto_tally, U256::new(1_000), denominator).unwrap_or(U256::MAX);
    Percent::from_u256(scaled)
}

pub fn ratio_to_percent(ratio: Ratio) -> String {
    ratio.to_string()
}

/// Render a scaled integer with `decimals` fractional digits, dropping
/// trailing zeros: `(1500000000000000000, 18)` → `"1.5"`.
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{}{digits}", "0".repeat(decimals + 1 - digits.len()))
    } else {
        digits
    };
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const E18: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn percent_display() {
        assert_eq!(Percent::from_hundredths(1234).to_string(), "12.34%");
        assert_eq!(Percent::from_hundredths(5000).to_string(), "50%");
        assert_eq!(Percent::from_hundredths(1250).to_string(), "12.5%");
        assert_eq!(Percent::from_hundredths(7).to_string(), "0.07%");
        assert_eq!(Percent::HUNDRED.to_string(), "100%");
    }

    #[test]
    fn vote_shares() {
        let p = vote_percentages(U256::new(70), U256::new(20), U256::new(10));
        assert_eq!(p.yes, Percent::from_hundredths(7000));
        assert_eq!(p.no, Percent::from_hundredths(2000));
        assert_eq!(p.abstain, Percent::from_hundredths(1000));
    }

    #[test]
    fn vote_shares_round_down() {
        let p = vote_percentages(U256::new(1), U256::new(1), U256::new(1));
        assert_eq!(p.yes.to_string(), "33.33%");
    }

    #[test]
    fn no_votes_no_percentages() {
        assert_eq!(
            vote_percentages(U256::ZERO, U256::ZERO, U256::ZERO),
            VotePercentages::default()
        );
        assert_eq!(support_percentage(U256::ZERO, U256::ZERO), Percent::ZERO);
    }

    #[test]
    fn support_ignores_abstain() {
        assert_eq!(
            support_percentage(U256::new(3), U256::new(1)),
            Percent::from_hundredths(7500)
        );
    }

    #[test]
    fn huge_tallies_keep_their_shares() {
        let p = vote_percentages(U256::new(3) << 250u32, U256::ONE << 250u32, U256::ZERO);
        assert_eq!(p.yes.to_string(), "75%");
        assert_eq!(p.no.to_string(), "25%");
        assert_eq!(p.abstain, Percent::ZERO);
    }

    #[test]
    fn totals_past_256_bits_are_not_saturated() {
        let p = vote_percentages(U256::MAX, U256::MAX, U256::MAX);
        assert_eq!(p.yes, Percent::from_hundredths(3333));
        assert_eq!(p.no, Percent::from_hundredths(3333));
        assert_eq!(p.abstain, Percent::from_hundredths(3333));
        assert_eq!(
            support_percentage(U256::new(3) << 254u32, U256::ONE << 254u32),
            Percent::from_hundredths(7500)
        );
        assert_eq!(support_percentage(U256::MAX, U256::MAX), Percent::from_hundredths(5000));
    }

    #[test]
    fn participation_against_minimum() {
        assert_eq!(
            participation_percentage(U256::new(40), U256::new(100)),
            Percent::from_hundredths(4000)
        );
        assert_eq!(
            participation_percentage(U256::new(150), U256::new(100)).to_string(),
            "150%"
        );
        assert_eq!(participation_percentage(U256::ZERO, U256::ZERO), Percent::HUNDRED);
    }

    #[test]
    fn veto_progress() {
        // Threshold: 10% of 10000 tokens = 1000 tokens.
        let supply = Some(U256::new(10_000 * E18));
        let ratio = Some(Ratio::new(100_000).unwrap());
        assert_eq!(veto_percentage(U256::ZERO, supply, ratio), Percent::ZERO);
        assert_eq!(
            veto_percentage(U256::new(500 * E18), supply, ratio),
            Percent::from_hundredths(5000)
        );
        assert_eq!(
            veto_percentage(U256::new(1_000 * E18), supply, ratio),
            Percent::HUNDRED
        );
    }

    #[test]
    fn veto_progress_needs_supply_and_ratio() {
        let veto = U256::new(E18);
        let ratio = Some(Ratio::new(100_000).unwrap());
        assert_eq!(veto_percentage(veto, None, ratio), Percent::ZERO);
        assert_eq!(veto_percentage(veto, Some(U256::ZERO), ratio), Percent::ZERO);
        assert_eq!(veto_percentage(veto, Some(U256::new(E18)), None), Percent::ZERO);
        assert_eq!(
            veto_percentage(veto, Some(U256::new(E18)), Some(Ratio::ZERO)),
            Percent::ZERO
        );
        // 5 * 100000 / 10^7 rounds to zero.
        assert_eq!(veto_percentage(veto, Some(U256::new(5)), ratio), Percent::ZERO);
    }

    #[test]
    fn units() {
        assert_eq!(format_units(U256::new(1_500_000_000_000_000_000), 18), "1.5");
        assert_eq!(format_units(U256::new(E18), 18), "1");
        assert_eq!(format_units(U256::new(1), 18), "0.000000000000000001");
        assert_eq!(format_units(U256::ZERO, 18), "0");
        assert_eq!(format_units(U256::new(12345), 0), "12345");
        assert_eq!(format_units(U256::new(12345), 2), "123.45");
    }

    #[test]
    fn thresholds_render_as_percent() {
        assert_eq!(ratio_to_percent(Ratio::new(150_000).unwrap()), "15%");
    }
}
