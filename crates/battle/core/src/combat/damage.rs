//! Damage formulas.
//!
//! All multipliers are percentages. They are composed multiplicatively onto
//! the base damage: the product is taken in 128-bit space and divided once,
//! so intermediate rounding never depends on the order of the multipliers.

use crate::config::{AffinityParams, DamageParams};
use crate::state::Affinity;

/// Base damage before any multiplier.
///
/// ```text
/// raw = power × offense / offense_divisor − defense / defense_divisor
/// base = max(minimum, raw)
/// ```
pub fn base_damage(params: &DamageParams, power: u32, offense: i32, defense: i32) -> u32 {
    let offense = offense.max(0) as i64;
    let defense = defense.max(0) as i64;
    let scaled = power as i64 * offense / params.offense_divisor.max(1) as i64;
    let reduced = scaled - defense / params.defense_divisor.max(1) as i64;
    reduced.clamp(params.minimum as i64, u32::MAX as i64) as u32
}

/// Applies every multiplier (in percent) to `base` in a single division.
pub fn compose(base: u32, multipliers: &[u32]) -> u32 {
    let mut numerator = base as u128;
    let mut denominator = 1u128;
    for multiplier in multipliers {
        numerator *= *multiplier as u128;
        denominator *= 100;
    }
    (numerator / denominator).min(u32::MAX as u128) as u32
}

/// Damage multiplier for an affinity. `None` means the hit deals no damage
/// (immune) or is converted to healing (absorb).
pub fn affinity_multiplier(params: &AffinityParams, affinity: Affinity) -> Option<u32> {
    match affinity {
        Affinity::Normal => Some(100),
        Affinity::Weak => Some(params.weak_multiplier),
        Affinity::Resist => Some(params.resist_multiplier),
        Affinity::Immune | Affinity::Absorb => None,
    }
}

/// Healing from a restorative skill: `max(1, power × magic_attack / offense_divisor)`.
pub fn healing_amount(params: &DamageParams, power: u32, magic_attack: i32) -> u32 {
    let scaled =
        power as i64 * magic_attack.max(0) as i64 / params.offense_divisor.max(1) as i64;
    scaled.clamp(1, u32::MAX as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weakness_scenario_base_and_multiplier() {
        let params = DamageParams::default();
        let base = base_damage(&params, 90, 80, 30);
        assert_eq!(base, 345);
        assert_eq!(compose(base, &[150]), 517);
    }

    #[test]
    fn composition_is_multiplicative_and_order_free() {
        assert_eq!(compose(100, &[150, 150]), 225);
        assert_eq!(compose(101, &[150, 50]), compose(101, &[50, 150]));
        assert_eq!(compose(101, &[150, 50]), 75);
        assert_eq!(compose(7, &[]), 7);
    }

    #[test]
    fn base_damage_never_drops_below_minimum() {
        let params = DamageParams::default();
        assert_eq!(base_damage(&params, 10, 5, 500), params.minimum);
        assert_eq!(base_damage(&params, 10, -40, 0), params.minimum);
    }

    #[test]
    fn immune_and_absorb_have_no_multiplier() {
        let params = AffinityParams::default();
        assert_eq!(affinity_multiplier(&params, Affinity::Weak), Some(150));
        assert_eq!(affinity_multiplier(&params, Affinity::Resist), Some(50));
        assert_eq!(affinity_multiplier(&params, Affinity::Immune), None);
        assert_eq!(affinity_multiplier(&params, Affinity::Absorb), None);
    }
}
