//! Hit chance and critical chance calculations.

use crate::config::HitParams;

/// Hit chance as a percentage.
///
/// ```text
/// hit_chance = accuracy + (attacker_speed - target_speed) / evasion_divisor
/// clamped to [min_hit_chance, max_hit_chance]
/// ```
pub fn hit_chance(
    params: &HitParams,
    accuracy: Option<u32>,
    attacker_speed: i32,
    target_speed: i32,
) -> u32 {
    let accuracy = accuracy.unwrap_or(params.base_accuracy) as i32;
    let swing = (attacker_speed - target_speed) / params.evasion_divisor.max(1);
    (accuracy + swing).clamp(params.min_hit_chance as i32, params.max_hit_chance as i32) as u32
}

/// Critical chance as a percentage, clamped to 0..=100.
pub fn crit_chance(params: &HitParams, crit_bonus: u32, luck: i32) -> u32 {
    let chance = params.base_crit_chance as i32
        + crit_bonus as i32
        + luck.max(0) / params.luck_divisor.max(1);
    chance.clamp(0, 100) as u32
}

/// A d100 roll succeeds when it does not exceed the chance.
#[inline]
pub fn roll_succeeds(roll: u32, chance: u32) -> bool {
    roll <= chance
}
