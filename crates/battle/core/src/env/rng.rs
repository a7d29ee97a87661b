//! RNG oracle for deterministic rolls.
//!
//! Every roll is a pure function of a seed. Seeds are derived with
//! [`compute_seed`] from the battle seed, the action nonce, the acting
//! combatant and a [`RollContext`], so replaying a battle with the same seed
//! and the same inputs reproduces every hit, crit and escape roll.

use std::sync::atomic::{AtomicUsize, Ordering};

/// RNG oracle for deterministic random number generation.
///
/// Implementations must produce the same value for the same seed.
pub trait RngOracle: Send + Sync {
    /// Generate a random u32 value from a seed.
    fn next_u32(&self, seed: u64) -> u32;

    /// Roll a d100 (1-100 inclusive).
    fn roll_d100(&self, seed: u64) -> u32 {
        (self.next_u32(seed) % 100) + 1
    }

    /// Generate a random value in range [min, max] inclusive.
    fn range(&self, seed: u64, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        let range = max - min + 1;
        min + (self.next_u32(seed) % range)
    }
}

/// PCG-XSH-RR generator: 64-bit state, 32-bit output.
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::output(Self::step(seed))
    }
}

/// Always rolls the same d100 value. Useful to pin every roll in tests.
#[derive(Clone, Copy, Debug)]
pub struct FixedRng {
    roll: u32,
}

impl FixedRng {
    /// `roll` is the d100 result (1-100) every roll returns.
    pub fn new(roll: u32) -> Self {
        Self {
            roll: roll.clamp(1, 100),
        }
    }
}

impl RngOracle for FixedRng {
    fn next_u32(&self, _seed: u64) -> u32 {
        self.roll - 1
    }
}

/// Returns scripted d100 values in order, repeating the last one when the
/// script runs out.
#[derive(Debug, Default)]
pub struct ScriptedRng {
    rolls: Vec<u32>,
    cursor: AtomicUsize,
}

impl ScriptedRng {
    pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self {
            rolls: rolls.into_iter().map(|roll| roll.clamp(1, 100)).collect(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Number of rolls consumed so far.
    pub fn consumed(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }
}

impl RngOracle for ScriptedRng {
    fn next_u32(&self, _seed: u64) -> u32 {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        let roll = self
            .rolls
            .get(index)
            .or_else(|| self.rolls.last())
            .copied()
            .unwrap_or(100);
        roll - 1
    }
}

/// Distinguishes independent rolls made for the same action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum RollContext {
    Hit = 0,
    Critical = 1,
    Variance = 2,
    Infliction = 3,
    Escape = 4,
    Drop = 5,
    Decision = 6,
}

impl RollContext {
    /// Context value for the roll against the `slot`-th target of an action.
    #[inline]
    pub const fn for_slot(self, slot: usize) -> u32 {
        ((self as u32) << 8) | (slot as u32 & 0xff)
    }
}

/// Combines the battle seed with per-roll inputs into a single seed.
///
/// * `battle_seed` - seed fixed when the battle starts
/// * `nonce` - action sequence number, incremented for every resolved action
/// * `actor_id` - combatant performing the roll
/// * `context` - separates multiple rolls made for the same action
pub fn compute_seed(battle_seed: u64, nonce: u64, actor_id: u32, context: u32) -> u64 {
    let mut hash = battle_seed;
    hash ^= nonce.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= (actor_id as u64).wrapping_mul(0x517cc1b727220a95);
    hash ^= (context as u64).wrapping_mul(0x85ebca6b);

    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;

    hash
}
