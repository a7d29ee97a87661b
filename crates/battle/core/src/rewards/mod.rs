//! Post-battle scoring, ranking and reward distribution.
//!
//! ```text
//! score = Σ events × points
//!       + no-damage / no-knockout / no-item bonuses
//!       + (threshold − turns) × speed points        when under the threshold
//!       − knockouts × penalty
//!       − (turns − threshold) × overtime penalty    when over the threshold
//! ```
//!
//! The threshold is the boss threshold for boss encounters. The score is
//! floored at zero and mapped to a [`Rank`], whose multipliers scale the summed
//! bounty of every defeated opponent. Experience is split evenly among the
//! living party members; the remainder of the division is dropped.

mod rank;

pub use rank::Rank;

use tracing::info;

use crate::config::{RankTier, RewardParams};
use crate::env::{InventoryService, ItemId, RngOracle, RollContext, compute_seed};
use crate::state::{BattleMetrics, BattleState, CombatantId, Side};

/// Components of a score, kept for display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoreBreakdown {
    pub events: u64,
    pub bonuses: u64,
    pub speed: u64,
    pub penalties: u64,
    pub total: u32,
}

/// Everything awarded for a victory.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleRewards {
    pub score: ScoreBreakdown,
    pub rank: Rank,
    pub experience: u64,
    pub currency: u64,
    /// Experience awarded to each living party member.
    pub shares: Vec<(CombatantId, u64)>,
    pub drops: Vec<(ItemId, u32)>,
}

impl BattleRewards {
    pub fn experience_awarded(&self) -> u64 {
        self.shares.iter().map(|(_, share)| share).sum()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RewardCalculator {
    params: RewardParams,
}

impl RewardCalculator {
    pub fn new(params: RewardParams) -> Self {
        Self { params }
    }

    pub fn score(&self, metrics: &BattleMetrics, boss: bool) -> ScoreBreakdown {
        let p = &self.params;
        let events = metrics.weakness_hits as u64 * p.weakness_points as u64
            + metrics.critical_hits as u64 * p.critical_points as u64
            + metrics.technical_hits as u64 * p.technical_points as u64
            + metrics.finisher_uses as u64 * p.finisher_points as u64
            + metrics.ultimate_uses as u64 * p.ultimate_points as u64;

        let mut bonuses = 0u64;
        if metrics.damage_taken == 0 {
            bonuses += p.no_damage_bonus as u64;
        }
        if metrics.knockouts_suffered == 0 {
            bonuses += p.no_knockout_bonus as u64;
        }
        if metrics.items_used == 0 {
            bonuses += p.no_item_bonus as u64;
        }

        let threshold = if boss {
            p.boss_turn_threshold
        } else {
            p.turn_threshold
        };
        let turns = metrics.turns_elapsed;
        let speed = threshold.saturating_sub(turns) as u64 * p.speed_points_per_turn as u64;
        let penalties = metrics.knockouts_suffered as u64 * p.knockout_penalty as u64
            + turns.saturating_sub(threshold) as u64 * p.overtime_penalty_per_turn as u64;

        let total = (events + bonuses + speed).saturating_sub(penalties);
        ScoreBreakdown {
            events,
            bonuses,
            speed,
            penalties,
            total: total.min(u32::MAX as u64) as u32,
        }
    }

    pub fn rank(&self, score: u32) -> (Rank, RankTier) {
        let rank = Rank::from_score(score, &self.params.ranks);
        (rank, rank.tier(&self.params.ranks))
    }

    /// Computes the rewards of a won battle. Drop rolls are keyed by the
    /// battle seed and the dropping opponent.
    pub fn compute(&self, state: &BattleState, rng: &dyn RngOracle) -> BattleRewards {
        let score = self.score(&state.metrics, state.encounter.boss);
        let (rank, tier) = self.rank(score.total);

        let defeated: Vec<_> = state
            .combatants()
            .filter(|combatant| combatant.side == Side::Enemy && !combatant.is_alive())
            .collect();
        let base_experience: u64 = defeated.iter().map(|enemy| enemy.bounty.experience).sum();
        let base_currency: u64 = defeated.iter().map(|enemy| enemy.bounty.currency).sum();
        let experience = scale(base_experience, tier.experience_multiplier);
        let currency = scale(base_currency, tier.currency_multiplier);

        let living: Vec<CombatantId> = state.living(Side::Party).map(|member| member.id).collect();
        let share = match living.len() as u64 {
            0 => 0,
            count => experience / count,
        };
        let shares = living.into_iter().map(|id| (id, share)).collect();

        let mut drops = Vec::new();
        for enemy in &defeated {
            for (slot, entry) in enemy.bounty.drops.iter().enumerate() {
                let chance = scale(entry.chance as u64, tier.drop_multiplier).min(100) as u32;
                let seed = compute_seed(
                    state.encounter.seed,
                    state.nonce,
                    enemy.id.0,
                    RollContext::Drop.for_slot(slot),
                );
                if rng.roll_d100(seed) <= chance {
                    drops.push((entry.item.clone(), entry.quantity));
                }
            }
        }

        BattleRewards {
            score,
            rank,
            experience,
            currency,
            shares,
            drops,
        }
    }

    /// Credits experience to the party and deposits currency and drops.
    pub fn grant(
        &self,
        state: &mut BattleState,
        rewards: &BattleRewards,
        inventory: &mut dyn InventoryService,
    ) {
        for (id, share) in &rewards.shares {
            if let Some(member) = state.combatant_mut(*id) {
                member.experience_gained += share;
            }
        }
        inventory.deposit_currency(rewards.currency);
        for (item, quantity) in &rewards.drops {
            inventory.deposit_item(item, *quantity);
        }
        info!(
            target: "battle::rewards",
            rank = %rewards.rank,
            score = rewards.score.total,
            experience = rewards.experience,
            currency = rewards.currency,
            drops = rewards.drops.len(),
            "rewards granted"
        );
    }
}

fn scale(value: u64, percent: u32) -> u64 {
    (value as u128 * percent as u128 / 100).min(u64::MAX as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{FixedRng, LedgerInventory};
    use crate::state::{
        BattleFlags, Bounty, CombatantTemplate, DropEntry, EncounterSettings, Stats,
    };

    fn calculator() -> RewardCalculator {
        RewardCalculator::new(RewardParams::default())
    }

    #[test]
    fn flawless_fast_battle_scores_every_bonus() {
        let metrics = BattleMetrics {
            weakness_hits: 2,
            turns_elapsed: 4,
            ..BattleMetrics::default()
        };
        let score = calculator().score(&metrics, false);
        assert_eq!(score.events, 40);
        assert_eq!(score.bonuses, 550);
        assert_eq!(score.speed, 150);
        assert_eq!(score.total, 740);
        assert_eq!(calculator().rank(score.total).0, Rank::A);
    }

    #[test]
    fn penalties_floor_at_zero() {
        let metrics = BattleMetrics {
            knockouts_suffered: 9,
            items_used: 3,
            damage_taken: 500,
            turns_elapsed: 40,
            ..BattleMetrics::default()
        };
        let score = calculator().score(&metrics, false);
        assert_eq!(score.total, 0);
        assert_eq!(calculator().rank(score.total).0, Rank::D);
    }

    #[test]
    fn boss_threshold_is_more_lenient() {
        let metrics = BattleMetrics {
            turns_elapsed: 15,
            ..BattleMetrics::default()
        };
        assert!(calculator().score(&metrics, true).total > calculator().score(&metrics, false).total);
    }

    #[test]
    fn experience_is_split_among_living_members_only() {
        let hero = CombatantTemplate::new("hero", "Hero", 50, 0, Stats::new(10, 10, 10, 10, 10, 0));
        let ogre = CombatantTemplate::new("ogre", "Ogre", 50, 0, Stats::new(10, 10, 10, 10, 10, 0))
            .with_bounty(Bounty {
                experience: 100,
                currency: 40,
                drops: vec![DropEntry {
                    item: "hide".into(),
                    chance: 60,
                    quantity: 1,
                }],
            });
        let mut state = BattleState::new(
            &[hero.clone(), hero.clone(), hero],
            &[ogre.clone(), ogre],
            EncounterSettings::default(),
        )
        .unwrap();
        for id in [CombatantId(2), CombatantId(3), CombatantId(4)] {
            let combatant = state.combatant_mut(id).unwrap();
            combatant.hp = 0;
            combatant.flags.insert(BattleFlags::DEFEATED);
        }
        state.metrics.damage_taken = 10;
        state.metrics.items_used = 1;
        state.metrics.knockouts_suffered = 1;
        state.metrics.turns_elapsed = 10;

        let calculator = calculator();
        let rewards = calculator.compute(&state, &FixedRng::new(50));
        assert_eq!(rewards.rank, Rank::D);
        assert_eq!(rewards.experience, 200);
        assert_eq!(rewards.currency, 80);
        assert_eq!(
            rewards.shares,
            vec![(CombatantId(0), 100), (CombatantId(1), 100)]
        );
        assert_eq!(rewards.drops.len(), 2);

        let mut inventory = LedgerInventory::new();
        calculator.grant(&mut state, &rewards, &mut inventory);
        assert_eq!(inventory.currency(), 80);
        assert_eq!(inventory.quantity(&"hide".into()), 2);
        assert_eq!(state.combatant(CombatantId(0)).unwrap().experience_gained, 100);
        assert_eq!(state.combatant(CombatantId(2)).unwrap().experience_gained, 0);
    }
}
