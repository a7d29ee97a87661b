//! Battle configuration constants and tunable parameters.
//!
//! Every multiplier is an integer percentage (`150` means ×1.5) so the whole
//! core stays in integer arithmetic. All values are tuning knobs: content
//! files may override any subset of them.

/// Tunable parameters for one battle session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BattleConfig {
    pub damage: DamageParams,
    pub affinity: AffinityParams,
    pub hit: HitParams,
    pub technical: TechnicalParams,
    pub chain: ChainParams,
    pub gauge: GaugeParams,
    pub escape: EscapeParams,
    pub status: StatusParams,
    pub rewards: RewardParams,
}

impl BattleConfig {
    // ===== compile-time constants used as type parameters =====
    pub const MAX_STATUS_EFFECTS: usize = 8;
    pub const RANK_TIERS: usize = 7;

    pub fn new() -> Self {
        Self::default()
    }

    /// Checks cross-field constraints that `Default` always satisfies but a
    /// hand-written config file might not.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.damage.offense_divisor == 0 || self.damage.defense_divisor == 0 {
            return Err(ConfigError::ZeroDivisor);
        }
        if self.hit.evasion_divisor == 0 || self.hit.luck_divisor == 0 {
            return Err(ConfigError::ZeroDivisor);
        }
        if self.hit.min_hit_chance > self.hit.max_hit_chance {
            return Err(ConfigError::HitChanceRange {
                min: self.hit.min_hit_chance,
                max: self.hit.max_hit_chance,
            });
        }
        if self.gauge.maximum == 0 {
            return Err(ConfigError::ZeroGauge);
        }

        let tiers = &self.rewards.ranks;
        for (index, pair) in tiers.windows(2).enumerate() {
            let (lower, upper) = (&pair[0], &pair[1]);
            if upper.threshold <= lower.threshold {
                return Err(ConfigError::RankThresholds { tier: index + 1 });
            }
            if upper.experience_multiplier < lower.experience_multiplier
                || upper.currency_multiplier < lower.currency_multiplier
                || upper.drop_multiplier < lower.drop_multiplier
            {
                return Err(ConfigError::RankMultipliers { tier: index + 1 });
            }
        }
        if tiers[0].threshold != 0 {
            return Err(ConfigError::LowestRankThreshold(tiers[0].threshold));
        }
        Ok(())
    }
}

/// Inconsistent configuration values.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("divisors must be non-zero")]
    ZeroDivisor,

    #[error("min hit chance {min} exceeds max hit chance {max}")]
    HitChanceRange { min: u32, max: u32 },

    #[error("gauge maximum must be non-zero")]
    ZeroGauge,

    #[error("rank tier {tier} threshold must be strictly above the previous tier")]
    RankThresholds { tier: usize },

    #[error("rank tier {tier} multipliers must not decrease")]
    RankMultipliers { tier: usize },

    #[error("lowest rank tier must start at score 0, found {0}")]
    LowestRankThreshold(u32),
}

impl crate::error::BattleError for ConfigError {
    fn severity(&self) -> crate::error::ErrorSeverity {
        crate::error::ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroDivisor => "CONFIG_ZERO_DIVISOR",
            Self::HitChanceRange { .. } => "CONFIG_HIT_CHANCE_RANGE",
            Self::ZeroGauge => "CONFIG_ZERO_GAUGE",
            Self::RankThresholds { .. } => "CONFIG_RANK_THRESHOLDS",
            Self::RankMultipliers { .. } => "CONFIG_RANK_MULTIPLIERS",
            Self::LowestRankThreshold(_) => "CONFIG_LOWEST_RANK_THRESHOLD",
        }
    }
}

/// Base damage formula:
/// `max(minimum, power × offense / offense_divisor − defense / defense_divisor)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DamageParams {
    /// Skill power of a basic attack.
    pub attack_power: u32,
    pub offense_divisor: u32,
    pub defense_divisor: u32,
    pub minimum: u32,
    /// Percentage of damage a guarding target still takes.
    pub guard_multiplier: u32,
    /// Random spread in percent around 100 (0 disables variance).
    pub variance: u32,
}

impl Default for DamageParams {
    fn default() -> Self {
        Self {
            attack_power: 40,
            offense_divisor: 20,
            defense_divisor: 2,
            minimum: 1,
            guard_multiplier: 50,
            variance: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AffinityParams {
    pub weak_multiplier: u32,
    pub resist_multiplier: u32,
}

impl Default for AffinityParams {
    fn default() -> Self {
        Self {
            weak_multiplier: 150,
            resist_multiplier: 50,
        }
    }
}

/// Accuracy and critical-hit tuning.
///
/// Hit chance is `accuracy + (attacker speed − target speed) / evasion_divisor`
/// clamped to `[min_hit_chance, max_hit_chance]`; crit chance is
/// `base_crit_chance + skill bonus + luck / luck_divisor`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HitParams {
    pub base_accuracy: u32,
    pub min_hit_chance: u32,
    pub max_hit_chance: u32,
    pub evasion_divisor: i32,
    pub base_crit_chance: u32,
    pub luck_divisor: i32,
    pub crit_multiplier: u32,
}

impl Default for HitParams {
    fn default() -> Self {
        Self {
            base_accuracy: 95,
            min_hit_chance: 5,
            max_hit_chance: 100,
            evasion_divisor: 4,
            base_crit_chance: 3,
            luck_divisor: 5,
            crit_multiplier: 150,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TechnicalParams {
    pub multiplier: u32,
}

impl Default for TechnicalParams {
    fn default() -> Self {
        Self { multiplier: 150 }
    }
}

/// Turn transfer and finisher tuning.
///
/// The transfer multiplier at chain level `n ≥ 1` is
/// `transfer_base + transfer_step × (n − 1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChainParams {
    pub transfer_base: u32,
    pub transfer_step: u32,
    /// Skill power of the finisher, per participating attacker.
    pub finisher_power: u32,
    /// Rounds before the same side can open another finisher window.
    pub finisher_cooldown: u32,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            transfer_base: 150,
            transfer_step: 50,
            finisher_power: 60,
            finisher_cooldown: 1,
        }
    }
}

impl ChainParams {
    pub fn transfer_multiplier(&self, level: u32) -> u32 {
        if level == 0 {
            return 100;
        }
        self.transfer_base
            .saturating_add(self.transfer_step.saturating_mul(level - 1))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GaugeParams {
    pub maximum: u32,
    /// Gain per damaging hit landed.
    pub on_deal: u32,
    /// Gain per damaging hit received, before the HP-loss bonus.
    pub on_take: u32,
    /// Extra gain per this many percent of max HP lost in one hit.
    pub take_percent_step: u32,
    /// Skill power of a solo limit break.
    pub limit_break_power: u32,
}

impl Default for GaugeParams {
    fn default() -> Self {
        Self {
            maximum: 100,
            on_deal: 6,
            on_take: 10,
            take_percent_step: 5,
            limit_break_power: 180,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EscapeParams {
    pub base_chance: u32,
    /// Added for every failed attempt in the same battle.
    pub increment: u32,
}

impl Default for EscapeParams {
    fn default() -> Self {
        Self {
            base_chance: 40,
            increment: 20,
        }
    }
}

impl EscapeParams {
    pub fn chance(&self, failures: u32) -> u32 {
        self.base_chance
            .saturating_add(self.increment.saturating_mul(failures))
            .min(100)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StatusParams {
    /// Upper bound of the stack counter for stacking kinds.
    pub max_stacks: u32,
    /// Cap on a single damage-over-time tick, in percent of max HP.
    pub max_tick_percent: u32,
}

impl Default for StatusParams {
    fn default() -> Self {
        Self {
            max_stacks: 3,
            max_tick_percent: 25,
        }
    }
}

/// Score thresholds and reward multipliers of one rank tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankTier {
    pub threshold: u32,
    pub experience_multiplier: u32,
    pub currency_multiplier: u32,
    pub drop_multiplier: u32,
}

impl RankTier {
    pub const fn new(threshold: u32, experience: u32, currency: u32, drops: u32) -> Self {
        Self {
            threshold,
            experience_multiplier: experience,
            currency_multiplier: currency,
            drop_multiplier: drops,
        }
    }
}

/// Scoring weights and rank table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RewardParams {
    // ===== per-event points =====
    pub weakness_points: u32,
    pub critical_points: u32,
    pub technical_points: u32,
    pub finisher_points: u32,
    pub ultimate_points: u32,

    // ===== flat bonuses =====
    pub no_damage_bonus: u32,
    pub no_knockout_bonus: u32,
    pub no_item_bonus: u32,

    // ===== speed =====
    pub speed_points_per_turn: u32,
    pub turn_threshold: u32,
    pub boss_turn_threshold: u32,

    // ===== penalties =====
    pub knockout_penalty: u32,
    pub overtime_penalty_per_turn: u32,

    /// Ascending tiers, lowest first.
    pub ranks: [RankTier; BattleConfig::RANK_TIERS],
}

impl Default for RewardParams {
    fn default() -> Self {
        Self {
            weakness_points: 20,
            critical_points: 15,
            technical_points: 30,
            finisher_points: 60,
            ultimate_points: 50,
            no_damage_bonus: 300,
            no_knockout_bonus: 150,
            no_item_bonus: 100,
            speed_points_per_turn: 25,
            turn_threshold: 10,
            boss_turn_threshold: 20,
            knockout_penalty: 100,
            overtime_penalty_per_turn: 15,
            ranks: [
                RankTier::new(0, 100, 100, 100),
                RankTier::new(200, 110, 110, 105),
                RankTier::new(400, 120, 120, 110),
                RankTier::new(700, 135, 135, 120),
                RankTier::new(1000, 150, 150, 130),
                RankTier::new(1400, 175, 175, 150),
                RankTier::new(1900, 200, 200, 175),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(BattleConfig::default().validate(), Ok(()));
    }

    #[test]
    fn transfer_multiplier_scales_with_level() {
        let chain = ChainParams::default();
        assert_eq!(chain.transfer_multiplier(0), 100);
        assert_eq!(chain.transfer_multiplier(1), 150);
        assert_eq!(chain.transfer_multiplier(2), 200);
    }

    #[test]
    fn escape_chance_accumulates_and_caps() {
        let escape = EscapeParams {
            base_chance: 30,
            increment: 25,
        };
        assert_eq!(escape.chance(0), 30);
        assert_eq!(escape.chance(1), 55);
        assert_eq!(escape.chance(5), 100);
    }

    #[test]
    fn unordered_rank_thresholds_are_rejected() {
        let mut config = BattleConfig::default();
        config.rewards.ranks[3].threshold = 100;
        assert_eq!(
            config.validate(),
            Err(ConfigError::RankThresholds { tier: 3 })
        );
    }
}
