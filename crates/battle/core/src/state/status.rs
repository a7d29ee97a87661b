//! Status effect data carried by combatants.
//!
//! Status effects are timed conditions: damage/healing over time, action
//! prevention, reflection, a death countdown, and stat shifts. Every kind is a
//! variant of the closed [`StatusKind`] enum and describes its own behavior
//! through [`StatusKind::behavior`], so adding a kind is a compile-checked
//! change to the exhaustive matches below.
//!
//! This module only stores effects. Applying, ticking and expiring them is the
//! job of [`crate::combat::StatusEngine`], which owns the stat-modifier
//! bookkeeping.

use arrayvec::ArrayVec;

use super::stats::StatKind;
use crate::config::BattleConfig;

/// Types of status effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusKind {
    // ========================================================================
    // Damage over time
    // ========================================================================
    Poison,
    Burn,
    Bleed,

    // ========================================================================
    // Healing over time
    // ========================================================================
    Regen,

    // ========================================================================
    // Action prevention
    // ========================================================================
    Sleep,
    Stun,
    Freeze,
    Petrify,

    // ========================================================================
    // Special
    // ========================================================================
    /// Bounces magical damage back to its caster.
    Reflect,
    /// Lethal when the countdown reaches 1 at turn start.
    Doom,

    // ========================================================================
    // Stat shifts
    // ========================================================================
    AttackUp,
    AttackDown,
    DefenseUp,
    DefenseDown,
    SpeedUp,
    SpeedDown,
}

/// What a status kind does, dispatched by exhaustive match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusBehavior {
    /// Loses `potency`% of max HP per tick.
    DamageOverTime,
    /// Regains `potency`% of max HP per tick.
    HealOverTime,
    /// The bearer cannot act while this is active.
    PreventsAction,
    /// Magical damage aimed at the bearer is redirected to the attacker.
    Reflect,
    /// Kills the bearer when `remaining == 1` at turn start.
    Countdown,
    /// Adds `sign * potency`% of the stat at application time.
    StatShift { stat: StatKind, sign: i32 },
}

/// When the remaining duration of a status counts down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickPhase {
    /// Start of the bearer's own independent turn.
    TurnStart,
    /// End of the round, for every living combatant.
    RoundEnd,
}

impl StatusKind {
    pub const fn behavior(self) -> StatusBehavior {
        use StatusKind::*;
        match self {
            Poison | Burn | Bleed => StatusBehavior::DamageOverTime,
            Regen => StatusBehavior::HealOverTime,
            Sleep | Stun | Freeze | Petrify => StatusBehavior::PreventsAction,
            Reflect => StatusBehavior::Reflect,
            Doom => StatusBehavior::Countdown,
            AttackUp => StatusBehavior::StatShift {
                stat: StatKind::Attack,
                sign: 1,
            },
            AttackDown => StatusBehavior::StatShift {
                stat: StatKind::Attack,
                sign: -1,
            },
            DefenseUp => StatusBehavior::StatShift {
                stat: StatKind::Defense,
                sign: 1,
            },
            DefenseDown => StatusBehavior::StatShift {
                stat: StatKind::Defense,
                sign: -1,
            },
            SpeedUp => StatusBehavior::StatShift {
                stat: StatKind::Speed,
                sign: 1,
            },
            SpeedDown => StatusBehavior::StatShift {
                stat: StatKind::Speed,
                sign: -1,
            },
        }
    }

    pub const fn tick_phase(self) -> TickPhase {
        match self.behavior() {
            StatusBehavior::StatShift { .. } => TickPhase::RoundEnd,
            StatusBehavior::DamageOverTime
            | StatusBehavior::HealOverTime
            | StatusBehavior::PreventsAction
            | StatusBehavior::Reflect
            | StatusBehavior::Countdown => TickPhase::TurnStart,
        }
    }

    #[inline]
    pub const fn prevents_action(self) -> bool {
        matches!(self.behavior(), StatusBehavior::PreventsAction)
    }
}

/// How a new application interacts with an existing instance of the same kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StackRule {
    /// Increments the stack counter and keeps the longer duration.
    #[default]
    Stack,
    /// Replaces duration and power, keeping the stack counter.
    Refresh,
    /// Leaves an existing instance untouched.
    Ignore,
}

/// A stat delta recorded when a stat-shift status was applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AppliedShift {
    pub stat: StatKind,
    /// Delta actually written to the stat (after clamping).
    pub delta: i32,
}

/// A single active status effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveStatus {
    pub kind: StatusKind,
    /// Turns left. Zero or negative means expired, pending removal.
    pub remaining: i32,
    pub power: u32,
    pub stacks: u32,
    /// Present while a stat shift is in effect; taken on reversal.
    pub(crate) applied: Option<AppliedShift>,
}

impl ActiveStatus {
    pub fn new(kind: StatusKind, duration: i32, power: u32) -> Self {
        Self {
            kind,
            remaining: duration,
            power,
            stacks: 1,
            applied: None,
        }
    }

    /// Effective strength: `max(1, power × stacks)`.
    #[inline]
    pub fn potency(&self) -> u32 {
        self.power.saturating_mul(self.stacks).max(1)
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.remaining <= 0
    }

    /// The stat delta currently in effect, if any.
    pub fn applied_shift(&self) -> Option<AppliedShift> {
        self.applied
    }
}

/// Active status effects on a combatant.
///
/// Exposed read-only; all mutation goes through the status engine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusEffects {
    effects: ArrayVec<ActiveStatus, { BattleConfig::MAX_STATUS_EFFECTS }>,
}

impl StatusEffects {
    pub fn empty() -> Self {
        Self {
            effects: ArrayVec::new(),
        }
    }

    /// Returns true when a non-expired instance of `kind` exists.
    pub fn has(&self, kind: StatusKind) -> bool {
        self.get(kind).is_some_and(|status| !status.is_expired())
    }

    pub fn get(&self, kind: StatusKind) -> Option<&ActiveStatus> {
        self.effects.iter().find(|status| status.kind == kind)
    }

    /// Potency of `kind`, or 0 if absent.
    pub fn power(&self, kind: StatusKind) -> u32 {
        self.get(kind)
            .filter(|status| !status.is_expired())
            .map_or(0, ActiveStatus::potency)
    }

    /// Returns true if any action-preventing kind is active.
    pub fn prevents_action(&self) -> bool {
        self.effects
            .iter()
            .any(|status| status.kind.prevents_action() && !status.is_expired())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveStatus> {
        self.effects.iter()
    }

    pub fn kinds(&self) -> impl Iterator<Item = StatusKind> + '_ {
        self.effects.iter().map(|status| status.kind)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub(crate) fn get_mut(&mut self, kind: StatusKind) -> Option<&mut ActiveStatus> {
        self.effects.iter_mut().find(|status| status.kind == kind)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut ActiveStatus> {
        self.effects.iter_mut()
    }

    /// Inserts a new instance. Returns false when the set is full.
    pub(crate) fn insert(&mut self, status: ActiveStatus) -> bool {
        self.effects.try_push(status).is_ok()
    }

    pub(crate) fn take(&mut self, kind: StatusKind) -> Option<ActiveStatus> {
        let index = self.effects.iter().position(|status| status.kind == kind)?;
        Some(self.effects.remove(index))
    }

    pub(crate) fn expired_kinds(&self) -> ArrayVec<StatusKind, { BattleConfig::MAX_STATUS_EFFECTS }> {
        self.effects
            .iter()
            .filter(|status| status.is_expired())
            .map(|status| status.kind)
            .collect()
    }
}
