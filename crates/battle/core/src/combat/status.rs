//! Status effect engine.
//!
//! Applies, ticks and expires the statuses stored in
//! [`StatusEffects`](crate::state::StatusEffects). Stat-shift kinds write
//! their delta into the bearer's stats at application time and record the
//! delta that was actually applied; reversal always subtracts that recorded
//! value and takes it out of the status, so a shift is undone exactly once no
//! matter how many times the instance was stacked, refreshed, removed or
//! expired.

use arrayvec::ArrayVec;
use tracing::trace;

use crate::config::{BattleConfig, StatusParams};
use crate::state::{
    ActiveStatus, AppliedShift, Combatant, StackRule, StatusBehavior, StatusKind, Stats,
    TickPhase,
};

/// What an application did to the bearer's status list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Stacked,
    Refreshed,
    /// An existing instance was kept as is.
    Ignored,
    /// Bearer defeated, list full, or non-positive duration.
    Rejected,
}

impl ApplyOutcome {
    pub fn took_effect(self) -> bool {
        matches!(
            self,
            ApplyOutcome::Applied | ApplyOutcome::Stacked | ApplyOutcome::Refreshed
        )
    }
}

/// Effect of one status on one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusTick {
    pub kind: StatusKind,
    pub damage: u32,
    pub healing: u32,
    /// Duration left after this tick.
    pub remaining: i32,
    /// A countdown status killed the bearer.
    pub lethal: bool,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StatusEngine {
    params: StatusParams,
}

impl StatusEngine {
    pub fn new(params: StatusParams) -> Self {
        Self { params }
    }

    pub fn apply(
        &self,
        target: &mut Combatant,
        kind: StatusKind,
        duration: i32,
        power: u32,
        rule: StackRule,
    ) -> ApplyOutcome {
        if !target.is_alive() || duration <= 0 {
            return ApplyOutcome::Rejected;
        }
        if target.statuses.get(kind).is_some_and(ActiveStatus::is_expired) {
            self.remove(target, kind);
        }

        let max_stacks = self.params.max_stacks.max(1);
        let Combatant {
            stats, statuses, ..
        } = target;

        if let Some(existing) = statuses.get_mut(kind) {
            let outcome = match rule {
                StackRule::Ignore => return ApplyOutcome::Ignored,
                StackRule::Stack => {
                    disengage(stats, existing);
                    existing.stacks = (existing.stacks + 1).min(max_stacks);
                    existing.remaining = existing.remaining.max(duration);
                    existing.power = existing.power.max(power);
                    ApplyOutcome::Stacked
                }
                StackRule::Refresh => {
                    disengage(stats, existing);
                    existing.remaining = duration;
                    existing.power = power;
                    ApplyOutcome::Refreshed
                }
            };
            engage(stats, existing);
            return outcome;
        }

        if statuses.len() >= BattleConfig::MAX_STATUS_EFFECTS {
            return ApplyOutcome::Rejected;
        }
        let mut status = ActiveStatus::new(kind, duration, power);
        engage(stats, &mut status);
        statuses.insert(status);
        ApplyOutcome::Applied
    }

    /// Runs every status whose tick phase is `phase`, then decrements its
    /// duration. Expired instances are skipped and left for
    /// [`StatusEngine::remove_expired`].
    pub fn process(&self, target: &mut Combatant, phase: TickPhase) -> Vec<StatusTick> {
        let kinds: ArrayVec<StatusKind, { BattleConfig::MAX_STATUS_EFFECTS }> = target
            .statuses
            .iter()
            .filter(|status| status.kind.tick_phase() == phase && !status.is_expired())
            .map(|status| status.kind)
            .collect();

        let mut ticks = Vec::with_capacity(kinds.len());
        for kind in kinds {
            if !target.is_alive() || target.hp == 0 {
                break;
            }
            let Some(status) = target.statuses.get(kind).copied() else {
                continue;
            };

            let mut tick = StatusTick {
                kind,
                damage: 0,
                healing: 0,
                remaining: status.remaining - 1,
                lethal: false,
            };
            match kind.behavior() {
                StatusBehavior::DamageOverTime => {
                    let amount = self.tick_amount(target.max_hp, status.potency());
                    tick.damage = target.take_damage(amount);
                }
                StatusBehavior::HealOverTime => {
                    let amount = self.tick_amount(target.max_hp, status.potency());
                    tick.healing = target.heal(amount);
                }
                StatusBehavior::Countdown => {
                    if status.remaining == 1 {
                        tick.damage = target.take_damage(target.hp);
                        tick.lethal = true;
                    }
                }
                StatusBehavior::PreventsAction
                | StatusBehavior::Reflect
                | StatusBehavior::StatShift { .. } => {}
            }

            if let Some(status) = target.statuses.get_mut(kind) {
                status.remaining -= 1;
            }
            trace!(
                target: "battle::status",
                bearer = %target.id,
                status = %kind,
                damage = tick.damage,
                healing = tick.healing,
                remaining = tick.remaining,
                "status ticked"
            );
            ticks.push(tick);
        }
        ticks
    }

    /// Removes every expired instance, reversing its stat shift first.
    pub fn remove_expired(&self, target: &mut Combatant) -> Vec<StatusKind> {
        let expired = target.statuses.expired_kinds();
        for kind in &expired {
            self.remove(target, *kind);
        }
        expired.into_iter().collect()
    }

    /// Removes `kind`, reversing its stat shift. Returns false if absent.
    pub fn remove(&self, target: &mut Combatant, kind: StatusKind) -> bool {
        let Combatant {
            stats, statuses, ..
        } = target;
        let Some(status) = statuses.get_mut(kind) else {
            return false;
        };
        disengage(stats, status);
        statuses.take(kind).is_some()
    }

    /// Removes every status, reversing all stat shifts.
    pub fn clear_all(&self, target: &mut Combatant) -> Vec<StatusKind> {
        let kinds: Vec<StatusKind> = target.statuses.kinds().collect();
        for kind in &kinds {
            self.remove(target, *kind);
        }
        kinds
    }

    pub fn has(&self, target: &Combatant, kind: StatusKind) -> bool {
        target.statuses.has(kind)
    }

    pub fn power(&self, target: &Combatant, kind: StatusKind) -> u32 {
        target.statuses.power(kind)
    }

    /// False for defeated combatants and bearers of an action-preventing kind.
    pub fn can_act(&self, target: &Combatant) -> bool {
        target.is_alive() && target.hp > 0 && !target.statuses.prevents_action()
    }

    fn tick_amount(&self, max_hp: u32, potency: u32) -> u32 {
        let amount = (max_hp as u64 * potency as u64 / 100).max(1);
        let cap = (max_hp as u64 * self.params.max_tick_percent as u64 / 100).max(1);
        amount.min(cap) as u32
    }
}

/// Writes the stat shift of `status` (if any) into `stats`.
fn engage(stats: &mut Stats, status: &mut ActiveStatus) {
    let StatusBehavior::StatShift { stat, sign } = status.kind.behavior() else {
        return;
    };
    let base = stats.get(stat).max(0) as i64;
    let magnitude = (base * status.potency() as i64 / 100).max(1) as i32;
    let delta = stats.shift(stat, sign * magnitude);
    status.applied = Some(AppliedShift { stat, delta });
}

/// Reverses the recorded shift of `status`, at most once.
fn disengage(stats: &mut Stats, status: &mut ActiveStatus) {
    if let Some(shift) = status.applied.take() {
        stats.unshift(shift.stat, shift.delta);
    }
}
