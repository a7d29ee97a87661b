//! Chain mechanics: extra turns, turn transfers, finishers and ultimates.
//!
//! The controller is stateless apart from its tuning; the per-sequence data
//! lives in [`ChainState`](crate::state::ChainState) and in combatant flags so
//! the scheduler stays the single owner of battle state.
//!
//! Four privileges are tracked:
//!
//! 1. **Extra turn**: granted when a hit lands a weakness or a critical on a
//!    living opponent that was not already down. Stored as
//!    [`BattleFlags::EXTRA_TURN`]; at most one combatant holds it.
//! 2. **Turn transfer**: the holder passes its extra turn to an ally, raising
//!    the chain level and giving the receiver a damage multiplier.
//! 3. **Finisher**: opens for a side once every living opponent is downed.
//! 4. **Ultimate**: usable once the gauge is full, solo or as a duo.
mod error;

pub use error::ChainError;

use tracing::debug;

use crate::combat::ActionResult;
use crate::config::{BattleConfig, ChainParams, GaugeParams};
use crate::env::DuoDefinition;
use crate::state::{BattleFlags, BattleState, CombatantId, Side};

/// Something the controller granted while processing a resolved action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainTrigger {
    Knockdown(CombatantId),
    ExtraTurnGranted(CombatantId),
    FinisherAvailable(Side),
    UltimateReady(CombatantId),
}

#[derive(Clone, Copy, Debug)]
pub struct ChainController {
    chain: ChainParams,
    gauge: GaugeParams,
}

impl ChainController {
    pub fn new(config: &BattleConfig) -> Self {
        Self {
            chain: config.chain,
            gauge: config.gauge,
        }
    }

    // ========================================================================
    // Turn boundaries
    // ========================================================================

    /// Prepares `actor` for a turn.
    ///
    /// An independent turn resets the chain sequence and lets a downed actor
    /// get up. Every turn clears the actor's guard.
    pub fn begin_turn(&self, state: &mut BattleState, actor: CombatantId, independent: bool) {
        if independent {
            if let Some(holder) = state.chain.bonus_holder
                && let Some(combatant) = state.combatant_mut(holder)
            {
                combatant.flags.remove(BattleFlags::TRANSFER_BONUS);
            }
            state.chain.reset_sequence();
        }

        if let Some(combatant) = state.combatant_mut(actor) {
            combatant.flags.remove(BattleFlags::GUARDING);
            if independent {
                combatant.flags.remove(BattleFlags::DOWNED);
            }
        }
    }

    /// Current holder of an unconsumed extra turn.
    pub fn extra_turn_holder(&self, state: &BattleState) -> Option<CombatantId> {
        state
            .combatants()
            .find(|combatant| combatant.is_alive() && combatant.has_extra_turn())
            .map(|combatant| combatant.id)
    }

    /// Consumes the extra turn at the start of the holder's action.
    pub fn consume_extra_turn(&self, state: &mut BattleState, actor: CombatantId) -> bool {
        state.combatant_mut(actor).is_some_and(|combatant| {
            let held = combatant.has_extra_turn();
            combatant.flags.remove(BattleFlags::EXTRA_TURN);
            held
        })
    }

    /// Damage multiplier (percent) for the actor's hits in this sequence.
    pub fn damage_multiplier(&self, state: &BattleState, actor: CombatantId) -> u32 {
        let holds_bonus = state
            .combatant(actor)
            .is_some_and(|combatant| combatant.flags.contains(BattleFlags::TRANSFER_BONUS));
        if holds_bonus {
            self.chain.transfer_multiplier(state.chain.level)
        } else {
            100
        }
    }

    // ========================================================================
    // Resolution feedback
    // ========================================================================

    /// Applies knockdowns, gauge gains and privilege grants for a resolved
    /// action. No extra turn is granted when the action ended the battle.
    pub fn on_action_resolved(
        &self,
        state: &mut BattleState,
        result: &ActionResult,
        battle_over: bool,
    ) -> Vec<ChainTrigger> {
        let mut triggers = Vec::new();
        let actor = result.actor;
        let Some(actor_side) = state.combatant(actor).map(|combatant| combatant.side) else {
            return triggers;
        };

        let mut earned_extra_turn = false;
        for outcome in &result.outcomes {
            if outcome.recipient == actor || outcome.evaded || outcome.nullified {
                continue;
            }

            if outcome.damage > 0 {
                self.gain_gauge(state, actor, self.gauge.on_deal, &mut triggers);
                let take_gain = self.take_gain(state, outcome.recipient, outcome.damage);
                self.gain_gauge(state, outcome.recipient, take_gain, &mut triggers);
            }

            if !(outcome.weakness || outcome.critical) || outcome.was_downed {
                continue;
            }
            let Some(target) = state.combatant_mut(outcome.recipient) else {
                continue;
            };
            if !target.is_alive() || target.hp == 0 || target.side == actor_side {
                continue;
            }
            if !target.is_guarding() {
                target.flags.insert(BattleFlags::DOWNED);
                triggers.push(ChainTrigger::Knockdown(target.id));
            }
            earned_extra_turn = true;
        }

        let actor_alive = state.combatant(actor).is_some_and(|c| c.is_alive() && c.hp > 0);
        if earned_extra_turn && !battle_over && actor_alive {
            if let Some(combatant) = state.combatant_mut(actor) {
                combatant.flags.insert(BattleFlags::EXTRA_TURN);
            }
            debug!(target: "battle::chain", actor = %actor, "extra turn granted");
            triggers.push(ChainTrigger::ExtraTurnGranted(actor));
        }

        if !battle_over && let Some(side) = self.refresh_finisher_window(state, actor_side) {
            triggers.push(ChainTrigger::FinisherAvailable(side));
        }

        triggers
    }

    fn take_gain(&self, state: &BattleState, recipient: CombatantId, damage: u32) -> u32 {
        let Some(combatant) = state.combatant(recipient) else {
            return 0;
        };
        if combatant.max_hp == 0 || self.gauge.take_percent_step == 0 {
            return self.gauge.on_take;
        }
        let percent = (damage as u64 * 100 / combatant.max_hp as u64) as u32;
        self.gauge.on_take + percent / self.gauge.take_percent_step
    }

    fn gain_gauge(
        &self,
        state: &mut BattleState,
        id: CombatantId,
        amount: u32,
        triggers: &mut Vec<ChainTrigger>,
    ) {
        let maximum = self.gauge.maximum;
        let Some(combatant) = state.combatant_mut(id) else {
            return;
        };
        if !combatant.is_alive() || amount == 0 {
            return;
        }
        let before = combatant.gauge;
        combatant.gauge = before.saturating_add(amount).min(maximum);
        if before < maximum && combatant.gauge == maximum {
            triggers.push(ChainTrigger::UltimateReady(id));
        }
    }

    // ========================================================================
    // Turn transfer
    // ========================================================================

    /// Allies of `from` that may receive its extra turn.
    pub fn transfer_candidates(&self, state: &BattleState, from: CombatantId) -> Vec<CombatantId> {
        let Some(holder) = state.combatant(from) else {
            return Vec::new();
        };
        if !holder.has_extra_turn() {
            return Vec::new();
        }
        state
            .living(holder.side)
            .filter(|ally| ally.id != from)
            .filter(|ally| !state.chain.received.contains(&ally.id))
            .filter(|ally| !ally.statuses().prevents_action())
            .map(|ally| ally.id)
            .collect()
    }

    /// Passes the extra turn of `from` to `to`. Returns the new chain level.
    pub fn transfer(
        &self,
        state: &mut BattleState,
        from: CombatantId,
        to: CombatantId,
    ) -> Result<u32, ChainError> {
        let holds = state
            .combatant(from)
            .is_some_and(|combatant| combatant.is_alive() && combatant.has_extra_turn());
        if !holds {
            return Err(ChainError::NoExtraTurn(from));
        }
        if state.chain.received.contains(&to) {
            return Err(ChainError::AlreadyReceived(to));
        }
        if !self.transfer_candidates(state, from).contains(&to) {
            return Err(ChainError::InvalidTransferTarget(to));
        }

        if let Some(previous) = state.chain.bonus_holder
            && let Some(combatant) = state.combatant_mut(previous)
        {
            combatant.flags.remove(BattleFlags::TRANSFER_BONUS);
        }
        if let Some(combatant) = state.combatant_mut(from) {
            combatant.flags.remove(BattleFlags::EXTRA_TURN);
        }
        if let Some(combatant) = state.combatant_mut(to) {
            combatant
                .flags
                .insert(BattleFlags::EXTRA_TURN | BattleFlags::TRANSFER_BONUS);
        }

        // The originator never gets the turn back within its own sequence.
        if state.chain.level == 0 {
            state.chain.received.insert(from);
        }
        state.chain.level += 1;
        state.chain.bonus_holder = Some(to);
        state.chain.received.insert(to);

        debug!(
            target: "battle::chain",
            from = %from,
            to = %to,
            level = state.chain.level,
            "turn transferred"
        );
        Ok(state.chain.level)
    }

    // ========================================================================
    // Finisher
    // ========================================================================

    fn finisher_condition(state: &BattleState, side: Side) -> bool {
        let mut opponents = state.living(side.opposing()).peekable();
        opponents.peek().is_some() && opponents.all(|opponent| opponent.is_downed())
    }

    /// Closes a window whose condition lapsed, then opens one for `side` if
    /// its condition holds. Returns the side of a newly opened window.
    pub fn refresh_finisher_window(&self, state: &mut BattleState, side: Side) -> Option<Side> {
        if let Some(open) = state.chain.finisher_window
            && !Self::finisher_condition(state, open)
        {
            state.chain.finisher_window = None;
        }

        if state.chain.finisher_window.is_none()
            && state.chain.cooldown(side) == 0
            && Self::finisher_condition(state, side)
        {
            state.chain.finisher_window = Some(side);
            debug!(target: "battle::chain", side = %side, "finisher window opened");
            return Some(side);
        }
        None
    }

    pub fn finisher_available(&self, state: &BattleState, side: Side) -> bool {
        state.chain.finisher_window == Some(side)
            && state.chain.cooldown(side) == 0
            && Self::finisher_condition(state, side)
    }

    pub fn ensure_finisher(&self, state: &BattleState, side: Side) -> Result<(), ChainError> {
        let cooldown = state.chain.cooldown(side);
        if cooldown > 0 {
            return Err(ChainError::FinisherCoolingDown { rounds: cooldown });
        }
        if !self.finisher_available(state, side) {
            return Err(ChainError::FinisherUnavailable);
        }
        Ok(())
    }

    /// Closes the window after a finisher: targets get up and the side's
    /// cooldown starts.
    pub fn consume_finisher(&self, state: &mut BattleState, side: Side) {
        state.chain.finisher_window = None;
        state.chain.set_cooldown(side, self.chain.finisher_cooldown);
        for combatant in state.combatants_mut() {
            if combatant.side == side.opposing() {
                combatant.flags.remove(BattleFlags::DOWNED);
            }
        }
    }

    // ========================================================================
    // Ultimates
    // ========================================================================

    pub fn ultimate_ready(&self, state: &BattleState, id: CombatantId) -> bool {
        state
            .combatant(id)
            .is_some_and(|combatant| combatant.is_alive() && combatant.gauge >= self.gauge.maximum)
    }

    pub fn ensure_ultimate(&self, state: &BattleState, actor: CombatantId) -> Result<(), ChainError> {
        if self.ultimate_ready(state, actor) {
            return Ok(());
        }
        let gauge = state.combatant(actor).map_or(0, |combatant| combatant.gauge);
        Err(ChainError::GaugeNotFull { actor, gauge })
    }

    /// Checks a duo ultimate for `actor` and returns the partner.
    pub fn ensure_duo(
        &self,
        state: &BattleState,
        actor: CombatantId,
        duo: &DuoDefinition,
    ) -> Result<CombatantId, ChainError> {
        let Some(combatant) = state.combatant(actor) else {
            return Err(ChainError::NotDuoMember {
                duo: duo.id.clone(),
                actor,
            });
        };
        if !duo.involves(&combatant.key) {
            return Err(ChainError::NotDuoMember {
                duo: duo.id.clone(),
                actor,
            });
        }
        self.ensure_ultimate(state, actor)?;

        let partner_key = duo
            .members
            .iter()
            .find(|member| **member != combatant.key)
            .ok_or_else(|| ChainError::DuoPartnerUnavailable(duo.id.clone()))?;
        let partner = state
            .living(combatant.side)
            .find(|ally| &ally.key == partner_key)
            .map(|ally| ally.id)
            .ok_or_else(|| ChainError::DuoPartnerUnavailable(duo.id.clone()))?;
        if !self.ultimate_ready(state, partner) {
            return Err(ChainError::DuoPartnerUnavailable(duo.id.clone()));
        }
        Ok(partner)
    }

    /// Duos `actor` could launch right now: both members alive with a full
    /// gauge.
    pub fn ready_duos<'d>(
        &self,
        state: &BattleState,
        actor: CombatantId,
        duos: &'d [DuoDefinition],
    ) -> Vec<&'d DuoDefinition> {
        duos.iter()
            .filter(|duo| self.ensure_duo(state, actor, duo).is_ok())
            .collect()
    }

    pub fn consume_gauge(&self, state: &mut BattleState, id: CombatantId) {
        if let Some(combatant) = state.combatant_mut(id) {
            combatant.gauge = 0;
        }
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Revokes every privilege owned by a combatant leaving the battle.
    /// Returns true if an unconsumed extra turn was revoked.
    pub fn revoke(&self, state: &mut BattleState, id: CombatantId) -> bool {
        if state.chain.bonus_holder == Some(id) {
            state.chain.bonus_holder = None;
        }
        let Some(combatant) = state.combatant_mut(id) else {
            return false;
        };
        let had_extra_turn = combatant.has_extra_turn();
        combatant.flags.remove(
            BattleFlags::EXTRA_TURN
                | BattleFlags::TRANSFER_BONUS
                | BattleFlags::DOWNED
                | BattleFlags::GUARDING,
        );
        combatant.gauge = 0;
        had_extra_turn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::TargetOutcome;
    use crate::state::{CombatantTemplate, EncounterSettings, Stats};

    fn state() -> BattleState {
        let member = |key: &str| {
            CombatantTemplate::new(key, key, 100, 20, Stats::new(20, 10, 20, 10, 10, 5))
        };
        BattleState::new(
            &[member("a"), member("b"), member("c")],
            &[member("x"), member("y")],
            EncounterSettings::default(),
        )
        .unwrap()
    }

    fn weakness_hit(actor: u32, target: u32) -> ActionResult {
        let mut outcome = TargetOutcome::new(CombatantId(target));
        outcome.damage = 10;
        outcome.weakness = true;
        ActionResult::new(CombatantId(actor), vec![outcome])
    }

    #[test]
    fn weakness_hit_knocks_down_and_grants_extra_turn() {
        let controller = ChainController::new(&BattleConfig::default());
        let mut state = state();

        let triggers = controller.on_action_resolved(&mut state, &weakness_hit(0, 3), false);
        assert!(triggers.contains(&ChainTrigger::Knockdown(CombatantId(3))));
        assert!(triggers.contains(&ChainTrigger::ExtraTurnGranted(CombatantId(0))));
        assert_eq!(controller.extra_turn_holder(&state), Some(CombatantId(0)));
    }

    #[test]
    fn no_extra_turn_when_battle_ends_or_target_already_down() {
        let controller = ChainController::new(&BattleConfig::default());
        let mut state = state();

        let triggers = controller.on_action_resolved(&mut state, &weakness_hit(0, 3), true);
        assert!(!triggers.contains(&ChainTrigger::ExtraTurnGranted(CombatantId(0))));
        assert_eq!(controller.extra_turn_holder(&state), None);

        let mut result = weakness_hit(1, 3);
        result.outcomes[0].was_downed = true;
        let triggers = controller.on_action_resolved(&mut state, &result, false);
        assert!(triggers.is_empty());
        assert_eq!(controller.extra_turn_holder(&state), None);
    }

    #[test]
    fn transfer_escalates_chain_level() {
        let controller = ChainController::new(&BattleConfig::default());
        let mut state = state();
        controller.on_action_resolved(&mut state, &weakness_hit(0, 3), false);

        assert_eq!(
            controller.transfer_candidates(&state, CombatantId(0)),
            vec![CombatantId(1), CombatantId(2)]
        );
        assert_eq!(controller.transfer(&mut state, CombatantId(0), CombatantId(1)), Ok(1));
        assert_eq!(controller.damage_multiplier(&state, CombatantId(1)), 150);
        assert_eq!(controller.damage_multiplier(&state, CombatantId(0)), 100);

        assert_eq!(
            controller.transfer(&mut state, CombatantId(0), CombatantId(2)),
            Err(ChainError::NoExtraTurn(CombatantId(0)))
        );
        assert_eq!(controller.transfer(&mut state, CombatantId(1), CombatantId(2)), Ok(2));
        assert_eq!(controller.damage_multiplier(&state, CombatantId(2)), 200);
        assert_eq!(
            controller.transfer(&mut state, CombatantId(2), CombatantId(1)),
            Err(ChainError::AlreadyReceived(CombatantId(1)))
        );
        assert!(controller.transfer_candidates(&state, CombatantId(2)).is_empty());

        controller.begin_turn(&mut state, CombatantId(3), true);
        assert_eq!(state.chain.level, 0);
        assert_eq!(controller.damage_multiplier(&state, CombatantId(2)), 100);
    }

    #[test]
    fn originator_cannot_take_the_turn_back() {
        let controller = ChainController::new(&BattleConfig::default());
        let mut state = state();
        controller.on_action_resolved(&mut state, &weakness_hit(0, 3), false);
        controller.transfer(&mut state, CombatantId(0), CombatantId(1)).unwrap();

        assert_eq!(
            controller.transfer_candidates(&state, CombatantId(1)),
            vec![CombatantId(2)]
        );
        assert_eq!(
            controller.transfer(&mut state, CombatantId(1), CombatantId(0)),
            Err(ChainError::AlreadyReceived(CombatantId(0)))
        );
    }

    #[test]
    fn revoked_privileges_disappear_with_the_owner() {
        let controller = ChainController::new(&BattleConfig::default());
        let mut state = state();
        controller.on_action_resolved(&mut state, &weakness_hit(0, 3), false);

        assert!(controller.revoke(&mut state, CombatantId(0)));
        assert_eq!(controller.extra_turn_holder(&state), None);
    }

    #[test]
    fn gauge_fills_faster_when_taking_damage() {
        let controller = ChainController::new(&BattleConfig::default());
        let mut state = state();
        let mut outcome = TargetOutcome::new(CombatantId(3));
        outcome.damage = 20;
        controller.on_action_resolved(
            &mut state,
            &ActionResult::new(CombatantId(0), vec![outcome]),
            false,
        );

        let dealer = state.combatant(CombatantId(0)).unwrap().gauge;
        let taker = state.combatant(CombatantId(3)).unwrap().gauge;
        assert_eq!(dealer, 6);
        assert_eq!(taker, 14);
        assert!(taker > dealer);
    }
}
