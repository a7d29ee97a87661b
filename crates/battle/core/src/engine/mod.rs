//! Battle session driver.
//!
//! [`BattleEngine`] owns the [`BattleState`] of one battle and is the only
//! component that mutates it structurally. A session runs as:
//!
//! ```text
//! start() ─► next_turn() ─► submit_action() / take_opponent_turn()
//!               ▲               │          / transfer_turn()
//!               └───────────────┘
//!           ... until TurnPrompt::Ended ─► finish()
//! ```
//!
//! Every step pushes [`BattleEvent`]s that collaborators drain at will.
mod errors;
mod events;
mod turns;

pub use errors::EngineError;
pub use events::{BattleEvent, EventQueue};
pub use turns::{TurnInfo, TurnPrompt};

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::action::{self, BattleAction, PreparedAction, PreparedKind, hp_cost};
use crate::chain::{ChainController, ChainTrigger};
use crate::combat::{ActionResult, DamageResolver, StatusEngine};
use crate::config::BattleConfig;
use crate::env::{
    BattleEnv, CatalogOracle, DuoId, InventoryService, RngOracle, RollContext, SkillCost,
    compute_seed,
};
use crate::opponent::{DecisionEngine, OpponentProfile};
use crate::rewards::{BattleRewards, RewardCalculator};
use crate::state::{
    BattleMetrics, BattleOutcome, BattlePhase, BattleState, Combatant, CombatantId, Round, Side,
};

/// The turn currently waiting for an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ActiveTurn {
    actor: CombatantId,
    /// Served from the round queue rather than from an extra turn.
    independent: bool,
}

/// Final report returned by [`BattleEngine::finish`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleSummary {
    pub outcome: BattleOutcome,
    pub rounds: Round,
    pub metrics: BattleMetrics,
    /// Present only for a victory.
    pub rewards: Option<BattleRewards>,
    /// Party members in their post-battle condition, for copy-back.
    pub party: Vec<Combatant>,
    /// Events not drained before the battle was finished.
    pub events: Vec<BattleEvent>,
}

pub struct BattleEngine<'a> {
    state: BattleState,
    env: BattleEnv<'a>,
    catalog: &'a dyn CatalogOracle,
    config: &'a BattleConfig,
    rng: &'a dyn RngOracle,
    inventory: &'a mut dyn InventoryService,
    status: StatusEngine,
    chain: ChainController,
    rewards: RewardCalculator,
    opponents: DecisionEngine,
    profiles: BTreeMap<CombatantId, OpponentProfile>,
    events: EventQueue,
    turn: Option<ActiveTurn>,
    /// Order the current round was built in; round-end ticks follow it.
    round_order: Vec<CombatantId>,
}

impl<'a> BattleEngine<'a> {
    /// Creates an engine for a freshly initialized state.
    ///
    /// # Errors
    ///
    /// Fails when the environment lacks the catalog, the RNG or the config,
    /// when the config is inconsistent, or when `state` already started.
    pub fn new(
        state: BattleState,
        env: BattleEnv<'a>,
        inventory: &'a mut dyn InventoryService,
    ) -> Result<Self, EngineError> {
        let config = env.config()?;
        let rng = env.rng()?;
        let catalog = env.catalog()?;
        config.validate()?;
        if state.phase != BattlePhase::Initializing {
            return Err(EngineError::AlreadyStarted);
        }

        Ok(Self {
            state,
            env,
            catalog,
            config,
            rng,
            inventory,
            status: StatusEngine::new(config.status),
            chain: ChainController::new(config),
            rewards: RewardCalculator::new(config.rewards),
            opponents: DecisionEngine::default(),
            profiles: BTreeMap::new(),
            events: EventQueue::new(),
            turn: None,
            round_order: Vec::new(),
        })
    }

    /// Hands `id` over to the decision engine.
    #[must_use]
    pub fn with_profile(mut self, id: CombatantId, profile: OpponentProfile) -> Self {
        self.set_profile(id, profile);
        self
    }

    pub fn set_profile(&mut self, id: CombatantId, profile: OpponentProfile) {
        self.profiles.insert(id, profile);
    }

    #[must_use]
    pub fn with_decision_engine(mut self, opponents: DecisionEngine) -> Self {
        self.opponents = opponents;
        self
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn phase(&self) -> BattlePhase {
        self.state.phase
    }

    pub fn current_actor(&self) -> Option<CombatantId> {
        self.turn.map(|turn| turn.actor)
    }

    pub fn profile(&self, id: CombatantId) -> Option<&OpponentProfile> {
        self.profiles.get(&id)
    }

    pub fn decision_engine(&self) -> &DecisionEngine {
        &self.opponents
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<BattleEvent> {
        self.events.drain()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Leaves initialization and builds the first round's turn order.
    ///
    /// # Errors
    ///
    /// [`EngineError::AlreadyStarted`] when called twice.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.state.phase != BattlePhase::Initializing {
            return Err(EngineError::AlreadyStarted);
        }
        self.state.metrics.reset();
        info!(
            target: "battle::engine",
            party = self.state.living(Side::Party).count(),
            enemies = self.state.living(Side::Enemy).count(),
            seed = self.state.encounter.seed,
            boss = self.state.encounter.boss,
            "battle started"
        );
        self.begin_round();
        Ok(())
    }

    /// Ends the battle immediately without rewards.
    pub fn abort(&mut self) -> Result<(), EngineError> {
        if let BattlePhase::Ended(outcome) = self.state.phase {
            return Err(EngineError::AlreadyEnded(outcome));
        }
        self.end(BattleOutcome::Aborted);
        Ok(())
    }

    /// Consumes the ended engine. A victory computes and grants rewards:
    /// experience goes to the living party members, currency and drops to
    /// the inventory.
    ///
    /// # Errors
    ///
    /// [`EngineError::StillRunning`] while the battle has not ended.
    pub fn finish(mut self) -> Result<BattleSummary, EngineError> {
        let BattlePhase::Ended(outcome) = self.state.phase else {
            return Err(EngineError::StillRunning);
        };

        let rewards = if outcome == BattleOutcome::Victory {
            let rewards = self.rewards.compute(&self.state, self.rng);
            self.rewards
                .grant(&mut self.state, &rewards, &mut *self.inventory);
            self.events.push(BattleEvent::RewardsGranted {
                rank: rewards.rank,
                experience: rewards.experience_awarded(),
                currency: rewards.currency,
            });
            Some(rewards)
        } else {
            None
        };

        let events = self.events.drain();
        Ok(BattleSummary {
            outcome,
            rounds: self.state.round,
            metrics: self.state.metrics,
            rewards,
            events,
            party: self.state.into_party(),
        })
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Validates and executes `action` for the actor holding the turn.
    ///
    /// Costs are paid before resolution. A rejected action changes nothing
    /// and the same actor may resubmit.
    ///
    /// # Errors
    ///
    /// [`EngineError::Action`] or [`EngineError::Chain`] for a rejected
    /// action, [`EngineError::NoActiveTurn`] when no turn is open.
    pub fn submit_action(&mut self, action: BattleAction) -> Result<ActionResult, EngineError> {
        let turn = self.active_turn()?;
        if action.actor != turn.actor {
            return Err(action::ActionError::NotActorsTurn {
                actual: action.actor,
            }
            .into());
        }
        let prepared = action::validate(
            &self.state,
            &self.env,
            &*self.inventory,
            &self.chain,
            &self.status,
            &action,
        )?;

        self.pay_costs(&prepared)?;
        self.chain.consume_extra_turn(&mut self.state, prepared.actor);
        self.state.phase = BattlePhase::ActionResolution;

        let result = self.execute(&prepared);
        self.record(&action, &prepared, &result);

        self.state.phase = BattlePhase::PostActionBookkeeping;
        self.settle_defeats();
        let outcome = self.check_outcome().or_else(|| {
            (result.escaped == Some(true)).then_some(BattleOutcome::Escaped)
        });

        let triggers = self
            .chain
            .on_action_resolved(&mut self.state, &result, outcome.is_some());
        for trigger in triggers {
            self.events.push(match trigger {
                ChainTrigger::Knockdown(target) => BattleEvent::Knockdown { target },
                ChainTrigger::ExtraTurnGranted(actor) => BattleEvent::ExtraTurnGranted { actor },
                ChainTrigger::FinisherAvailable(side) => BattleEvent::FinisherAvailable { side },
                ChainTrigger::UltimateReady(actor) => BattleEvent::UltimateReady { actor },
            });
        }

        if prepared.side == Side::Party {
            self.state.metrics.turns_elapsed += 1;
        }
        self.state.nonce += 1;
        self.turn = None;
        self.state.current = None;
        if let Some(outcome) = outcome {
            self.end(outcome);
        }
        Ok(result)
    }

    /// Executes a duo ultimate for the actor holding the turn.
    pub fn execute_duo(
        &mut self,
        duo: impl Into<DuoId>,
    ) -> Result<ActionResult, EngineError> {
        let turn = self.active_turn()?;
        self.submit_action(BattleAction::duo(turn.actor, duo))
    }

    /// Lets the decision engine act for the actor holding the turn. An actor
    /// without a registered profile uses the default one. A decision that
    /// fails validation falls back to guarding.
    ///
    /// # Errors
    ///
    /// [`EngineError::Oracle`] when the decision or its validation needs a
    /// catalog entry that does not exist; the turn stays open.
    pub fn take_opponent_turn(&mut self) -> Result<ActionResult, EngineError> {
        let turn = self.active_turn()?;
        let profile = self.profiles.get(&turn.actor).cloned().unwrap_or_default();
        let action = self
            .opponents
            .decide(&self.state, self.env, turn.actor, &profile)?;

        match self.submit_action(action) {
            Err(err) if err.is_rejection() => {
                warn!(
                    target: "battle::opponent",
                    actor = %turn.actor,
                    error = %err,
                    "decision rejected, guarding instead"
                );
                self.submit_action(BattleAction::guard(turn.actor))
            }
            other => other,
        }
    }

    /// Allies the current actor may pass its extra turn to.
    pub fn transfer_candidates(&self) -> Vec<CombatantId> {
        self.turn
            .map(|turn| self.chain.transfer_candidates(&self.state, turn.actor))
            .unwrap_or_default()
    }

    /// Passes the current extra turn to `to` instead of acting. Returns the
    /// new chain level; `to` is served next.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoExtraTurn`] when the turn is an independent one,
    /// [`EngineError::Chain`] when `to` cannot receive it.
    pub fn transfer_turn(&mut self, to: CombatantId) -> Result<u32, EngineError> {
        let turn = self.active_turn()?;
        let holds = self
            .state
            .combatant(turn.actor)
            .is_some_and(|combatant| combatant.has_extra_turn());
        if !holds {
            return Err(EngineError::NoExtraTurn(turn.actor));
        }

        let chain_level = self.chain.transfer(&mut self.state, turn.actor, to)?;
        self.events.push(BattleEvent::TurnTransferred {
            from: turn.actor,
            to,
            chain_level,
        });
        self.turn = None;
        self.state.current = None;
        Ok(chain_level)
    }

    fn pay_costs(&mut self, prepared: &PreparedAction) -> Result<(), EngineError> {
        let actor = prepared.actor;
        match &prepared.kind {
            PreparedKind::Skill(skill) => {
                if let Some(combatant) = self.state.combatant_mut(actor) {
                    match skill.cost {
                        SkillCost::None => {}
                        SkillCost::Mp(mp) => combatant.mp = combatant.mp.saturating_sub(mp),
                        SkillCost::HpPercent(percent) => {
                            let cost = hp_cost(combatant.max_hp, percent);
                            combatant.hp = combatant.hp.saturating_sub(cost);
                        }
                    }
                }
            }
            PreparedKind::Item(item) => self.inventory.consume(&item.id, 1)?,
            PreparedKind::LimitBreak => self.chain.consume_gauge(&mut self.state, actor),
            PreparedKind::Duo { partner, .. } => {
                self.chain.consume_gauge(&mut self.state, actor);
                self.chain.consume_gauge(&mut self.state, *partner);
            }
            PreparedKind::Attack
            | PreparedKind::Guard
            | PreparedKind::Escape
            | PreparedKind::AllOutAttack => {}
        }
        Ok(())
    }

    fn execute(&mut self, prepared: &PreparedAction) -> ActionResult {
        if matches!(prepared.kind, PreparedKind::Escape) {
            return self.attempt_escape(prepared.actor);
        }

        let bonus = self.chain.damage_multiplier(&self.state, prepared.actor);
        let result =
            DamageResolver::new(self.config, self.rng).resolve(&mut self.state, prepared, bonus);

        match &prepared.kind {
            PreparedKind::AllOutAttack => {
                self.chain.consume_finisher(&mut self.state, prepared.side);
                self.events.push(BattleEvent::FinisherUsed {
                    actor: prepared.actor,
                    side: prepared.side,
                });
            }
            PreparedKind::LimitBreak | PreparedKind::Duo { .. } => {
                self.events.push(BattleEvent::UltimateUsed {
                    actor: prepared.actor,
                    duo: matches!(prepared.kind, PreparedKind::Duo { .. }),
                });
            }
            _ => {}
        }
        result
    }

    fn attempt_escape(&mut self, actor: CombatantId) -> ActionResult {
        let chance = self.config.escape.chance(self.state.escape_failures);
        let seed = compute_seed(
            self.state.encounter.seed,
            self.state.nonce,
            actor.0,
            RollContext::Escape.for_slot(0),
        );
        let roll = self.rng.roll_d100(seed);
        let success = roll <= chance;
        if !success {
            self.state.escape_failures += 1;
        }
        debug!(
            target: "battle::engine",
            actor = %actor,
            chance,
            roll,
            success,
            "escape attempted"
        );
        self.events.push(BattleEvent::EscapeAttempted {
            actor,
            chance,
            success,
        });
        ActionResult::escape(actor, success)
    }

    /// Updates metrics, emits action events and feeds the weakness memory.
    fn record(&mut self, action: &BattleAction, prepared: &PreparedAction, result: &ActionResult) {
        let actor = prepared.actor;
        let party_actor = prepared.side == Side::Party;

        for outcome in &result.outcomes {
            let recipient_side = self
                .state
                .combatant(outcome.recipient)
                .map(|combatant| combatant.side);
            let metrics = &mut self.state.metrics;
            if recipient_side == Some(Side::Party) {
                metrics.damage_taken += outcome.damage as u64;
            }
            if party_actor {
                if recipient_side == Some(Side::Enemy) {
                    metrics.damage_dealt += outcome.damage as u64;
                }
                metrics.weakness_hits += outcome.weakness as u32;
                metrics.critical_hits += outcome.critical as u32;
                metrics.technical_hits += outcome.was_technical() as u32;
            }
        }
        if party_actor {
            let metrics = &mut self.state.metrics;
            match prepared.kind {
                PreparedKind::Item(_) => metrics.items_used += 1,
                PreparedKind::AllOutAttack => metrics.finisher_uses += 1,
                PreparedKind::LimitBreak | PreparedKind::Duo { .. } => metrics.ultimate_uses += 1,
                _ => {}
            }
        }

        self.events.push(BattleEvent::ActionExecuted {
            actor,
            action: action.kind.to_string(),
            damage: result.total_damage(),
            hit_weakness: result.hit_weakness(),
            was_critical: result.was_critical(),
        });
        for outcome in &result.outcomes {
            if outcome.weakness {
                self.events.push(BattleEvent::WeaknessHit {
                    attacker: actor,
                    target: outcome.recipient,
                });
            }
            if let Some(status) = outcome.technical {
                self.events.push(BattleEvent::TechnicalHit {
                    attacker: actor,
                    target: outcome.recipient,
                    status,
                });
            }
        }
        for (target, status) in result.statuses_applied() {
            self.events.push(BattleEvent::StatusApplied { target, status });
        }

        if !party_actor || self.profiles.contains_key(&actor) {
            self.opponents.observe(prepared.kind.element(), result);
        }
    }
}

impl core::fmt::Debug for BattleEngine<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BattleEngine")
            .field("phase", &self.state.phase)
            .field("round", &self.state.round)
            .field("turn", &self.turn)
            .field("profiles", &self.profiles.len())
            .field("pending_events", &self.events.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{CatalogSnapshot, FixedRng, LedgerInventory, OracleError};
    use crate::error::{BattleError, ErrorSeverity};
    use crate::state::{CombatantTemplate, EncounterSettings, Stats};

    fn templates() -> (Vec<CombatantTemplate>, Vec<CombatantTemplate>) {
        let fast = CombatantTemplate::new("fast", "Fast", 100, 10, Stats::new(30, 20, 10, 20, 40, 0));
        let slow = CombatantTemplate::new("slow", "Slow", 100, 10, Stats::new(30, 20, 10, 20, 10, 0));
        let imp = CombatantTemplate::new("imp", "Imp", 60, 0, Stats::new(20, 10, 10, 10, 20, 0));
        (vec![slow, fast], vec![imp])
    }

    fn state() -> BattleState {
        let (party, enemies) = templates();
        BattleState::new(&party, &enemies, EncounterSettings::default()).unwrap()
    }

    #[test]
    fn requires_every_oracle() {
        let config = BattleConfig::default();
        let mut inventory = LedgerInventory::new();
        let rng = FixedRng::new(50);
        let env = BattleEnv::new(None, Some(&rng), Some(&config));
        let err = BattleEngine::new(state(), env, &mut inventory).unwrap_err();
        assert!(matches!(err, EngineError::Oracle(_)));
    }

    #[test]
    fn turn_order_is_speed_then_roster() {
        let catalog = CatalogSnapshot::new();
        let config = BattleConfig::default();
        let rng = FixedRng::new(50);
        let mut inventory = LedgerInventory::new();
        let env = BattleEnv::with_all(&catalog, &rng, &config);
        let mut engine = BattleEngine::new(state(), env, &mut inventory).unwrap();

        assert_eq!(engine.next_turn().unwrap_err(), EngineError::NotStarted);
        engine.start().unwrap();
        assert_eq!(engine.start().unwrap_err(), EngineError::AlreadyStarted);

        let order: Vec<_> = engine.state().queue().collect();
        // fast (40), imp (20), slow (10)
        assert_eq!(order, vec![CombatantId(1), CombatantId(2), CombatantId(0)]);

        let TurnPrompt::Act(info) = engine.next_turn().unwrap() else {
            panic!("battle should be running");
        };
        assert_eq!(info.actor, CombatantId(1));
        assert!(!info.extra);
        // Asking again returns the same pending turn.
        assert_eq!(engine.next_turn().unwrap(), TurnPrompt::Act(info));
    }

    #[test]
    fn rejected_action_keeps_the_turn() {
        let catalog = CatalogSnapshot::new();
        let config = BattleConfig::default();
        let rng = FixedRng::new(50);
        let mut inventory = LedgerInventory::new();
        let env = BattleEnv::with_all(&catalog, &rng, &config);
        let mut engine = BattleEngine::new(state(), env, &mut inventory).unwrap();
        engine.start().unwrap();
        engine.next_turn().unwrap();

        let err = engine
            .submit_action(BattleAction::skill(CombatantId(1), "fireball", crate::action::TargetSet::All))
            .unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(engine.current_actor(), Some(CombatantId(1)));

        engine
            .submit_action(BattleAction::attack(CombatantId(1), CombatantId(2)))
            .unwrap();
        assert_eq!(engine.current_actor(), None);
        assert_eq!(engine.state().metrics.turns_elapsed, 1);
    }

    #[test]
    fn skill_missing_from_catalog_is_not_a_rejection() {
        let (mut party, enemies) = templates();
        party[1] = party[1].clone().with_skills(["ghost".into()]);
        let state = BattleState::new(&party, &enemies, EncounterSettings::default()).unwrap();
        let catalog = CatalogSnapshot::new();
        let config = BattleConfig::default();
        let rng = FixedRng::new(50);
        let mut inventory = LedgerInventory::new();
        let env = BattleEnv::with_all(&catalog, &rng, &config);
        let mut engine = BattleEngine::new(state, env, &mut inventory).unwrap();
        engine.start().unwrap();
        engine.next_turn().unwrap();

        let err = engine
            .submit_action(BattleAction::skill(CombatantId(1), "ghost", crate::action::TargetSet::All))
            .unwrap_err();
        assert_eq!(err.severity(), ErrorSeverity::Fatal);
        assert!(!err.is_rejection());

        let err = engine.take_opponent_turn().unwrap_err();
        assert_eq!(err, EngineError::Oracle(OracleError::SkillNotFound("ghost".into())));
        assert_eq!(engine.current_actor(), Some(CombatantId(1)));
        assert_eq!(engine.state().metrics.turns_elapsed, 0);
    }

    #[test]
    fn abort_ends_without_rewards() {
        let catalog = CatalogSnapshot::new();
        let config = BattleConfig::default();
        let rng = FixedRng::new(50);
        let mut inventory = LedgerInventory::new();
        let env = BattleEnv::with_all(&catalog, &rng, &config);
        let mut engine = BattleEngine::new(state(), env, &mut inventory).unwrap();
        engine.start().unwrap();

        engine.abort().unwrap();
        assert_eq!(
            engine.abort().unwrap_err(),
            EngineError::AlreadyEnded(BattleOutcome::Aborted)
        );
        assert_eq!(engine.next_turn().unwrap(), TurnPrompt::Ended(BattleOutcome::Aborted));

        let summary = engine.finish().unwrap();
        assert_eq!(summary.outcome, BattleOutcome::Aborted);
        assert!(summary.rewards.is_none());
        assert_eq!(summary.party.len(), 2);
    }
}
