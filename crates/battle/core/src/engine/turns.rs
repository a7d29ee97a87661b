//! Round and turn scheduling.
//!
//! A round orders every living combatant by speed, fastest first, with roster
//! order breaking ties. Before the next queued combatant is served, a pending
//! extra turn is always served first, so an independent turn never starts
//! while an extra turn is outstanding. At round end, round-end statuses tick
//! for every living combatant in round order and finisher cooldowns count
//! down.

use tracing::{debug, info};

use super::events::BattleEvent;
use super::{ActiveTurn, BattleEngine, EngineError};
use crate::env::DuoId;
use crate::state::{
    BattleFlags, BattleOutcome, BattlePhase, CombatantId, Round, Side, TickPhase,
};

/// What the caller has to do next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnPrompt {
    /// `actor` is waiting for an action.
    Act(TurnInfo),
    Ended(BattleOutcome),
}

/// Snapshot of the turn being offered, with the privileges open to the actor.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnInfo {
    pub actor: CombatantId,
    pub side: Side,
    pub round: Round,
    /// Served from an extra turn rather than the queue.
    pub extra: bool,
    /// A decision profile is registered for the actor.
    pub opponent_controlled: bool,
    pub chain_level: u32,
    pub can_transfer: bool,
    pub finisher_available: bool,
    pub ultimate_ready: bool,
    /// Duo ultimates the actor could launch now, in catalog order.
    pub ready_duos: Vec<DuoId>,
}

impl BattleEngine<'_> {
    /// Advances to the next actor that can act, running skipped turns, status
    /// ticks and round boundaries on the way. Calling it again before the
    /// offered turn is used returns the same prompt.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotStarted`] before [`BattleEngine::start`].
    pub fn next_turn(&mut self) -> Result<TurnPrompt, EngineError> {
        match self.state.phase {
            BattlePhase::Initializing => return Err(EngineError::NotStarted),
            BattlePhase::Ended(outcome) => return Ok(TurnPrompt::Ended(outcome)),
            _ => {}
        }
        if let Some(turn) = self.turn {
            return Ok(TurnPrompt::Act(self.turn_info(turn)));
        }

        loop {
            if let Some(holder) = self.chain.extra_turn_holder(&self.state) {
                let can_act = self
                    .state
                    .combatant(holder)
                    .is_some_and(|combatant| self.status.can_act(combatant));
                if can_act {
                    return Ok(self.open_turn(holder, false));
                }
                self.chain.consume_extra_turn(&mut self.state, holder);
                continue;
            }

            let Some(actor) = self.state.queue.pop_front() else {
                self.end_round();
                if let Some(outcome) = self.check_outcome() {
                    self.end(outcome);
                    return Ok(TurnPrompt::Ended(outcome));
                }
                self.begin_round();
                continue;
            };
            let Some(can_act) = self
                .state
                .combatant(actor)
                .filter(|combatant| combatant.is_alive())
                .map(|combatant| self.status.can_act(combatant))
            else {
                continue;
            };

            self.chain.begin_turn(&mut self.state, actor, true);
            self.state.current = Some(actor);
            self.tick_statuses(actor, TickPhase::TurnStart);
            self.settle_defeats();
            if let Some(outcome) = self.check_outcome() {
                self.end(outcome);
                return Ok(TurnPrompt::Ended(outcome));
            }

            let alive = self.state.combatant(actor).is_some_and(|c| c.is_alive());
            if !alive {
                self.state.current = None;
                continue;
            }
            if !can_act {
                debug!(target: "battle::turn", actor = %actor, "turn skipped");
                self.events.push(BattleEvent::TurnSkipped { actor });
                self.state.current = None;
                continue;
            }
            return Ok(self.open_turn(actor, true));
        }
    }

    /// Turn currently waiting for an action.
    pub fn current_turn(&self) -> Option<TurnInfo> {
        self.turn.map(|turn| self.turn_info(turn))
    }

    pub(super) fn active_turn(&self) -> Result<ActiveTurn, EngineError> {
        match self.state.phase {
            BattlePhase::Initializing => Err(EngineError::NotStarted),
            BattlePhase::Ended(outcome) => Err(EngineError::AlreadyEnded(outcome)),
            _ => self.turn.ok_or(EngineError::NoActiveTurn),
        }
    }

    fn open_turn(&mut self, actor: CombatantId, independent: bool) -> TurnPrompt {
        if !independent {
            self.chain.begin_turn(&mut self.state, actor, false);
        }
        let turn = ActiveTurn { actor, independent };
        self.turn = Some(turn);
        self.state.current = Some(actor);
        self.state.phase = BattlePhase::ActorTurn;

        let name = self
            .state
            .combatant(actor)
            .map(|combatant| combatant.name.clone())
            .unwrap_or_default();
        self.events.push(BattleEvent::TurnStarted {
            actor,
            name,
            extra: !independent,
        });
        TurnPrompt::Act(self.turn_info(turn))
    }

    fn turn_info(&self, turn: ActiveTurn) -> TurnInfo {
        let side = self
            .state
            .combatant(turn.actor)
            .map_or(Side::Party, |combatant| combatant.side);
        let duos = self.catalog.duos();
        let ready_duos = self
            .chain
            .ready_duos(&self.state, turn.actor, &duos)
            .into_iter()
            .map(|duo| duo.id.clone())
            .collect();
        TurnInfo {
            actor: turn.actor,
            side,
            round: self.state.round,
            extra: !turn.independent,
            opponent_controlled: self.profiles.contains_key(&turn.actor),
            chain_level: self.state.chain.level,
            can_transfer: !self.chain.transfer_candidates(&self.state, turn.actor).is_empty(),
            finisher_available: self.chain.finisher_available(&self.state, side),
            ultimate_ready: self.chain.ultimate_ready(&self.state, turn.actor),
            ready_duos,
        }
    }

    // ========================================================================
    // Round boundaries
    // ========================================================================

    pub(super) fn begin_round(&mut self) {
        let mut order: Vec<(CombatantId, i32)> = self
            .state
            .combatants()
            .filter(|combatant| combatant.is_alive())
            .map(|combatant| (combatant.id, combatant.stats.speed))
            .collect();
        // Stable sort keeps roster order among equal speeds.
        order.sort_by(|a, b| b.1.cmp(&a.1));

        self.round_order = order.iter().map(|(id, _)| *id).collect();
        self.state.queue = self.round_order.iter().copied().collect();
        self.state.round = self.state.round.next();
        self.state.phase = BattlePhase::RoundStart;
        debug!(
            target: "battle::turn",
            round = self.state.round.0,
            order = ?self.round_order,
            "round started"
        );
        self.events.push(BattleEvent::RoundStarted {
            round: self.state.round,
        });
    }

    fn end_round(&mut self) {
        let order = std::mem::take(&mut self.round_order);
        for id in order {
            let alive = self.state.combatant(id).is_some_and(|c| c.is_alive());
            if alive {
                self.tick_statuses(id, TickPhase::RoundEnd);
            }
        }
        self.settle_defeats();
        self.state.chain.tick_cooldowns();
    }

    // ========================================================================
    // Bookkeeping
    // ========================================================================

    pub(super) fn tick_statuses(&mut self, id: CombatantId, phase: TickPhase) {
        let Some(combatant) = self.state.combatant_mut(id) else {
            return;
        };
        let party = combatant.side == Side::Party;
        let ticks = self.status.process(combatant, phase);
        let expired = self.status.remove_expired(combatant);

        for tick in ticks {
            if party {
                self.state.metrics.damage_taken += tick.damage as u64;
            }
            self.events.push(BattleEvent::StatusTicked {
                target: id,
                status: tick.kind,
                damage: tick.damage,
                healing: tick.healing,
            });
        }
        for status in expired {
            self.events.push(BattleEvent::StatusExpired { target: id, status });
        }
    }

    /// Marks every combatant at zero HP as defeated: its statuses are cleared,
    /// its chain privileges revoked and it leaves the turn queue.
    pub(super) fn settle_defeats(&mut self) {
        let fallen: Vec<(CombatantId, Side)> = self
            .state
            .combatants()
            .filter(|combatant| combatant.hp == 0 && combatant.is_alive())
            .map(|combatant| (combatant.id, combatant.side))
            .collect();

        for (id, side) in fallen {
            if let Some(combatant) = self.state.combatant_mut(id) {
                self.status.clear_all(combatant);
                combatant.flags.insert(BattleFlags::DEFEATED);
            }
            self.chain.revoke(&mut self.state, id);
            self.state.queue.retain(|queued| *queued != id);
            if side == Side::Party {
                self.state.metrics.knockouts_suffered += 1;
            }
            debug!(target: "battle::turn", combatant = %id, side = %side, "combatant defeated");
            self.events.push(BattleEvent::CombatantDefeated { target: id, side });
        }
    }

    /// Defeat takes precedence when both sides fall in the same action.
    pub(super) fn check_outcome(&self) -> Option<BattleOutcome> {
        if self.state.all_defeated(Side::Party) {
            Some(BattleOutcome::Defeat)
        } else if self.state.all_defeated(Side::Enemy) {
            Some(BattleOutcome::Victory)
        } else {
            None
        }
    }

    pub(super) fn end(&mut self, outcome: BattleOutcome) {
        self.state.phase = BattlePhase::Ended(outcome);
        self.state.current = None;
        self.state.queue.clear();
        self.turn = None;
        info!(
            target: "battle::engine",
            outcome = %outcome,
            round = self.state.round.0,
            "battle ended"
        );
        self.events.push(BattleEvent::BattleEnded {
            outcome,
            victory: outcome == BattleOutcome::Victory,
        });
    }
}
