//! Authoritative battle state.
//!
//! [`BattleState`] owns the roster, the turn queue, the chain bookkeeping and
//! the metrics accumulator for one battle session. Other components receive
//! references to individual combatants; only the engine restructures the
//! roster or the queue.

mod affinity;
mod chain;
mod combatant;
mod common;
mod metrics;
mod stats;
mod status;

use std::collections::VecDeque;

pub use affinity::{Affinity, AffinityTable, Element};
pub use chain::ChainState;
pub use combatant::{BattleFlags, Bounty, Combatant, CombatantTemplate, DropEntry};
pub use common::{CombatantId, Round, Side};
pub use metrics::BattleMetrics;
pub use stats::{StatKind, Stats};
pub use status::{
    ActiveStatus, AppliedShift, StackRule, StatusBehavior, StatusEffects, StatusKind, TickPhase,
};

/// States of the battle state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattlePhase {
    Initializing,
    RoundStart,
    ActorTurn,
    ActionResolution,
    PostActionBookkeeping,
    Ended(BattleOutcome),
}

impl BattlePhase {
    #[inline]
    pub const fn is_ended(self) -> bool {
        matches!(self, BattlePhase::Ended(_))
    }
}

/// Terminal result of a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleOutcome {
    Victory,
    Defeat,
    Escaped,
    Aborted,
}

/// Encounter-level settings supplied when the battle is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EncounterSettings {
    pub escapable: bool,
    pub boss: bool,
    /// Base seed for every random roll of this battle.
    pub seed: u64,
}

impl Default for EncounterSettings {
    fn default() -> Self {
        Self {
            escapable: true,
            boss: false,
            seed: 0,
        }
    }
}

/// Errors raised while building the initial state.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InitializationError {
    #[error("battle requires at least one party member")]
    EmptyParty,

    #[error("battle requires at least one opponent")]
    NoOpponents,
}

/// Full state of one battle session.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleState {
    roster: Vec<Combatant>,
    pub(crate) queue: VecDeque<CombatantId>,
    pub phase: BattlePhase,
    pub round: Round,
    /// Combatant whose turn is in progress.
    pub current: Option<CombatantId>,
    pub chain: ChainState,
    pub metrics: BattleMetrics,
    pub encounter: EncounterSettings,
    /// Consecutive failed escape attempts in this battle.
    pub escape_failures: u32,
    /// Monotonic action counter mixed into every RNG seed.
    pub nonce: u64,
}

impl BattleState {
    /// Builds the roster: party members first, then enemies, ids in that order.
    pub fn new(
        party: &[CombatantTemplate],
        enemies: &[CombatantTemplate],
        encounter: EncounterSettings,
    ) -> Result<Self, InitializationError> {
        if party.is_empty() {
            return Err(InitializationError::EmptyParty);
        }
        if enemies.is_empty() {
            return Err(InitializationError::NoOpponents);
        }

        let roster = party
            .iter()
            .map(|template| (Side::Party, template))
            .chain(enemies.iter().map(|template| (Side::Enemy, template)))
            .enumerate()
            .map(|(index, (side, template))| {
                Combatant::from_template(CombatantId(index as u32), side, template)
            })
            .collect();

        Ok(Self {
            roster,
            queue: VecDeque::new(),
            phase: BattlePhase::Initializing,
            round: Round::ZERO,
            current: None,
            chain: ChainState::new(),
            metrics: BattleMetrics::new(),
            encounter,
            escape_failures: 0,
            nonce: 0,
        })
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.roster.get(id.index())
    }

    pub(crate) fn combatant_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.roster.get_mut(id.index())
    }

    pub fn combatants(&self) -> impl Iterator<Item = &Combatant> {
        self.roster.iter()
    }

    pub(crate) fn combatants_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.roster.iter_mut()
    }

    /// Living combatants of `side`, in roster order.
    pub fn living(&self, side: Side) -> impl Iterator<Item = &Combatant> {
        self.roster
            .iter()
            .filter(move |combatant| combatant.side == side && combatant.is_alive())
    }

    pub fn all_defeated(&self, side: Side) -> bool {
        self.living(side).next().is_none()
    }

    /// Remaining turn order for the current round.
    pub fn queue(&self) -> impl Iterator<Item = CombatantId> + '_ {
        self.queue.iter().copied()
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        match self.phase {
            BattlePhase::Ended(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Consumes the state, returning the party members for copy-back.
    pub fn into_party(self) -> Vec<Combatant> {
        self.roster
            .into_iter()
            .filter(|combatant| combatant.side == Side::Party)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(key: &str) -> CombatantTemplate {
        CombatantTemplate::new(key, key, 50, 10, Stats::new(10, 10, 10, 10, 10, 10))
    }

    #[test]
    fn roster_ids_follow_party_then_enemies() {
        let state = BattleState::new(
            &[template("a"), template("b")],
            &[template("x")],
            EncounterSettings::default(),
        )
        .unwrap();

        let sides: Vec<_> = state.combatants().map(|c| (c.id, c.side)).collect();
        assert_eq!(
            sides,
            vec![
                (CombatantId(0), Side::Party),
                (CombatantId(1), Side::Party),
                (CombatantId(2), Side::Enemy),
            ]
        );
        assert_eq!(state.phase, BattlePhase::Initializing);
    }

    #[test]
    fn empty_sides_are_rejected() {
        let result = BattleState::new(&[], &[template("x")], EncounterSettings::default());
        assert_eq!(result.unwrap_err(), InitializationError::EmptyParty);
    }
}
