//! Outbound battle events.
//!
//! The engine pushes events into an [`EventQueue`] as it runs; collaborators
//! (presentation, audio, logging) drain it whenever they like. Nothing in the
//! core waits for a consumer.

use std::collections::VecDeque;

use tracing::debug;

use crate::rewards::Rank;
use crate::state::{BattleOutcome, CombatantId, Round, Side, StatusKind};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "snake_case"))]
pub enum BattleEvent {
    RoundStarted {
        round: Round,
    },
    TurnStarted {
        actor: CombatantId,
        name: String,
        /// Served from an extra turn rather than the queue.
        extra: bool,
    },
    /// The actor could not act; its statuses still ticked.
    TurnSkipped {
        actor: CombatantId,
    },
    ActionExecuted {
        actor: CombatantId,
        action: String,
        damage: u64,
        hit_weakness: bool,
        was_critical: bool,
    },
    WeaknessHit {
        attacker: CombatantId,
        target: CombatantId,
    },
    TechnicalHit {
        attacker: CombatantId,
        target: CombatantId,
        status: StatusKind,
    },
    ExtraTurnGranted {
        actor: CombatantId,
    },
    TurnTransferred {
        from: CombatantId,
        to: CombatantId,
        chain_level: u32,
    },
    FinisherAvailable {
        side: Side,
    },
    FinisherUsed {
        actor: CombatantId,
        side: Side,
    },
    UltimateReady {
        actor: CombatantId,
    },
    UltimateUsed {
        actor: CombatantId,
        duo: bool,
    },
    Knockdown {
        target: CombatantId,
    },
    StatusApplied {
        target: CombatantId,
        status: StatusKind,
    },
    StatusTicked {
        target: CombatantId,
        status: StatusKind,
        damage: u32,
        healing: u32,
    },
    StatusExpired {
        target: CombatantId,
        status: StatusKind,
    },
    CombatantDefeated {
        target: CombatantId,
        side: Side,
    },
    EscapeAttempted {
        actor: CombatantId,
        chance: u32,
        success: bool,
    },
    RewardsGranted {
        rank: Rank,
        experience: u64,
        currency: u64,
    },
    BattleEnded {
        outcome: BattleOutcome,
        victory: bool,
    },
}

impl BattleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoundStarted { .. } => "round_started",
            Self::TurnStarted { .. } => "turn_started",
            Self::TurnSkipped { .. } => "turn_skipped",
            Self::ActionExecuted { .. } => "action_executed",
            Self::WeaknessHit { .. } => "weakness_hit",
            Self::TechnicalHit { .. } => "technical_hit",
            Self::ExtraTurnGranted { .. } => "extra_turn_granted",
            Self::TurnTransferred { .. } => "turn_transferred",
            Self::FinisherAvailable { .. } => "finisher_available",
            Self::FinisherUsed { .. } => "finisher_used",
            Self::UltimateReady { .. } => "ultimate_ready",
            Self::UltimateUsed { .. } => "ultimate_used",
            Self::Knockdown { .. } => "knockdown",
            Self::StatusApplied { .. } => "status_applied",
            Self::StatusTicked { .. } => "status_ticked",
            Self::StatusExpired { .. } => "status_expired",
            Self::CombatantDefeated { .. } => "combatant_defeated",
            Self::EscapeAttempted { .. } => "escape_attempted",
            Self::RewardsGranted { .. } => "rewards_granted",
            Self::BattleEnded { .. } => "battle_ended",
        }
    }
}

/// FIFO of events not yet drained by a collaborator.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    pending: VecDeque<BattleEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: BattleEvent) {
        debug!(target: "battle::event", event = event.name(), detail = ?event);
        self.pending.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<BattleEvent> {
        self.pending.drain(..).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BattleEvent> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
