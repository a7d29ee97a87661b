//! Outcome of a resolved action.

use crate::state::{CombatantId, StatusKind};

/// Per-target outcome of one action.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetOutcome {
    /// Combatant the action was aimed at.
    pub target: CombatantId,
    /// Combatant that actually received the effect (differs when reflected).
    pub recipient: CombatantId,
    pub damage: u32,
    pub healing: u32,
    pub mp_restored: u32,
    pub critical: bool,
    pub weakness: bool,
    /// Status consumed by a technical hit.
    pub technical: Option<StatusKind>,
    pub evaded: bool,
    /// Immune target: the hit had no effect.
    pub nullified: bool,
    /// Absorb affinity turned the damage into healing.
    pub absorbed: bool,
    pub reflected: bool,
    /// Recipient was already down before this hit.
    pub was_downed: bool,
    pub statuses_applied: Vec<StatusKind>,
    pub statuses_removed: Vec<StatusKind>,
}

impl TargetOutcome {
    pub fn new(target: CombatantId) -> Self {
        Self {
            target,
            recipient: target,
            ..Self::default()
        }
    }

    #[inline]
    pub fn was_technical(&self) -> bool {
        self.technical.is_some()
    }
}

/// Result of resolving one action against every target.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionResult {
    pub actor: CombatantId,
    pub outcomes: Vec<TargetOutcome>,
    /// `Some(success)` for escape attempts.
    pub escaped: Option<bool>,
}

impl ActionResult {
    pub fn new(actor: CombatantId, outcomes: Vec<TargetOutcome>) -> Self {
        Self {
            actor,
            outcomes,
            escaped: None,
        }
    }

    pub fn escape(actor: CombatantId, success: bool) -> Self {
        Self {
            actor,
            outcomes: Vec::new(),
            escaped: Some(success),
        }
    }

    pub fn outcome_for(&self, target: CombatantId) -> Option<&TargetOutcome> {
        self.outcomes.iter().find(|outcome| outcome.target == target)
    }

    pub fn damage_per_target(&self) -> impl Iterator<Item = (CombatantId, u32)> + '_ {
        self.outcomes
            .iter()
            .map(|outcome| (outcome.recipient, outcome.damage))
    }

    pub fn healing_per_target(&self) -> impl Iterator<Item = (CombatantId, u32)> + '_ {
        self.outcomes
            .iter()
            .map(|outcome| (outcome.recipient, outcome.healing))
    }

    pub fn total_damage(&self) -> u64 {
        self.outcomes.iter().map(|outcome| outcome.damage as u64).sum()
    }

    pub fn was_critical(&self) -> bool {
        self.outcomes.iter().any(|outcome| outcome.critical)
    }

    pub fn hit_weakness(&self) -> bool {
        self.outcomes.iter().any(|outcome| outcome.weakness)
    }

    pub fn was_technical(&self) -> bool {
        self.outcomes.iter().any(TargetOutcome::was_technical)
    }

    /// True when every targeted hit missed.
    pub fn was_evaded(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|outcome| outcome.evaded)
    }

    pub fn statuses_applied(&self) -> impl Iterator<Item = (CombatantId, StatusKind)> + '_ {
        self.outcomes.iter().flat_map(|outcome| {
            outcome
                .statuses_applied
                .iter()
                .map(move |kind| (outcome.recipient, *kind))
        })
    }
}
