//! Battle actions submitted by the presentation layer or the decision engine.
//!
//! A [`BattleAction`] is a plain request: who acts, what kind of action, and
//! which combatants are aimed at. [`validate`] checks it against the current
//! state and the catalog and produces a [`PreparedAction`] with concrete
//! definitions and a living target list, which is what the resolver consumes.
mod error;
mod validation;

pub use error::ActionError;
pub use validation::{PreparedAction, PreparedKind, validate};
pub(crate) use validation::hp_cost;

use core::fmt;

use crate::env::{DuoId, ItemId, SkillId};
use crate::state::CombatantId;

/// What the actor does this turn.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionKind {
    /// Basic physical attack.
    Attack,
    Skill(SkillId),
    Item(ItemId),
    Guard,
    /// Solo gauge-gated ultimate.
    LimitBreak,
    /// Two-member gauge-gated ultimate.
    DuoUltimate(DuoId),
    Escape,
    /// Multi-actor finisher against a fully downed opposing side.
    AllOutAttack,
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Attack => "attack",
            ActionKind::Skill(_) => "skill",
            ActionKind::Item(_) => "item",
            ActionKind::Guard => "guard",
            ActionKind::LimitBreak => "limit-break",
            ActionKind::DuoUltimate(_) => "duo-ultimate",
            ActionKind::Escape => "escape",
            ActionKind::AllOutAttack => "all-out-attack",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Skill(id) => write!(f, "skill:{id}"),
            ActionKind::Item(id) => write!(f, "item:{id}"),
            ActionKind::DuoUltimate(id) => write!(f, "duo:{id}"),
            other => f.write_str(other.label()),
        }
    }
}

/// Requested targets. Patterns that target everyone ignore the explicit set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetSet {
    One(CombatantId),
    Several(Vec<CombatantId>),
    /// Every living combatant the action's pattern allows.
    #[default]
    All,
}

impl TargetSet {
    pub fn ids(&self) -> &[CombatantId] {
        match self {
            TargetSet::One(id) => core::slice::from_ref(id),
            TargetSet::Several(ids) => ids,
            TargetSet::All => &[],
        }
    }
}

/// One action request, immutable once submitted.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleAction {
    pub actor: CombatantId,
    pub kind: ActionKind,
    pub targets: TargetSet,
}

impl BattleAction {
    pub fn new(actor: CombatantId, kind: ActionKind, targets: TargetSet) -> Self {
        Self {
            actor,
            kind,
            targets,
        }
    }

    pub fn attack(actor: CombatantId, target: CombatantId) -> Self {
        Self::new(actor, ActionKind::Attack, TargetSet::One(target))
    }

    pub fn skill(actor: CombatantId, skill: impl Into<SkillId>, targets: TargetSet) -> Self {
        Self::new(actor, ActionKind::Skill(skill.into()), targets)
    }

    pub fn item(actor: CombatantId, item: impl Into<ItemId>, targets: TargetSet) -> Self {
        Self::new(actor, ActionKind::Item(item.into()), targets)
    }

    pub fn guard(actor: CombatantId) -> Self {
        Self::new(actor, ActionKind::Guard, TargetSet::All)
    }

    pub fn limit_break(actor: CombatantId, target: CombatantId) -> Self {
        Self::new(actor, ActionKind::LimitBreak, TargetSet::One(target))
    }

    pub fn duo(actor: CombatantId, duo: impl Into<DuoId>) -> Self {
        Self::new(actor, ActionKind::DuoUltimate(duo.into()), TargetSet::All)
    }

    pub fn escape(actor: CombatantId) -> Self {
        Self::new(actor, ActionKind::Escape, TargetSet::All)
    }

    pub fn all_out_attack(actor: CombatantId) -> Self {
        Self::new(actor, ActionKind::AllOutAttack, TargetSet::All)
    }
}
