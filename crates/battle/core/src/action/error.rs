//! Rejected action submissions.
//!
//! A rejected action never advances the turn; the same actor may resubmit.

use crate::chain::ChainError;
use crate::env::{ItemId, OracleError, SkillId};
use crate::error::{BattleError, ErrorSeverity};
use crate::state::CombatantId;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("combatant {0} not found")]
    ActorNotFound(CombatantId),

    #[error("combatant {0} is defeated")]
    ActorDefeated(CombatantId),

    #[error("it is not {actual}'s turn")]
    NotActorsTurn { actual: CombatantId },

    /// The actor carries an action-preventing status.
    #[error("combatant {0} cannot act")]
    ActorCannotAct(CombatantId),

    #[error("target {0} not found")]
    TargetNotFound(CombatantId),

    #[error("target {0} is not valid for this action")]
    InvalidTarget(CombatantId),

    #[error("no living targets")]
    NoLivingTargets,

    #[error("skill '{0}' is not known by the actor")]
    SkillNotKnown(SkillId),

    #[error("insufficient MP: need {required}, have {available}")]
    InsufficientMp { required: u32, available: u32 },

    #[error("insufficient HP: need more than {required}, have {available}")]
    InsufficientHp { required: u32, available: u32 },

    #[error("item '{0}' is not in the inventory")]
    ItemUnavailable(ItemId),

    #[error("escape is not possible from this encounter")]
    EscapeForbidden,

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

impl BattleError for ActionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Chain(err) => err.severity(),
            Self::Oracle(err) => err.severity(),
            Self::ActorNotFound(_) => ErrorSeverity::Internal,
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        use ActionError::*;
        match self {
            ActorNotFound(_) => "ACTION_ACTOR_NOT_FOUND",
            ActorDefeated(_) => "ACTION_ACTOR_DEFEATED",
            NotActorsTurn { .. } => "ACTION_NOT_ACTORS_TURN",
            ActorCannotAct(_) => "ACTION_ACTOR_CANNOT_ACT",
            TargetNotFound(_) => "ACTION_TARGET_NOT_FOUND",
            InvalidTarget(_) => "ACTION_INVALID_TARGET",
            NoLivingTargets => "ACTION_NO_LIVING_TARGETS",
            SkillNotKnown(_) => "ACTION_SKILL_NOT_KNOWN",
            InsufficientMp { .. } => "ACTION_INSUFFICIENT_MP",
            InsufficientHp { .. } => "ACTION_INSUFFICIENT_HP",
            ItemUnavailable(_) => "ACTION_ITEM_UNAVAILABLE",
            EscapeForbidden => "ACTION_ESCAPE_FORBIDDEN",
            Chain(err) => err.error_code(),
            Oracle(err) => err.error_code(),
        }
    }
}
