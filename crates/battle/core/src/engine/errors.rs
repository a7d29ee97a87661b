//! Scheduler and state machine misuse.

use crate::action::ActionError;
use crate::chain::ChainError;
use crate::config::ConfigError;
use crate::env::{InventoryError, OracleError};
use crate::error::{BattleError, ErrorSeverity};
use crate::state::{BattleOutcome, CombatantId};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("battle has not started")]
    NotStarted,

    #[error("battle already started")]
    AlreadyStarted,

    #[error("battle already ended: {0}")]
    AlreadyEnded(BattleOutcome),

    #[error("battle is still running")]
    StillRunning,

    #[error("no turn is waiting for an action")]
    NoActiveTurn,

    #[error("combatant {0} does not hold an extra turn")]
    NoExtraTurn(CombatantId),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

impl EngineError {
    /// True when the caller may resubmit for the same turn. A missing
    /// catalog entry is fatal even when it surfaces during validation.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Action(_) | Self::Chain(_)) && self.severity() != ErrorSeverity::Fatal
    }
}

impl BattleError for EngineError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Action(err) => err.severity(),
            Self::Chain(err) => err.severity(),
            Self::Oracle(err) => err.severity(),
            Self::Config(err) => err.severity(),
            Self::Inventory(err) => err.severity(),
            Self::NoExtraTurn(_) => ErrorSeverity::Recoverable,
            Self::NotStarted
            | Self::AlreadyStarted
            | Self::AlreadyEnded(_)
            | Self::StillRunning
            | Self::NoActiveTurn => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotStarted => "ENGINE_NOT_STARTED",
            Self::AlreadyStarted => "ENGINE_ALREADY_STARTED",
            Self::AlreadyEnded(_) => "ENGINE_ALREADY_ENDED",
            Self::StillRunning => "ENGINE_STILL_RUNNING",
            Self::NoActiveTurn => "ENGINE_NO_ACTIVE_TURN",
            Self::NoExtraTurn(_) => "ENGINE_NO_EXTRA_TURN",
            Self::Action(err) => err.error_code(),
            Self::Chain(err) => err.error_code(),
            Self::Oracle(err) => err.error_code(),
            Self::Config(err) => err.error_code(),
            Self::Inventory(err) => err.error_code(),
        }
    }
}
