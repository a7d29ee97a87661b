use crate::env::DuoId;
use crate::error::{BattleError, ErrorSeverity};
use crate::state::CombatantId;

/// A chain privilege was requested while its preconditions are not met.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("combatant {0} holds no extra turn")]
    NoExtraTurn(CombatantId),

    #[error("combatant {0} cannot receive a transferred turn")]
    InvalidTransferTarget(CombatantId),

    #[error("combatant {0} already received a transfer in this sequence")]
    AlreadyReceived(CombatantId),

    #[error("finisher not available")]
    FinisherUnavailable,

    #[error("finisher cooling down for {rounds} more round(s)")]
    FinisherCoolingDown { rounds: u32 },

    #[error("gauge of {actor} not full ({gauge})")]
    GaugeNotFull { actor: CombatantId, gauge: u32 },

    #[error("combatant {actor} is not a member of duo '{duo}'")]
    NotDuoMember { duo: DuoId, actor: CombatantId },

    #[error("partner for duo '{0}' is not ready")]
    DuoPartnerUnavailable(DuoId),
}

impl BattleError for ChainError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }

    fn error_code(&self) -> &'static str {
        use ChainError::*;
        match self {
            NoExtraTurn(_) => "CHAIN_NO_EXTRA_TURN",
            InvalidTransferTarget(_) => "CHAIN_INVALID_TRANSFER_TARGET",
            AlreadyReceived(_) => "CHAIN_ALREADY_RECEIVED",
            FinisherUnavailable => "CHAIN_FINISHER_UNAVAILABLE",
            FinisherCoolingDown { .. } => "CHAIN_FINISHER_COOLING_DOWN",
            GaugeNotFull { .. } => "CHAIN_GAUGE_NOT_FULL",
            NotDuoMember { .. } => "CHAIN_NOT_DUO_MEMBER",
            DuoPartnerUnavailable(_) => "CHAIN_DUO_PARTNER_UNAVAILABLE",
        }
    }
}
