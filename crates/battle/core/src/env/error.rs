//! Oracle access errors.

use super::{DuoId, ItemId, SkillId};
use crate::error::{BattleError, ErrorSeverity};

/// Errors that occur when accessing external data.
///
/// A missing catalog entry is never defaulted to a zero effect; it surfaces
/// to the caller as a fatal configuration problem.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// CatalogOracle is not available in the environment.
    #[error("CatalogOracle not available")]
    CatalogNotAvailable,

    /// RngOracle is not available in the environment.
    #[error("RngOracle not available")]
    RngNotAvailable,

    /// BattleConfig is not available in the environment.
    #[error("BattleConfig not available")]
    ConfigNotAvailable,

    #[error("skill '{0}' not found in catalog")]
    SkillNotFound(SkillId),

    #[error("item '{0}' not found in catalog")]
    ItemNotFound(ItemId),

    #[error("duo ultimate '{0}' not found in catalog")]
    DuoNotFound(DuoId),
}

impl BattleError for OracleError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        use OracleError::*;
        match self {
            CatalogNotAvailable => "ORACLE_CATALOG_NOT_AVAILABLE",
            RngNotAvailable => "ORACLE_RNG_NOT_AVAILABLE",
            ConfigNotAvailable => "ORACLE_CONFIG_NOT_AVAILABLE",
            SkillNotFound(_) => "ORACLE_SKILL_NOT_FOUND",
            ItemNotFound(_) => "ORACLE_ITEM_NOT_FOUND",
            DuoNotFound(_) => "ORACLE_DUO_NOT_FOUND",
        }
    }
}
