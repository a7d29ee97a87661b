//! Common error infrastructure for battle-core.
//!
//! Domain-specific errors (`ActionError`, `ChainError`, `OracleError`,
//! `EngineError`) are defined next to the code that raises them. This module
//! only holds the shared classification used by every one of them.
//!
//! # Design Principles
//!
//! - **Type Safety**: each concern has its own error enum with specific variants
//! - **Severity Classification**: errors are categorized for recovery strategies
//! - **Stable Codes**: every variant exposes a static code for logs and tests

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the request was well-formed but its preconditions are not
///   met right now (a chain privilege that is not open yet)
/// - **Validation**: invalid input that the caller must change before retrying
///   (no living targets, not enough MP)
/// - **Internal**: unexpected state inconsistency inside the core
/// - **Fatal**: configuration is broken (missing catalog entry or oracle)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Preconditions not met yet; retrying later or choosing another action works.
    Recoverable,

    /// Invalid input; the same actor may resubmit a corrected action.
    Validation,

    /// Unexpected state inconsistency. Indicates a bug.
    Internal,

    /// Broken configuration; the battle cannot continue.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable | Self::Validation)
    }

    /// Returns true if this error indicates a bug or broken configuration.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all battle-core errors.
///
/// # Implementation Guidelines
///
/// - All error enums implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait BattleError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_allow_resubmission() {
        assert!(ErrorSeverity::Validation.is_recoverable());
        assert!(ErrorSeverity::Recoverable.is_recoverable());
        assert!(!ErrorSeverity::Fatal.is_recoverable());
        assert!(ErrorSeverity::Fatal.is_internal());
        assert_eq!(ErrorSeverity::Internal.as_str(), "internal");
    }
}
