//! External collaborators of the battle core.
//!
//! Read-only oracles (static catalog, RNG, tuning config) are bundled in
//! [`BattleEnv`] so the engine can reach everything it needs without coupling
//! to concrete implementations. The mutable inventory service is injected
//! separately.
mod catalog;
mod error;
mod inventory;
mod rng;
mod snapshot;

pub use catalog::{
    CatalogOracle, DamageKind, DuoDefinition, DuoId, Infliction, ItemDefinition, ItemEffect,
    ItemId, SkillCost, SkillDefinition, SkillEffect, SkillId, TargetPattern,
};
pub use error::OracleError;
pub use inventory::{InventoryError, InventoryService, LedgerInventory};
pub use rng::{FixedRng, PcgRng, RngOracle, RollContext, ScriptedRng, compute_seed};
pub use snapshot::CatalogSnapshot;

use crate::config::BattleConfig;

/// Aggregates the read-only oracles required by the engine.
#[derive(Clone, Copy)]
pub struct BattleEnv<'a> {
    catalog: Option<&'a dyn CatalogOracle>,
    rng: Option<&'a dyn RngOracle>,
    config: Option<&'a BattleConfig>,
}

impl<'a> BattleEnv<'a> {
    pub fn new(
        catalog: Option<&'a dyn CatalogOracle>,
        rng: Option<&'a dyn RngOracle>,
        config: Option<&'a BattleConfig>,
    ) -> Self {
        Self {
            catalog,
            rng,
            config,
        }
    }

    pub fn with_all(
        catalog: &'a dyn CatalogOracle,
        rng: &'a dyn RngOracle,
        config: &'a BattleConfig,
    ) -> Self {
        Self::new(Some(catalog), Some(rng), Some(config))
    }

    pub fn empty() -> Self {
        Self::new(None, None, None)
    }

    /// Returns the CatalogOracle, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::CatalogNotAvailable` if no catalog was provided.
    pub fn catalog(&self) -> Result<&'a dyn CatalogOracle, OracleError> {
        self.catalog.ok_or(OracleError::CatalogNotAvailable)
    }

    /// Returns the RngOracle, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::RngNotAvailable` if no RNG was provided.
    pub fn rng(&self) -> Result<&'a dyn RngOracle, OracleError> {
        self.rng.ok_or(OracleError::RngNotAvailable)
    }

    /// Returns the BattleConfig, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::ConfigNotAvailable` if no config was provided.
    pub fn config(&self) -> Result<&'a BattleConfig, OracleError> {
        self.config.ok_or(OracleError::ConfigNotAvailable)
    }

    /// Looks a skill up, treating a missing entry as an error.
    pub fn skill(&self, id: &SkillId) -> Result<SkillDefinition, OracleError> {
        self.catalog()?
            .skill(id)
            .ok_or_else(|| OracleError::SkillNotFound(id.clone()))
    }

    pub fn item(&self, id: &ItemId) -> Result<ItemDefinition, OracleError> {
        self.catalog()?
            .item(id)
            .ok_or_else(|| OracleError::ItemNotFound(id.clone()))
    }

    pub fn duo(&self, id: &DuoId) -> Result<DuoDefinition, OracleError> {
        self.catalog()?
            .duo(id)
            .ok_or_else(|| OracleError::DuoNotFound(id.clone()))
    }
}

impl core::fmt::Debug for BattleEnv<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BattleEnv")
            .field("catalog", &self.catalog.is_some())
            .field("rng", &self.rng.is_some())
            .field("config", &self.config)
            .finish()
    }
}
