//! Data-driven battle content and loaders.
//!
//! This crate reads static battle data from disk:
//! - Skill, item and duo-ultimate catalogs (RON)
//! - Encounters: party/enemy templates and opponent profiles (RON)
//! - Tuning configuration (TOML)
//!
//! Everything is deserialized straight into `battle-core` types and validated
//! against the catalog before a battle can be built from it. Content never
//! appears in battle state; the engine reads it through its oracles.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{
    CatalogFile, CatalogLoader, ConfigLoader, ContentFactory, Encounter, EncounterFile,
    EncounterLoader, LoadResult, MemberSpec,
};
