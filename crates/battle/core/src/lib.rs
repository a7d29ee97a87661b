//! Deterministic turn-based combat rules.
//!
//! `battle-core` owns the combat state machine: turn order, action validation
//! and resolution, affinities, status effects, the chain system, opponent
//! decisions and post-battle rewards. It performs no I/O; the catalog, RNG,
//! tuning config and inventory are injected through [`env`]. All state
//! mutation flows through [`engine::BattleEngine`].
pub mod action;
pub mod chain;
pub mod combat;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod opponent;
pub mod rewards;
pub mod state;

pub use action::{ActionError, ActionKind, BattleAction, PreparedAction, PreparedKind, TargetSet};
pub use chain::{ChainController, ChainError, ChainTrigger};
pub use combat::{ActionResult, DamageResolver, StatusEngine, TargetOutcome};
pub use config::{BattleConfig, ConfigError};
pub use engine::{BattleEngine, BattleEvent, BattleSummary, EngineError, TurnInfo, TurnPrompt};
pub use env::{
    BattleEnv, CatalogOracle, CatalogSnapshot, DamageKind, DuoDefinition, DuoId, FixedRng,
    Infliction, InventoryError, InventoryService, ItemDefinition, ItemEffect, ItemId,
    LedgerInventory, OracleError, PcgRng, RngOracle, ScriptedRng, SkillCost, SkillDefinition,
    SkillEffect, SkillId, TargetPattern,
};
pub use error::{BattleError, ErrorSeverity};
pub use opponent::{DecisionEngine, EmergencyOverride, OpponentProfile, PatternStep, TurnPattern};
pub use rewards::{BattleRewards, Rank, RewardCalculator, ScoreBreakdown};
pub use state::{
    Affinity, AffinityTable, BattleFlags, BattleMetrics, BattleOutcome, BattlePhase, BattleState,
    Bounty, Combatant, CombatantId, CombatantTemplate, DropEntry, Element, EncounterSettings,
    InitializationError, Round, Side, StatKind, Stats, StatusKind, TickPhase,
};
