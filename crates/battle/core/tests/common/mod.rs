//! Shared fixture for battle scenario tests.
#![allow(dead_code)]

use battle_core::{
    BattleConfig, BattleEngine, BattleEnv, BattleEvent, BattleState, CatalogSnapshot,
    CombatantId, CombatantTemplate, EncounterSettings, FixedRng, LedgerInventory, RngOracle,
    Stats, TurnInfo, TurnPrompt,
};

/// Owns every collaborator an engine borrows.
pub struct Fixture {
    pub catalog: CatalogSnapshot,
    pub config: BattleConfig,
    pub rng: Box<dyn RngOracle>,
    pub inventory: LedgerInventory,
}

impl Fixture {
    /// Every d100 roll returns 50: hits land, default crits never happen.
    pub fn new(catalog: CatalogSnapshot) -> Self {
        Self {
            catalog,
            config: BattleConfig::default(),
            rng: Box::new(FixedRng::new(50)),
            inventory: LedgerInventory::new(),
        }
    }

    pub fn engine(
        &mut self,
        party: &[CombatantTemplate],
        enemies: &[CombatantTemplate],
        encounter: EncounterSettings,
    ) -> BattleEngine<'_> {
        let state = BattleState::new(party, enemies, encounter).expect("valid roster");
        let env = BattleEnv::with_all(&self.catalog, &*self.rng, &self.config);
        let mut engine = BattleEngine::new(state, env, &mut self.inventory).expect("engine");
        engine.start().expect("start");
        engine
    }
}

pub fn template(key: &str, hp: u32, stats: Stats) -> CombatantTemplate {
    CombatantTemplate::new(key, key, hp, 50, stats)
}

/// Advances to the next turn, which must belong to `expected`.
pub fn expect_turn(engine: &mut BattleEngine<'_>, expected: CombatantId) -> TurnInfo {
    match engine.next_turn().expect("next turn") {
        TurnPrompt::Act(info) => {
            assert_eq!(info.actor, expected, "unexpected actor");
            info
        }
        TurnPrompt::Ended(outcome) => panic!("battle ended early: {outcome}"),
    }
}

pub fn has_event(events: &[BattleEvent], predicate: impl Fn(&BattleEvent) -> bool) -> bool {
    events.iter().any(predicate)
}
