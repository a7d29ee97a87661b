//! Opponent decision engine.
//!
//! Picks an action for a non-player combatant by walking a fixed priority
//! tree and taking the first tier that produces an action:
//!
//! ```text
//! Selector
//!   ├─ FollowPattern            scripted steps, emergency override
//!   ├─ ExploitTechnical         skill that exploits an active status
//!   ├─ ExploitKnownWeakness     skill matching a remembered weakness
//!   ├─ Sequence
//!   │   ├─ IsHpLow
//!   │   └─ Selector(Heal, Guard)
//!   └─ AttackWeakest            default profile
//! ```

mod context;
mod memory;
pub mod nodes;
pub mod tree;

use std::collections::BTreeMap;

use tracing::debug;

pub use context::DecisionContext;
pub use memory::WeaknessMemory;
pub use tree::{Behavior, Selector, Sequence, Status};

use crate::action::BattleAction;
use crate::combat::ActionResult;
use crate::env::{BattleEnv, OracleError, SkillId};
use crate::state::{BattleState, CombatantId, Element};

/// One scripted turn.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PatternStep {
    Attack,
    Skill(SkillId),
    Guard,
    LimitBreak,
}

/// Action taken instead of the pattern while HP is below a threshold.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EmergencyOverride {
    /// HP percentage below which the override fires.
    pub hp_threshold: u32,
    pub step: PatternStep,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnPattern {
    pub steps: Vec<PatternStep>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub emergency: Option<EmergencyOverride>,
}

/// Per-combatant decision settings.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OpponentProfile {
    pub pattern: Option<TurnPattern>,
    /// HP percentage below which the combatant heals or guards.
    pub defensive_threshold: u32,
}

impl Default for OpponentProfile {
    fn default() -> Self {
        Self {
            pattern: None,
            defensive_threshold: 25,
        }
    }
}

impl OpponentProfile {
    pub fn scripted(steps: Vec<PatternStep>) -> Self {
        Self {
            pattern: Some(TurnPattern {
                steps,
                emergency: None,
            }),
            ..Self::default()
        }
    }

    pub fn with_emergency(mut self, hp_threshold: u32, step: PatternStep) -> Self {
        let pattern = self.pattern.get_or_insert_with(TurnPattern::default);
        pattern.emergency = Some(EmergencyOverride { hp_threshold, step });
        self
    }

    pub fn with_defensive_threshold(mut self, threshold: u32) -> Self {
        self.defensive_threshold = threshold;
        self
    }
}

/// Builds the default priority tree.
pub fn default_tree() -> Box<dyn Behavior> {
    tree::selector(vec![
        Box::new(nodes::FollowPattern),
        Box::new(nodes::ExploitTechnical),
        Box::new(nodes::ExploitKnownWeakness),
        tree::sequence(vec![
            Box::new(nodes::IsHpLow),
            tree::selector(vec![Box::new(nodes::Heal), Box::new(nodes::Guard)]),
        ]),
        Box::new(nodes::AttackWeakest),
    ])
}

/// Chooses actions for AI-controlled combatants and remembers what it learns
/// during the battle.
pub struct DecisionEngine {
    tree: Box<dyn Behavior>,
    cursors: BTreeMap<CombatantId, usize>,
    memory: WeaknessMemory,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(default_tree())
    }
}

impl DecisionEngine {
    pub fn new(tree: Box<dyn Behavior>) -> Self {
        Self {
            tree,
            cursors: BTreeMap::new(),
            memory: WeaknessMemory::new(),
        }
    }

    pub fn memory(&self) -> &WeaknessMemory {
        &self.memory
    }

    pub fn pattern_cursor(&self, actor: CombatantId) -> usize {
        self.cursors.get(&actor).copied().unwrap_or(0)
    }

    /// Picks an action for `actor`. Falls back to guarding when no tier
    /// produced anything (e.g. no living enemy is left).
    ///
    /// # Errors
    ///
    /// Any [`OracleError`] hit while evaluating the tree, such as a skill the
    /// actor or its pattern names that the catalog does not define. The
    /// pattern cursor does not move in that case.
    pub fn decide(
        &mut self,
        state: &BattleState,
        env: BattleEnv<'_>,
        actor: CombatantId,
        profile: &OpponentProfile,
    ) -> Result<BattleAction, OracleError> {
        let Some(combatant) = state.combatant(actor) else {
            return Ok(BattleAction::guard(actor));
        };
        let cursor = self.pattern_cursor(actor);
        let mut ctx = DecisionContext::new(combatant, state, env, profile, &self.memory, cursor);
        self.tree.tick(&mut ctx);
        let (action, advance) = ctx.into_decision()?;
        if advance {
            self.cursors.insert(actor, cursor + 1);
        }

        let action = action.unwrap_or_else(|| BattleAction::guard(actor));
        debug!(
            target: "battle::opponent",
            actor = %actor,
            action = %action.kind,
            cursor,
            "opponent decided"
        );
        Ok(action)
    }

    /// Records weaknesses revealed by an AI-controlled action.
    pub fn observe(&mut self, element: Option<Element>, result: &ActionResult) {
        if let Some(element) = element {
            let learned = self.memory.observe(element, result);
            if learned > 0 {
                debug!(target: "battle::opponent", element = %element, learned, "weakness learned");
            }
        }
    }
}

impl std::fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("cursors", &self.cursors)
            .field("memory", &self.memory)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, TargetSet};
    use crate::config::BattleConfig;
    use crate::env::{CatalogSnapshot, FixedRng, SkillCost, SkillDefinition};
    use crate::state::{
        ActiveStatus, CombatantTemplate, EncounterSettings, Side, StatusKind, Stats,
    };

    struct Fixture {
        state: BattleState,
        catalog: CatalogSnapshot,
        config: BattleConfig,
        rng: FixedRng,
    }

    impl Fixture {
        fn new() -> Self {
            let knight = CombatantTemplate::new("knight", "Knight", 100, 0, Stats::new(20, 10, 5, 5, 10, 5));
            let mage = CombatantTemplate::new("mage", "Mage", 60, 20, Stats::new(5, 5, 20, 10, 12, 5));
            let drake = CombatantTemplate::new("drake", "Drake", 200, 30, Stats::new(25, 15, 20, 15, 8, 5))
                .with_skills(["bolt".into(), "gust".into(), "mend".into()]);
            let state = BattleState::new(&[knight, mage], &[drake], EncounterSettings::default()).unwrap();
            let catalog = CatalogSnapshot::new()
                .with_skill(SkillDefinition::new("bolt", "Bolt", 40, Element::Thunder).with_cost(SkillCost::Mp(5)))
                .with_skill(SkillDefinition::new("gust", "Gust", 30, Element::Wind).magical().with_cost(SkillCost::Mp(5)))
                .with_skill(
                    SkillDefinition::new("mend", "Mend", 30, Element::Light)
                        .with_effect(crate::env::SkillEffect::Heal)
                        .with_target(crate::env::TargetPattern::SelfOnly)
                        .with_cost(SkillCost::Mp(10)),
                );
            Self {
                state,
                catalog,
                config: BattleConfig::default(),
                rng: FixedRng::new(50),
            }
        }

        fn env(&self) -> BattleEnv<'_> {
            BattleEnv::with_all(&self.catalog, &self.rng, &self.config)
        }
    }

    const DRAKE: CombatantId = CombatantId(2);

    #[test]
    fn default_attacks_the_weakest_enemy() {
        let fixture = Fixture::new();
        let mut engine = DecisionEngine::default();
        let action = engine.decide(&fixture.state, fixture.env(), DRAKE, &OpponentProfile::default()).unwrap();
        assert_eq!(action, BattleAction::attack(DRAKE, CombatantId(1)));
    }

    #[test]
    fn technical_opportunity_beats_default() {
        let mut fixture = Fixture::new();
        fixture
            .state
            .combatant_mut(CombatantId(0))
            .unwrap()
            .statuses
            .insert(ActiveStatus::new(StatusKind::Burn, 3, 5));

        let mut engine = DecisionEngine::default();
        let action = engine.decide(&fixture.state, fixture.env(), DRAKE, &OpponentProfile::default()).unwrap();
        assert_eq!(action.kind, ActionKind::Skill("bolt".into()));
        assert_eq!(action.targets, TargetSet::One(CombatantId(0)));
    }

    #[test]
    fn remembered_weakness_is_exploited() {
        let fixture = Fixture::new();
        let mut engine = DecisionEngine::default();
        engine.memory.record(CombatantId(0), Element::Wind);

        let action = engine.decide(&fixture.state, fixture.env(), DRAKE, &OpponentProfile::default()).unwrap();
        assert_eq!(action.kind, ActionKind::Skill("gust".into()));
        assert_eq!(action.targets, TargetSet::One(CombatantId(0)));
    }

    #[test]
    fn low_hp_heals_then_guards() {
        let mut fixture = Fixture::new();
        fixture.state.combatant_mut(DRAKE).unwrap().hp = 20;
        let mut engine = DecisionEngine::default();

        let action = engine.decide(&fixture.state, fixture.env(), DRAKE, &OpponentProfile::default()).unwrap();
        assert_eq!(action.kind, ActionKind::Skill("mend".into()));

        fixture.state.combatant_mut(DRAKE).unwrap().mp = 5;
        let action = engine.decide(&fixture.state, fixture.env(), DRAKE, &OpponentProfile::default()).unwrap();
        assert_eq!(action, BattleAction::guard(DRAKE));
    }

    #[test]
    fn emergency_override_does_not_advance_the_pattern() {
        let mut fixture = Fixture::new();
        let profile = OpponentProfile::scripted(vec![PatternStep::Skill("gust".into()), PatternStep::Attack])
            .with_emergency(30, PatternStep::Guard);
        let mut engine = DecisionEngine::default();

        let first = engine.decide(&fixture.state, fixture.env(), DRAKE, &profile).unwrap();
        assert_eq!(first.kind, ActionKind::Skill("gust".into()));
        assert_eq!(engine.pattern_cursor(DRAKE), 1);

        fixture.state.combatant_mut(DRAKE).unwrap().hp = 40;
        let emergency = engine.decide(&fixture.state, fixture.env(), DRAKE, &profile).unwrap();
        assert_eq!(emergency, BattleAction::guard(DRAKE));
        assert_eq!(engine.pattern_cursor(DRAKE), 1);

        fixture.state.combatant_mut(DRAKE).unwrap().hp = 200;
        let second = engine.decide(&fixture.state, fixture.env(), DRAKE, &profile).unwrap();
        assert_eq!(second.kind, ActionKind::Attack);
        assert_eq!(engine.pattern_cursor(DRAKE), 2);
    }

    #[test]
    fn party_side_uses_the_same_tree() {
        let fixture = Fixture::new();
        let mut engine = DecisionEngine::default();
        let knight = fixture.state.combatant(CombatantId(0)).unwrap();
        assert_eq!(knight.side, Side::Party);

        let action = engine.decide(&fixture.state, fixture.env(), CombatantId(0), &OpponentProfile::default()).unwrap();
        assert_eq!(action, BattleAction::attack(CombatantId(0), DRAKE));
    }

    #[test]
    fn known_skill_missing_from_catalog_is_fatal() {
        let mut fixture = Fixture::new();
        fixture.catalog = CatalogSnapshot::new();
        let mut engine = DecisionEngine::default();

        let err = engine
            .decide(&fixture.state, fixture.env(), DRAKE, &OpponentProfile::default())
            .unwrap_err();
        assert_eq!(err, OracleError::SkillNotFound("bolt".into()));
    }

    #[test]
    fn scripted_skill_missing_from_catalog_is_fatal() {
        let fixture = Fixture::new();
        let profile = OpponentProfile::scripted(vec![PatternStep::Skill("ghost".into()), PatternStep::Attack]);
        let mut engine = DecisionEngine::default();

        let err = engine.decide(&fixture.state, fixture.env(), DRAKE, &profile).unwrap_err();
        assert_eq!(err, OracleError::SkillNotFound("ghost".into()));
        assert_eq!(engine.pattern_cursor(DRAKE), 0);

        let emergency = OpponentProfile::scripted(vec![PatternStep::Attack])
            .with_emergency(101, PatternStep::Skill("ghost".into()));
        let err = engine.decide(&fixture.state, fixture.env(), DRAKE, &emergency).unwrap_err();
        assert_eq!(err, OracleError::SkillNotFound("ghost".into()));
    }
}
