//! Action validation.
//!
//! Checks performed before an action is resolved:
//! - the actor exists, is alive, holds the turn and can act
//! - the skill/item/duo exists in the catalog and is usable by the actor
//! - costs can be paid
//! - the requested targets match the action's pattern
//!
//! Dead targets are dropped from the set with a warning; the action is only
//! rejected when no living target remains.

use tracing::warn;

use super::{ActionError, ActionKind, BattleAction, TargetSet};
use crate::chain::ChainController;
use crate::combat::StatusEngine;
use crate::env::{
    BattleEnv, DuoDefinition, InventoryService, ItemDefinition, ItemEffect, SkillCost,
    SkillDefinition, SkillEffect, TargetPattern,
};
use crate::state::{BattleState, CombatantId, Element, Side};

/// Catalog-resolved form of an action, ready for the resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PreparedKind {
    Attack,
    Skill(SkillDefinition),
    Item(ItemDefinition),
    Guard,
    LimitBreak,
    Duo {
        definition: DuoDefinition,
        partner: CombatantId,
    },
    Escape,
    AllOutAttack,
}

impl PreparedKind {
    /// Element carried by an offensive action.
    pub fn element(&self) -> Option<Element> {
        match self {
            PreparedKind::Attack | PreparedKind::LimitBreak | PreparedKind::AllOutAttack => {
                Some(Element::Physical)
            }
            PreparedKind::Skill(skill) if skill.effect == SkillEffect::Damage => Some(skill.element),
            PreparedKind::Item(item) => match item.effect {
                ItemEffect::Damage { element, .. } => Some(element),
                _ => None,
            },
            PreparedKind::Duo { definition, .. } => Some(definition.element),
            PreparedKind::Skill(_) | PreparedKind::Guard | PreparedKind::Escape => None,
        }
    }
}

/// A validated action with its concrete, living target list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedAction {
    pub actor: CombatantId,
    pub side: Side,
    pub kind: PreparedKind,
    pub targets: Vec<CombatantId>,
}

/// Validates `action` against the current state.
///
/// # Errors
///
/// Returns an [`ActionError`] describing why the action was rejected. The
/// state is never modified.
pub fn validate(
    state: &BattleState,
    env: &BattleEnv<'_>,
    inventory: &dyn InventoryService,
    chain: &ChainController,
    status: &StatusEngine,
    action: &BattleAction,
) -> Result<PreparedAction, ActionError> {
    let actor = state
        .combatant(action.actor)
        .ok_or(ActionError::ActorNotFound(action.actor))?;
    if !actor.is_alive() {
        return Err(ActionError::ActorDefeated(actor.id));
    }
    if state.current != Some(actor.id) {
        return Err(ActionError::NotActorsTurn { actual: actor.id });
    }
    if !status.can_act(actor) {
        return Err(ActionError::ActorCannotAct(actor.id));
    }

    let side = actor.side;
    let (kind, pattern) = match &action.kind {
        ActionKind::Attack => (PreparedKind::Attack, TargetPattern::Single),
        ActionKind::Skill(id) => {
            if !actor.skills.contains(id) {
                return Err(ActionError::SkillNotKnown(id.clone()));
            }
            let skill = env.skill(id)?;
            match skill.cost {
                SkillCost::None => {}
                SkillCost::Mp(required) if actor.mp < required => {
                    return Err(ActionError::InsufficientMp {
                        required,
                        available: actor.mp,
                    });
                }
                SkillCost::Mp(_) => {}
                SkillCost::HpPercent(percent) => {
                    let required = hp_cost(actor.max_hp, percent);
                    if actor.hp <= required {
                        return Err(ActionError::InsufficientHp {
                            required,
                            available: actor.hp,
                        });
                    }
                }
            }
            let pattern = skill.target;
            (PreparedKind::Skill(skill), pattern)
        }
        ActionKind::Item(id) => {
            let item = env.item(id)?;
            if inventory.quantity(id) == 0 {
                return Err(ActionError::ItemUnavailable(id.clone()));
            }
            let pattern = item.target;
            (PreparedKind::Item(item), pattern)
        }
        ActionKind::Guard => (PreparedKind::Guard, TargetPattern::SelfOnly),
        ActionKind::LimitBreak => {
            chain.ensure_ultimate(state, actor.id)?;
            (PreparedKind::LimitBreak, TargetPattern::Single)
        }
        ActionKind::DuoUltimate(id) => {
            let definition = env.duo(id)?;
            let partner = chain.ensure_duo(state, actor.id, &definition)?;
            (PreparedKind::Duo { definition, partner }, TargetPattern::All)
        }
        ActionKind::Escape => {
            if !state.encounter.escapable || side != Side::Party {
                return Err(ActionError::EscapeForbidden);
            }
            return Ok(PreparedAction {
                actor: actor.id,
                side,
                kind: PreparedKind::Escape,
                targets: Vec::new(),
            });
        }
        ActionKind::AllOutAttack => {
            chain.ensure_finisher(state, side)?;
            (PreparedKind::AllOutAttack, TargetPattern::All)
        }
    };

    let targets = resolve_targets(state, actor.id, side, pattern, &action.targets)?;
    Ok(PreparedAction {
        actor: actor.id,
        side,
        kind,
        targets,
    })
}

/// HP paid by an `HpPercent` cost.
pub(crate) fn hp_cost(max_hp: u32, percent: u32) -> u32 {
    ((max_hp as u64 * percent as u64) / 100).max(1) as u32
}

fn resolve_targets(
    state: &BattleState,
    actor: CombatantId,
    side: Side,
    pattern: TargetPattern,
    requested: &TargetSet,
) -> Result<Vec<CombatantId>, ActionError> {
    let aimed_side = if pattern.is_friendly() {
        side
    } else {
        side.opposing()
    };

    let targets: Vec<CombatantId> = match pattern {
        TargetPattern::SelfOnly => vec![actor],
        TargetPattern::All | TargetPattern::AllAllies => {
            state.living(aimed_side).map(|combatant| combatant.id).collect()
        }
        TargetPattern::Single | TargetPattern::SingleAlly => {
            let ids = requested.ids();
            if ids.is_empty() {
                // No explicit choice: first living combatant on the aimed side.
                state
                    .living(aimed_side)
                    .map(|combatant| combatant.id)
                    .take(1)
                    .collect()
            } else {
                let mut living = Vec::with_capacity(ids.len());
                for id in ids {
                    let target = state
                        .combatant(*id)
                        .ok_or(ActionError::TargetNotFound(*id))?;
                    if target.side != aimed_side {
                        return Err(ActionError::InvalidTarget(*id));
                    }
                    if !target.is_alive() {
                        warn!(
                            target: "battle::action",
                            actor = %actor,
                            dropped = %id,
                            "dropping defeated target"
                        );
                        continue;
                    }
                    if !living.contains(id) {
                        living.push(*id);
                    }
                }
                living
            }
        }
    };

    if targets.is_empty() {
        return Err(ActionError::NoLivingTargets);
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BattleConfig;
    use crate::env::{CatalogSnapshot, LedgerInventory, PcgRng};
    use crate::state::{BattleFlags, CombatantTemplate, EncounterSettings, Stats};

    struct Fixture {
        state: BattleState,
        catalog: CatalogSnapshot,
        config: BattleConfig,
        inventory: LedgerInventory,
    }

    impl Fixture {
        fn new() -> Self {
            let hero = CombatantTemplate::new("hero", "Hero", 100, 5, Stats::new(20, 10, 20, 10, 10, 5))
                .with_skills(["fira".into()]);
            let slime = CombatantTemplate::new("slime", "Slime", 40, 0, Stats::new(8, 4, 4, 4, 5, 1));
            let mut state = BattleState::new(
                &[hero],
                &[slime.clone(), slime],
                EncounterSettings::default(),
            )
            .unwrap();
            state.current = Some(CombatantId(0));

            let catalog = CatalogSnapshot::new()
                .with_skill(
                    SkillDefinition::new("fira", "Fira", 60, Element::Fire)
                        .magical()
                        .with_cost(SkillCost::Mp(8)),
                )
                .with_item(ItemDefinition::new(
                    "potion",
                    "Potion",
                    ItemEffect::Heal(50),
                    TargetPattern::SingleAlly,
                ));
            Self {
                state,
                catalog,
                config: BattleConfig::default(),
                inventory: LedgerInventory::new(),
            }
        }

        fn validate(&self, action: &BattleAction) -> Result<PreparedAction, ActionError> {
            let env = BattleEnv::with_all(&self.catalog, &PcgRng, &self.config);
            validate(
                &self.state,
                &env,
                &self.inventory,
                &ChainController::new(&self.config),
                &StatusEngine::default(),
                action,
            )
        }
    }

    #[test]
    fn insufficient_mp_is_rejected() {
        let fixture = Fixture::new();
        let action = BattleAction::skill(CombatantId(0), "fira", TargetSet::One(CombatantId(1)));
        assert_eq!(
            fixture.validate(&action).unwrap_err(),
            ActionError::InsufficientMp {
                required: 8,
                available: 5
            }
        );
    }

    #[test]
    fn dead_targets_are_dropped() {
        let mut fixture = Fixture::new();
        if let Some(slime) = fixture.state.combatant_mut(CombatantId(1)) {
            slime.hp = 0;
            slime.flags.insert(BattleFlags::DEFEATED);
        }

        let both = BattleAction::new(
            CombatantId(0),
            ActionKind::Attack,
            TargetSet::Several(vec![CombatantId(1), CombatantId(2)]),
        );
        assert_eq!(fixture.validate(&both).unwrap().targets, vec![CombatantId(2)]);

        let dead_only = BattleAction::attack(CombatantId(0), CombatantId(1));
        assert_eq!(
            fixture.validate(&dead_only).unwrap_err(),
            ActionError::NoLivingTargets
        );
    }

    #[test]
    fn wrong_turn_missing_item_and_unknown_skill() {
        let fixture = Fixture::new();
        assert_eq!(
            fixture
                .validate(&BattleAction::attack(CombatantId(1), CombatantId(0)))
                .unwrap_err(),
            ActionError::NotActorsTurn {
                actual: CombatantId(1)
            }
        );
        assert!(matches!(
            fixture.validate(&BattleAction::item(CombatantId(0), "potion", TargetSet::One(CombatantId(0)))),
            Err(ActionError::ItemUnavailable(_))
        ));
        assert!(matches!(
            fixture.validate(&BattleAction::skill(CombatantId(0), "blizzard", TargetSet::All)),
            Err(ActionError::SkillNotKnown(_))
        ));
    }

    #[test]
    fn chain_privileges_report_not_available() {
        let fixture = Fixture::new();
        assert!(matches!(
            fixture.validate(&BattleAction::all_out_attack(CombatantId(0))),
            Err(ActionError::Chain(_))
        ));
        assert!(matches!(
            fixture.validate(&BattleAction::limit_break(CombatantId(0), CombatantId(1))),
            Err(ActionError::Chain(_))
        ));
    }
}
