//! Decision nodes, one per priority tier.

use super::tree::{Behavior, Status};
use super::DecisionContext;
use crate::action::BattleAction;
use crate::combat::technical::exploitable_status;
use crate::env::SkillEffect;

/// Scripted turn pattern with its emergency override.
///
/// Below the emergency threshold the override action is used and the cursor
/// stays put. A step that cannot be used right now is skipped: the cursor
/// moves on and the lower tiers decide this turn.
pub struct FollowPattern;

impl Behavior for FollowPattern {
    fn tick(&self, ctx: &mut DecisionContext<'_>) -> Status {
        let profile = ctx.profile;
        let Some(pattern) = profile.pattern.as_ref() else {
            return Status::Failure;
        };
        if pattern.steps.is_empty() {
            return Status::Failure;
        }

        if let Some(emergency) = pattern.emergency.as_ref()
            && ctx.actor.hp_percent() < emergency.hp_threshold
        {
            match ctx.step_action(&emergency.step) {
                Ok(Some(action)) => {
                    ctx.set_action(action);
                    return Status::Success;
                }
                Ok(None) => {}
                Err(err) => return ctx.fail(err),
            }
        }

        let step = &pattern.steps[ctx.cursor % pattern.steps.len()];
        ctx.advance_pattern();
        match ctx.step_action(step) {
            Ok(choice) => commit(ctx, choice),
            Err(err) => ctx.fail(err),
        }
    }
}

/// Uses a damage skill that lands a technical hit on some living enemy.
pub struct ExploitTechnical;

impl Behavior for ExploitTechnical {
    fn tick(&self, ctx: &mut DecisionContext<'_>) -> Status {
        let skills = match ctx.usable_skills() {
            Ok(skills) => skills,
            Err(err) => return ctx.fail(err),
        };
        let choice = ctx.enemies().find_map(|enemy| {
            skills
                .iter()
                .filter(|skill| skill.effect == SkillEffect::Damage)
                .find(|skill| {
                    exploitable_status(
                        enemy.statuses(),
                        skill.element,
                        skill.damage_kind,
                        &skill.technical_with,
                    )
                    .is_some()
                })
                .map(|skill| ctx.skill_action(skill, Some(enemy.id)))
        });
        commit(ctx, choice)
    }
}

/// Uses a damage skill of an element some living enemy is known to be weak to.
pub struct ExploitKnownWeakness;

impl Behavior for ExploitKnownWeakness {
    fn tick(&self, ctx: &mut DecisionContext<'_>) -> Status {
        if ctx.memory.is_empty() {
            return Status::Failure;
        }
        let skills = match ctx.usable_skills() {
            Ok(skills) => skills,
            Err(err) => return ctx.fail(err),
        };
        let memory = ctx.memory;
        let choice = ctx.enemies().find_map(|enemy| {
            skills
                .iter()
                .filter(|skill| skill.effect == SkillEffect::Damage)
                .find(|skill| memory.knows(enemy.id, skill.element))
                .map(|skill| ctx.skill_action(skill, Some(enemy.id)))
        });
        commit(ctx, choice)
    }
}

/// Succeeds while the actor's HP is under the profile's defensive threshold.
pub struct IsHpLow;

impl Behavior for IsHpLow {
    fn tick(&self, ctx: &mut DecisionContext<'_>) -> Status {
        Status::from_bool(ctx.actor.hp_percent() < ctx.profile.defensive_threshold)
    }
}

/// Casts the first usable healing skill.
pub struct Heal;

impl Behavior for Heal {
    fn tick(&self, ctx: &mut DecisionContext<'_>) -> Status {
        let skills = match ctx.usable_skills() {
            Ok(skills) => skills,
            Err(err) => return ctx.fail(err),
        };
        let choice = skills
            .iter()
            .find(|skill| skill.is_healing())
            .map(|skill| ctx.skill_action(skill, Some(ctx.actor.id)));
        commit(ctx, choice)
    }
}

pub struct Guard;

impl Behavior for Guard {
    fn tick(&self, ctx: &mut DecisionContext<'_>) -> Status {
        ctx.set_action(BattleAction::guard(ctx.actor.id));
        Status::Success
    }
}

/// Basic attack on the living enemy with the lowest HP.
pub struct AttackWeakest;

impl Behavior for AttackWeakest {
    fn tick(&self, ctx: &mut DecisionContext<'_>) -> Status {
        let choice = ctx
            .weakest_enemy()
            .map(|target| BattleAction::attack(ctx.actor.id, target));
        commit(ctx, choice)
    }
}

fn commit(ctx: &mut DecisionContext<'_>, choice: Option<BattleAction>) -> Status {
    match choice {
        Some(action) => {
            ctx.set_action(action);
            Status::Success
        }
        None => Status::Failure,
    }
}
