//! Blackboard handed to every decision node.

use super::{OpponentProfile, PatternStep, Status, WeaknessMemory};
use crate::action::{BattleAction, TargetSet, hp_cost};
use crate::env::{BattleEnv, OracleError, SkillCost, SkillDefinition, TargetPattern};
use crate::state::{BattleState, Combatant, CombatantId};

/// Read access to the battle for one decision, plus the slot the chosen
/// action is written to. A node that hits a catalog error records it with
/// [`DecisionContext::fail`]; the decision then fails as a whole.
pub struct DecisionContext<'a> {
    pub actor: &'a Combatant,
    pub state: &'a BattleState,
    pub env: BattleEnv<'a>,
    pub profile: &'a OpponentProfile,
    pub memory: &'a WeaknessMemory,
    /// Index of the next scripted pattern step.
    pub cursor: usize,
    advance: bool,
    action: Option<BattleAction>,
    error: Option<OracleError>,
}

impl<'a> DecisionContext<'a> {
    pub fn new(
        actor: &'a Combatant,
        state: &'a BattleState,
        env: BattleEnv<'a>,
        profile: &'a OpponentProfile,
        memory: &'a WeaknessMemory,
        cursor: usize,
    ) -> Self {
        Self {
            actor,
            state,
            env,
            profile,
            memory,
            cursor,
            advance: false,
            action: None,
            error: None,
        }
    }

    pub fn set_action(&mut self, action: BattleAction) {
        self.action = Some(action);
    }

    pub fn action(&self) -> Option<&BattleAction> {
        self.action.as_ref()
    }

    /// Marks the current pattern step as consumed.
    pub fn advance_pattern(&mut self) {
        self.advance = true;
    }

    /// Records `err` (the first one wins) and fails the calling node.
    pub fn fail(&mut self, err: OracleError) -> Status {
        self.error.get_or_insert(err);
        Status::Failure
    }

    /// Chosen action and whether the pattern cursor moves on.
    ///
    /// # Errors
    ///
    /// The first catalog error any node recorded.
    pub fn into_decision(self) -> Result<(Option<BattleAction>, bool), OracleError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok((self.action, self.advance)),
        }
    }

    /// Living combatants on the opposing side, in roster order.
    pub fn enemies(&self) -> impl Iterator<Item = &'a Combatant> + use<'a> {
        self.state.living(self.actor.side.opposing())
    }

    /// Living enemy with the lowest HP; ties go to roster order.
    pub fn weakest_enemy(&self) -> Option<CombatantId> {
        self.enemies()
            .min_by_key(|combatant| (combatant.hp, combatant.id))
            .map(|combatant| combatant.id)
    }

    /// Living ally (self included) with the lowest HP percentage.
    pub fn most_injured_ally(&self) -> Option<CombatantId> {
        self.state
            .living(self.actor.side)
            .min_by_key(|combatant| (combatant.hp_percent(), combatant.id))
            .map(|combatant| combatant.id)
    }

    /// Catalog definitions of the actor's skills whose cost it can pay now.
    ///
    /// # Errors
    ///
    /// [`OracleError::SkillNotFound`] when the actor knows a skill the
    /// catalog does not define.
    pub fn usable_skills(&self) -> Result<Vec<SkillDefinition>, OracleError> {
        let mut usable = Vec::with_capacity(self.actor.skills.len());
        for id in &self.actor.skills {
            let skill = self.env.skill(id)?;
            if self.can_pay(&skill) {
                usable.push(skill);
            }
        }
        Ok(usable)
    }

    pub fn can_pay(&self, skill: &SkillDefinition) -> bool {
        match skill.cost {
            SkillCost::None => true,
            SkillCost::Mp(required) => self.actor.mp >= required,
            SkillCost::HpPercent(percent) => self.actor.hp > hp_cost(self.actor.max_hp, percent),
        }
    }

    pub fn gauge_full(&self) -> bool {
        self.env
            .config()
            .is_ok_and(|config| self.actor.gauge >= config.gauge.maximum)
    }

    /// Builds a skill action, aiming single-target patterns at `preferred`.
    pub fn skill_action(&self, skill: &SkillDefinition, preferred: Option<CombatantId>) -> BattleAction {
        let targets = match skill.target {
            TargetPattern::Single => preferred
                .or_else(|| self.weakest_enemy())
                .map(TargetSet::One)
                .unwrap_or_default(),
            TargetPattern::SingleAlly => self
                .most_injured_ally()
                .map(TargetSet::One)
                .unwrap_or_default(),
            TargetPattern::SelfOnly => TargetSet::One(self.actor.id),
            TargetPattern::All | TargetPattern::AllAllies => TargetSet::All,
        };
        BattleAction::skill(self.actor.id, skill.id.clone(), targets)
    }

    /// Action for a scripted step, or `None` when the step cannot be used
    /// right now.
    ///
    /// # Errors
    ///
    /// [`OracleError::SkillNotFound`] when the step names a skill the catalog
    /// does not define, whether or not the actor knows it.
    pub fn step_action(&self, step: &PatternStep) -> Result<Option<BattleAction>, OracleError> {
        let action = match step {
            PatternStep::Attack => self
                .weakest_enemy()
                .map(|target| BattleAction::attack(self.actor.id, target)),
            PatternStep::Guard => Some(BattleAction::guard(self.actor.id)),
            PatternStep::Skill(id) => {
                let skill = self.env.skill(id)?;
                (self.actor.skills.contains(id) && self.can_pay(&skill))
                    .then(|| self.skill_action(&skill, None))
            }
            PatternStep::LimitBreak => self
                .weakest_enemy()
                .filter(|_| self.gauge_full())
                .map(|target| BattleAction::limit_break(self.actor.id, target)),
        };
        Ok(action)
    }
}
