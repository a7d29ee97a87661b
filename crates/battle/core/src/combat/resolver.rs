//! Action resolution.
//!
//! [`DamageResolver::resolve`] turns a [`PreparedAction`] into HP, MP and
//! status changes on its targets and reports them as an [`ActionResult`].
//! Every hit is evaluated for accuracy, affinity, critical and technical
//! bonuses independently; all applicable multipliers compose multiplicatively.
//! Costs, chain privileges and defeat bookkeeping belong to the scheduler.

use tracing::trace;

use super::damage::{affinity_multiplier, base_damage, compose, healing_amount};
use super::hit::{crit_chance, hit_chance, roll_succeeds};
use super::result::{ActionResult, TargetOutcome};
use super::status::StatusEngine;
use super::technical::exploitable_status;
use crate::action::{PreparedAction, PreparedKind};
use crate::config::BattleConfig;
use crate::env::{
    DamageKind, Infliction, ItemEffect, RngOracle, RollContext, SkillEffect, compute_seed,
};
use crate::state::{
    Affinity, BattleFlags, BattleState, Combatant, CombatantId, Element, StatusKind,
};

/// Offensive description of one hit, independent of where it came from.
#[derive(Clone, Debug)]
struct Strike<'s> {
    power: u32,
    element: Element,
    kind: DamageKind,
    /// Offensive stat used for scaling; `None` means fixed damage.
    offense: Option<i32>,
    accuracy: Option<u32>,
    crit_bonus: u32,
    can_crit: bool,
    always_hits: bool,
    inflicts: Option<Infliction>,
    technical_with: &'s [StatusKind],
}

pub struct DamageResolver<'a> {
    config: &'a BattleConfig,
    rng: &'a dyn RngOracle,
    status: StatusEngine,
}

impl<'a> DamageResolver<'a> {
    pub fn new(config: &'a BattleConfig, rng: &'a dyn RngOracle) -> Self {
        Self {
            config,
            rng,
            status: StatusEngine::new(config.status),
        }
    }

    /// Resolves `action`. `bonus` is the chain damage multiplier in percent.
    pub fn resolve(&self, state: &mut BattleState, action: &PreparedAction, bonus: u32) -> ActionResult {
        let actor = action.actor;
        let Some(attacker) = state.combatant(actor) else {
            return ActionResult::new(actor, Vec::new());
        };
        let stats = attacker.stats;
        let outcomes = match &action.kind {
            PreparedKind::Attack => {
                let strike = Strike {
                    power: self.config.damage.attack_power,
                    element: Element::Physical,
                    kind: DamageKind::Physical,
                    offense: Some(stats.attack),
                    accuracy: None,
                    crit_bonus: 0,
                    can_crit: true,
                    always_hits: false,
                    inflicts: None,
                    technical_with: &[],
                };
                self.strike_all(state, actor, &action.targets, &strike, bonus)
            }
            PreparedKind::Skill(skill) => match skill.effect {
                SkillEffect::Damage => {
                    let offense = match skill.damage_kind {
                        DamageKind::Physical => stats.attack,
                        DamageKind::Magical => stats.magic_attack,
                    };
                    let strike = Strike {
                        power: skill.power,
                        element: skill.element,
                        kind: skill.damage_kind,
                        offense: Some(offense),
                        accuracy: skill.accuracy,
                        crit_bonus: skill.crit_bonus,
                        can_crit: true,
                        always_hits: false,
                        inflicts: skill.inflicts,
                        technical_with: &skill.technical_with,
                    };
                    self.strike_all(state, actor, &action.targets, &strike, bonus)
                }
                SkillEffect::Heal => {
                    let amount = healing_amount(&self.config.damage, skill.power, stats.magic_attack);
                    self.restore_all(state, actor, &action.targets, amount, skill.inflicts)
                }
                SkillEffect::Support => self.restore_all(state, actor, &action.targets, 0, skill.inflicts),
            },
            PreparedKind::Item(item) => self.use_item(state, actor, &action.targets, item.effect),
            PreparedKind::Guard => {
                if let Some(combatant) = state.combatant_mut(actor) {
                    combatant.flags.insert(BattleFlags::GUARDING);
                }
                Vec::new()
            }
            PreparedKind::LimitBreak => {
                let strike = Strike {
                    power: self.config.gauge.limit_break_power,
                    element: Element::Physical,
                    kind: DamageKind::Physical,
                    offense: Some(stats.attack.max(stats.magic_attack)),
                    accuracy: Some(self.config.hit.max_hit_chance),
                    crit_bonus: 0,
                    can_crit: true,
                    always_hits: true,
                    inflicts: None,
                    technical_with: &[],
                };
                self.strike_all(state, actor, &action.targets, &strike, bonus)
            }
            PreparedKind::Duo {
                definition,
                partner,
            } => {
                let partner_stats = state.combatant(*partner).map(|c| c.stats).unwrap_or(stats);
                let offense = match definition.damage_kind {
                    DamageKind::Physical => stats.attack + partner_stats.attack,
                    DamageKind::Magical => stats.magic_attack + partner_stats.magic_attack,
                };
                let strike = Strike {
                    power: definition.power,
                    element: definition.element,
                    kind: definition.damage_kind,
                    offense: Some(offense),
                    accuracy: None,
                    crit_bonus: 0,
                    can_crit: true,
                    always_hits: true,
                    inflicts: None,
                    technical_with: &[],
                };
                self.strike_all(state, actor, &action.targets, &strike, bonus)
            }
            PreparedKind::AllOutAttack => {
                let offense: i32 = state
                    .living(action.side)
                    .map(|ally| ally.stats.attack.max(0))
                    .sum();
                let strike = Strike {
                    power: self.config.chain.finisher_power,
                    element: Element::Physical,
                    kind: DamageKind::Physical,
                    offense: Some(offense),
                    accuracy: None,
                    crit_bonus: 0,
                    can_crit: false,
                    always_hits: true,
                    inflicts: None,
                    technical_with: &[],
                };
                self.strike_all(state, actor, &action.targets, &strike, bonus)
            }
            PreparedKind::Escape => Vec::new(),
        };

        ActionResult::new(actor, outcomes)
    }

    fn roll(&self, state: &BattleState, actor: CombatantId, context: RollContext, slot: usize) -> u32 {
        let seed = compute_seed(state.encounter.seed, state.nonce, actor.0, context.for_slot(slot));
        self.rng.roll_d100(seed)
    }

    fn strike_all(
        &self,
        state: &mut BattleState,
        actor: CombatantId,
        targets: &[CombatantId],
        strike: &Strike<'_>,
        bonus: u32,
    ) -> Vec<TargetOutcome> {
        targets
            .iter()
            .enumerate()
            .map(|(slot, target)| self.strike(state, actor, *target, slot, strike, bonus))
            .collect()
    }

    fn strike(
        &self,
        state: &mut BattleState,
        actor: CombatantId,
        target: CombatantId,
        slot: usize,
        strike: &Strike<'_>,
        bonus: u32,
    ) -> TargetOutcome {
        let mut outcome = TargetOutcome::new(target);
        let (Some(attacker), Some(aimed)) = (state.combatant(actor), state.combatant(target)) else {
            outcome.evaded = true;
            return outcome;
        };
        let attacker_stats = attacker.stats;
        let reflected = strike.kind == DamageKind::Magical
            && target != actor
            && aimed.statuses().has(StatusKind::Reflect);
        if reflected {
            outcome.reflected = true;
            outcome.recipient = actor;
        }

        let Some(recipient) = state.combatant(outcome.recipient) else {
            return outcome;
        };
        outcome.was_downed = recipient.is_downed();

        if !strike.always_hits {
            let chance = hit_chance(
                &self.config.hit,
                strike.accuracy,
                attacker_stats.speed,
                recipient.stats.speed,
            );
            let roll = self.roll(state, actor, RollContext::Hit, slot);
            trace!(target: "battle::roll", actor = %actor, target = %outcome.recipient, roll, chance, "hit roll");
            if !roll_succeeds(roll, chance) {
                outcome.evaded = true;
                return outcome;
            }
        }

        let affinity = recipient.affinities.get(strike.element);
        let technical = exploitable_status(
            recipient.statuses(),
            strike.element,
            strike.kind,
            strike.technical_with,
        );
        let critical = strike.can_crit && {
            let chance = crit_chance(&self.config.hit, strike.crit_bonus, attacker_stats.luck);
            let roll = self.roll(state, actor, RollContext::Critical, slot);
            trace!(target: "battle::roll", actor = %actor, roll, chance, "critical roll");
            roll_succeeds(roll, chance)
        };

        let defense = match strike.kind {
            DamageKind::Physical => recipient.stats.defense,
            DamageKind::Magical => recipient.stats.magic_defense,
        };
        let base = match strike.offense {
            Some(offense) => base_damage(&self.config.damage, strike.power, offense, defense),
            None => strike.power.max(self.config.damage.minimum),
        };
        let guarding = recipient.is_guarding();

        let Some(affinity_multiplier) = affinity_multiplier(&self.config.affinity, affinity) else {
            // Absorbed hits heal the unscaled base; chain bonuses never apply.
            if affinity == Affinity::Absorb {
                if let Some(recipient) = state.combatant_mut(outcome.recipient) {
                    outcome.healing = recipient.heal(base);
                }
                outcome.absorbed = true;
            } else {
                outcome.nullified = true;
            }
            return outcome;
        };

        let mut multipliers = Vec::with_capacity(6);
        multipliers.push(affinity_multiplier);
        if critical {
            multipliers.push(self.config.hit.crit_multiplier);
        }
        if technical.is_some() {
            multipliers.push(self.config.technical.multiplier);
        }
        multipliers.push(bonus);
        if guarding {
            multipliers.push(self.config.damage.guard_multiplier);
        }
        let variance = self.config.damage.variance;
        if variance > 0 {
            let seed = compute_seed(
                state.encounter.seed,
                state.nonce,
                actor.0,
                RollContext::Variance.for_slot(slot),
            );
            multipliers.push(self.rng.range(seed, 100u32.saturating_sub(variance), 100 + variance));
        }
        let amount = compose(base, &multipliers).max(self.config.damage.minimum);

        outcome.critical = critical;
        outcome.weakness = affinity == Affinity::Weak;
        outcome.technical = technical;

        let infliction_roll = strike
            .inflicts
            .map(|infliction| (infliction, self.roll(state, actor, RollContext::Infliction, slot)));

        let Some(recipient) = state.combatant_mut(outcome.recipient) else {
            return outcome;
        };
        outcome.damage = recipient.take_damage(amount);
        if let Some(kind) = technical
            && self.status.remove(recipient, kind)
        {
            outcome.statuses_removed.push(kind);
        }
        if let Some((infliction, roll)) = infliction_roll
            && recipient.hp > 0
            && roll_succeeds(roll, infliction.chance)
            && self.inflict(recipient, infliction)
        {
            outcome.statuses_applied.push(infliction.kind);
        }
        outcome
    }

    fn inflict(&self, recipient: &mut Combatant, infliction: Infliction) -> bool {
        self.status
            .apply(
                recipient,
                infliction.kind,
                infliction.duration,
                infliction.power,
                infliction.rule,
            )
            .took_effect()
    }

    /// Healing and support on friendly targets: heal `amount`, then roll the
    /// infliction.
    fn restore_all(
        &self,
        state: &mut BattleState,
        actor: CombatantId,
        targets: &[CombatantId],
        amount: u32,
        inflicts: Option<Infliction>,
    ) -> Vec<TargetOutcome> {
        let mut outcomes = Vec::with_capacity(targets.len());
        for (slot, target) in targets.iter().enumerate() {
            let roll = inflicts.map(|_| self.roll(state, actor, RollContext::Infliction, slot));
            let mut outcome = TargetOutcome::new(*target);
            if let Some(recipient) = state.combatant_mut(*target) {
                if amount > 0 {
                    outcome.healing = recipient.heal(amount);
                }
                if let (Some(infliction), Some(roll)) = (inflicts, roll)
                    && roll_succeeds(roll, infliction.chance)
                    && self.inflict(recipient, infliction)
                {
                    outcome.statuses_applied.push(infliction.kind);
                }
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    fn use_item(
        &self,
        state: &mut BattleState,
        actor: CombatantId,
        targets: &[CombatantId],
        effect: ItemEffect,
    ) -> Vec<TargetOutcome> {
        match effect {
            ItemEffect::Heal(amount) => self.restore_all(state, actor, targets, amount, None),
            ItemEffect::ApplyStatus(infliction) => {
                self.restore_all(state, actor, targets, 0, Some(infliction))
            }
            ItemEffect::RestoreMp(amount) => targets
                .iter()
                .map(|target| {
                    let mut outcome = TargetOutcome::new(*target);
                    if let Some(recipient) = state.combatant_mut(*target) {
                        outcome.mp_restored = recipient.restore_mp(amount);
                    }
                    outcome
                })
                .collect(),
            ItemEffect::Cure(kind) => targets
                .iter()
                .map(|target| {
                    let mut outcome = TargetOutcome::new(*target);
                    if let Some(recipient) = state.combatant_mut(*target)
                        && self.status.remove(recipient, kind)
                    {
                        outcome.statuses_removed.push(kind);
                    }
                    outcome
                })
                .collect(),
            ItemEffect::Damage { power, element } => {
                let strike = Strike {
                    power,
                    element,
                    kind: DamageKind::Physical,
                    offense: None,
                    accuracy: None,
                    crit_bonus: 0,
                    can_crit: false,
                    always_hits: true,
                    inflicts: None,
                    technical_with: &[],
                };
                self.strike_all(state, actor, targets, &strike, 100)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{FixedRng, SkillDefinition, TargetPattern};
    use crate::state::{
        AffinityTable, CombatantTemplate, EncounterSettings, Side, StackRule, Stats,
    };

    fn state(enemy_affinities: AffinityTable) -> BattleState {
        let mage = CombatantTemplate::new("mage", "Mage", 100, 50, Stats::new(20, 10, 80, 20, 10, 0));
        let golem = CombatantTemplate::new("golem", "Golem", 900, 0, Stats::new(30, 40, 10, 30, 10, 0))
            .with_affinities(enemy_affinities);
        BattleState::new(&[mage], &[golem], EncounterSettings::default()).unwrap()
    }

    fn prepared(kind: PreparedKind) -> PreparedAction {
        PreparedAction {
            actor: CombatantId(0),
            side: Side::Party,
            kind,
            targets: vec![CombatantId(1)],
        }
    }

    #[test]
    fn reflect_redirects_magic_to_the_caster() {
        let config = BattleConfig::default();
        let rng = FixedRng::new(50);
        let resolver = DamageResolver::new(&config, &rng);
        let mut state = state(AffinityTable::new());
        let golem = state.combatant_mut(CombatantId(1)).unwrap();
        StatusEngine::default().apply(golem, StatusKind::Reflect, 3, 1, StackRule::Refresh);

        let skill = SkillDefinition::new("blizzard", "Blizzard", 20, Element::Ice).magical();
        let result = resolver.resolve(&mut state, &prepared(PreparedKind::Skill(skill)), 100);

        let outcome = &result.outcomes[0];
        assert!(outcome.reflected);
        assert_eq!(outcome.recipient, CombatantId(0));
        // 20 × 80 / 20 − 20 / 2 = 70
        assert_eq!(outcome.damage, 70);
        assert_eq!(state.combatant(CombatantId(0)).unwrap().hp, 30);
        assert_eq!(state.combatant(CombatantId(1)).unwrap().hp, 900);
    }

    #[test]
    fn immune_nullifies_and_absorb_heals() {
        let config = BattleConfig::default();
        let rng = FixedRng::new(50);
        let resolver = DamageResolver::new(&config, &rng);
        let skill = SkillDefinition::new("fire", "Fire", 20, Element::Fire).magical();

        let mut immune = state(AffinityTable::new().with(Element::Fire, Affinity::Immune));
        let result = resolver.resolve(&mut immune, &prepared(PreparedKind::Skill(skill.clone())), 100);
        assert!(result.outcomes[0].nullified);
        assert_eq!(result.total_damage(), 0);

        let mut absorb = state(AffinityTable::new().with(Element::Fire, Affinity::Absorb));
        absorb.combatant_mut(CombatantId(1)).unwrap().hp = 800;
        let result = resolver.resolve(&mut absorb, &prepared(PreparedKind::Skill(skill)), 100);
        assert!(result.outcomes[0].absorbed);
        assert_eq!(result.outcomes[0].healing, 65);
        assert_eq!(absorb.combatant(CombatantId(1)).unwrap().hp, 865);
    }

    #[test]
    fn absorb_ignores_the_transfer_bonus() {
        let config = BattleConfig::default();
        let rng = FixedRng::new(50);
        let resolver = DamageResolver::new(&config, &rng);
        let skill = SkillDefinition::new("fire", "Fire", 20, Element::Fire).magical();

        let mut absorb = state(AffinityTable::new().with(Element::Fire, Affinity::Absorb));
        absorb.combatant_mut(CombatantId(1)).unwrap().hp = 800;
        let result = resolver.resolve(&mut absorb, &prepared(PreparedKind::Skill(skill)), 200);
        assert_eq!(result.outcomes[0].healing, 65);
        assert_eq!(absorb.combatant(CombatantId(1)).unwrap().hp, 865);
    }

    #[test]
    fn high_roll_misses_and_applies_nothing() {
        let config = BattleConfig::default();
        let rng = FixedRng::new(100);
        let resolver = DamageResolver::new(&config, &rng);
        let mut state = state(AffinityTable::new());

        let result = resolver.resolve(&mut state, &prepared(PreparedKind::Attack), 100);
        assert!(result.was_evaded());
        assert_eq!(state.combatant(CombatantId(1)).unwrap().hp, 900);
    }

    #[test]
    fn guard_and_healing() {
        let config = BattleConfig::default();
        let rng = FixedRng::new(50);
        let resolver = DamageResolver::new(&config, &rng);
        let mut state = state(AffinityTable::new());

        let mut guard = prepared(PreparedKind::Guard);
        guard.targets = vec![CombatantId(0)];
        resolver.resolve(&mut state, &guard, 100);
        assert!(state.combatant(CombatantId(0)).unwrap().is_guarding());

        state.combatant_mut(CombatantId(0)).unwrap().hp = 10;
        let cure = SkillDefinition::new("cure", "Cure", 10, Element::Light)
            .with_effect(SkillEffect::Heal)
            .with_target(TargetPattern::SelfOnly);
        let mut heal = prepared(PreparedKind::Skill(cure));
        heal.targets = vec![CombatantId(0)];
        let result = resolver.resolve(&mut state, &heal, 100);
        // 10 × 80 / 20 = 40
        assert_eq!(result.outcomes[0].healing, 40);
        assert_eq!(state.combatant(CombatantId(0)).unwrap().hp, 50);
    }
}
