//! Chain privileges, escape and end-of-battle scenarios.

mod common;

use battle_core::{
    Affinity, AffinityTable, BattleAction, BattleEvent, BattleOutcome, Bounty, CatalogSnapshot,
    CombatantId, DamageKind, DuoDefinition, DuoId, EncounterSettings, EngineError, Element,
    PcgRng, Rank, SkillDefinition, SkillId, Stats, TargetPattern, TargetSet, TurnPrompt,
};
use battle_core::config::EscapeParams;
use common::{Fixture, expect_turn, has_event, template};

// ============================================================================
// Finisher
// ============================================================================

/// Three Ice-weak imps are downed by one Ice sweep, which opens the finisher.
/// Sweep: 40 × 40 / 20 − 10 / 2 = 75, ×1.5 = 112.
/// Finisher: 60 × 40 / 20 − 10 / 2 = 115 on each imp.
#[test]
fn finisher_opens_when_every_opponent_is_down_and_closes_after_use() {
    let catalog = CatalogSnapshot::new().with_skill(
        SkillDefinition::new("blizzard", "Blizzard", 40, Element::Ice)
            .magical()
            .with_target(TargetPattern::All),
    );
    let mut fixture = Fixture::new(catalog);
    let hero = template("hero", 500, Stats::new(40, 20, 40, 20, 50, 0))
        .with_skills([SkillId::new("blizzard")]);
    let imp = template("imp", 300, Stats::new(10, 10, 10, 10, 10, 0))
        .with_affinities(AffinityTable::new().with(Element::Ice, Affinity::Weak));
    let imps = [imp.clone(), imp.clone(), imp];
    let mut engine = fixture.engine(&[hero], &imps, EncounterSettings::default());
    let hero = CombatantId(0);

    let info = expect_turn(&mut engine, hero);
    assert!(!info.finisher_available);
    let err = engine
        .submit_action(BattleAction::all_out_attack(hero))
        .unwrap_err();
    assert!(err.is_rejection());

    let sweep = engine
        .submit_action(BattleAction::skill(hero, "blizzard", TargetSet::All))
        .unwrap();
    assert_eq!(sweep.outcomes.len(), 3);
    assert!(sweep.outcomes.iter().all(|o| o.weakness && o.damage == 112));
    let events = engine.drain_events();
    assert!(has_event(&events, |e| matches!(e, BattleEvent::FinisherAvailable { .. })));
    // One extra turn, no matter how many weaknesses were hit.
    let grants = events
        .iter()
        .filter(|e| matches!(e, BattleEvent::ExtraTurnGranted { .. }))
        .count();
    assert_eq!(grants, 1);

    let info = expect_turn(&mut engine, hero);
    assert!(info.extra);
    assert!(info.finisher_available);

    let finisher = engine
        .submit_action(BattleAction::all_out_attack(hero))
        .unwrap();
    assert_eq!(finisher.outcomes.len(), 3);
    assert!(finisher.outcomes.iter().all(|o| o.damage == 115 && !o.critical));

    let state = engine.state();
    for id in 1..=3 {
        let imp = state.combatant(CombatantId(id)).unwrap();
        assert_eq!(imp.hp, 73);
        assert!(!imp.is_downed());
    }
    assert_eq!(state.metrics.finisher_uses, 1);
    assert_eq!(state.metrics.weakness_hits, 3);
    assert!(has_event(&engine.drain_events(), |e| matches!(e, BattleEvent::FinisherUsed { .. })));

    let info = expect_turn(&mut engine, CombatantId(1));
    assert!(!info.finisher_available);
}

// ============================================================================
// Extra turns and transfers
// ============================================================================

#[test]
fn extra_turn_is_served_first_and_can_be_transferred_once() {
    let catalog = CatalogSnapshot::new().with_skill(
        SkillDefinition::new("fire_bolt", "Fire Bolt", 40, Element::Fire).magical(),
    );
    let mut fixture = Fixture::new(catalog);
    let ace = template("ace", 400, Stats::new(40, 20, 40, 20, 50, 0))
        .with_skills([SkillId::new("fire_bolt")]);
    let partner = template("partner", 400, Stats::new(40, 20, 10, 20, 30, 0));
    let ogre = template("ogre", 1000, Stats::new(10, 20, 10, 20, 10, 0))
        .with_affinities(AffinityTable::new().with(Element::Fire, Affinity::Weak));
    let mut engine = fixture.engine(&[ace, partner], &[ogre], EncounterSettings::default());
    let (ace, partner, ogre) = (CombatantId(0), CombatantId(1), CombatantId(2));

    expect_turn(&mut engine, ace);
    // Nothing to pass on an independent turn.
    assert_eq!(
        engine.transfer_turn(partner).unwrap_err(),
        EngineError::NoExtraTurn(ace)
    );
    engine
        .submit_action(BattleAction::skill(ace, "fire_bolt", TargetSet::One(ogre)))
        .unwrap();

    // The extra turn comes before the partner's queued turn.
    let info = expect_turn(&mut engine, ace);
    assert!(info.extra);
    assert!(info.can_transfer);
    assert_eq!(engine.transfer_candidates(), vec![partner]);
    assert_eq!(engine.transfer_turn(partner).unwrap(), 1);

    let info = expect_turn(&mut engine, partner);
    assert!(info.extra);
    assert_eq!(info.chain_level, 1);
    assert!(!info.can_transfer);

    // 40 × 40 / 20 − 20 / 2 = 70, ×1.5 at chain level 1.
    let result = engine
        .submit_action(BattleAction::attack(partner, ogre))
        .unwrap();
    assert_eq!(result.outcome_for(ogre).unwrap().damage, 105);
    assert!(
        engine
            .state()
            .combatants()
            .all(|combatant| !combatant.has_extra_turn())
    );

    // The partner's own turn starts a fresh sequence.
    let info = expect_turn(&mut engine, partner);
    assert!(!info.extra);
    assert_eq!(info.chain_level, 0);
    let events = engine.drain_events();
    assert!(has_event(&events, |e| matches!(
        e,
        BattleEvent::TurnTransferred { from, to, chain_level: 1 } if *from == ace && *to == partner
    )));
}

// ============================================================================
// Ultimates
// ============================================================================

/// Gauges only fill from hits taken, so every gauge in this battle comes
/// from the golem's quake and the ultimates never refill their user.
#[test]
fn limit_break_and_duo_ultimate_consume_their_gauges() {
    let catalog = CatalogSnapshot::new()
        .with_skill(
            SkillDefinition::new("quake", "Quake", 40, Element::Physical)
                .with_target(TargetPattern::All),
        )
        .with_duo(DuoDefinition {
            id: DuoId::new("frostfire"),
            name: "Frostfire".into(),
            members: ["knight".into(), "mage".into()],
            power: 120,
            element: Element::Ice,
            damage_kind: DamageKind::Magical,
        });
    let mut fixture = Fixture::new(catalog);
    fixture.config.gauge.on_deal = 0;
    fixture.config.gauge.on_take = 100;
    fixture.config.gauge.take_percent_step = 0;
    let knight = template("knight", 500, Stats::new(30, 20, 20, 20, 50, 0));
    let mage = template("mage", 500, Stats::new(10, 20, 40, 20, 40, 0));
    let golem = template("golem", 5000, Stats::new(40, 20, 10, 20, 10, 0))
        .with_skills([SkillId::new("quake")]);
    let mut engine = fixture.engine(&[knight, mage], &[golem], EncounterSettings::default());
    let (knight, mage, golem) = (CombatantId(0), CombatantId(1), CombatantId(2));
    let frostfire = DuoId::new("frostfire");

    fn quake(engine: &mut battle_core::BattleEngine<'_>, golem: CombatantId) {
        expect_turn(engine, golem);
        engine
            .submit_action(BattleAction::skill(golem, "quake", TargetSet::All))
            .unwrap();
    }

    // Round 1: nobody is ready until the quake lands on both members.
    let info = expect_turn(&mut engine, knight);
    assert!(!info.ultimate_ready);
    assert!(info.ready_duos.is_empty());
    engine.submit_action(BattleAction::attack(knight, golem)).unwrap();
    expect_turn(&mut engine, mage);
    engine.submit_action(BattleAction::attack(mage, golem)).unwrap();
    quake(&mut engine, golem);
    let events = engine.drain_events();
    assert!(has_event(&events, |e| matches!(e, BattleEvent::UltimateReady { actor } if *actor == knight)));
    assert!(has_event(&events, |e| matches!(e, BattleEvent::UltimateReady { actor } if *actor == mage)));

    // Round 2: a solo limit break spends the knight's gauge only.
    let info = expect_turn(&mut engine, knight);
    assert!(info.ultimate_ready);
    assert_eq!(info.ready_duos, vec![frostfire.clone()]);
    let result = engine
        .submit_action(BattleAction::limit_break(knight, golem))
        .unwrap();
    assert!(result.outcome_for(golem).unwrap().damage > 0);
    assert_eq!(engine.state().combatant(knight).unwrap().gauge, 0);
    assert_eq!(engine.state().combatant(mage).unwrap().gauge, 100);
    assert_eq!(engine.state().metrics.ultimate_uses, 1);
    assert!(has_event(&engine.drain_events(), |e| matches!(
        e,
        BattleEvent::UltimateUsed { actor, duo: false } if *actor == knight
    )));

    let info = expect_turn(&mut engine, mage);
    assert!(info.ultimate_ready);
    assert!(info.ready_duos.is_empty());
    let err = engine.execute_duo("frostfire").unwrap_err();
    assert!(err.is_rejection());
    engine.submit_action(BattleAction::attack(mage, golem)).unwrap();
    quake(&mut engine, golem);

    // Round 3: the duo spends both gauges in one action.
    let info = expect_turn(&mut engine, knight);
    assert_eq!(info.ready_duos, vec![frostfire.clone()]);
    engine.drain_events();
    let result = engine.execute_duo(frostfire).unwrap();
    assert_eq!(result.actor, knight);
    assert!(result.outcome_for(golem).unwrap().damage > 0);

    let state = engine.state();
    assert_eq!(state.combatant(knight).unwrap().gauge, 0);
    assert_eq!(state.combatant(mage).unwrap().gauge, 0);
    assert_eq!(state.metrics.ultimate_uses, 2);
    let events = engine.drain_events();
    let used: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, BattleEvent::UltimateUsed { .. }))
        .collect();
    assert_eq!(used, vec![&BattleEvent::UltimateUsed { actor: knight, duo: true }]);

    let info = expect_turn(&mut engine, mage);
    assert!(!info.ultimate_ready);
}

// ============================================================================
// Escape
// ============================================================================

#[test]
fn escape_chance_accumulates_across_failures() {
    let mut fixture = Fixture::new(CatalogSnapshot::new());
    fixture.config.escape = EscapeParams {
        base_chance: 30,
        increment: 25,
    };
    let hero = template("hero", 500, Stats::new(20, 20, 10, 20, 50, 0));
    let wolf = template("wolf", 500, Stats::new(20, 20, 10, 20, 10, 0));
    let mut engine = fixture.engine(&[hero], &[wolf], EncounterSettings::default());
    let (hero, wolf) = (CombatantId(0), CombatantId(1));

    // Every roll is 50: 30% fails.
    expect_turn(&mut engine, hero);
    let result = engine.submit_action(BattleAction::escape(hero)).unwrap();
    assert_eq!(result.escaped, Some(false));
    assert_eq!(engine.state().escape_failures, 1);

    expect_turn(&mut engine, wolf);
    engine.take_opponent_turn().unwrap();

    // 30 + 25 = 55% succeeds.
    expect_turn(&mut engine, hero);
    let result = engine.submit_action(BattleAction::escape(hero)).unwrap();
    assert_eq!(result.escaped, Some(true));
    assert_eq!(
        engine.next_turn().unwrap(),
        TurnPrompt::Ended(BattleOutcome::Escaped)
    );

    let summary = engine.finish().unwrap();
    assert_eq!(summary.outcome, BattleOutcome::Escaped);
    assert!(summary.rewards.is_none());
    let attempts: Vec<_> = summary
        .events
        .iter()
        .filter_map(|e| match e {
            BattleEvent::EscapeAttempted { chance, success, .. } => Some((*chance, *success)),
            _ => None,
        })
        .collect();
    assert_eq!(attempts, vec![(30, false), (55, true)]);
}

#[test]
fn boss_encounters_forbid_escape() {
    let mut fixture = Fixture::new(CatalogSnapshot::new());
    let hero = template("hero", 500, Stats::new(20, 20, 10, 20, 50, 0));
    let boss = template("lich", 900, Stats::new(20, 20, 10, 20, 10, 0));
    let encounter = EncounterSettings {
        escapable: false,
        boss: true,
        seed: 7,
    };
    let mut engine = fixture.engine(&[hero], &[boss], encounter);

    expect_turn(&mut engine, CombatantId(0));
    let err = engine
        .submit_action(BattleAction::escape(CombatantId(0)))
        .unwrap_err();
    assert!(err.is_rejection());
    assert_eq!(engine.current_actor(), Some(CombatantId(0)));
}

// ============================================================================
// Victory and rewards
// ============================================================================

/// The ogre knocks out the frail member before falling; only the survivor
/// shares the experience.
///
/// Score: no-item bonus 100 + speed (10 − 2) × 25 − one knockout 100 = 200,
/// rank C (×1.1): 90 experience → 99, 30 currency → 33.
#[test]
fn victory_rewards_go_to_living_members() {
    let mut fixture = Fixture::new(CatalogSnapshot::new());
    let hero = template("hero", 500, Stats::new(100, 20, 10, 20, 50, 0));
    let frail = template("frail", 1, Stats::new(10, 0, 10, 0, 30, 0));
    let ogre = template("ogre", 300, Stats::new(40, 0, 10, 0, 40, 0)).with_bounty(Bounty {
        experience: 90,
        currency: 30,
        drops: Vec::new(),
    });
    let mut engine = fixture.engine(&[hero, frail], &[ogre], EncounterSettings::default());
    let (hero, frail, ogre) = (CombatantId(0), CombatantId(1), CombatantId(2));

    expect_turn(&mut engine, hero);
    engine.submit_action(BattleAction::attack(hero, ogre)).unwrap();

    expect_turn(&mut engine, ogre);
    let result = engine.take_opponent_turn().unwrap();
    assert_eq!(result.outcome_for(frail).unwrap().damage, 1);
    assert!(!engine.state().combatant(frail).unwrap().is_alive());

    expect_turn(&mut engine, hero);
    engine.submit_action(BattleAction::attack(hero, ogre)).unwrap();
    assert_eq!(engine.phase(), battle_core::BattlePhase::Ended(BattleOutcome::Victory));

    let summary = engine.finish().unwrap();
    let rewards = summary.rewards.expect("victory grants rewards");
    assert_eq!(summary.metrics.knockouts_suffered, 1);
    assert_eq!(rewards.score.total, 200);
    assert_eq!(rewards.rank, Rank::C);
    assert_eq!(rewards.experience, 99);
    assert_eq!(rewards.currency, 33);
    assert_eq!(rewards.shares, vec![(hero, 99)]);

    let members: Vec<_> = summary
        .party
        .iter()
        .map(|member| (member.id, member.experience_gained))
        .collect();
    assert_eq!(members, vec![(hero, 99), (frail, 0)]);
    assert_eq!(fixture.inventory.currency(), 33);
}

// ============================================================================
// Determinism
// ============================================================================

fn auto_battle(seed: u64) -> (BattleOutcome, Vec<BattleEvent>) {
    let mut fixture = Fixture::new(CatalogSnapshot::new());
    fixture.rng = Box::new(PcgRng);
    let knight = template("knight", 120, Stats::new(30, 15, 10, 10, 25, 10));
    let archer = template("archer", 90, Stats::new(25, 10, 10, 10, 35, 20));
    let goblin = template("goblin", 80, Stats::new(22, 10, 10, 10, 30, 5));
    let encounter = EncounterSettings {
        seed,
        ..EncounterSettings::default()
    };
    let mut engine = fixture.engine(&[knight, archer], &[goblin.clone(), goblin], encounter);

    let mut events = Vec::new();
    for _ in 0..500 {
        match engine.next_turn().unwrap() {
            TurnPrompt::Act(_) => {
                engine.take_opponent_turn().unwrap();
            }
            TurnPrompt::Ended(outcome) => {
                events.extend(engine.drain_events());
                return (outcome, events);
            }
        }
        events.extend(engine.drain_events());
    }
    panic!("battle did not finish");
}

#[test]
fn same_seed_replays_the_same_battle() {
    let (outcome, events) = auto_battle(42);
    assert!(matches!(outcome, BattleOutcome::Victory | BattleOutcome::Defeat));
    assert_eq!(auto_battle(42), (outcome, events));
}
