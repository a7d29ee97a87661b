//! Console and JSON rendering of a finished battle.

use std::collections::BTreeMap;

use battle_core::{
    BattleEvent, BattleOutcome, BattleState, BattleSummary, CombatantId, ItemId, Side,
};
use console::style;
use serde::Serialize;

/// Everything `run --json` prints.
#[derive(Serialize)]
pub struct Report<'a> {
    pub encounter: &'a str,
    pub seed: u64,
    pub turns: u32,
    pub summary: &'a BattleSummary,
    pub events: &'a [BattleEvent],
    pub inventory: Vec<(ItemId, u32)>,
    pub currency: u64,
}

pub type Names = BTreeMap<CombatantId, String>;

/// Display names, suffixed with the id when two combatants share one.
pub fn names(state: &BattleState) -> Names {
    let roster: Vec<_> = state.combatants().collect();
    roster
        .iter()
        .map(|combatant| {
            let shared = roster
                .iter()
                .filter(|other| other.name == combatant.name)
                .count()
                > 1;
            let name = if shared {
                format!("{} #{}", combatant.name, combatant.id.0)
            } else {
                combatant.name.clone()
            };
            (combatant.id, name)
        })
        .collect()
}

fn name(names: &Names, id: CombatantId) -> String {
    names.get(&id).cloned().unwrap_or_else(|| format!("#{}", id.0))
}

/// One log line per event.
pub fn describe(event: &BattleEvent, names: &Names) -> String {
    let n = |id: &CombatantId| name(names, *id);
    match event {
        BattleEvent::RoundStarted { round } => {
            style(format!("── Round {} ──", round.0)).bold().yellow().to_string()
        }
        BattleEvent::TurnStarted { actor, extra, .. } => {
            if *extra {
                format!("{} {}", style(n(actor)).bold(), style("(extra turn)").magenta())
            } else {
                style(n(actor)).bold().to_string()
            }
        }
        BattleEvent::TurnSkipped { actor } => format!("  {} cannot act", n(actor)),
        BattleEvent::ActionExecuted {
            action,
            damage,
            was_critical,
            ..
        } => {
            let crit = if *was_critical { " CRITICAL" } else { "" };
            format!("  uses {action}: {damage} damage{}", style(crit).red().bold())
        }
        BattleEvent::WeaknessHit { target, .. } => {
            format!("  {} {}", style("WEAK!").green().bold(), n(target))
        }
        BattleEvent::TechnicalHit { target, status, .. } => {
            format!("  {} {} ({status})", style("TECHNICAL!").green().bold(), n(target))
        }
        BattleEvent::ExtraTurnGranted { actor } => format!("  {} earns an extra turn", n(actor)),
        BattleEvent::TurnTransferred {
            from,
            to,
            chain_level,
        } => format!("  {} passes to {} (chain {chain_level})", n(from), n(to)),
        BattleEvent::FinisherAvailable { side } => {
            format!("  {}", style(format!("{side} can launch a finisher")).magenta())
        }
        BattleEvent::FinisherUsed { actor, .. } => {
            format!("  {}", style(format!("{} leads the all-out attack", n(actor))).magenta().bold())
        }
        BattleEvent::UltimateReady { actor } => format!("  {}'s ultimate is ready", n(actor)),
        BattleEvent::UltimateUsed { actor, duo } => {
            let kind = if *duo { "duo ultimate" } else { "limit break" };
            format!("  {}", style(format!("{} unleashes a {kind}", n(actor))).magenta().bold())
        }
        BattleEvent::Knockdown { target } => format!("  {} is knocked down", n(target)),
        BattleEvent::StatusApplied { target, status } => format!("  {} gains {status}", n(target)),
        BattleEvent::StatusTicked {
            target,
            status,
            damage,
            healing,
        } => {
            if *healing > 0 {
                format!("  {} recovers {healing} from {status}", n(target))
            } else {
                format!("  {} takes {damage} from {status}", n(target))
            }
        }
        BattleEvent::StatusExpired { target, status } => {
            style(format!("  {status} wears off {}", n(target))).dim().to_string()
        }
        BattleEvent::CombatantDefeated { target, .. } => {
            format!("  {}", style(format!("{} falls", n(target))).red())
        }
        BattleEvent::EscapeAttempted {
            actor,
            chance,
            success,
        } => {
            let result = if *success { "succeeds" } else { "fails" };
            format!("  {} tries to flee ({chance}%) and {result}", n(actor))
        }
        BattleEvent::RewardsGranted {
            rank,
            experience,
            currency,
        } => format!(
            "{} rank {rank}, {experience} exp, {currency} currency",
            style("Rewards:").bold().green()
        ),
        BattleEvent::BattleEnded { outcome, .. } => {
            format!("{} {}", style("Battle ended:").bold().cyan(), outcome_label(*outcome))
        }
    }
}

fn outcome_label(outcome: BattleOutcome) -> String {
    match outcome {
        BattleOutcome::Victory => style("Victory").green().bold().to_string(),
        BattleOutcome::Defeat => style("Defeat").red().bold().to_string(),
        BattleOutcome::Escaped => style("Escaped").yellow().to_string(),
        BattleOutcome::Aborted => style("Aborted").dim().to_string(),
    }
}

pub fn print_summary(summary: &BattleSummary, names: &Names) {
    println!("{}", style("=== Battle Summary ===").bold().green());
    println!();

    println!("{} {}", style("Outcome:").bold().cyan(), outcome_label(summary.outcome));
    println!("{} {}", style("Rounds:").bold().cyan(), summary.rounds.0);
    println!();

    let metrics = &summary.metrics;
    println!("{}", style("Metrics:").bold().yellow());
    println!("  Turns: {}", metrics.turns_elapsed);
    println!("  Weakness hits: {}", metrics.weakness_hits);
    println!("  Critical hits: {}", metrics.critical_hits);
    println!("  Technical hits: {}", metrics.technical_hits);
    println!("  Finishers: {}", metrics.finisher_uses);
    println!("  Ultimates: {}", metrics.ultimate_uses);
    println!("  Damage taken: {}", metrics.damage_taken);
    println!("  Knockouts suffered: {}", metrics.knockouts_suffered);
    println!();

    if let Some(rewards) = &summary.rewards {
        println!("{}", style("Rewards:").bold().yellow());
        println!(
            "  Rank {} (score {}: events {} + bonuses {} + speed {} - penalties {})",
            style(rewards.rank).bold(),
            rewards.score.total,
            rewards.score.events,
            rewards.score.bonuses,
            rewards.score.speed,
            rewards.score.penalties
        );
        println!("  Experience: {}", rewards.experience);
        for (id, share) in &rewards.shares {
            println!("    {}: +{}", name(names, *id), share);
        }
        println!("  Currency: {}", rewards.currency);
        for (item, quantity) in &rewards.drops {
            println!("  Drop: {item} x{quantity}");
        }
        println!();
    }

    println!("{}", style("Party:").bold().yellow());
    for member in summary.party.iter().filter(|member| member.side == Side::Party) {
        let hp = format!("{}/{}", member.hp, member.max_hp);
        let hp = if member.hp == 0 {
            style(hp).red()
        } else {
            style(hp).green()
        };
        println!(
            "  {} HP {} MP {}/{} gauge {}",
            name(names, member.id),
            hp,
            member.mp,
            member.max_mp,
            member.gauge
        );
    }
}
