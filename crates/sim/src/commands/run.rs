//! Fight one encounter with both sides auto-piloted.

use std::path::PathBuf;

use anyhow::{Context, Result};
use battle_content::ContentFactory;
use battle_core::{
    BattleEngine, BattleEnv, BattleEvent, LedgerInventory, PcgRng, TurnPrompt,
};
use clap::Parser;
use console::style;

use crate::config::SimConfig;
use crate::report::{self, Report};

/// Fight one encounter to the end
#[derive(Parser)]
pub struct Run {
    /// Content directory (defaults to $BATTLE_CONTENT_DIR, then ./data)
    #[arg(short, long, value_name = "DIR")]
    content: Option<PathBuf>,

    /// Encounter name under encounters/, or a path to a .ron file
    #[arg(short, long, value_name = "ENCOUNTER")]
    encounter: String,

    /// Battle seed (defaults to $BATTLE_SEED, then a random seed)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Abort the battle after this many turns
    #[arg(long, default_value_t = 500)]
    max_turns: u32,

    /// Print a JSON report instead of the event log
    #[arg(long)]
    json: bool,
}

impl Run {
    pub fn execute(self, config: &SimConfig) -> Result<()> {
        let factory = ContentFactory::new(config.content_dir(self.content.clone()));
        let seed = config.seed(self.seed);

        let battle_config = factory.load_config()?;
        let catalog = factory.load_catalog()?;
        let encounter = factory
            .load_encounter(&self.encounter, &catalog)?
            .with_seed(seed);

        let state = encounter
            .state()
            .with_context(|| format!("Failed to set up encounter '{}'", encounter.name))?;
        let rng = PcgRng;
        let mut inventory = LedgerInventory::new();
        let env = BattleEnv::with_all(&catalog, &rng, &battle_config);
        let mut engine = BattleEngine::new(state, env, &mut inventory)?;
        for (id, profile) in encounter.profiles.iter().cloned() {
            engine.set_profile(id, profile);
        }

        if !self.json {
            println!(
                "{} {} {}",
                style("Encounter:").bold().cyan(),
                encounter.name,
                style(format!("(seed {seed})")).dim()
            );
            println!();
        }

        engine.start()?;
        let mut events = Vec::new();
        let mut turns = 0;
        loop {
            match engine.next_turn()? {
                TurnPrompt::Act(_) if turns >= self.max_turns => {
                    tracing::warn!(max_turns = self.max_turns, "turn limit reached, aborting");
                    engine.abort()?;
                }
                TurnPrompt::Act(_) => {
                    engine.take_opponent_turn()?;
                    turns += 1;
                }
                TurnPrompt::Ended(_) => break,
            }
            self.flush(&mut engine, &mut events);
        }
        self.flush(&mut engine, &mut events);

        let names = report::names(engine.state());
        let mut summary = engine.finish()?;
        if !self.json {
            for event in &summary.events {
                println!("{}", report::describe(event, &names));
            }
        }
        events.append(&mut summary.events);

        if self.json {
            let report = Report {
                encounter: &encounter.name,
                seed,
                turns,
                summary: &summary,
                events: &events,
                inventory: inventory.items().map(|(id, qty)| (id.clone(), qty)).collect(),
                currency: inventory.currency(),
            };
            let json = serde_json::to_string_pretty(&report)
                .context("Failed to serialize battle report to JSON")?;
            println!("{}", json);
        } else {
            println!();
            report::print_summary(&summary, &names);
        }
        Ok(())
    }

    fn flush(&self, engine: &mut BattleEngine<'_>, events: &mut Vec<BattleEvent>) {
        let drained = engine.drain_events();
        if !self.json {
            let names = report::names(engine.state());
            for event in &drained {
                println!("{}", report::describe(event, &names));
            }
        }
        events.extend(drained);
    }
}
