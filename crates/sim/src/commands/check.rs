//! Validate every file of a content directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use battle_content::ContentFactory;
use clap::Parser;
use console::style;

use crate::config::SimConfig;

/// Load and validate a content directory
#[derive(Parser)]
pub struct Check {
    /// Content directory (defaults to $BATTLE_CONTENT_DIR, then ./data)
    #[arg(short, long, value_name = "DIR")]
    content: Option<PathBuf>,
}

impl Check {
    pub fn execute(self, config: &SimConfig) -> Result<()> {
        let factory = ContentFactory::new(config.content_dir(self.content));
        println!(
            "{} {}",
            style("Content:").bold().cyan(),
            factory.data_dir().display()
        );

        factory.load_config()?;
        println!("  {} config", style("ok").green());

        let catalog = factory.load_catalog()?;
        println!(
            "  {} catalog ({} skills, {} items)",
            style("ok").green(),
            catalog.skill_count(),
            catalog.item_count()
        );

        let dir = factory.data_dir().join("encounters");
        let mut entries: Vec<_> = std::fs::read_dir(&dir)
            .with_context(|| format!("Failed to read encounter directory: {}", dir.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "ron"))
            .collect();
        entries.sort();

        let mut failures = 0;
        for path in &entries {
            let label = path.display().to_string();
            match factory.load_encounter(&label, &catalog) {
                Ok(encounter) => println!(
                    "  {} {} ({} vs {})",
                    style("ok").green(),
                    encounter.name,
                    encounter.party.len(),
                    encounter.enemies.len()
                ),
                Err(err) => {
                    failures += 1;
                    println!("  {} {:#}", style("error").red().bold(), err);
                }
            }
        }

        if failures > 0 {
            anyhow::bail!("{} of {} encounters failed to load", failures, entries.len());
        }
        Ok(())
    }
}
