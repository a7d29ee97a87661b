//! Skill, item and duo-ultimate catalog loader.

use std::collections::BTreeSet;
use std::path::Path;

use battle_core::{CatalogSnapshot, DuoDefinition, ItemDefinition, SkillDefinition};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Catalog structure for RON files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogFile {
    pub skills: Vec<SkillDefinition>,
    pub items: Vec<ItemDefinition>,
    pub duos: Vec<DuoDefinition>,
}

impl CatalogFile {
    /// Rejects duplicate ids within each table.
    pub fn validate(&self) -> LoadResult<()> {
        ensure_unique("skill", self.skills.iter().map(|skill| skill.id.as_str()))?;
        ensure_unique("item", self.items.iter().map(|item| item.id.as_str()))?;
        ensure_unique("duo", self.duos.iter().map(|duo| duo.id.as_str()))?;

        for duo in &self.duos {
            if duo.members[0] == duo.members[1] {
                anyhow::bail!("Duo '{}' lists '{}' twice", duo.id, duo.members[0]);
            }
        }
        Ok(())
    }

    pub fn into_snapshot(self) -> CatalogSnapshot {
        CatalogSnapshot::from_parts(self.skills, self.items, self.duos)
    }
}

fn ensure_unique<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> LoadResult<()> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            anyhow::bail!("Duplicate {} id '{}'", kind, id);
        }
    }
    Ok(())
}

/// Loader for catalogs from RON files.
pub struct CatalogLoader;

impl CatalogLoader {
    /// Load a catalog from a RON file.
    pub fn load(path: &Path) -> LoadResult<CatalogSnapshot> {
        let content = read_file(path)?;
        Self::parse(&content).map_err(|e| anyhow::anyhow!("{} ({})", e, path.display()))
    }

    /// Parse and validate a catalog from a RON string.
    pub fn parse(content: &str) -> LoadResult<CatalogSnapshot> {
        let file: CatalogFile = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse catalog RON: {}", e))?;
        file.validate()?;

        tracing::debug!(
            target: "content::catalog",
            skills = file.skills.len(),
            items = file.items.len(),
            duos = file.duos.len(),
            "loaded catalog"
        );
        Ok(file.into_snapshot())
    }
}
