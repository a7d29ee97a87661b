//! Encounter loader: combatant templates, opponent profiles and settings.

use std::path::Path;

use battle_core::{
    BattleState, CatalogOracle, CombatantId, CombatantTemplate, EncounterSettings,
    InitializationError, OpponentProfile, PatternStep,
};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// One roster entry: the template plus an optional decision profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberSpec {
    pub template: CombatantTemplate,
    #[serde(default)]
    pub profile: Option<OpponentProfile>,
}

/// Encounter structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterFile {
    pub name: String,
    #[serde(default)]
    pub settings: EncounterSettings,
    pub party: Vec<MemberSpec>,
    pub enemies: Vec<MemberSpec>,
}

/// A validated encounter, ready to build battle state from.
#[derive(Debug, Clone)]
pub struct Encounter {
    pub name: String,
    pub settings: EncounterSettings,
    pub party: Vec<CombatantTemplate>,
    pub enemies: Vec<CombatantTemplate>,
    /// Profiles keyed by the id the combatant receives in battle.
    pub profiles: Vec<(CombatantId, OpponentProfile)>,
}

impl Encounter {
    /// Splits a file into templates and id-keyed profiles.
    ///
    /// Party members take ids first, enemies after them, matching the
    /// roster order of [`BattleState::new`].
    pub fn from_file(file: EncounterFile) -> Self {
        let mut profiles = Vec::new();
        let mut split = |members: Vec<MemberSpec>, offset: usize| -> Vec<CombatantTemplate> {
            members
                .into_iter()
                .enumerate()
                .map(|(index, member)| {
                    if let Some(profile) = member.profile {
                        profiles.push((CombatantId((offset + index) as u32), profile));
                    }
                    member.template
                })
                .collect()
        };

        let party_len = file.party.len();
        let party = split(file.party, 0);
        let enemies = split(file.enemies, party_len);

        Self {
            name: file.name,
            settings: file.settings,
            party,
            enemies,
            profiles,
        }
    }

    /// Overrides the battle seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.settings.seed = seed;
        self
    }

    /// Checks every catalog reference made by the encounter.
    pub fn validate(&self, catalog: &dyn CatalogOracle) -> LoadResult<()> {
        if self.party.is_empty() {
            anyhow::bail!("Encounter '{}' has no party members", self.name);
        }
        if self.enemies.is_empty() {
            anyhow::bail!("Encounter '{}' has no enemies", self.name);
        }

        for template in self.party.iter().chain(&self.enemies) {
            if template.max_hp == 0 {
                anyhow::bail!("Template '{}' has zero max HP", template.key);
            }
            for skill in &template.skills {
                if catalog.skill(skill).is_none() {
                    anyhow::bail!("Template '{}' references unknown skill '{}'", template.key, skill);
                }
            }
            for drop in &template.bounty.drops {
                if catalog.item(&drop.item).is_none() {
                    anyhow::bail!("Template '{}' drops unknown item '{}'", template.key, drop.item);
                }
            }
        }

        for (id, profile) in &self.profiles {
            let Some(pattern) = &profile.pattern else {
                continue;
            };
            let steps = pattern
                .steps
                .iter()
                .chain(pattern.emergency.as_ref().map(|emergency| &emergency.step));
            for step in steps {
                if let PatternStep::Skill(skill) = step
                    && catalog.skill(skill).is_none()
                {
                    anyhow::bail!("Profile of combatant {} references unknown skill '{}'", id.0, skill);
                }
            }
        }
        Ok(())
    }

    /// Builds the initial battle state.
    pub fn state(&self) -> Result<BattleState, InitializationError> {
        BattleState::new(&self.party, &self.enemies, self.settings)
    }
}

/// Loader for encounters from RON files.
pub struct EncounterLoader;

impl EncounterLoader {
    /// Load an encounter and validate it against `catalog`.
    pub fn load(path: &Path, catalog: &dyn CatalogOracle) -> LoadResult<Encounter> {
        let content = read_file(path)?;
        Self::parse(&content, catalog).map_err(|e| anyhow::anyhow!("{} ({})", e, path.display()))
    }

    pub fn parse(content: &str, catalog: &dyn CatalogOracle) -> LoadResult<Encounter> {
        let file: EncounterFile = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse encounter RON: {}", e))?;
        let encounter = Encounter::from_file(file);
        encounter.validate(catalog)?;

        tracing::debug!(
            target: "content::encounter",
            name = %encounter.name,
            party = encounter.party.len(),
            enemies = encounter.enemies.len(),
            profiles = encounter.profiles.len(),
            "loaded encounter"
        );
        Ok(encounter)
    }
}
