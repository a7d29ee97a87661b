//! In-memory catalog backed by sorted maps.

use std::collections::BTreeMap;

use super::{CatalogOracle, DuoDefinition, DuoId, ItemDefinition, ItemId, SkillDefinition, SkillId};

/// Owned copy of every static definition a battle may look up.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CatalogSnapshot {
    skills: BTreeMap<SkillId, SkillDefinition>,
    items: BTreeMap<ItemId, ItemDefinition>,
    duos: BTreeMap<DuoId, DuoDefinition>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from definition lists. Later duplicates win.
    pub fn from_parts(
        skills: impl IntoIterator<Item = SkillDefinition>,
        items: impl IntoIterator<Item = ItemDefinition>,
        duos: impl IntoIterator<Item = DuoDefinition>,
    ) -> Self {
        Self {
            skills: skills.into_iter().map(|def| (def.id.clone(), def)).collect(),
            items: items.into_iter().map(|def| (def.id.clone(), def)).collect(),
            duos: duos.into_iter().map(|def| (def.id.clone(), def)).collect(),
        }
    }

    #[must_use]
    pub fn with_skill(mut self, skill: SkillDefinition) -> Self {
        self.skills.insert(skill.id.clone(), skill);
        self
    }

    #[must_use]
    pub fn with_item(mut self, item: ItemDefinition) -> Self {
        self.items.insert(item.id.clone(), item);
        self
    }

    #[must_use]
    pub fn with_duo(mut self, duo: DuoDefinition) -> Self {
        self.duos.insert(duo.id.clone(), duo);
        self
    }

    pub fn contains_skill(&self, id: &SkillId) -> bool {
        self.skills.contains_key(id)
    }

    pub fn contains_item(&self, id: &ItemId) -> bool {
        self.items.contains_key(id)
    }

    pub fn skill_count(&self) -> usize {
        self.skills.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

impl CatalogOracle for CatalogSnapshot {
    fn skill(&self, id: &SkillId) -> Option<SkillDefinition> {
        self.skills.get(id).cloned()
    }

    fn item(&self, id: &ItemId) -> Option<ItemDefinition> {
        self.items.get(id).cloned()
    }

    fn duo(&self, id: &DuoId) -> Option<DuoDefinition> {
        self.duos.get(id).cloned()
    }

    fn duos(&self) -> Vec<DuoDefinition> {
        self.duos.values().cloned().collect()
    }
}
