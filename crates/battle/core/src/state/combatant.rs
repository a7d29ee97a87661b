//! Per-battle combatant state and the templates it is created from.

use bitflags::bitflags;

use super::affinity::AffinityTable;
use super::common::{CombatantId, Side};
use super::stats::Stats;
use super::status::StatusEffects;
use crate::env::{ItemId, SkillId};

bitflags! {
    /// Transient battle flags. Cleared when the battle ends.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct BattleFlags: u8 {
        /// Chose Guard this turn; cleared at the start of its next turn.
        const GUARDING = 1 << 0;
        /// Holds an unconsumed extra turn.
        const EXTRA_TURN = 1 << 1;
        /// Knocked down by a weakness or critical hit.
        const DOWNED = 1 << 2;
        /// Reduced to zero HP and removed from targeting.
        const DEFEATED = 1 << 3;
        /// Holds the damage bonus from a received turn transfer.
        const TRANSFER_BONUS = 1 << 4;
    }
}

/// Static drop entry on an enemy template.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DropEntry {
    pub item: ItemId,
    /// Base chance in percent before the rank multiplier.
    pub chance: u32,
    #[cfg_attr(feature = "serde", serde(default = "default_quantity"))]
    pub quantity: u32,
}

#[cfg(feature = "serde")]
fn default_quantity() -> u32 {
    1
}

/// Base rewards granted when an enemy is defeated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Bounty {
    pub experience: u64,
    pub currency: u64,
    pub drops: Vec<DropEntry>,
}

/// Persistent character/enemy definition a combatant is created from.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantTemplate {
    /// Stable key, used by duo definitions and copy-back.
    pub key: String,
    pub name: String,
    pub max_hp: u32,
    pub max_mp: u32,
    pub stats: Stats,
    #[cfg_attr(feature = "serde", serde(default))]
    pub affinities: AffinityTable,
    #[cfg_attr(feature = "serde", serde(default))]
    pub skills: Vec<SkillId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub bounty: Bounty,
}

impl CombatantTemplate {
    pub fn new(key: impl Into<String>, name: impl Into<String>, max_hp: u32, max_mp: u32, stats: Stats) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            max_hp,
            max_mp,
            stats,
            affinities: AffinityTable::new(),
            skills: Vec::new(),
            bounty: Bounty::default(),
        }
    }

    #[must_use]
    pub fn with_affinities(mut self, affinities: AffinityTable) -> Self {
        self.affinities = affinities;
        self
    }

    #[must_use]
    pub fn with_skills(mut self, skills: impl IntoIterator<Item = SkillId>) -> Self {
        self.skills = skills.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_bounty(mut self, bounty: Bounty) -> Self {
        self.bounty = bounty;
        self
    }
}

/// A participant in one battle session.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Combatant {
    pub id: CombatantId,
    pub key: String,
    pub name: String,
    pub side: Side,
    pub hp: u32,
    pub max_hp: u32,
    pub mp: u32,
    pub max_mp: u32,
    pub stats: Stats,
    pub affinities: AffinityTable,
    pub skills: Vec<SkillId>,
    pub bounty: Bounty,
    pub flags: BattleFlags,
    /// Ultimate-move gauge, 0..=100.
    pub gauge: u32,
    /// Experience awarded by the rewards calculator.
    pub experience_gained: u64,
    pub(crate) statuses: StatusEffects,
}

impl Combatant {
    pub fn from_template(id: CombatantId, side: Side, template: &CombatantTemplate) -> Self {
        Self {
            id,
            key: template.key.clone(),
            name: template.name.clone(),
            side,
            hp: template.max_hp,
            max_hp: template.max_hp,
            mp: template.max_mp,
            max_mp: template.max_mp,
            stats: template.stats,
            affinities: template.affinities.clone(),
            skills: template.skills.clone(),
            bounty: template.bounty.clone(),
            flags: BattleFlags::empty(),
            gauge: 0,
            experience_gained: 0,
            statuses: StatusEffects::empty(),
        }
    }

    /// Read-only view of active statuses.
    #[inline]
    pub fn statuses(&self) -> &StatusEffects {
        &self.statuses
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.flags.contains(BattleFlags::DEFEATED)
    }

    #[inline]
    pub fn is_downed(&self) -> bool {
        self.flags.contains(BattleFlags::DOWNED)
    }

    #[inline]
    pub fn is_guarding(&self) -> bool {
        self.flags.contains(BattleFlags::GUARDING)
    }

    #[inline]
    pub fn has_extra_turn(&self) -> bool {
        self.flags.contains(BattleFlags::EXTRA_TURN)
    }

    /// HP as a percentage of max HP (0..=100).
    pub fn hp_percent(&self) -> u32 {
        if self.max_hp == 0 {
            return 0;
        }
        ((self.hp as u64 * 100) / self.max_hp as u64) as u32
    }

    /// Reduces HP, returning the amount actually lost.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.hp);
        self.hp -= lost;
        lost
    }

    /// Restores HP up to the maximum, returning the amount actually gained.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let gained = amount.min(self.max_hp - self.hp);
        self.hp += gained;
        gained
    }

    pub fn restore_mp(&mut self, amount: u32) -> u32 {
        let gained = amount.min(self.max_mp - self.mp);
        self.mp += gained;
        gained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> CombatantTemplate {
        CombatantTemplate::new("hero", "Hero", 100, 40, Stats::new(20, 15, 18, 12, 10, 5))
    }

    #[test]
    fn created_at_full_resources() {
        let combatant = Combatant::from_template(CombatantId(3), Side::Party, &template());
        assert_eq!(combatant.hp, 100);
        assert_eq!(combatant.mp, 40);
        assert!(combatant.is_alive());
        assert!(combatant.flags.is_empty());
        assert_eq!(combatant.hp_percent(), 100);
    }

    #[test]
    fn damage_and_healing_are_clamped() {
        let mut combatant = Combatant::from_template(CombatantId(0), Side::Party, &template());
        assert_eq!(combatant.take_damage(130), 100);
        assert_eq!(combatant.hp, 0);
        assert_eq!(combatant.heal(30), 30);
        assert_eq!(combatant.heal(500), 70);
        assert_eq!(combatant.hp, 100);
    }
}
