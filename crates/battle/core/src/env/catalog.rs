//! Static skill, item and duo-ultimate definitions.
//!
//! The battle core never owns these tables; it looks definitions up through
//! [`CatalogOracle`] every time an action is validated or resolved.

use core::fmt;

use crate::state::{Element, StackRule, StatusKind};

macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }
    };
}

catalog_id!(
    /// Key of a [`SkillDefinition`].
    SkillId
);
catalog_id!(
    /// Key of an [`ItemDefinition`].
    ItemId
);
catalog_id!(
    /// Key of a [`DuoDefinition`].
    DuoId
);

/// Which offensive/defensive stat pair a hit uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageKind {
    /// Attack vs. defense.
    #[default]
    Physical,
    /// Magic attack vs. magic defense; bounced by Reflect.
    Magical,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkillCost {
    #[default]
    None,
    Mp(u32),
    /// Percentage of the user's max HP. Never lethal to the user.
    HpPercent(u32),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetPattern {
    #[default]
    Single,
    /// Every living opponent.
    All,
    SelfOnly,
    SingleAlly,
    /// Every living ally, the user included.
    AllAllies,
}

impl TargetPattern {
    /// Returns true when the pattern targets the user's own side.
    pub const fn is_friendly(self) -> bool {
        matches!(
            self,
            TargetPattern::SelfOnly | TargetPattern::SingleAlly | TargetPattern::AllAllies
        )
    }

    /// Returns true when the caller chooses a single target.
    pub const fn is_single(self) -> bool {
        matches!(self, TargetPattern::Single | TargetPattern::SingleAlly)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkillEffect {
    #[default]
    Damage,
    Heal,
    /// Only applies its infliction.
    Support,
}

/// A status a skill or item may apply on hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Infliction {
    pub kind: StatusKind,
    /// Percent chance (100 = always).
    pub chance: u32,
    pub duration: i32,
    pub power: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub rule: StackRule,
}

impl Infliction {
    pub const fn new(kind: StatusKind, chance: u32, duration: i32, power: u32) -> Self {
        Self {
            kind,
            chance,
            duration,
            power,
            rule: StackRule::Stack,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillDefinition {
    pub id: SkillId,
    pub name: String,
    pub power: u32,
    pub element: Element,
    #[cfg_attr(feature = "serde", serde(default))]
    pub damage_kind: DamageKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cost: SkillCost,
    #[cfg_attr(feature = "serde", serde(default))]
    pub target: TargetPattern,
    #[cfg_attr(feature = "serde", serde(default))]
    pub effect: SkillEffect,
    /// Overrides the configured base accuracy.
    #[cfg_attr(feature = "serde", serde(default))]
    pub accuracy: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub crit_bonus: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub inflicts: Option<Infliction>,
    /// Status kinds this skill exploits beyond the fixed compatibility table.
    #[cfg_attr(feature = "serde", serde(default))]
    pub technical_with: Vec<StatusKind>,
}

impl SkillDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, power: u32, element: Element) -> Self {
        Self {
            id: SkillId::new(id),
            name: name.into(),
            power,
            element,
            damage_kind: DamageKind::Physical,
            cost: SkillCost::None,
            target: TargetPattern::Single,
            effect: SkillEffect::Damage,
            accuracy: None,
            crit_bonus: 0,
            inflicts: None,
            technical_with: Vec::new(),
        }
    }

    #[must_use]
    pub fn magical(mut self) -> Self {
        self.damage_kind = DamageKind::Magical;
        self
    }

    #[must_use]
    pub fn with_cost(mut self, cost: SkillCost) -> Self {
        self.cost = cost;
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: TargetPattern) -> Self {
        self.target = target;
        self
    }

    #[must_use]
    pub fn with_effect(mut self, effect: SkillEffect) -> Self {
        self.effect = effect;
        self
    }

    #[must_use]
    pub fn with_infliction(mut self, infliction: Infliction) -> Self {
        self.inflicts = Some(infliction);
        self
    }

    #[must_use]
    pub fn with_technical(mut self, kinds: impl IntoIterator<Item = StatusKind>) -> Self {
        self.technical_with = kinds.into_iter().collect();
        self
    }

    pub fn is_healing(&self) -> bool {
        self.effect == SkillEffect::Heal
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemEffect {
    /// Restores a flat amount of HP.
    Heal(u32),
    RestoreMp(u32),
    /// Fixed-power damage that ignores the user's stats.
    Damage { power: u32, element: Element },
    /// Removes one status kind.
    Cure(StatusKind),
    ApplyStatus(Infliction),
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemDefinition {
    pub id: ItemId,
    pub name: String,
    pub effect: ItemEffect,
    #[cfg_attr(feature = "serde", serde(default))]
    pub target: TargetPattern,
}

impl ItemDefinition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        effect: ItemEffect,
        target: TargetPattern,
    ) -> Self {
        Self {
            id: ItemId::new(id),
            name: name.into(),
            effect,
            target,
        }
    }
}

/// A two-combatant ultimate; both members need a full gauge.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DuoDefinition {
    pub id: DuoId,
    pub name: String,
    /// Combatant template keys of the two members.
    pub members: [String; 2],
    pub power: u32,
    pub element: Element,
    #[cfg_attr(feature = "serde", serde(default))]
    pub damage_kind: DamageKind,
}

impl DuoDefinition {
    pub fn involves(&self, key: &str) -> bool {
        self.members.iter().any(|member| member == key)
    }
}

/// Read-only access to static definitions.
pub trait CatalogOracle: Send + Sync {
    fn skill(&self, id: &SkillId) -> Option<SkillDefinition>;

    fn item(&self, id: &ItemId) -> Option<ItemDefinition>;

    fn duo(&self, id: &DuoId) -> Option<DuoDefinition>;

    /// Every duo definition, used to report which duos are ready.
    fn duos(&self) -> Vec<DuoDefinition>;
}
