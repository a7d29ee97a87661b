//! Elemental affinity lookup.
//!
//! Every combatant carries an [`AffinityTable`] with exactly one entry per
//! [`Element`]. The table is backed by a fixed array indexed by the element
//! discriminant, so an element can never be "unset": anything not explicitly
//! configured reads back as [`Affinity::Normal`].

use strum::{EnumCount, EnumIter, IntoEnumIterator};

/// Damage elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, EnumCount, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Element {
    Physical = 0,
    Fire = 1,
    Ice = 2,
    Thunder = 3,
    Wind = 4,
    Light = 5,
    Dark = 6,
}

impl Element {
    #[inline]
    const fn slot(self) -> usize {
        self as usize
    }
}

/// How a combatant reacts to an element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Affinity {
    #[default]
    Normal,
    /// Takes increased damage; triggers knockdown and an extra turn.
    Weak,
    /// Takes reduced damage.
    Resist,
    /// Takes no damage; the hit is marked as "no effect".
    Immune,
    /// Heals instead of taking damage.
    Absorb,
}

/// Per-combatant element → affinity mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "Vec<(Element, Affinity)>", into = "Vec<(Element, Affinity)>")
)]
pub struct AffinityTable {
    entries: [Affinity; Element::COUNT],
}

impl AffinityTable {
    /// Creates a table where every element is [`Affinity::Normal`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, element: Element, affinity: Affinity) -> Self {
        self.set(element, affinity);
        self
    }

    /// Returns the affinity for `element`. Never fails.
    #[inline]
    pub fn get(&self, element: Element) -> Affinity {
        self.entries[element.slot()]
    }

    /// Replaces the single entry for `element`.
    #[inline]
    pub fn set(&mut self, element: Element, affinity: Affinity) {
        self.entries[element.slot()] = affinity;
    }

    /// Elements this table is weak to.
    pub fn weaknesses(&self) -> impl Iterator<Item = Element> + '_ {
        Element::iter().filter(|element| self.get(*element) == Affinity::Weak)
    }

    /// All entries that differ from [`Affinity::Normal`].
    pub fn overrides(&self) -> impl Iterator<Item = (Element, Affinity)> + '_ {
        Element::iter()
            .map(|element| (element, self.get(element)))
            .filter(|(_, affinity)| *affinity != Affinity::Normal)
    }
}

impl From<Vec<(Element, Affinity)>> for AffinityTable {
    fn from(pairs: Vec<(Element, Affinity)>) -> Self {
        // Later pairs win, keeping one entry per element.
        pairs
            .into_iter()
            .fold(Self::new(), |table, (element, affinity)| {
                table.with(element, affinity)
            })
    }
}

impl From<AffinityTable> for Vec<(Element, Affinity)> {
    fn from(table: AffinityTable) -> Self {
        table.overrides().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_elements_read_as_normal() {
        let table = AffinityTable::new().with(Element::Ice, Affinity::Weak);
        for element in Element::iter() {
            let expected = if element == Element::Ice {
                Affinity::Weak
            } else {
                Affinity::Normal
            };
            assert_eq!(table.get(element), expected);
        }
    }

    #[test]
    fn set_replaces_the_single_entry() {
        let mut table = AffinityTable::new();
        table.set(Element::Fire, Affinity::Weak);
        table.set(Element::Fire, Affinity::Absorb);
        assert_eq!(table.get(Element::Fire), Affinity::Absorb);
        assert_eq!(table.overrides().count(), 1);
    }

    #[test]
    fn duplicate_pairs_collapse_to_last_value() {
        let table = AffinityTable::from(vec![
            (Element::Wind, Affinity::Resist),
            (Element::Wind, Affinity::Immune),
            (Element::Dark, Affinity::Weak),
        ]);
        assert_eq!(table.get(Element::Wind), Affinity::Immune);
        assert_eq!(table.weaknesses().collect::<Vec<_>>(), vec![Element::Dark]);
    }
}
