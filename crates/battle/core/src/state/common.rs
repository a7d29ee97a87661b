use core::fmt;

/// Identifier of a combatant inside one battle session.
///
/// Ids are assigned in roster order when the battle is created, so they double
/// as the stable tie-breaker for turn ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantId(pub u32);

impl CombatantId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which side of the battle a combatant fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    /// Human-controlled party.
    Party,
    /// Opponents driven by the decision engine.
    Enemy,
}

impl Side {
    #[inline]
    pub const fn opposing(self) -> Self {
        match self {
            Side::Party => Side::Enemy,
            Side::Enemy => Side::Party,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Side::Party => "party",
            Side::Enemy => "enemy",
        };
        write!(f, "{label}")
    }
}

/// Round counter. Round 1 is the first round after initialization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Round(pub u32);

impl Round {
    pub const ZERO: Self = Self(0);

    #[inline]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}
