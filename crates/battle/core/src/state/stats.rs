/// Core combat stats of a combatant.
///
/// Values are signed so that a modifier can always be reversed exactly, even
/// after it was clamped at application time (see [`Stats::shift`]).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stats {
    pub attack: i32,
    pub defense: i32,
    pub magic_attack: i32,
    pub magic_defense: i32,
    pub speed: i32,
    pub luck: i32,
}

/// Addresses a single field of [`Stats`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatKind {
    Attack,
    Defense,
    MagicAttack,
    MagicDefense,
    Speed,
    Luck,
}

impl Stats {
    /// Lowest value a modifier can push a stat to.
    pub const FLOOR: i32 = 1;

    pub const fn new(
        attack: i32,
        defense: i32,
        magic_attack: i32,
        magic_defense: i32,
        speed: i32,
        luck: i32,
    ) -> Self {
        Self {
            attack,
            defense,
            magic_attack,
            magic_defense,
            speed,
            luck,
        }
    }

    pub fn get(&self, kind: StatKind) -> i32 {
        match kind {
            StatKind::Attack => self.attack,
            StatKind::Defense => self.defense,
            StatKind::MagicAttack => self.magic_attack,
            StatKind::MagicDefense => self.magic_defense,
            StatKind::Speed => self.speed,
            StatKind::Luck => self.luck,
        }
    }

    fn slot_mut(&mut self, kind: StatKind) -> &mut i32 {
        match kind {
            StatKind::Attack => &mut self.attack,
            StatKind::Defense => &mut self.defense,
            StatKind::MagicAttack => &mut self.magic_attack,
            StatKind::MagicDefense => &mut self.magic_defense,
            StatKind::Speed => &mut self.speed,
            StatKind::Luck => &mut self.luck,
        }
    }

    /// Applies `delta` to a stat, never going below [`Stats::FLOOR`].
    ///
    /// Returns the delta that was actually applied. Reversing a modifier must
    /// use this returned value with [`Stats::unshift`], not the requested one.
    pub fn shift(&mut self, kind: StatKind, delta: i32) -> i32 {
        let slot = self.slot_mut(kind);
        let before = *slot;
        let after = before.saturating_add(delta).max(Self::FLOOR.min(before));
        *slot = after;
        after - before
    }

    /// Reverts a delta previously returned by [`Stats::shift`].
    pub fn unshift(&mut self, kind: StatKind, applied: i32) {
        let slot = self.slot_mut(kind);
        *slot -= applied;
    }
}
