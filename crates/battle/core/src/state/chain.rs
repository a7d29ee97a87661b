use std::collections::BTreeSet;

use super::common::{CombatantId, Side};

/// Turn-sequence bookkeeping owned by the scheduler.
///
/// Reset at the start of every independent turn, i.e. a turn that was not
/// received through a transfer and is not an extra turn of the same holder.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChainState {
    /// Number of transfers in the current sequence (0 = no transfer yet).
    pub level: u32,
    /// Combatant currently holding the transfer damage bonus.
    pub bonus_holder: Option<CombatantId>,
    /// Combatants that already held the turn in this sequence: every transfer
    /// receiver plus the one that started it.
    pub received: BTreeSet<CombatantId>,
    /// Side whose finisher window is open, if any.
    pub finisher_window: Option<Side>,
    /// Rounds left before a side may open another finisher window.
    pub finisher_cooldown: [u32; 2],
}

impl ChainState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the per-sequence part (level, bonus holder, received set).
    pub fn reset_sequence(&mut self) {
        self.level = 0;
        self.bonus_holder = None;
        self.received.clear();
    }

    #[inline]
    pub fn cooldown(&self, side: Side) -> u32 {
        self.finisher_cooldown[side_slot(side)]
    }

    #[inline]
    pub fn set_cooldown(&mut self, side: Side, rounds: u32) {
        self.finisher_cooldown[side_slot(side)] = rounds;
    }

    /// Counts every finisher cooldown down by one round.
    pub fn tick_cooldowns(&mut self) {
        for rounds in &mut self.finisher_cooldown {
            *rounds = rounds.saturating_sub(1);
        }
    }
}

const fn side_slot(side: Side) -> usize {
    match side {
        Side::Party => 0,
        Side::Enemy => 1,
    }
}
