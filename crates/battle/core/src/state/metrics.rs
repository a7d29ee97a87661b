/// Running counters consumed once by the rewards calculator.
///
/// Only player-side performance is counted: hits are those landed by the
/// party, knockouts and damage taken are those suffered by the party.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleMetrics {
    pub weakness_hits: u32,
    pub critical_hits: u32,
    pub technical_hits: u32,
    pub finisher_uses: u32,
    pub ultimate_uses: u32,
    pub knockouts_suffered: u32,
    pub items_used: u32,
    pub damage_dealt: u64,
    pub damage_taken: u64,
    pub turns_elapsed: u32,
}

impl BattleMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
