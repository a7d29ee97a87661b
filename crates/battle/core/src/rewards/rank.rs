use strum::{EnumCount, EnumIter, IntoEnumIterator};

use crate::config::{BattleConfig, RankTier};

/// Performance rank, lowest first.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, EnumIter, EnumCount,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rank {
    D,
    C,
    B,
    A,
    S,
    SS,
    SSS,
}

const _: () = assert!(Rank::COUNT == BattleConfig::RANK_TIERS);

impl Rank {
    /// Highest rank whose threshold `score` reaches.
    pub fn from_score(score: u32, tiers: &[RankTier; BattleConfig::RANK_TIERS]) -> Self {
        Rank::iter()
            .zip(tiers)
            .filter(|(_, tier)| score >= tier.threshold)
            .map(|(rank, _)| rank)
            .last()
            .unwrap_or(Rank::D)
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn tier(self, tiers: &[RankTier; BattleConfig::RANK_TIERS]) -> RankTier {
        tiers[self.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RewardParams;

    #[test]
    fn thresholds_map_to_ranks() {
        let tiers = RewardParams::default().ranks;
        assert_eq!(Rank::from_score(0, &tiers), Rank::D);
        assert_eq!(Rank::from_score(199, &tiers), Rank::D);
        assert_eq!(Rank::from_score(200, &tiers), Rank::C);
        assert_eq!(Rank::from_score(1000, &tiers), Rank::S);
        assert_eq!(Rank::from_score(u32::MAX, &tiers), Rank::SSS);
        assert_eq!(Rank::SS.tier(&tiers).experience_multiplier, 175);
    }
}
