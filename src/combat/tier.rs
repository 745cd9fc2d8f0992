//! Engagement tiers
//!
//! Range is a discrete, ordered state, never a distance. Every range check
//! compares positions in this order.

use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum EngagementTier {
    #[default]
    #[display(fmt = "DISENGAGED")]
    Disengaged,
    #[display(fmt = "MISSILE")]
    Missile,
    #[display(fmt = "POLEARM")]
    Polearm,
    #[display(fmt = "MELEE")]
    Melee,
    #[display(fmt = "CLOSE_QUARTERS")]
    CloseQuarters,
}

/// Balance recovery band derived from the tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenBand {
    Safe,
    Ranged,
    Engaged,
}

impl EngagementTier {
    /// Farthest first
    pub const ALL: [EngagementTier; 5] = [
        EngagementTier::Disengaged,
        EngagementTier::Missile,
        EngagementTier::Polearm,
        EngagementTier::Melee,
        EngagementTier::CloseQuarters,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// One step toward melee, or None at the closest tier
    pub fn closer(&self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    /// One step away from melee, or None when fully disengaged
    pub fn farther(&self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn is_closest(&self) -> bool {
        self.closer().is_none()
    }

    pub fn is_farthest(&self) -> bool {
        self.farther().is_none()
    }

    /// Range at which two combatants actually meet: the closer of the two
    pub fn effective(a: Self, b: Self) -> Self {
        a.max(b)
    }

    /// Is this tier within an inclusive [min, max] window?
    pub fn within(&self, min: Self, max: Self) -> bool {
        *self >= min && *self <= max
    }

    pub fn regen_band(&self) -> RegenBand {
        match self {
            EngagementTier::Disengaged => RegenBand::Safe,
            EngagementTier::Missile | EngagementTier::Polearm => RegenBand::Ranged,
            EngagementTier::Melee | EngagementTier::CloseQuarters => RegenBand::Engaged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_runs_far_to_close() {
        assert!(EngagementTier::Disengaged < EngagementTier::Missile);
        assert!(EngagementTier::Melee < EngagementTier::CloseQuarters);
    }

    #[test]
    fn test_steps_stop_at_bounds() {
        assert_eq!(EngagementTier::CloseQuarters.closer(), None);
        assert_eq!(EngagementTier::Disengaged.farther(), None);
        assert_eq!(EngagementTier::Missile.farther(), Some(EngagementTier::Disengaged));
        assert_eq!(EngagementTier::Melee.closer(), Some(EngagementTier::CloseQuarters));
    }

    #[test]
    fn test_effective_is_closer_tier() {
        assert_eq!(
            EngagementTier::effective(EngagementTier::Disengaged, EngagementTier::Melee),
            EngagementTier::Melee
        );
    }

    #[test]
    fn test_within_window() {
        let cq = EngagementTier::CloseQuarters;
        assert!(cq.within(cq, cq));
        assert!(!EngagementTier::Disengaged.within(cq, cq));
    }

    #[test]
    fn test_display_names() {
        assert_eq!(EngagementTier::CloseQuarters.to_string(), "CLOSE_QUARTERS");
        assert_eq!(EngagementTier::Disengaged.to_string(), "DISENGAGED");
    }

    #[test]
    fn test_index_round_trip() {
        for tier in EngagementTier::ALL {
            assert_eq!(EngagementTier::from_index(tier.index()), Some(tier));
        }
    }
}
