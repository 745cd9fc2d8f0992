//! Wound ledger
//!
//! Levels run 0 (uninjured) to 10 and only ever go up here; healing belongs
//! to other systems.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::combat::body_zone::BodyPart;

pub const MAX_WOUND_LEVEL: u32 = 10;

/// Heavy head wounds daze the victim at this level
pub const STUN_WOUND_LEVEL: u32 = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WoundTable {
    wounds: BTreeMap<BodyPart, u32>,
}

impl WoundTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `level` to the part's wound (saturating at the max). Returns the new level.
    pub fn apply(&mut self, part: BodyPart, level: u32) -> u32 {
        let entry = self.wounds.entry(part).or_insert(0);
        *entry = (*entry + level).min(MAX_WOUND_LEVEL);
        *entry
    }

    pub fn level(&self, part: BodyPart) -> u32 {
        self.wounds.get(&part).copied().unwrap_or(0)
    }

    /// Injured parts, in body order
    pub fn injuries(&self) -> impl Iterator<Item = (BodyPart, u32)> + '_ {
        self.wounds
            .iter()
            .filter(|(_, level)| **level > 0)
            .map(|(part, level)| (*part, *level))
    }

    pub fn is_uninjured(&self) -> bool {
        self.injuries().next().is_none()
    }

    pub fn total(&self) -> u32 {
        self.wounds.values().sum()
    }
}

/// Short adjective for a wound level
pub fn describe_level(level: u32) -> &'static str {
    match level {
        l if l > 8 => "shattered",
        l if l > 5 => "ragged",
        l if l > 2 => "bleeding",
        _ => "bruised",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wounds_accumulate_and_cap() {
        let mut table = WoundTable::new();
        assert_eq!(table.apply(BodyPart::Chest, 5), 5);
        assert_eq!(table.apply(BodyPart::Chest, 5), 10);
        assert_eq!(table.apply(BodyPart::Chest, 5), 10);
        assert_eq!(table.level(BodyPart::Head), 0);
    }

    #[test]
    fn test_injuries_skip_clean_parts() {
        let mut table = WoundTable::new();
        assert!(table.is_uninjured());
        table.apply(BodyPart::LeftArm, 0);
        assert!(table.is_uninjured());
        table.apply(BodyPart::Head, 3);
        assert_eq!(table.injuries().collect::<Vec<_>>(), vec![(BodyPart::Head, 3)]);
    }

    #[test]
    fn test_level_descriptions() {
        assert_eq!(describe_level(9), "shattered");
        assert_eq!(describe_level(8), "ragged");
        assert_eq!(describe_level(3), "bleeding");
        assert_eq!(describe_level(2), "bruised");
    }
}
