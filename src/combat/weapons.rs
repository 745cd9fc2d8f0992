//! Weapon data and attack moves
//!
//! A weapon is a plain record. Behaviour differences come from its category
//! tag (flavor, move validity, skill routing), never from a type hierarchy.

use serde::{Deserialize, Serialize};

use crate::combat::tier::EngagementTier;
use crate::core::error::{CombatError, Result};

/// Timing-challenge difficulty carried by each weapon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncDifficulty {
    /// Cursor speed multiplier (1.0 = normal)
    pub speed: f32,
    /// Width of the critical zone in bar cells
    pub zone_size: f32,
    /// Chance per step that the cursor jumps (0.0 to 1.0)
    pub jitter: f32,
}

impl Default for SyncDifficulty {
    fn default() -> Self {
        Self {
            speed: 1.0,
            zone_size: 2.0,
            jitter: 0.0,
        }
    }
}

impl SyncDifficulty {
    pub fn new(speed: f32, zone_size: f32, jitter: f32) -> Self {
        Self {
            speed,
            zone_size,
            jitter,
        }
    }
}

/// A named attack move requested alongside `attack`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackMove {
    Punch,
    Jab,
    Uppercut,
    Headbutt,
    Slash,
    Slice,
    Thrust,
    /// Katana finisher fuelled by momentum
    Iaijutsu,
}

impl AttackMove {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "punch" => Some(AttackMove::Punch),
            "jab" => Some(AttackMove::Jab),
            "uppercut" => Some(AttackMove::Uppercut),
            "headbutt" => Some(AttackMove::Headbutt),
            "slash" => Some(AttackMove::Slash),
            "slice" => Some(AttackMove::Slice),
            "thrust" => Some(AttackMove::Thrust),
            "iaijutsu" => Some(AttackMove::Iaijutsu),
            _ => None,
        }
    }

    /// Moves performed with bare hands (or head)
    pub fn is_brawl(&self) -> bool {
        matches!(
            self,
            AttackMove::Punch | AttackMove::Jab | AttackMove::Uppercut | AttackMove::Headbutt
        )
    }

    pub fn verb(&self) -> &'static str {
        match self {
            AttackMove::Punch => "punch",
            AttackMove::Jab => "jab",
            AttackMove::Uppercut => "uppercut",
            AttackMove::Headbutt => "headbutt",
            AttackMove::Slash => "slash",
            AttackMove::Slice => "slice",
            AttackMove::Thrust => "thrust",
            AttackMove::Iaijutsu => "draw-cut",
        }
    }
}

const EDGED: [&str; 6] = ["blade", "sword", "katana", "machete", "axe", "knife"];
const POINTED: [&str; 6] = ["blade", "sword", "katana", "knife", "spear", "dagger"];

/// Weapon component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    /// Category tag ("blade", "brawling", "pistol", ...)
    pub category: String,
    pub damage: f32,
    /// 0 = melee, > 0 = ranged
    pub range: u32,
    pub ammo_type: Option<String>,
    pub current_ammo: u32,
    pub mag_size: u32,
    /// Closest-to-farthest window in which the weapon works
    pub min_tier: EngagementTier,
    pub max_tier: EngagementTier,
    pub difficulty: SyncDifficulty,
    /// Roundtime on use; None falls back to the configured default
    pub roundtime: Option<f32>,
}

impl Weapon {
    /// Hand weapon usable at melee and close quarters
    pub fn melee(name: impl Into<String>, category: impl Into<String>, damage: f32) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            damage,
            range: 0,
            ammo_type: None,
            current_ammo: 0,
            mag_size: 0,
            min_tier: EngagementTier::Melee,
            max_tier: EngagementTier::CloseQuarters,
            difficulty: SyncDifficulty::default(),
            roundtime: None,
        }
    }

    /// Firearm loaded with a full magazine
    pub fn ranged(
        name: impl Into<String>,
        category: impl Into<String>,
        damage: f32,
        range: u32,
        ammo_type: impl Into<String>,
        mag_size: u32,
    ) -> Self {
        Self {
            range: range.max(1),
            ammo_type: Some(ammo_type.into()),
            current_ammo: mag_size,
            mag_size,
            min_tier: EngagementTier::Missile,
            max_tier: EngagementTier::CloseQuarters,
            ..Self::melee(name, category, damage)
        }
    }

    pub fn with_tiers(mut self, min: EngagementTier, max: EngagementTier) -> Self {
        self.min_tier = min;
        self.max_tier = max;
        self
    }

    pub fn with_difficulty(mut self, difficulty: SyncDifficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_roundtime(mut self, seconds: f32) -> Self {
        self.roundtime = Some(seconds);
        self
    }

    pub fn is_ranged(&self) -> bool {
        self.range > 0
    }

    pub fn is_brawling(&self) -> bool {
        self.category.eq_ignore_ascii_case("brawling")
    }

    /// Katana-class blades get their own skill and moves
    pub fn is_katana(&self) -> bool {
        let name = self.name.to_lowercase();
        name.contains("katana") || name.contains("kitana") || name.contains("samurai sword")
    }

    fn category_has(&self, tags: &[&str]) -> bool {
        let category = self.category.to_lowercase();
        tags.iter().any(|t| category.contains(t))
    }

    pub fn can_slash(&self) -> bool {
        self.category_has(&EDGED)
    }

    pub fn can_thrust(&self) -> bool {
        self.category_has(&POINTED)
    }

    /// Can this weapon parry at all?
    pub fn can_parry(&self) -> bool {
        !self.is_ranged() && !self.is_brawling()
    }

    pub fn usable_at(&self, tier: EngagementTier) -> bool {
        tier.within(self.min_tier, self.max_tier)
    }

    /// Reject weapon records that would corrupt resolution
    pub fn validate(&self) -> Result<()> {
        if !self.damage.is_finite() || self.damage < 0.0 {
            return Err(CombatError::MalformedWeapon(format!(
                "{} has damage {}",
                self.name, self.damage
            )));
        }
        if self.min_tier > self.max_tier {
            return Err(CombatError::MalformedWeapon(format!(
                "{} has tier window {}..{}",
                self.name, self.min_tier, self.max_tier
            )));
        }
        if self.is_ranged() && self.ammo_type.is_none() {
            return Err(CombatError::MalformedWeapon(format!(
                "{} is ranged but has no ammo type",
                self.name
            )));
        }
        let d = &self.difficulty;
        if d.speed <= 0.0 || d.zone_size < 0.0 || !(0.0..=1.0).contains(&d.jitter) {
            return Err(CombatError::MalformedWeapon(format!(
                "{} has sync difficulty {:?}",
                self.name, d
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn katana() -> Weapon {
        Weapon::melee("Katana", "katana", 14.0)
    }

    #[test]
    fn test_move_parse() {
        assert_eq!(AttackMove::parse("SLASH"), Some(AttackMove::Slash));
        assert!(AttackMove::parse("headbutt").is_some_and(|m| m.is_brawl()));
        assert_eq!(AttackMove::parse("kick"), None);
    }

    #[test]
    fn test_edge_and_point_checks() {
        let machete = Weapon::melee("Machete", "machete", 8.0);
        assert!(machete.can_slash());
        assert!(!machete.can_thrust());

        let spear = Weapon::melee("Spear", "spear", 9.0);
        assert!(spear.can_thrust());
        assert!(!spear.can_slash());

        assert!(katana().can_slash() && katana().can_thrust());
    }

    #[test]
    fn test_katana_by_name() {
        assert!(katana().is_katana());
        assert!(Weapon::melee("Old Samurai Sword", "sword", 10.0).is_katana());
        assert!(!Weapon::melee("Shortsword", "sword", 10.0).is_katana());
    }

    #[test]
    fn test_ranged_starts_loaded() {
        let pistol = Weapon::ranged("Pistol", "pistol", 12.0, 10, "9mm", 12);
        assert!(pistol.is_ranged());
        assert_eq!(pistol.current_ammo, 12);
        assert!(!pistol.can_parry());
        assert!(pistol.usable_at(EngagementTier::Missile));
        assert!(!pistol.usable_at(EngagementTier::Disengaged));
    }

    #[test]
    fn test_validate_catches_bad_data() {
        assert!(katana().validate().is_ok());

        let mut bad = katana();
        bad.damage = -1.0;
        assert!(matches!(bad.validate(), Err(CombatError::MalformedWeapon(_))));

        let inverted = katana().with_tiers(EngagementTier::CloseQuarters, EngagementTier::Missile);
        assert!(inverted.validate().is_err());

        let mut no_ammo = Weapon::ranged("Rifle", "rifle", 20.0, 30, "5.56", 30);
        no_ammo.ammo_type = None;
        assert!(no_ammo.validate().is_err());
    }
}
