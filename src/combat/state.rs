//! Combat state component for entities
//!
//! Everything a combatant needs between actions: vitals, footing, stamina,
//! range and defensive allocation. Clamping happens here so that callers can
//! never push balance or fatigue out of range.

use serde::{Deserialize, Serialize};

use crate::combat::body_zone::BodyPart;
use crate::combat::buffer::CombatActionType;
use crate::combat::tier::EngagementTier;
use crate::combat::weapons::AttackMove;
use crate::core::types::EntityId;

/// Fatigue pool used until regeneration syncs it with the entity's stats
pub const DEFAULT_MAX_FATIGUE: f32 = 100.0;

/// Named defensive allocations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StancePreset {
    Evasion,
    Parry,
    Shield,
    Offensive,
    Neutral,
    Defensive,
}

impl StancePreset {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "EVASION" => Some(StancePreset::Evasion),
            "PARRY" => Some(StancePreset::Parry),
            "SHIELD" => Some(StancePreset::Shield),
            "OFFENSIVE" => Some(StancePreset::Offensive),
            "NEUTRAL" => Some(StancePreset::Neutral),
            "DEFENSIVE" => Some(StancePreset::Defensive),
            _ => None,
        }
    }
}

/// How a defender splits attention between the three defensive styles
///
/// Percentages; `evasion + parry + shield <= 100` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefenseAllocation {
    pub evasion: u32,
    pub parry: u32,
    pub shield: u32,
    /// 0.0 (turtle) to 1.0 (all-in)
    pub aggression: f32,
}

impl Default for DefenseAllocation {
    fn default() -> Self {
        Self::preset(StancePreset::Neutral)
    }
}

impl DefenseAllocation {
    pub fn preset(preset: StancePreset) -> Self {
        let (evasion, parry, shield, aggression) = match preset {
            StancePreset::Evasion => (100, 0, 0, 0.0),
            StancePreset::Parry => (0, 100, 0, 0.0),
            StancePreset::Shield => (0, 0, 100, 0.0),
            StancePreset::Offensive => (33, 33, 34, 1.0),
            StancePreset::Neutral => (33, 33, 34, 0.5),
            StancePreset::Defensive => (33, 33, 34, 0.0),
        };
        Self {
            evasion,
            parry,
            shield,
            aggression,
        }
    }

    /// Custom split; None if the total exceeds 100%
    pub fn custom(evasion: u32, parry: u32, shield: u32, aggression: f32) -> Option<Self> {
        (evasion + parry + shield <= 100).then_some(Self {
            evasion,
            parry,
            shield,
            aggression: aggression.clamp(0.0, 1.0),
        })
    }

    pub fn total(&self) -> u32 {
        self.evasion + self.parry + self.shield
    }

    /// Shift weight into parry, taking it from evasion first, then shield
    pub fn raise_parry(&mut self, amount: u32) {
        self.parry = (self.parry + amount).min(100);
        let mut excess = self.total().saturating_sub(100);
        let from_evasion = excess.min(self.evasion);
        self.evasion -= from_evasion;
        excess -= from_evasion;
        self.shield -= excess.min(self.shield);
    }
}

/// An outstanding phase-one challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAttack {
    pub target: EntityId,
    pub attack_move: Option<AttackMove>,
}

/// Combat state component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatStats {
    pub hp: i32,
    pub max_hp: i32,
    /// Flat attack rating (used by the NPC attack path)
    pub attack: f32,
    /// Flat defense added to defender power
    pub defense: f32,
    /// Footing, 0.0 to 1.0
    pub balance: f32,
    pub fatigue: f32,
    pub max_fatigue: f32,
    /// Set when fatigue bottoms out; lifts once enough stamina returns
    pub exhausted: bool,
    pub engagement_tier: EngagementTier,
    pub allocation: DefenseAllocation,
    pub is_hostile: bool,
    /// Locked target (looked up by id, never owned)
    pub target: Option<EntityId>,
    /// Challenge sent by `attack`, still awaiting its timing report
    pub pending_attack: Option<PendingAttack>,
    /// Preferred body part for crushing hits
    pub target_limb: Option<BodyPart>,
    /// Active parry window opened by a buffered parry
    pub is_parrying: bool,
    /// Resists being closed on
    pub hang_back: bool,
    /// Next move this combatant has broadcast
    pub telegraph: Option<CombatActionType>,
}

impl Default for CombatStats {
    fn default() -> Self {
        Self::new(100, 10.0, 0.0)
    }
}

impl CombatStats {
    pub fn new(max_hp: i32, attack: f32, defense: f32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            attack,
            defense,
            balance: 1.0,
            fatigue: DEFAULT_MAX_FATIGUE,
            max_fatigue: DEFAULT_MAX_FATIGUE,
            exhausted: false,
            engagement_tier: EngagementTier::Disengaged,
            allocation: DefenseAllocation::default(),
            is_hostile: false,
            target: None,
            pending_attack: None,
            target_limb: None,
            is_parrying: false,
            hang_back: false,
            telegraph: None,
        }
    }

    pub fn hostile(mut self) -> Self {
        self.is_hostile = true;
        self
    }

    pub fn at_tier(mut self, tier: EngagementTier) -> Self {
        self.engagement_tier = tier;
        self
    }

    pub fn with_balance(mut self, balance: f32) -> Self {
        self.balance = balance.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_fatigue(mut self, max: f32) -> Self {
        self.max_fatigue = max.max(0.0);
        self.fatigue = self.max_fatigue;
        self
    }

    pub fn with_allocation(mut self, allocation: DefenseAllocation) -> Self {
        self.allocation = allocation;
        self
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    pub fn has_fatigue(&self, amount: f32) -> bool {
        self.fatigue >= amount
    }

    /// Spend stamina; hitting zero latches exhaustion
    pub fn spend_fatigue(&mut self, amount: f32) {
        self.fatigue = (self.fatigue - amount).clamp(0.0, self.max_fatigue);
        if self.fatigue <= 0.0 {
            self.exhausted = true;
        }
    }

    pub fn recover_fatigue(&mut self, amount: f32) {
        self.fatigue = (self.fatigue + amount).clamp(0.0, self.max_fatigue);
    }

    pub fn adjust_balance(&mut self, delta: f32) {
        self.balance = (self.balance + delta).clamp(0.0, 1.0);
    }

    pub fn take_damage(&mut self, amount: i32) {
        self.hp -= amount.max(0);
    }

    /// Drop out of the fight entirely
    pub fn disengage(&mut self) {
        self.engagement_tier = EngagementTier::Disengaged;
        self.target = None;
        self.is_hostile = false;
        self.is_parrying = false;
        self.pending_attack = None;
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_hp <= 0 {
            return 0.0;
        }
        (self.hp.max(0) as f32 / self.max_hp as f32).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_combatant_is_fresh() {
        let stats = CombatStats::new(50, 12.0, 2.0);
        assert_eq!(stats.hp, 50);
        assert_eq!(stats.balance, 1.0);
        assert_eq!(stats.fatigue, DEFAULT_MAX_FATIGUE);
        assert_eq!(stats.engagement_tier, EngagementTier::Disengaged);
        assert!(!stats.is_dead());
    }

    #[test]
    fn test_balance_clamped() {
        let mut stats = CombatStats::default();
        stats.adjust_balance(0.5);
        assert_eq!(stats.balance, 1.0);
        stats.adjust_balance(-3.0);
        assert_eq!(stats.balance, 0.0);
    }

    #[test]
    fn test_spending_to_zero_latches_exhaustion() {
        let mut stats = CombatStats::default().with_max_fatigue(10.0);
        stats.spend_fatigue(4.0);
        assert!(!stats.exhausted);
        stats.spend_fatigue(40.0);
        assert_eq!(stats.fatigue, 0.0);
        assert!(stats.exhausted);
    }

    #[test]
    fn test_custom_allocation_over_100_rejected() {
        assert!(DefenseAllocation::custom(50, 40, 10, 0.5).is_some());
        assert!(DefenseAllocation::custom(50, 40, 11, 0.5).is_none());
    }

    #[test]
    fn test_raise_parry_keeps_total_bounded() {
        let mut alloc = DefenseAllocation::preset(StancePreset::Neutral);
        alloc.raise_parry(20);
        assert_eq!(alloc.parry, 53);
        assert_eq!(alloc.evasion, 13);
        assert!(alloc.total() <= 100);

        let mut full = DefenseAllocation::preset(StancePreset::Evasion);
        full.raise_parry(20);
        assert_eq!((full.evasion, full.parry), (80, 20));
    }

    #[test]
    fn test_raise_parry_spills_into_shield() {
        let mut alloc = DefenseAllocation::custom(5, 10, 85, 0.0).unwrap();
        alloc.raise_parry(20);
        assert_eq!(alloc.parry, 30);
        assert_eq!(alloc.evasion, 0);
        assert_eq!(alloc.shield, 70);
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!(StancePreset::parse("offensive"), Some(StancePreset::Offensive));
        assert_eq!(StancePreset::parse("bogus"), None);
    }

    #[test]
    fn test_disengage_clears_target() {
        let mut stats = CombatStats::default()
            .hostile()
            .at_tier(EngagementTier::Melee);
        let foe = EntityId::new();
        stats.target = Some(foe);
        stats.pending_attack = Some(PendingAttack {
            target: foe,
            attack_move: None,
        });
        stats.disengage();
        assert_eq!(stats.engagement_tier, EngagementTier::Disengaged);
        assert!(stats.target.is_none());
        assert!(stats.pending_attack.is_none());
        assert!(!stats.is_hostile);
    }
}
