//! Combat calculator
//!
//! Pure power and outcome math. Nothing here mutates the world; random
//! draws come in through the caller's RNG so results are reproducible.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::combat::armor::Armor;
use crate::combat::state::{CombatStats, DefenseAllocation};
use crate::combat::tier::EngagementTier;
use crate::combat::weapons::{AttackMove, SyncDifficulty, Weapon};
use crate::core::config::CombatConfig;
use crate::core::error::{CombatError, Result};
use crate::core::types::EntityId;
use crate::ecs::world::World;
use crate::entity::inventory::Inventory;
use crate::entity::posture::Posture;
use crate::entity::stats::{SkillKind, Stats};

/// Resolved quality of a hit, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HitType {
    Crushing,
    Solid,
    Marginal,
    Miss,
}

impl HitType {
    /// One step worse (a parried blow)
    pub fn downgrade(&self) -> HitType {
        match self {
            HitType::Crushing => HitType::Solid,
            HitType::Solid => HitType::Marginal,
            HitType::Marginal | HitType::Miss => HitType::Miss,
        }
    }

    pub fn is_hit(&self) -> bool {
        !matches!(self, HitType::Miss)
    }

    /// Skill uses earned by the attacker
    pub fn skill_uses(&self) -> u32 {
        match self {
            HitType::Crushing => 5,
            HitType::Solid | HitType::Marginal => 1,
            HitType::Miss => 0,
        }
    }

    /// Balance change for (attacker, target)
    pub fn balance_shift(&self) -> (f32, f32) {
        match self {
            HitType::Crushing => (0.1, -0.2),
            HitType::Solid => (0.0, -0.05),
            HitType::Marginal => (0.05, 0.0),
            HitType::Miss => (-0.1, 0.0),
        }
    }
}

impl fmt::Display for HitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HitType::Crushing => "crushing",
            HitType::Solid => "solid",
            HitType::Marginal => "marginal",
            HitType::Miss => "miss",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackType {
    Melee,
    Ranged,
}

impl AttackType {
    pub fn of(weapon: &Weapon) -> Self {
        if weapon.is_ranged() {
            AttackType::Ranged
        } else {
            AttackType::Melee
        }
    }
}

/// Timing classification reported back by whoever played the sync bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncReport {
    Crit,
    Hit,
    Miss,
}

impl SyncReport {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "crit" => Some(SyncReport::Crit),
            "hit" => Some(SyncReport::Hit),
            "miss" => Some(SyncReport::Miss),
            _ => None,
        }
    }
}

/// Margin-to-outcome strategy
///
/// Two tables exist: the player table opens a probabilistic critical roll
/// above a margin threshold; the lighter NPC table uses flat bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomePolicy {
    CritRoll {
        /// Crit roll opens strictly above this margin
        crit_above: f32,
        /// Crit chance gained per margin point above `crit_above`
        crit_per_point: f32,
        solid_above: f32,
        marginal_above: f32,
    },
    FlatBands {
        crushing_above: f32,
        solid_above: f32,
        marginal_above: f32,
    },
}

impl Default for OutcomePolicy {
    fn default() -> Self {
        Self::crit_roll()
    }
}

impl OutcomePolicy {
    /// 2% per point above 30, certain by margin 80
    pub fn crit_roll() -> Self {
        OutcomePolicy::CritRoll {
            crit_above: 30.0,
            crit_per_point: 0.02,
            solid_above: 5.0,
            marginal_above: -10.0,
        }
    }

    pub fn flat_bands() -> Self {
        OutcomePolicy::FlatBands {
            crushing_above: 15.0,
            solid_above: 0.0,
            marginal_above: -10.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            OutcomePolicy::CritRoll {
                crit_above,
                crit_per_point,
                solid_above,
                marginal_above,
            } => {
                if crit_per_point <= 0.0 {
                    return Err(CombatError::InvalidConfig(
                        "crit_per_point must be positive".into(),
                    ));
                }
                if !(crit_above >= solid_above && solid_above >= marginal_above) {
                    return Err(CombatError::InvalidConfig(
                        "crit roll thresholds must descend: crit >= solid >= marginal".into(),
                    ));
                }
            }
            OutcomePolicy::FlatBands {
                crushing_above,
                solid_above,
                marginal_above,
            } => {
                if !(crushing_above >= solid_above && solid_above >= marginal_above) {
                    return Err(CombatError::InvalidConfig(
                        "outcome bands must descend: crushing >= solid >= marginal".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Probability that this margin becomes a crushing hit
    pub fn crit_chance(&self, margin: f32) -> f64 {
        match *self {
            OutcomePolicy::CritRoll {
                crit_above,
                crit_per_point,
                ..
            } => {
                if margin > crit_above {
                    (((margin - crit_above) * crit_per_point) as f64).min(1.0)
                } else {
                    0.0
                }
            }
            OutcomePolicy::FlatBands { crushing_above, .. } => {
                if margin > crushing_above {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Classify a margin given a uniform roll in [0, 1)
    pub fn classify_with_roll(&self, margin: f32, roll: f64) -> HitType {
        match *self {
            OutcomePolicy::CritRoll {
                crit_above,
                solid_above,
                marginal_above,
                ..
            } => {
                if margin > crit_above {
                    return if roll < self.crit_chance(margin) {
                        HitType::Crushing
                    } else {
                        HitType::Solid
                    };
                }
                band(margin, solid_above, marginal_above)
            }
            OutcomePolicy::FlatBands {
                crushing_above,
                solid_above,
                marginal_above,
            } => {
                if margin > crushing_above {
                    HitType::Crushing
                } else {
                    band(margin, solid_above, marginal_above)
                }
            }
        }
    }

    /// Classify a margin, drawing the crit roll only when one is open
    pub fn classify<R: Rng>(&self, margin: f32, rng: &mut R) -> HitType {
        let open = matches!(self, OutcomePolicy::CritRoll { .. }) && self.crit_chance(margin) > 0.0;
        let roll = if open {
            rng.gen::<f64>()
        } else {
            0.0
        };
        self.classify_with_roll(margin, roll)
    }
}

fn band(margin: f32, solid_above: f32, marginal_above: f32) -> HitType {
    if margin > solid_above {
        HitType::Solid
    } else if margin > marginal_above {
        HitType::Marginal
    } else {
        HitType::Miss
    }
}

/// Combine the margin verdict with the timing report
///
/// A missed timing is always a miss. A crit report upgrades any landed blow
/// to crushing but cannot rescue a margin miss.
pub fn reconcile(margin_outcome: HitType, report: SyncReport) -> HitType {
    match (report, margin_outcome) {
        (SyncReport::Miss, _) => HitType::Miss,
        (_, HitType::Miss) => HitType::Miss,
        (SyncReport::Crit, _) => HitType::Crushing,
        (SyncReport::Hit, outcome) => outcome,
    }
}

/// Which skill drives an attack with this weapon
pub fn skill_for_weapon(weapon: &Weapon) -> SkillKind {
    if weapon.is_brawling() {
        SkillKind::Brawling
    } else if weapon.is_katana() {
        SkillKind::Kenjutsu
    } else if weapon.is_ranged() {
        SkillKind::MarksmanshipLight
    } else {
        SkillKind::MeleeCombat
    }
}

/// `skill*0.6 + agility*0.4 + balance*weight`
pub fn attacker_power(skill_level: u32, agility: f32, balance: f32, balance_weight: f32) -> f32 {
    skill_level as f32 * 0.6 + agility * 0.4 + balance * balance_weight
}

/// Attacker power read from the entity's stats and balance
pub fn attacker_power_for(
    stats: &Stats,
    combat: &CombatStats,
    weapon: &Weapon,
    config: &CombatConfig,
) -> f32 {
    let skill = skill_for_weapon(weapon);
    let level = stats.skill_level(skill);
    let power = attacker_power(level, stats.agility(), combat.balance, config.attacker_balance_weight);
    tracing::debug!(
        skill = %skill,
        level,
        agility = stats.agility(),
        balance = combat.balance,
        power,
        "attacker power"
    );
    power
}

/// Everything defender power depends on, gathered up front
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefenderProfile {
    pub evasion_skill: u32,
    pub parry_skill: u32,
    pub shield_skill: u32,
    pub agility: f32,
    pub balance: f32,
    pub allocation: DefenseAllocation,
    pub flat_defense: f32,
    /// Sum of worn armor defense minus penalties
    pub armor: f32,
    pub posture_factor: f32,
}

impl DefenderProfile {
    /// Read a defender's profile from the world
    pub fn gather(world: &World, id: EntityId) -> Result<Self> {
        let combat = world.require::<CombatStats>(id)?;
        let default_stats = Stats::default();
        let stats = world.get::<Stats>(id).unwrap_or(&default_stats);

        let inventory = world.get::<Inventory>(id);
        let holds_katana = inventory
            .and_then(|inv| inv.right_hand)
            .and_then(|w| world.get::<Weapon>(w))
            .is_some_and(|w| w.is_katana());
        let parry_skill = if holds_katana {
            SkillKind::Kenjutsu
        } else {
            SkillKind::MeleeCombat
        };

        let armor = inventory
            .map(|inv| {
                inv.equipment
                    .values()
                    .filter_map(|item| world.get::<Armor>(*item))
                    .map(Armor::net_defense)
                    .sum()
            })
            .unwrap_or(0.0);

        let posture_factor = world
            .get::<Posture>(id)
            .map_or(1.0, |p| p.defense_factor());

        Ok(Self {
            evasion_skill: stats.skill_level(SkillKind::Evasion),
            parry_skill: stats.skill_level(parry_skill),
            shield_skill: stats.skill_level(SkillKind::ShieldUsage),
            agility: stats.agility(),
            balance: combat.balance,
            allocation: combat.allocation,
            flat_defense: combat.defense,
            armor,
            posture_factor,
        })
    }
}

/// Weighted defensive styles + balance + defense + armor, times posture
pub fn defender_power(profile: &DefenderProfile, attack: AttackType, config: &CombatConfig) -> f32 {
    let style = |skill: u32| {
        skill as f32 * config.defense_skill_weight + profile.agility * config.defense_agility_weight
    };
    let alloc = &profile.allocation;

    let mut styles = style(profile.evasion_skill) * alloc.evasion as f32 / 100.0;
    if attack == AttackType::Melee {
        styles += style(profile.parry_skill) * alloc.parry as f32 / 100.0;
    }
    styles += style(profile.shield_skill) * alloc.shield as f32 / 100.0;

    let base = styles
        + profile.balance * config.defender_balance_weight
        + profile.flat_defense
        + profile.armor;
    base * profile.posture_factor
}

/// Damage dealt by a hit of the given quality (never negative)
pub fn damage_for(hit: HitType, weapon_damage: f32, margin: f32, multiplier: f32) -> i32 {
    let raw = match hit {
        HitType::Crushing => (weapon_damage * 1.5 + margin * 0.5) * multiplier,
        HitType::Solid => (weapon_damage + margin * 0.2) * multiplier,
        HitType::Marginal => weapon_damage * 0.5 * multiplier,
        HitType::Miss => 0.0,
    };
    raw.floor().max(0.0) as i32
}

/// Improvised weapon for unarmed moves; None for moves that need a weapon
pub fn brawling_weapon(attack: AttackMove) -> Option<Weapon> {
    let (name, damage, difficulty, roundtime) = match attack {
        AttackMove::Punch => ("Fists (Punch)", 5.0, SyncDifficulty::new(1.0, 5.0, 0.5), 3.0),
        AttackMove::Jab => ("Fists (Jab)", 3.0, SyncDifficulty::new(1.2, 6.0, 0.3), 2.0),
        AttackMove::Uppercut => ("Fists (Uppercut)", 8.0, SyncDifficulty::new(0.8, 4.0, 0.7), 4.0),
        AttackMove::Headbutt => ("Headbutt", 10.0, SyncDifficulty::new(0.6, 3.0, 1.0), 4.0),
        _ => return None,
    };
    Some(
        Weapon::melee(name, "brawling", damage)
            .with_tiers(EngagementTier::CloseQuarters, EngagementTier::CloseQuarters)
            .with_difficulty(difficulty)
            .with_roundtime(roundtime),
    )
}
