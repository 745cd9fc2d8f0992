//! Attributes and skills
//!
//! Attributes are fixed-ish scores (default 10). Skills level up through
//! use: every level needs more uses than the last.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value assumed for an attribute the entity does not define
pub const DEFAULT_ATTRIBUTE: u32 = 10;

/// Level assumed for a skill the entity does not have
pub const DEFAULT_SKILL_LEVEL: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    /// AGI - speed, precision, footwork
    Agility,
    /// CON - stamina pool and recovery
    Constitution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillKind {
    Brawling,
    MeleeCombat,
    Kenjutsu,
    MarksmanshipLight,
    MarksmanshipMedium,
    MarksmanshipHeavy,
    Evasion,
    ShieldUsage,
}

impl SkillKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            SkillKind::Brawling => "Brawling",
            SkillKind::MeleeCombat => "Melee Combat",
            SkillKind::Kenjutsu => "Kenjutsu",
            SkillKind::MarksmanshipLight => "Marksmanship (Light)",
            SkillKind::MarksmanshipMedium => "Marksmanship (Medium)",
            SkillKind::MarksmanshipHeavy => "Marksmanship (Heavy)",
            SkillKind::Evasion => "Evasion",
            SkillKind::ShieldUsage => "Shield Usage",
        }
    }
}

impl fmt::Display for SkillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A trained skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub level: u32,
    pub uses: u32,
    /// Uses needed for the next level
    pub max_uses: u32,
}

impl Skill {
    pub fn new(level: u32, max_uses: u32) -> Self {
        Self {
            level,
            uses: 0,
            max_uses: max_uses.max(1),
        }
    }

    /// Accrue uses; returns true if the skill levelled up
    pub fn add_uses(&mut self, amount: u32, growth: f32) -> bool {
        self.uses += amount;
        if self.uses >= self.max_uses {
            self.level += 1;
            self.uses -= self.max_uses;
            self.max_uses = ((self.max_uses as f32 * growth).floor() as u32).max(self.max_uses + 1);
            true
        } else {
            false
        }
    }
}

/// Attribute scores and skills of an entity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stats {
    attributes: AHashMap<Attribute, u32>,
    skills: AHashMap<SkillKind, Skill>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, attribute: Attribute, value: u32) -> Self {
        self.attributes.insert(attribute, value);
        self
    }

    pub fn with_skill(mut self, kind: SkillKind, level: u32, max_uses: u32) -> Self {
        self.skills.insert(kind, Skill::new(level, max_uses));
        self
    }

    pub fn attribute(&self, attribute: Attribute) -> u32 {
        self.attributes
            .get(&attribute)
            .copied()
            .unwrap_or(DEFAULT_ATTRIBUTE)
    }

    pub fn set_attribute(&mut self, attribute: Attribute, value: u32) {
        self.attributes.insert(attribute, value);
    }

    pub fn agility(&self) -> f32 {
        self.attribute(Attribute::Agility) as f32
    }

    pub fn constitution(&self) -> f32 {
        self.attribute(Attribute::Constitution) as f32
    }

    /// Derived fatigue pool
    pub fn max_fatigue(&self) -> f32 {
        self.constitution() * 10.0
    }

    pub fn skill(&self, kind: SkillKind) -> Option<&Skill> {
        self.skills.get(&kind)
    }

    pub fn skill_level(&self, kind: SkillKind) -> u32 {
        self.skills
            .get(&kind)
            .map(|s| s.level)
            .unwrap_or(DEFAULT_SKILL_LEVEL)
    }

    /// Accrue uses on a trained skill. Untrained skills do not progress.
    ///
    /// Returns the new level when the skill levelled up.
    pub fn record_use(&mut self, kind: SkillKind, amount: u32, growth: f32) -> Option<u32> {
        let skill = self.skills.get_mut(&kind)?;
        skill.add_uses(amount, growth).then_some(skill.level)
    }
}
