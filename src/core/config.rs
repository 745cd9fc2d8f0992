//! Combat configuration with documented constants
//!
//! All tunable numbers are collected here with explanations of their purpose
//! and how they interact with each other. The config is passed explicitly to
//! the engine; there is no global instance.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::combat::calculator::OutcomePolicy;
use crate::core::error::{CombatError, Result};

/// Configuration for the combat core
///
/// These values reproduce the pacing of the live game. Changing them affects
/// how long fights last and how punishing mistakes are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Seed for the engine RNG. Same seed + same inputs = same fight.
    pub seed: u64,

    // === RESOLUTION ===
    /// Margin-to-outcome policy for player attacks
    pub outcome_policy: OutcomePolicy,

    /// Margin-to-outcome policy for the lighter NPC attack path
    pub npc_outcome_policy: OutcomePolicy,

    /// Weight of balance in attacker power (`balance * weight`)
    ///
    /// At 25 a fully balanced attacker gets +25 power, which makes balance
    /// management the dominant factor for landing crits.
    pub attacker_balance_weight: f32,

    /// Weight of balance in defender power
    pub defender_balance_weight: f32,

    /// Skill weight inside each defensive style value
    pub defense_skill_weight: f32,

    /// Agility weight inside each defensive style value
    pub defense_agility_weight: f32,

    /// Wound level applied to the targeted part on a crushing hit
    pub crushing_wound_level: u32,

    // === RESOURCES ===
    /// Fatigue spent to initiate an attack (also the minimum required)
    pub attack_fatigue_cost: f32,

    /// Fatigue spent per maneuver attempt (also the minimum required)
    pub maneuver_fatigue_cost: f32,

    /// Roundtime applied after every rolled maneuver attempt (seconds)
    pub maneuver_roundtime: f32,

    /// Opposed-roll penalty per additional NPC in the room
    pub crowd_penalty: f32,

    /// Fraction of max fatigue that must be regained before exhaustion lifts
    pub exhaustion_recovery_fraction: f32,

    /// Balance cap while exhausted
    pub exhausted_balance_cap: f32,

    // === REGENERATION (per second) ===
    /// Balance regen when fully disengaged
    pub balance_regen_disengaged: f32,

    /// Balance regen at missile/polearm range
    pub balance_regen_ranged: f32,

    /// Balance regen at melee/close quarters
    pub balance_regen_melee: f32,

    // === TIMING CHALLENGE ===
    /// Length of the sync bar sent to the client
    pub sync_bar_length: u32,

    /// Roundtime used when a weapon does not configure its own
    pub default_attack_roundtime: f32,

    /// Roundtime of the fast `slice` move
    pub slice_roundtime: f32,

    // === ACTION BUFFER ===
    /// Starting buffer capacity
    pub buffer_base_slots: usize,

    /// Hard cap on buffer capacity
    pub buffer_max_slots: usize,

    /// Flow points needed for one extra slot
    pub flow_per_slot: u32,

    /// Stun applied by REBOOT malware (seconds)
    pub reboot_stun: f32,

    // === PROGRESSION ===
    /// Uses needed to reach level 2 of a fresh skill
    pub skill_base_uses: u32,

    /// Growth of the use threshold per level
    pub skill_growth: f32,

    /// Momentum needed for iaijutsu
    pub iaijutsu_threshold: u32,

    // === DEATH & LOOT ===
    /// Chance a dead combatant drops what it carried
    pub loot_drop_chance: f64,

    /// Chance a glitch enemy leaves a catalog item behind
    pub glitch_drop_chance: f64,

    // === NPC BEHAVIOUR ===
    /// Chance a turing NPC opens with COMMAND_SHUTDOWN
    pub shutdown_chance: f64,

    /// Roundtime inflicted by COMMAND_SHUTDOWN
    pub shutdown_roundtime: f32,

    /// Chance a turing NPC injects REBOOT malware on a hit
    pub malware_chance: f64,

    /// Roundtime an NPC incurs after attacking
    pub npc_attack_roundtime: f32,

    /// Roundtime for fleeing combat
    pub flee_roundtime: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,

            outcome_policy: OutcomePolicy::crit_roll(),
            npc_outcome_policy: OutcomePolicy::flat_bands(),
            attacker_balance_weight: 25.0,
            defender_balance_weight: 20.0,
            defense_skill_weight: 0.8,
            defense_agility_weight: 0.6,
            crushing_wound_level: 5,

            attack_fatigue_cost: 2.0,
            maneuver_fatigue_cost: 5.0,
            maneuver_roundtime: 1.0,
            crowd_penalty: 15.0,
            exhaustion_recovery_fraction: 0.25,
            exhausted_balance_cap: 0.5,

            // 5 : 2.5 : 1
            balance_regen_disengaged: 0.05,
            balance_regen_ranged: 0.025,
            balance_regen_melee: 0.01,

            sync_bar_length: 20,
            default_attack_roundtime: 3.0,
            slice_roundtime: 2.0,

            buffer_base_slots: 3,
            buffer_max_slots: 6,
            flow_per_slot: 3,
            reboot_stun: 5.0,

            skill_base_uses: 10,
            skill_growth: 1.5,
            iaijutsu_threshold: 30,

            loot_drop_chance: 0.2,
            glitch_drop_chance: 0.8,

            shutdown_chance: 0.2,
            shutdown_roundtime: 10.0,
            malware_chance: 0.2,
            npc_attack_roundtime: 4.0,
            flee_roundtime: 10.0,
        }
    }
}

impl CombatConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a (possibly partial) TOML document; missing keys keep defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CombatConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.buffer_base_slots == 0 || self.buffer_base_slots > self.buffer_max_slots {
            return Err(CombatError::InvalidConfig(format!(
                "buffer_base_slots ({}) must be in 1..={}",
                self.buffer_base_slots, self.buffer_max_slots
            )));
        }

        if self.flow_per_slot == 0 {
            return Err(CombatError::InvalidConfig("flow_per_slot must be positive".into()));
        }

        if !(0.0..=1.0).contains(&self.exhausted_balance_cap) {
            return Err(CombatError::InvalidConfig(format!(
                "exhausted_balance_cap ({}) must be within [0, 1]",
                self.exhausted_balance_cap
            )));
        }

        // Regen should favour safety: disengaged >= ranged >= melee
        if self.balance_regen_disengaged < self.balance_regen_ranged
            || self.balance_regen_ranged < self.balance_regen_melee
        {
            return Err(CombatError::InvalidConfig(
                "balance regen must not increase as range closes".into(),
            ));
        }

        for chance in [
            self.loot_drop_chance,
            self.glitch_drop_chance,
            self.shutdown_chance,
            self.malware_chance,
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(CombatError::InvalidConfig(format!(
                    "probability {} outside [0, 1]",
                    chance
                )));
            }
        }

        if self.skill_growth < 1.0 {
            return Err(CombatError::InvalidConfig(
                "skill_growth below 1.0 would make levels cheaper over time".into(),
            ));
        }

        self.outcome_policy.validate()?;
        self.npc_outcome_policy.validate()?;

        Ok(())
    }
}
