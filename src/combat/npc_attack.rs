//! NPC attacks
//!
//! NPCs skip the timing challenge. Their power is a flat rating plus footing
//! and a small random swing, classified with the NPC outcome table. Defenders
//! with an open parry window or a full parry stance earn flow; katana
//! wielders earn momentum.

use rand::Rng;

use crate::combat::body_zone::BodyPart;
use crate::combat::buffer::{CombatBuffer, Malware};
use crate::combat::calculator::{defender_power, AttackType, DefenderProfile, HitType};
use crate::combat::flavor::attack_flavor;
use crate::combat::state::CombatStats;
use crate::combat::sync::TimingChannel;
use crate::combat::weapons::Weapon;
use crate::core::error::Result;
use crate::core::types::EntityId;
use crate::engine::CombatEngine;
use crate::entity::inventory::Inventory;
use crate::entity::npc::{Npc, NpcTag};
use crate::messaging::{NarrationSink, Severity};

/// Footing weight in NPC attack power
const NPC_BALANCE_WEIGHT: f32 = 20.0;
/// Width of the random swing added to NPC attack power
const NPC_POWER_SWING: f32 = 10.0;

/// Defenders in at least this much parry stance earn flow on a clean guard
const PASSIVE_PARRY_ALLOCATION: u32 = 100;
/// Parry share that lets a katana wielder catch a marginal blow
const BLADE_CATCH_ALLOCATION: u32 = 50;

const EVADE_MOMENTUM: u32 = 15;
const CATCH_MOMENTUM: u32 = 10;

/// Chance a landed blow scrambles the defender's running buffer
fn scramble_chance(hit: HitType) -> f64 {
    match hit {
        HitType::Crushing => 0.7,
        HitType::Solid => 0.3,
        HitType::Marginal | HitType::Miss => 0.0,
    }
}

/// NPC damage: a multiple of the flat attack rating
pub fn npc_damage(hit: HitType, attack: f32) -> i32 {
    let factor = match hit {
        HitType::Crushing => 1.5,
        HitType::Solid => 0.8,
        HitType::Marginal => 0.3,
        HitType::Miss => 0.0,
    };
    (attack * factor).floor().max(0.0) as i32
}

/// Balance change for (npc, defender)
fn npc_balance_shift(hit: HitType) -> (f32, f32) {
    match hit {
        HitType::Crushing => (0.1, -0.2),
        HitType::Solid => (0.0, -0.1),
        HitType::Marginal => (0.0, 0.0),
        HitType::Miss => (-0.1, 0.0),
    }
}

impl<N: NarrationSink, T: TimingChannel> CombatEngine<N, T> {
    /// One NPC swing at `target`. Roundtime and lookup failures are returned
    /// without narration.
    pub fn npc_attack(&mut self, npc: EntityId, target: EntityId) -> Result<HitType> {
        let result = self.try_npc_attack(npc, target);
        if let Err(err) = &result {
            if !err.is_validation() {
                tracing::warn!(npc = %npc, target = %target, error = %err, "npc attack aborted");
            }
        }
        result
    }

    fn try_npc_attack(&mut self, npc: EntityId, target: EntityId) -> Result<HitType> {
        self.ensure_ready(npc)?;

        let attacker = self.world.require::<CombatStats>(npc)?.clone();
        let (npc_name, tag) = {
            let ident = self.world.require::<Npc>(npc)?;
            (ident.type_name.clone(), ident.tag)
        };
        let pos = self.require_position(npc)?;
        let defender = self.world.require::<CombatStats>(target)?.clone();
        let profile = DefenderProfile::gather(&self.world, target)?;

        let category = self
            .world
            .get::<Inventory>(npc)
            .and_then(|inv| inv.right_hand)
            .and_then(|id| self.world.get::<Weapon>(id))
            .map_or_else(|| "natural".to_string(), |w| w.category.clone());
        let defender_katana = self
            .held_weapon(target)
            .is_some_and(|(_, w)| w.is_katana());

        let swing = self.rng.gen_range(0.0..NPC_POWER_SWING);
        let attack = attacker.attack + attacker.balance * NPC_BALANCE_WEIGHT + swing;
        let defense = defender_power(&profile, AttackType::Melee, &self.config);
        let margin = attack - defense;
        let mut hit = self.config.npc_outcome_policy.classify(margin, &mut self.rng);
        tracing::debug!(npc = %npc, target = %target, attack, defense, margin, hit = %hit, "npc attack");

        // Guard rewards
        let has_buffer = self.world.has::<CombatBuffer>(target);
        if defender.is_parrying {
            hit = hit.downgrade();
            if has_buffer {
                self.tell(target, Severity::Success, "[ACTIVE PARRY] You deflected the blow!");
                self.award_flow(target);
            }
        } else if defender.allocation.parry >= PASSIVE_PARRY_ALLOCATION
            && matches!(hit, HitType::Miss | HitType::Marginal)
            && has_buffer
        {
            self.tell(
                target,
                Severity::Success,
                "[STANCE PARRY] You maintain flow through your guard.",
            );
            self.award_flow(target);
        }

        if defender_katana {
            let catch = defender.is_parrying || defender.allocation.parry > BLADE_CATCH_ALLOCATION;
            match hit {
                HitType::Miss => {
                    self.gain_momentum(target, EVADE_MOMENTUM);
                    let text = format!(
                        "[MOMENTUM] Your flow intensifies as you evade! (+{})",
                        EVADE_MOMENTUM
                    );
                    self.tell(target, Severity::Success, &text);
                }
                HitType::Marginal if catch => {
                    self.gain_momentum(target, CATCH_MOMENTUM);
                    let text = format!(
                        "[MOMENTUM] You catch the blow on your blade! (+{})",
                        CATCH_MOMENTUM
                    );
                    self.tell(target, Severity::Success, &text);
                }
                _ => {}
            }
        }

        self.tell(target, Severity::Combat, &format!("{} attacks you!", npc_name));
        let flavor = attack_flavor(&category, hit);

        let scramble = scramble_chance(hit);
        let executing = self
            .world
            .get::<CombatBuffer>(target)
            .is_some_and(|b| b.is_executing);
        if executing && scramble > 0.0 && self.rng.gen_bool(scramble) {
            if let Some(buffer) = self.world.get_mut::<CombatBuffer>(target) {
                buffer.scramble();
            }
            self.tell(
                target,
                Severity::Error,
                "[SYSTEM SHOCK] Your combat sequence has been SCRAMBLED!",
            );
        }

        // Commit
        let damage = npc_damage(hit, attacker.attack);
        let (own_shift, their_shift) = npc_balance_shift(hit);
        let own = self.world.require_mut::<CombatStats>(npc)?;
        own.adjust_balance(own_shift);
        own.is_hostile = true;
        own.target.get_or_insert(target);
        let theirs = self.world.require_mut::<CombatStats>(target)?;
        theirs.adjust_balance(their_shift);
        theirs.take_damage(damage);
        let down = theirs.is_dead();

        let line = match hit {
            HitType::Miss => format!("{} {} {}!", flavor.label, npc_name, flavor.npc_action),
            HitType::Marginal => format!(
                "{} {} {}. You take {} damage.",
                flavor.label, npc_name, flavor.npc_action, damage
            ),
            _ => format!(
                "{} {} {}! You take {} damage!",
                flavor.label, npc_name, flavor.npc_action, damage
            ),
        };
        self.tell(target, Severity::Combat, &line);
        if hit == HitType::Crushing {
            self.wound(target, target, BodyPart::Chest);
        }

        if tag == NpcTag::Turing && hit.is_hit() && self.rng.gen_bool(self.config.malware_chance) {
            let injected = self
                .world
                .get_mut::<CombatBuffer>(target)
                .is_some_and(|b| b.inject(Malware::Reboot));
            if injected {
                self.tell(
                    target,
                    Severity::Error,
                    "[MALWARE INJECTED] REBOOT.EXE UPLOADED TO YOUR BUFFER.",
                );
            }
        }

        if down {
            tracing::info!(npc = %npc, target = %target, "combatant down");
        }

        let text = format!(
            "{} attacks another combatant! {}",
            npc_name, flavor.observer_label
        );
        self.broadcast(pos, &[npc, target], Severity::Combat, &text);

        self.apply_roundtime(npc, self.config.npc_attack_roundtime);
        Ok(hit)
    }
}
