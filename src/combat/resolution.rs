//! Attack phase two: resolve a reported timing result
//!
//! All lookups and validation run first. Once the outcome is classified the
//! writes go through in one pass: balance, damage, wounds, ammo, skill, then
//! death handling and bystander narration.

use rand::Rng;

use crate::combat::body_zone::BodyPart;
use crate::combat::calculator::{
    attacker_power_for, brawling_weapon, damage_for, defender_power, reconcile, skill_for_weapon,
    AttackType, DefenderProfile, HitType, SyncReport,
};
use crate::combat::flavor::attack_flavor;
use crate::combat::momentum::Momentum;
use crate::combat::state::{CombatStats, PendingAttack};
use crate::combat::sync::TimingChannel;
use crate::combat::weapons::{AttackMove, Weapon};
use crate::combat::wounds::{WoundTable, STUN_WOUND_LEVEL};
use crate::core::error::{CombatError, Result};
use crate::core::types::{EntityId, Position};
use crate::engine::CombatEngine;
use crate::entity::inventory::Inventory;
use crate::entity::npc::{Npc, NpcTag};
use crate::entity::posture::Persona;
use crate::entity::stats::Stats;
use crate::messaging::{NarrationSink, Severity};

/// Momentum earned by a katana slice that lands
const SLICE_MOMENTUM: u32 = 5;

/// Result of a resolved attack
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackOutcome {
    pub hit: HitType,
    pub damage: i32,
    pub margin: f32,
    pub killed: bool,
}

impl<N: NarrationSink, T: TimingChannel> CombatEngine<N, T> {
    /// Resolve the pending attack of `actor` against `target`
    ///
    /// Each challenge sent by `initiate_attack` answers exactly one report;
    /// without one outstanding for `target` nothing is touched.
    pub fn resolve_attack(
        &mut self,
        actor: EntityId,
        target: EntityId,
        report: SyncReport,
    ) -> Result<AttackOutcome> {
        let result = self.take_pending(actor, target).and_then(|pending| {
            self.resolve_with(actor, target, report, 1.0, pending.attack_move)
        });
        self.surface(actor, result)
    }

    fn take_pending(&mut self, actor: EntityId, target: EntityId) -> Result<PendingAttack> {
        let own = self.world.require_mut::<CombatStats>(actor)?;
        match own.pending_attack {
            Some(pending) if pending.target == target => {
                own.pending_attack = None;
                Ok(pending)
            }
            _ => Err(CombatError::rejected("You have no attack ready against that target.")),
        }
    }

    /// Resolution with a damage multiplier (buffered strikes and combos)
    pub(crate) fn resolve_with(
        &mut self,
        actor: EntityId,
        target: EntityId,
        report: SyncReport,
        multiplier: f32,
        attack_move: Option<AttackMove>,
    ) -> Result<AttackOutcome> {
        let attacker = self.world.require::<CombatStats>(actor)?.clone();
        let their_combat = self
            .world
            .get::<CombatStats>(target)
            .filter(|_| self.world.co_located(actor, target))
            .ok_or_else(|| CombatError::rejected("Your target is no longer here."))?;
        let was_hostile = their_combat.is_hostile;
        let pos = self.require_position(target)?;

        let held = self.held_weapon(actor);
        let weapon = match &held {
            Some((_, w)) => w.clone(),
            None => attack_move
                .and_then(brawling_weapon)
                .or_else(|| brawling_weapon(AttackMove::Punch))
                .ok_or_else(|| CombatError::MalformedWeapon("no unarmed profile".into()))?,
        };
        weapon.validate()?;

        let stats = self.world.get::<Stats>(actor).cloned().unwrap_or_default();
        let profile = DefenderProfile::gather(&self.world, target)?;

        let attack = attacker_power_for(&stats, &attacker, &weapon, &self.config);
        let defense = defender_power(&profile, AttackType::of(&weapon), &self.config);
        let margin = attack - defense;
        let by_margin = self.config.outcome_policy.classify(margin, &mut self.rng);
        let hit = reconcile(by_margin, report);
        let damage = damage_for(hit, weapon.damage, margin, multiplier);
        tracing::debug!(
            actor = %actor,
            target = %target,
            attack,
            defense,
            margin,
            by_margin = %by_margin,
            ?report,
            hit = %hit,
            damage,
            "attack resolved"
        );

        let target_name = self.world.display_name(target);

        // Commit
        let (own_shift, their_shift) = hit.balance_shift();
        let own = self.world.require_mut::<CombatStats>(actor)?;
        own.target.get_or_insert(target);
        own.adjust_balance(own_shift);

        let theirs = self.world.require_mut::<CombatStats>(target)?;
        theirs.adjust_balance(their_shift);
        theirs.take_damage(damage);
        theirs.is_hostile = true;
        if theirs.target.is_none() {
            theirs.target = Some(actor);
        }
        let (hp, max_hp, balance) = (theirs.hp, theirs.max_hp, theirs.balance);

        if !was_hostile {
            let text = format!("{} becomes hostile!", target_name);
            self.tell(actor, Severity::Combat, &text);
        }

        let flavor = attack_flavor(&weapon.category, hit);
        self.tell(
            actor,
            Severity::Combat,
            &format!("You attack {} with your {}!", target_name, weapon.name),
        );
        let line = match hit {
            HitType::Miss => format!("{} You {}!", flavor.label, flavor.player_action),
            HitType::Marginal => format!(
                "{} You {}. You deal {} damage!",
                flavor.label, flavor.player_action, damage
            ),
            _ => format!(
                "{} You {}! You deal {} damage!",
                flavor.label, flavor.player_action, damage
            ),
        };
        self.tell(actor, Severity::Combat, &line);

        match hit {
            HitType::Crushing => {
                self.tell(actor, Severity::Combat, "[STUN] Target is reeling!");
                let aimed = attacker.target_limb.unwrap_or(BodyPart::Chest);
                self.wound(actor, target, aimed);
            }
            HitType::Solid => self.tell(actor, Severity::Combat, "Target loses balance!"),
            HitType::Marginal => self.tell(actor, Severity::Combat, "You regain some momentum."),
            HitType::Miss => {}
        }

        if hit.is_hit() && attack_move == Some(AttackMove::Slice) && weapon.is_katana() {
            self.gain_momentum(actor, SLICE_MOMENTUM);
            self.tell(
                actor,
                Severity::Combat,
                &format!(
                    "[MOMENTUM] Your slice connects, maintaining your flow! (+{})",
                    SLICE_MOMENTUM
                ),
            );
        }

        if weapon.is_ranged() {
            if let Some((weapon_id, _)) = held {
                self.spend_round(actor, weapon_id);
            }
        }

        self.accrue_skill(actor, &weapon, hit);

        let killed = hp <= 0;
        if killed {
            self.handle_death(actor, target, pos, &target_name);
        } else {
            let text = format!(
                "{}: {}/{} HP | Balance: {}%",
                target_name,
                hp,
                max_hp,
                (balance * 100.0).round() as i32
            );
            self.tell(actor, Severity::Combat, &text);
        }

        let text = format!(
            "A combatant attacks {} with their {}! {}",
            target_name, weapon.name, flavor.observer_label
        );
        self.broadcast(pos, &[actor, target], Severity::Combat, &text);

        Ok(AttackOutcome {
            hit,
            damage,
            margin,
            killed,
        })
    }

    /// Crushing-hit wound on `part` (mapped to digital anatomy for personas).
    /// The wound report goes to `notify`.
    pub(crate) fn wound(&mut self, notify: EntityId, target: EntityId, part: BodyPart) {
        let persona = self.world.has::<Persona>(target);
        let part = if persona { part.digital() } else { part };
        let amount = self.config.crushing_wound_level;

        if !self.world.has::<WoundTable>(target) {
            self.world.insert(target, WoundTable::new());
        }
        let Some(level) = self
            .world
            .get_mut::<WoundTable>(target)
            .map(|w| w.apply(part, amount))
        else {
            return;
        };

        let text = if persona {
            format!("[NEURAL FEEDBACK] {} corrupted! Level {}", part, level)
        } else {
            format!("[WOUND] {}: Level {}", part, level)
        };
        self.tell(notify, Severity::Combat, &text);

        if part.is_cranial() && level >= STUN_WOUND_LEVEL {
            self.tell(notify, Severity::Combat, "[STUN] Target is dazed!");
        } else if part.is_arm() {
            self.tell(notify, Severity::Combat, "[PENALTY] Accuracy reduced!");
        }
    }

    pub(crate) fn gain_momentum(&mut self, id: EntityId, amount: u32) -> u32 {
        if !self.world.has::<Momentum>(id) {
            self.world.insert(id, Momentum::default());
        }
        self.world
            .get_mut::<Momentum>(id)
            .map_or(0, |m| m.add(amount))
    }

    fn spend_round(&mut self, actor: EntityId, weapon_id: EntityId) {
        let Some(weapon) = self.world.get_mut::<Weapon>(weapon_id) else {
            return;
        };
        weapon.current_ammo = weapon.current_ammo.saturating_sub(1);
        let text = format!("[{}/{} rounds remaining]", weapon.current_ammo, weapon.mag_size);
        self.tell(actor, Severity::Combat, &text);
    }

    fn accrue_skill(&mut self, actor: EntityId, weapon: &Weapon, hit: HitType) {
        let kind = skill_for_weapon(weapon);
        let growth = self.config.skill_growth;
        let Some(level) = self
            .world
            .get_mut::<Stats>(actor)
            .and_then(|s| s.record_use(kind, hit.skill_uses(), growth))
        else {
            return;
        };
        tracing::info!(actor = %actor, skill = %kind, level, "skill level up");
        let text = format!("*** Your {} skill has increased to level {}! ***", kind, level);
        self.tell(actor, Severity::Success, &text);
    }

    fn handle_death(&mut self, actor: EntityId, target: EntityId, pos: Position, name: &str) {
        tracing::info!(actor = %actor, target = %target, "combatant eliminated");
        self.tell(actor, Severity::Combat, &format!("{} has been eliminated!", name));

        let glitch = self
            .world
            .get::<Npc>(target)
            .is_some_and(|npc| npc.tag == NpcTag::Glitch);
        if glitch {
            self.glitch_drop(actor, pos, name);
        }

        let carried = self
            .world
            .get::<Inventory>(target)
            .map(Inventory::carried)
            .unwrap_or_default();
        for item in carried {
            if self.rng.gen_bool(self.config.loot_drop_chance) {
                self.world.insert(item, pos);
                let text = format!("The {} drops a {}!", name, self.world.display_name(item));
                self.tell(actor, Severity::Info, &text);
            } else {
                self.despawn(item);
            }
        }

        self.despawn(target);
        if let Some(own) = self.world.get_mut::<CombatStats>(actor) {
            own.disengage();
        }
    }

    /// Glitch enemies sometimes leave a random catalog item behind
    fn glitch_drop(&mut self, actor: EntityId, pos: Position, name: &str) {
        let count = self.catalog.blueprints().len();
        if count == 0 || !self.rng.gen_bool(self.config.glitch_drop_chance) {
            return;
        }
        let pick = self.rng.gen_range(0..count);
        let catalog = self.catalog.clone();
        let blueprint = &catalog.blueprints()[pick];
        blueprint.spawn(&mut self.world, pos);
        let text = format!(
            "[GLITCH DROP] The {} destabilizes and leaves behind a {}!",
            name, blueprint.name
        );
        self.tell(actor, Severity::Success, &text);
    }
}
