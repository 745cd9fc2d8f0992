//! Attack phase one: validate, commit, hand out the timing challenge
//!
//! Every check runs before anything is written. The only early exits that
//! still consume the action are an automatic reload and an NPC's shutdown
//! command.

use rand::Rng;

use crate::combat::calculator::{brawling_weapon, skill_for_weapon};
use crate::combat::momentum::Momentum;
use crate::combat::state::{CombatStats, PendingAttack};
use crate::combat::sync::{SyncChallenge, TimingChannel};
use crate::combat::targeting::resolve_target;
use crate::combat::tier::EngagementTier;
use crate::combat::weapons::{AttackMove, Weapon};
use crate::core::error::{CombatError, Result};
use crate::core::types::EntityId;
use crate::engine::CombatEngine;
use crate::entity::inventory::{Container, Inventory, Item, Magazine, BACK_SLOT};
use crate::entity::npc::{Npc, NpcTag};
use crate::entity::posture::{Persona, Posture};
use crate::entity::stats::{SkillKind, Stats};
use crate::messaging::{NarrationSink, Severity};

/// What a committed phase one produced
#[derive(Debug, Clone, PartialEq)]
pub enum AttackStart {
    /// Challenge sent; resolution waits for the timing report
    Challenged(SyncChallenge),
    /// The empty weapon was reloaded instead of firing
    Reloaded { magazines_left: u32 },
    /// A turing NPC locked down the victim instead of attacking
    Shutdown { victim: EntityId },
}

/// Where a magazine was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MagazineSource {
    Container(EntityId),
    Ground,
}

/// Marksmanship skill that governs reloading a weapon category
pub fn reload_skill(category: &str) -> SkillKind {
    let category = category.to_lowercase();
    if category.contains("rifle") || category.contains("carbine") {
        SkillKind::MarksmanshipMedium
    } else if ["shotgun", "heavy", "launcher", "sweeper"]
        .iter()
        .any(|t| category.contains(t))
    {
        SkillKind::MarksmanshipHeavy
    } else {
        SkillKind::MarksmanshipLight
    }
}

/// `max(1, 5 - 0.5 * level)` seconds
pub fn reload_roundtime(skill_level: u32) -> f32 {
    (5.0 - skill_level as f32 * 0.5).max(1.0)
}

impl<N: NarrationSink, T: TimingChannel> CombatEngine<N, T> {
    /// `attack [target] [move]`
    pub fn initiate_attack(
        &mut self,
        actor: EntityId,
        target_name: Option<&str>,
        attack_move: Option<AttackMove>,
    ) -> Result<AttackStart> {
        let result = self.try_initiate(actor, target_name, attack_move);
        self.surface(actor, result)
    }

    /// Katana finisher: spends every point of momentum, then attacks
    pub fn iaijutsu(&mut self, actor: EntityId, target_name: Option<&str>) -> Result<AttackStart> {
        let result = self.check_iaijutsu(actor);
        if let Err(err) = result {
            if err.is_validation() {
                self.tell(actor, Severity::Error, &err.to_string());
            }
            return Err(err);
        }

        let start = self.initiate_attack(actor, target_name, Some(AttackMove::Iaijutsu))?;
        if matches!(start, AttackStart::Challenged(_)) {
            let spent = self
                .world
                .get_mut::<Momentum>(actor)
                .map(|m| std::mem::take(&mut m.current))
                .unwrap_or(0);
            tracing::debug!(actor = %actor, spent, "iaijutsu");
            self.tell(actor, Severity::Combat, "--- IAIJUTSU ---");
            self.tell(
                actor,
                Severity::Success,
                "You draw and strike in a single, fluid motion!",
            );
        }
        Ok(start)
    }

    fn check_iaijutsu(&self, actor: EntityId) -> Result<()> {
        let threshold = self.config.iaijutsu_threshold;
        let banked = self.world.get::<Momentum>(actor).map_or(0, |m| m.current);
        if banked < threshold {
            return Err(CombatError::rejected(format!(
                "You lack the Momentum for Iaijutsu! (Requires {}+)",
                threshold
            )));
        }
        match self.held_weapon(actor) {
            None => Err(CombatError::rejected("You need a blade to perform Iaijutsu!")),
            Some((_, weapon)) if !weapon.is_katana() => {
                Err(CombatError::rejected("Iaijutsu requires a samurai sword!"))
            }
            Some(_) => Ok(()),
        }
    }

    fn try_initiate(
        &mut self,
        actor: EntityId,
        target_name: Option<&str>,
        attack_move: Option<AttackMove>,
    ) -> Result<AttackStart> {
        self.ensure_ready(actor)?;

        let cost = self.config.attack_fatigue_cost;
        let own = self.world.require::<CombatStats>(actor)?;
        if !own.has_fatigue(cost) {
            return Err(CombatError::rejected("You are too exhausted to attack!"));
        }
        let own_tier = own.engagement_tier;

        if let Some(victim) = self.try_shutdown(actor) {
            self.world.require_mut::<CombatStats>(actor)?.spend_fatigue(cost);
            return Ok(AttackStart::Shutdown { victim });
        }

        self.require_position(actor)?;
        let posture = self.world.get::<Posture>(actor).copied().unwrap_or_default();
        if !posture.permits_action(self.world.has::<Persona>(actor)) {
            return Err(CombatError::rejected(format!(
                "You can't attack while {}!",
                posture
            )));
        }

        let target = resolve_target(&self.world, actor, target_name)?;
        let target_label = self.world.display_name(target);
        let their_tier = self
            .world
            .get::<CombatStats>(target)
            .map(|c| c.engagement_tier)
            .ok_or_else(|| CombatError::rejected(format!("You can't attack {}.", target_label)))?;

        let held = self.held_weapon(actor);
        let weapon = self.weapon_for_move(held.as_ref().map(|(_, w)| w), attack_move)?;
        weapon.validate()?;

        if weapon.is_ranged() && weapon.current_ammo == 0 {
            // Only a held weapon can be empty; brawling weapons never are
            if let Some((weapon_id, _)) = held {
                return self.auto_reload(actor, weapon_id, &weapon);
            }
        }

        let effective = EngagementTier::effective(own_tier, their_tier);
        if !weapon.usable_at(effective) {
            return Err(CombatError::rejected(format!(
                "Your {} is not effective at {} range! You need to advance.",
                weapon.name, effective
            )));
        }

        let default_stats = Stats::default();
        let stats = self.world.get::<Stats>(actor).unwrap_or(&default_stats);
        let skill_level = stats.skill_level(skill_for_weapon(&weapon));
        let challenge = SyncChallenge::for_weapon(
            &weapon,
            skill_level,
            stats.agility(),
            self.config.sync_bar_length,
            target,
            target_label.clone(),
        );

        // Commit
        let own = self.world.require_mut::<CombatStats>(actor)?;
        own.spend_fatigue(cost);
        own.pending_attack = Some(PendingAttack {
            target,
            attack_move,
        });
        if effective > own_tier {
            own.engagement_tier = effective;
            let text = format!("You engage the {} at {} range.", target_label, effective);
            self.tell(actor, Severity::Info, &text);
        }
        if let Some(theirs) = self.world.get_mut::<CombatStats>(target) {
            theirs.is_hostile = true;
        }

        self.timing.send_challenge(actor, &challenge);
        tracing::debug!(
            actor = %actor,
            target = %target,
            weapon = %weapon.name,
            speed = challenge.speed,
            zone = challenge.crit_zone_size,
            "sync challenge sent"
        );

        let roundtime = match attack_move {
            Some(AttackMove::Slice) => self.config.slice_roundtime,
            _ => weapon.roundtime.unwrap_or(self.config.default_attack_roundtime),
        };
        self.apply_roundtime(actor, roundtime);

        Ok(AttackStart::Challenged(challenge))
    }

    /// The weapon a move is performed with, or why the move is impossible
    fn weapon_for_move(&self, held: Option<&Weapon>, attack_move: Option<AttackMove>) -> Result<Weapon> {
        match attack_move {
            Some(m) if m.is_brawl() => {
                if held.is_some() {
                    return Err(CombatError::rejected("You can't brawl while holding a weapon!"));
                }
                brawling_weapon(m).ok_or_else(|| {
                    CombatError::MalformedWeapon(format!("no brawling profile for {:?}", m))
                })
            }
            Some(m @ (AttackMove::Slash | AttackMove::Slice | AttackMove::Thrust)) => {
                let weapon = held.ok_or_else(|| {
                    CombatError::rejected(format!("You need a weapon to {}!", m.verb()))
                })?;
                let able = match m {
                    AttackMove::Thrust => weapon.can_thrust(),
                    _ => weapon.can_slash(),
                };
                if !able {
                    return Err(CombatError::rejected(format!(
                        "You can't {} with a {}.",
                        m.verb(),
                        weapon.name
                    )));
                }
                Ok(weapon.clone())
            }
            _ => held.cloned().ok_or_else(|| {
                CombatError::rejected("You need a weapon in your right hand to attack!")
            }),
        }
    }

    /// Turing NPCs sometimes lock down a player instead of attacking
    fn try_shutdown(&mut self, actor: EntityId) -> Option<EntityId> {
        let npc = self.world.get::<Npc>(actor)?;
        if npc.tag != NpcTag::Turing {
            return None;
        }
        let name = npc.type_name.clone();
        if !self.rng.gen_bool(self.config.shutdown_chance) {
            return None;
        }
        let pos = self.world.position(actor)?;
        let victim = self.world.observers_at(pos, &[actor]).into_iter().next()?;

        let text = format!(
            "[COMBAT] {} points a device at you and initiates COMMAND_SHUTDOWN!",
            name
        );
        self.tell(victim, Severity::Combat, &text);
        self.apply_roundtime(victim, self.config.shutdown_roundtime);
        self.tell(
            victim,
            Severity::System,
            "[SYSTEM] MOTOR FUNCTIONS SUSPENDED. REBOOTING...",
        );
        tracing::info!(npc = %actor, victim = %victim, "command shutdown");
        Some(victim)
    }

    fn auto_reload(&mut self, actor: EntityId, weapon_id: EntityId, weapon: &Weapon) -> Result<AttackStart> {
        let ammo_type = weapon.ammo_type.clone().unwrap_or_default();
        let Some((magazine, source)) = self.find_magazine(actor, &ammo_type, false) else {
            return Err(CombatError::rejected(format!(
                "Your {} is out of ammo and you have no magazines!",
                weapon.name
            )));
        };

        let magazines_left = self.consume_magazine(magazine, source);
        self.world.require_mut::<Weapon>(weapon_id)?.current_ammo = weapon.mag_size;
        let text = format!("Reloading {}... [{} mags left]", weapon.name, magazines_left);
        self.tell(actor, Severity::System, &text);
        Ok(AttackStart::Reloaded { magazines_left })
    }

    /// `reload` command: belt and pockets first, then the ground; never the
    /// backpack
    pub fn reload(&mut self, actor: EntityId) -> Result<u32> {
        let result = self.try_reload(actor);
        self.surface(actor, result)
    }

    fn try_reload(&mut self, actor: EntityId) -> Result<u32> {
        self.ensure_ready(actor)?;

        let inventory = self.world.get::<Inventory>(actor);
        let weapon_id = inventory
            .and_then(|inv| inv.right_hand)
            .ok_or_else(|| CombatError::rejected("You need to be holding a weapon to reload it."))?;
        let weapon = self
            .world
            .get::<Weapon>(weapon_id)
            .cloned()
            .ok_or_else(|| CombatError::rejected("That's not a weapon."))?;
        if !weapon.is_ranged() {
            return Err(CombatError::rejected("You can't reload a melee weapon."));
        }

        let ammo_type = weapon.ammo_type.clone().unwrap_or_default();
        let (magazine, source) = self.find_magazine(actor, &ammo_type, true).ok_or_else(|| {
            CombatError::rejected(format!(
                "You don't have any {} magazine handy (check your belt, pockets, or the ground).",
                ammo_type
            ))
        })?;

        let level = self
            .world
            .get::<Stats>(actor)
            .and_then(|s| s.skill(reload_skill(&weapon.category)))
            .map_or(0, |s| s.level);
        let roundtime = reload_roundtime(level);

        self.consume_magazine(magazine, source);
        let old = weapon.current_ammo;
        self.world.require_mut::<Weapon>(weapon_id)?.current_ammo = weapon.mag_size;

        let text = format!(
            "You reload your {}. ({} -> {}) [Time: {}s]",
            weapon.name, old, weapon.mag_size, roundtime
        );
        self.tell(actor, Severity::Success, &text);
        self.apply_roundtime(actor, roundtime);
        Ok(weapon.mag_size)
    }

    /// `ammo` command
    pub fn check_ammo(&mut self, actor: EntityId) -> Option<(u32, u32)> {
        let Some((_, weapon)) = self.held_weapon(actor) else {
            self.tell(actor, Severity::Info, "You aren't holding a weapon.");
            return None;
        };
        if !weapon.is_ranged() {
            self.tell(actor, Severity::Info, "It's a melee weapon. It doesn't use ammo.");
            return None;
        }
        let text = format!(
            "Your {} has {}/{} rounds remaining.",
            weapon.name, weapon.current_ammo, weapon.mag_size
        );
        self.tell(actor, Severity::Info, &text);
        Some((weapon.current_ammo, weapon.mag_size))
    }

    /// `parry` outside the buffer: +20 parry and an open parry window
    pub fn parry(&mut self, actor: EntityId) -> Result<()> {
        let result = self.try_parry(actor);
        self.surface(actor, result)
    }

    fn try_parry(&mut self, actor: EntityId) -> Result<()> {
        self.ensure_ready(actor)?;
        self.world.require::<CombatStats>(actor)?;

        let has_hand = self
            .world
            .get::<Inventory>(actor)
            .is_some_and(|inv| inv.right_hand.is_some());
        if !has_hand {
            return Err(CombatError::rejected("You need a weapon to parry!"));
        }
        match self.held_weapon(actor) {
            Some((_, weapon)) if weapon.can_parry() => {}
            _ => return Err(CombatError::rejected("You can't parry with that!")),
        }

        let combat = self.world.require_mut::<CombatStats>(actor)?;
        combat.allocation.raise_parry(20);
        combat.is_parrying = true;
        self.tell(actor, Severity::Combat, "You assume a defensive parrying stance!");
        self.apply_roundtime(actor, 2.0);
        Ok(())
    }

    /// Right-hand item and its weapon data
    pub(crate) fn held_weapon(&self, actor: EntityId) -> Option<(EntityId, Weapon)> {
        let id = self.world.get::<Inventory>(actor)?.right_hand?;
        self.world.get::<Weapon>(id).map(|w| (id, w.clone()))
    }

    fn find_magazine(
        &self,
        actor: EntityId,
        ammo_type: &str,
        skip_back: bool,
    ) -> Option<(EntityId, MagazineSource)> {
        let usable = |id: EntityId| {
            self.world.get::<Magazine>(id).is_some_and(|m| m.fits(ammo_type))
                && self.world.get::<Item>(id).is_some_and(|i| i.quantity > 0)
        };

        if let Some(inventory) = self.world.get::<Inventory>(actor) {
            for (slot, worn) in &inventory.equipment {
                if skip_back && slot == BACK_SLOT {
                    continue;
                }
                let Some(container) = self.world.get::<Container>(*worn) else {
                    continue;
                };
                if let Some(found) = container.items.iter().copied().find(|i| usable(*i)) {
                    return Some((found, MagazineSource::Container(*worn)));
                }
            }
        }

        let pos = self.world.position(actor)?;
        self.world
            .entities_at(pos)
            .into_iter()
            .find(|id| usable(*id))
            .map(|id| (id, MagazineSource::Ground))
    }

    /// Take one magazine off the stack; returns how many are left
    fn consume_magazine(&mut self, magazine: EntityId, source: MagazineSource) -> u32 {
        let left = match self.world.get_mut::<Item>(magazine) {
            Some(item) => {
                item.quantity = item.quantity.saturating_sub(1);
                item.quantity
            }
            None => 0,
        };
        if left == 0 {
            if let MagazineSource::Container(container) = source {
                if let Some(c) = self.world.get_mut::<Container>(container) {
                    c.take(magazine);
                }
            }
            self.despawn(magazine);
        }
        left
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::CombatConfig;
    use crate::core::types::Position;
    use crate::entity::stats::Attribute;

    const HERE: Position = Position { x: 0, y: 0 };

    fn engine() -> CombatEngine {
        CombatEngine::new(CombatConfig::default()).unwrap()
    }

    fn fighter(engine: &mut CombatEngine, weapon: Option<Weapon>) -> EntityId {
        let inventory = match weapon {
            Some(w) => {
                let id = engine.world.spawn_with([w.into()]);
                Inventory::holding(id)
            }
            None => Inventory::new(),
        };
        engine.world.spawn_with([
            HERE.into(),
            CombatStats::default().into(),
            Stats::new().into(),
            inventory.into(),
        ])
    }

    fn ganger(engine: &mut CombatEngine, tier: EngagementTier) -> EntityId {
        engine.world.spawn_with([
            HERE.into(),
            Npc::new("ganger").into(),
            CombatStats::default().at_tier(tier).into(),
        ])
    }

    #[test]
    fn test_reload_skill_by_category() {
        assert_eq!(reload_skill("heavy pistol"), SkillKind::MarksmanshipHeavy);
        assert_eq!(reload_skill("assault rifle"), SkillKind::MarksmanshipMedium);
        assert_eq!(reload_skill("smg"), SkillKind::MarksmanshipLight);
        assert_eq!(reload_roundtime(0), 5.0);
        assert_eq!(reload_roundtime(4), 3.0);
        assert_eq!(reload_roundtime(20), 1.0);
    }

    #[test]
    fn test_successful_initiation_commits() {
        let mut engine = engine();
        let actor = fighter(&mut engine, Some(Weapon::melee("Monoblade", "blade", 10.0)));
        let target = ganger(&mut engine, EngagementTier::Melee);

        let start = engine.initiate_attack(actor, None, None).unwrap();
        let AttackStart::Challenged(challenge) = start else {
            panic!("expected a challenge");
        };
        assert_eq!(challenge.target, target);
        assert_eq!(challenge.bar_length, 20);
        assert_eq!(engine.timing().last_for(actor), Some(&challenge));

        let own = engine.world.get::<CombatStats>(actor).unwrap();
        assert_eq!(own.fatigue, 98.0);
        assert_eq!(own.engagement_tier, EngagementTier::Melee);
        assert!(engine.world.get::<CombatStats>(target).unwrap().is_hostile);
        assert_eq!(engine.roundtime_remaining(actor), 3.0);
        assert!(engine.narrator().saw(actor, "You engage the ganger at MELEE range."));
    }

    #[test]
    fn test_out_of_range_rejected_without_mutation() {
        let mut engine = engine();
        let fists_only = Weapon::melee("Knuckles", "blunt", 4.0)
            .with_tiers(EngagementTier::CloseQuarters, EngagementTier::CloseQuarters);
        let actor = fighter(&mut engine, Some(fists_only));
        let target = ganger(&mut engine, EngagementTier::Disengaged);

        let err = engine.initiate_attack(actor, Some("ganger"), None).unwrap_err();
        assert!(err.is_validation());
        assert!(engine
            .narrator()
            .saw(actor, "is not effective at DISENGAGED range! You need to advance."));
        assert_eq!(engine.roundtime_remaining(actor), 0.0);
        assert_eq!(engine.world.get::<CombatStats>(actor).unwrap().fatigue, 100.0);
        assert!(!engine.world.get::<CombatStats>(target).unwrap().is_hostile);
        assert!(engine.timing().is_empty());
    }

    #[test]
    fn test_roundtime_checked_first() {
        let mut engine = engine();
        let actor = fighter(&mut engine, None);
        engine.apply_roundtime(actor, 2.5);
        let err = engine.initiate_attack(actor, Some("nobody"), None).unwrap_err();
        assert!(matches!(err, CombatError::InRoundtime(3)));
    }

    #[test]
    fn test_exhausted_attacker_rejected() {
        let mut engine = engine();
        let actor = fighter(&mut engine, Some(Weapon::melee("Pipe", "blunt", 6.0)));
        ganger(&mut engine, EngagementTier::Melee);
        engine.world.get_mut::<CombatStats>(actor).unwrap().fatigue = 1.0;
        assert!(engine.initiate_attack(actor, None, None).is_err());
        assert!(engine.narrator().saw(actor, "too exhausted to attack"));
    }

    #[test]
    fn test_brawl_requires_empty_hands() {
        let mut engine = engine();
        let actor = fighter(&mut engine, Some(Weapon::melee("Pipe", "blunt", 6.0)));
        ganger(&mut engine, EngagementTier::CloseQuarters);
        assert!(engine
            .initiate_attack(actor, None, Some(AttackMove::Jab))
            .is_err());
        assert!(engine.narrator().saw(actor, "can't brawl while holding a weapon"));
    }

    #[test]
    fn test_unarmed_jab_uses_brawling_profile() {
        let mut engine = engine();
        let actor = fighter(&mut engine, None);
        ganger(&mut engine, EngagementTier::CloseQuarters);
        let start = engine
            .initiate_attack(actor, None, Some(AttackMove::Jab))
            .unwrap();
        assert!(matches!(start, AttackStart::Challenged(ref c) if c.weapon_name == "Fists (Jab)"));
        assert_eq!(engine.roundtime_remaining(actor), 2.0);
        assert_eq!(
            engine
                .world
                .get::<CombatStats>(actor)
                .unwrap()
                .pending_attack
                .map(|p| p.attack_move),
            Some(Some(AttackMove::Jab))
        );
    }

    #[test]
    fn test_slash_needs_edge() {
        let mut engine = engine();
        let actor = fighter(&mut engine, Some(Weapon::melee("Pipe", "blunt", 6.0)));
        ganger(&mut engine, EngagementTier::Melee);
        assert!(engine
            .initiate_attack(actor, None, Some(AttackMove::Slash))
            .is_err());
        assert!(engine.narrator().saw(actor, "You can't slash with a Pipe."));
    }

    #[test]
    fn test_slice_is_fast() {
        let mut engine = engine();
        let actor = fighter(&mut engine, Some(Weapon::melee("Katana", "katana", 12.0)));
        ganger(&mut engine, EngagementTier::Melee);
        engine
            .initiate_attack(actor, None, Some(AttackMove::Slice))
            .unwrap();
        assert_eq!(engine.roundtime_remaining(actor), 2.0);
    }

    #[test]
    fn test_sitting_attacker_rejected() {
        let mut engine = engine();
        let actor = fighter(&mut engine, Some(Weapon::melee("Pipe", "blunt", 6.0)));
        ganger(&mut engine, EngagementTier::Melee);
        engine.world.insert(actor, Posture::Sitting);
        assert!(engine.initiate_attack(actor, None, None).is_err());
        assert!(engine.narrator().saw(actor, "You can't attack while sitting!"));
    }

    #[test]
    fn test_malformed_weapon_logged_not_narrated() {
        let mut engine = engine();
        let actor = fighter(&mut engine, Some(Weapon::melee("Broken", "blade", -3.0)));
        ganger(&mut engine, EngagementTier::Melee);
        let err = engine.initiate_attack(actor, None, None).unwrap_err();
        assert!(matches!(err, CombatError::MalformedWeapon(_)));
        assert_eq!(engine.narrator().for_entity(actor).count(), 0);
        assert_eq!(engine.world.get::<CombatStats>(actor).unwrap().fatigue, 100.0);
    }

    #[test]
    fn test_empty_gun_auto_reloads_from_belt() {
        let mut engine = engine();
        let mut pistol = Weapon::ranged("Ares Predator", "heavy pistol", 14.0, 20, "9mm", 12);
        pistol.current_ammo = 0;
        let actor = fighter(&mut engine, Some(pistol));
        ganger(&mut engine, EngagementTier::Missile);

        let mags = engine
            .world
            .spawn_with([Item::stack("9mm magazine", 2).into(), Magazine::new("9mm").into()]);
        let belt = engine.world.spawn_with([Container::with_items(vec![mags]).into()]);
        engine
            .world
            .get_mut::<Inventory>(actor)
            .unwrap()
            .equip("belt", belt);

        let start = engine.initiate_attack(actor, None, None).unwrap();
        assert_eq!(start, AttackStart::Reloaded { magazines_left: 1 });
        assert_eq!(engine.check_ammo(actor), Some((12, 12)));
        assert!(engine.timing().is_empty());
        assert!(engine.narrator().saw(actor, "Reloading Ares Predator... [1 mags left]"));
    }

    #[test]
    fn test_empty_gun_without_magazines() {
        let mut engine = engine();
        let mut pistol = Weapon::ranged("Pistol", "pistol", 8.0, 10, "9mm", 6);
        pistol.current_ammo = 0;
        let actor = fighter(&mut engine, Some(pistol));
        ganger(&mut engine, EngagementTier::Missile);
        assert!(engine.initiate_attack(actor, None, None).is_err());
        assert!(engine.narrator().saw(actor, "out of ammo and you have no magazines"));
    }

    #[test]
    fn test_manual_reload_skips_backpack_and_scales_roundtime() {
        let mut engine = engine();
        let mut pistol = Weapon::ranged("Pistol", "pistol", 8.0, 10, "9mm", 6);
        pistol.current_ammo = 1;
        let actor = fighter(&mut engine, Some(pistol));
        engine.world.insert(
            actor,
            Stats::new().with_skill(SkillKind::MarksmanshipLight, 4, 10),
        );

        let stashed = engine
            .world
            .spawn_with([Item::new("9mm magazine").into(), Magazine::new("9mm").into()]);
        let pack = engine.world.spawn_with([Container::with_items(vec![stashed]).into()]);
        engine
            .world
            .get_mut::<Inventory>(actor)
            .unwrap()
            .equip(BACK_SLOT, pack);

        assert!(engine.reload(actor).is_err());
        assert!(engine.narrator().saw(actor, "You don't have any 9mm magazine handy"));

        let ground = engine.world.spawn_with([
            HERE.into(),
            Item::new("9mm magazine").into(),
            Magazine::new("9mm").into(),
        ]);
        assert_eq!(engine.reload(actor).unwrap(), 6);
        assert!(!engine.world.contains(ground));
        assert_eq!(engine.roundtime_remaining(actor), 3.0);
        assert!(engine.narrator().saw(actor, "(1 -> 6) [Time: 3s]"));
    }

    #[test]
    fn test_check_ammo_messages() {
        let mut engine = engine();
        let unarmed = fighter(&mut engine, None);
        assert_eq!(engine.check_ammo(unarmed), None);
        assert!(engine.narrator().saw(unarmed, "You aren't holding a weapon."));

        let swordsman = fighter(&mut engine, Some(Weapon::melee("Sword", "sword", 9.0)));
        assert_eq!(engine.check_ammo(swordsman), None);
        assert!(engine.narrator().saw(swordsman, "doesn't use ammo"));
    }

    #[test]
    fn test_immediate_parry() {
        let mut engine = engine();
        let actor = fighter(&mut engine, Some(Weapon::melee("Sword", "sword", 9.0)));
        engine.parry(actor).unwrap();
        let combat = engine.world.get::<CombatStats>(actor).unwrap();
        assert!(combat.is_parrying);
        assert_eq!(combat.allocation.parry, 53);
        assert!(combat.allocation.total() <= 100);
        assert_eq!(engine.roundtime_remaining(actor), 2.0);

        let gunner = fighter(
            &mut engine,
            Some(Weapon::ranged("Pistol", "pistol", 8.0, 10, "9mm", 6)),
        );
        assert!(engine.parry(gunner).is_err());
        assert!(engine.narrator().saw(gunner, "You can't parry with that!"));
    }

    #[test]
    fn test_iaijutsu_needs_momentum_and_katana() {
        let mut engine = engine();
        let actor = fighter(&mut engine, Some(Weapon::melee("Katana", "katana", 12.0)));
        ganger(&mut engine, EngagementTier::Melee);

        assert!(engine.iaijutsu(actor, None).is_err());
        assert!(engine.narrator().saw(actor, "You lack the Momentum for Iaijutsu! (Requires 30+)"));

        engine.world.insert(actor, Momentum { current: 45 });
        let start = engine.iaijutsu(actor, None).unwrap();
        assert!(matches!(start, AttackStart::Challenged(_)));
        assert_eq!(engine.world.get::<Momentum>(actor).unwrap().current, 0);
        assert_eq!(
            engine
                .world
                .get::<CombatStats>(actor)
                .unwrap()
                .pending_attack
                .map(|p| p.attack_move),
            Some(Some(AttackMove::Iaijutsu))
        );

        let brawler = fighter(&mut engine, Some(Weapon::melee("Pipe", "blunt", 6.0)));
        engine.world.insert(brawler, Momentum { current: 90 });
        assert!(engine.iaijutsu(brawler, None).is_err());
        assert!(engine.narrator().saw(brawler, "requires a samurai sword"));
    }

    #[test]
    fn test_turing_shutdown_consumes_action() {
        let config = CombatConfig {
            shutdown_chance: 1.0,
            ..CombatConfig::default()
        };
        let mut engine = CombatEngine::new(config).unwrap();
        let player = fighter(&mut engine, None);
        let cop = engine.world.spawn_with([
            HERE.into(),
            Npc::tagged("turing agent", NpcTag::Turing).into(),
            CombatStats::default().into(),
            Stats::new().with_attribute(Attribute::Agility, 12).into(),
        ]);

        let start = engine.initiate_attack(cop, None, None).unwrap();
        assert_eq!(start, AttackStart::Shutdown { victim: player });
        assert_eq!(engine.roundtime_remaining(player), 10.0);
        assert!(engine.narrator().saw(player, "COMMAND_SHUTDOWN"));
        assert!(engine.narrator().saw(player, "MOTOR FUNCTIONS SUSPENDED"));
        assert_eq!(engine.world.get::<CombatStats>(cop).unwrap().fatigue, 98.0);
    }
}
