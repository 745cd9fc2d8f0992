//! Stance and situational commands
//!
//! Defensive allocation, aim bias, hang-back, flee, and the two read-only
//! reports (`assess` for the whole room, `appraise` for one opponent).

use ahash::AHashMap;

use crate::combat::body_zone::BodyPart;
use crate::combat::state::{CombatStats, DefenseAllocation, StancePreset};
use crate::combat::sync::TimingChannel;
use crate::combat::targeting::{matching_npcs, ordinal_word, parse_target_name};
use crate::combat::tier::EngagementTier;
use crate::combat::wounds::{describe_level, WoundTable};
use crate::core::error::{CombatError, Result};
use crate::core::types::EntityId;
use crate::engine::CombatEngine;
use crate::entity::npc::Npc;
use crate::entity::posture::Posture;
use crate::messaging::{NarrationSink, Severity};
use crate::simulation::automation::AutomatedAction;

/// Footing as an observer would describe it
pub fn balance_description(balance: f32) -> &'static str {
    match balance {
        b if b >= 0.9 => "solidly balanced",
        b if b >= 0.7 => "balanced",
        b if b >= 0.5 => "somewhat off balance",
        b if b >= 0.3 => "badly balanced",
        _ => "very badly balanced",
    }
}

fn appraise_balance(balance: f32) -> &'static str {
    match balance {
        b if b > 0.8 => "is perfectly balanced and ready for action.",
        b if b > 0.5 => "is slightly off-balance but steady.",
        b if b > 0.2 => "is struggling to maintain their footing.",
        _ => "is badly balanced and reeling!",
    }
}

fn preset_message(preset: StancePreset) -> &'static str {
    match preset {
        StancePreset::Evasion => "Stance set to full EVASION.",
        StancePreset::Parry => "Stance set to full PARRY.",
        StancePreset::Shield => "Stance set to full SHIELD.",
        StancePreset::Offensive => "Stance set to OFFENSIVE (Balanced Defense).",
        StancePreset::Neutral => "Stance set to NEUTRAL (Balanced Defense).",
        StancePreset::Defensive => "Stance set to DEFENSIVE (Balanced Defense).",
    }
}

impl<N: NarrationSink, T: TimingChannel> CombatEngine<N, T> {
    pub fn set_stance(&mut self, actor: EntityId, preset: StancePreset) -> Result<()> {
        let combat = self.world.require_mut::<CombatStats>(actor)?;
        combat.allocation = DefenseAllocation::preset(preset);
        self.tell(actor, Severity::Info, preset_message(preset));
        Ok(())
    }

    /// Explicit evasion/parry/shield split; aggression is left alone
    pub fn set_custom_stance(
        &mut self,
        actor: EntityId,
        evasion: u32,
        parry: u32,
        shield: u32,
    ) -> Result<()> {
        let result = self.try_custom_stance(actor, evasion, parry, shield);
        if let Err(err) = &result {
            if err.is_validation() {
                self.tell(actor, Severity::Error, &err.to_string());
                return result;
            }
        }
        self.surface(actor, result)
    }

    fn try_custom_stance(
        &mut self,
        actor: EntityId,
        evasion: u32,
        parry: u32,
        shield: u32,
    ) -> Result<()> {
        let combat = self.world.require_mut::<CombatStats>(actor)?;
        let allocation =
            DefenseAllocation::custom(evasion, parry, shield, combat.allocation.aggression)
                .ok_or_else(|| {
                    CombatError::rejected("Total defense allocation cannot exceed 100%.")
                })?;
        combat.allocation = allocation;
        let text = format!(
            "Custom Stance: Evasion {}%, Parry {}%, Shield {}%.",
            evasion, parry, shield
        );
        self.tell(actor, Severity::Info, &text);
        Ok(())
    }

    /// Current posture and allocation, as shown by a bare `stance`
    pub fn describe_stance(&mut self, actor: EntityId) -> Result<String> {
        let allocation = self.world.require::<CombatStats>(actor)?.allocation;
        let posture = self.world.get::<Posture>(actor).copied().unwrap_or_default();
        let report = format!(
            "[Current Stance]\nPhysical: {}\nEvasion: {}%\nParry: {}%\nShield: {}%\nAggression: {}%",
            posture,
            allocation.evasion,
            allocation.parry,
            allocation.shield,
            (allocation.aggression * 100.0).floor() as u32
        );
        self.tell(actor, Severity::Info, &report);
        Ok(report)
    }

    /// Bias crushing hits toward a body part
    pub fn set_target_limb(&mut self, actor: EntityId, part_name: &str) -> Result<BodyPart> {
        let result = self.try_target_limb(actor, part_name);
        self.surface(actor, result)
    }

    fn try_target_limb(&mut self, actor: EntityId, part_name: &str) -> Result<BodyPart> {
        let Some(part) = BodyPart::parse(part_name).filter(|p| BodyPart::physical().contains(p))
        else {
            let available: Vec<&str> = BodyPart::physical().iter().map(BodyPart::name).collect();
            return Err(CombatError::rejected(format!(
                "Unknown body part: {}. Available: {}",
                part_name,
                available.join(", ")
            )));
        };
        self.world.require_mut::<CombatStats>(actor)?.target_limb = Some(part);
        let text = format!("Targeting bias set to: {}", part);
        self.tell(actor, Severity::Info, &text);
        Ok(part)
    }

    /// Toggle hang-back; returns the new state
    pub fn toggle_hang_back(&mut self, actor: EntityId) -> Result<bool> {
        let combat = self.world.require_mut::<CombatStats>(actor)?;
        combat.hang_back = !combat.hang_back;
        let hanging = combat.hang_back;
        let text = if hanging {
            "You are now hanging back, waiting to counter any advance."
        } else {
            "You stop hanging back."
        };
        self.tell(actor, Severity::Info, text);
        Ok(hanging)
    }

    /// Break off from every opponent without leaving the room
    pub fn flee(&mut self, actor: EntityId) -> Result<()> {
        let result = self.try_flee(actor);
        self.surface(actor, result)
    }

    fn try_flee(&mut self, actor: EntityId) -> Result<()> {
        self.ensure_ready(actor)?;
        self.world.require::<CombatStats>(actor)?;
        self.tell(actor, Severity::Info, "You attempt to flee from combat!");

        if let Some(combat) = self.world.get_mut::<CombatStats>(actor) {
            combat.disengage();
        }
        self.world.remove::<AutomatedAction>(actor);
        tracing::debug!(actor = %actor, "fled combat");

        self.tell(actor, Severity::Info, "You disengage from combat!");
        self.apply_roundtime(actor, self.config.flee_roundtime);
        Ok(())
    }

    /// Room overview: who the actor is facing and who else is around
    pub fn assess(&mut self, actor: EntityId) -> Result<String> {
        let result = self.assessment(actor);
        let report = self.surface(actor, result)?;
        self.tell(actor, Severity::Info, &report);
        Ok(report)
    }

    fn assessment(&self, actor: EntityId) -> Result<String> {
        let pos = self.require_position(actor)?;
        let own_tier = self.world.require::<CombatStats>(actor)?.engagement_tier;

        let npcs = self.world.npcs_at(pos);
        let mut totals: AHashMap<String, usize> = AHashMap::new();
        for id in &npcs {
            *totals.entry(self.world.display_name(*id)).or_default() += 1;
        }

        // Ordinal labels only when a type name is shared
        let mut seen: AHashMap<String, usize> = AHashMap::new();
        let labelled: Vec<(EntityId, String)> = npcs
            .iter()
            .map(|id| {
                let name = self.world.display_name(*id);
                let count = seen.entry(name.clone()).or_default();
                *count += 1;
                let label = if totals.get(&name).copied().unwrap_or(0) > 1 {
                    format!("{} {}", ordinal_word(*count), name)
                } else {
                    name
                };
                (*id, label)
            })
            .collect();

        let engaged = (own_tier != EngagementTier::Disengaged)
            .then(|| {
                labelled.iter().find(|(id, _)| {
                    self.world
                        .get::<CombatStats>(*id)
                        .is_some_and(|c| c.engagement_tier == own_tier)
                })
            })
            .flatten();

        let mut report = String::from("You are ");
        match engaged {
            Some((_, label)) => {
                report.push_str(&format!("facing {} at {} range.\n", label, own_tier));
            }
            None => report.push_str("facing nothing in particular.\n"),
        }

        for (id, label) in &labelled {
            if engaged.is_some_and(|(e, _)| e == id) {
                continue;
            }
            let Some(theirs) = self.world.get::<CombatStats>(*id) else {
                continue;
            };
            let hostile = if theirs.is_hostile { " (attacking you)" } else { "" };
            let balance = balance_description(theirs.balance);
            if theirs.engagement_tier == EngagementTier::Disengaged {
                report.push_str(&format!("A {}{} ({}) is nearby.\n", label, hostile, balance));
            } else {
                report.push_str(&format!(
                    "A {}{} ({}) is flanking you at {} range.\n",
                    label, hostile, balance, theirs.engagement_tier
                ));
            }
        }
        Ok(report.trim_end().to_string())
    }

    /// Footing and wounds of one opponent in the room
    pub fn appraise(&mut self, actor: EntityId, target_name: &str) -> Result<String> {
        let result = self.appraisal(actor, target_name);
        let report = self.surface(actor, result)?;
        self.tell(actor, Severity::Info, &report);
        Ok(report)
    }

    fn appraisal(&self, actor: EntityId, target_name: &str) -> Result<String> {
        self.require_position(actor)?;
        let parsed = parse_target_name(target_name);
        let target = matching_npcs(&self.world, actor, &parsed.name)
            .get(parsed.ordinal.saturating_sub(1))
            .copied()
            .ok_or_else(|| {
                CombatError::rejected(format!("You don't see \"{}\" here.", target_name.trim()))
            })?;

        let name = self
            .world
            .get::<Npc>(target)
            .map_or_else(|| "that".to_string(), |npc| npc.type_name.clone());
        let combat = self.world.get::<CombatStats>(target).ok_or_else(|| {
            CombatError::rejected(format!("You cannot appraise the condition of {}.", name))
        })?;

        let mut report = format!("[Appraisal: {}]\n", name);
        report.push_str(&format!("The {} {}\n", name, appraise_balance(combat.balance)));

        let wounds: Vec<String> = self
            .world
            .get::<WoundTable>(target)
            .map(|table| {
                table
                    .injuries()
                    .map(|(part, level)| format!("{} {}", describe_level(level), part))
                    .collect()
            })
            .unwrap_or_default();
        if wounds.is_empty() {
            report.push_str(&format!("The {} appears to be uninjured.", name));
        } else {
            report.push_str(&format!("Wounds: {}.", wounds.join(", ")));
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::CombatConfig;
    use crate::core::types::Position;
    use crate::simulation::automation::AutomationKind;

    const HERE: Position = Position { x: 4, y: 4 };

    fn room() -> (CombatEngine, EntityId) {
        let mut engine = CombatEngine::new(CombatConfig::default()).unwrap();
        let actor = engine.world.spawn_with([
            HERE.into(),
            CombatStats::default().at_tier(EngagementTier::Melee).into(),
        ]);
        (engine, actor)
    }

    fn spawn_npc(engine: &mut CombatEngine, name: &str, combat: CombatStats) -> EntityId {
        engine
            .world
            .spawn_with([HERE.into(), Npc::new(name).into(), combat.into()])
    }

    #[test]
    fn test_balance_descriptions() {
        assert_eq!(balance_description(1.0), "solidly balanced");
        assert_eq!(balance_description(0.7), "balanced");
        assert_eq!(balance_description(0.55), "somewhat off balance");
        assert_eq!(balance_description(0.3), "badly balanced");
        assert_eq!(balance_description(0.1), "very badly balanced");
    }

    #[test]
    fn test_preset_stance() {
        let (mut engine, actor) = room();
        engine.set_stance(actor, StancePreset::Parry).unwrap();
        let allocation = engine.world.get::<CombatStats>(actor).unwrap().allocation;
        assert_eq!((allocation.evasion, allocation.parry, allocation.shield), (0, 100, 0));
        assert!(engine.narrator().saw(actor, "Stance set to full PARRY."));
    }

    #[test]
    fn test_custom_stance_over_budget_rejected() {
        let (mut engine, actor) = room();
        assert!(engine.set_custom_stance(actor, 60, 50, 0).is_err());
        assert_eq!(
            engine.world.get::<CombatStats>(actor).unwrap().allocation,
            DefenseAllocation::default()
        );
        let last = engine.narrator().last_for(actor).unwrap();
        assert_eq!(last.severity, Severity::Error);

        engine.set_custom_stance(actor, 50, 30, 20).unwrap();
        let allocation = engine.world.get::<CombatStats>(actor).unwrap().allocation;
        assert_eq!(allocation.total(), 100);
        assert_eq!(allocation.aggression, 0.5);
    }

    #[test]
    fn test_describe_stance() {
        let (mut engine, actor) = room();
        let report = engine.describe_stance(actor).unwrap();
        assert!(report.contains("Physical: standing"));
        assert!(report.contains("Shield: 34%"));
        assert!(report.contains("Aggression: 50%"));
    }

    #[test]
    fn test_target_limb() {
        let (mut engine, actor) = room();
        assert_eq!(engine.set_target_limb(actor, "Left Arm").unwrap(), BodyPart::LeftArm);
        assert!(engine.narrator().saw(actor, "Targeting bias set to: left arm"));

        assert!(engine.set_target_limb(actor, "tail").is_err());
        assert!(engine.narrator().saw(actor, "Unknown body part: tail."));
        assert_eq!(
            engine.world.get::<CombatStats>(actor).unwrap().target_limb,
            Some(BodyPart::LeftArm)
        );
    }

    #[test]
    fn test_hang_back_toggles() {
        let (mut engine, actor) = room();
        assert!(engine.toggle_hang_back(actor).unwrap());
        assert!(!engine.toggle_hang_back(actor).unwrap());
        assert!(engine.narrator().saw(actor, "You stop hanging back."));
    }

    #[test]
    fn test_flee_disengages_in_place() {
        let (mut engine, actor) = room();
        let ganger = spawn_npc(&mut engine, "ganger", CombatStats::default());
        engine.world.insert(
            actor,
            AutomatedAction {
                kind: AutomationKind::Advance,
                target: ganger,
            },
        );

        engine.flee(actor).unwrap();
        let combat = engine.world.get::<CombatStats>(actor).unwrap();
        assert_eq!(combat.engagement_tier, EngagementTier::Disengaged);
        assert_eq!(engine.world.position(actor), Some(HERE));
        assert!(!engine.world.has::<AutomatedAction>(actor));
        assert_eq!(engine.roundtime_remaining(actor), 10.0);
    }

    #[test]
    fn test_flee_in_roundtime_rejected() {
        let (mut engine, actor) = room();
        engine.apply_roundtime(actor, 2.0);
        assert!(engine.flee(actor).is_err());
        assert_eq!(
            engine.world.get::<CombatStats>(actor).unwrap().engagement_tier,
            EngagementTier::Melee
        );
    }

    #[test]
    fn test_assess_room() {
        let (mut engine, actor) = room();
        spawn_npc(
            &mut engine,
            "ganger",
            CombatStats::default().at_tier(EngagementTier::Melee),
        );
        spawn_npc(
            &mut engine,
            "ganger",
            CombatStats::default()
                .hostile()
                .at_tier(EngagementTier::Polearm)
                .with_balance(0.4),
        );
        spawn_npc(&mut engine, "drone", CombatStats::default());

        let report = engine.assess(actor).unwrap();
        assert!(report.contains("facing first ganger at MELEE range."));
        assert!(report.contains(
            "A second ganger (attacking you) (badly balanced) is flanking you at POLEARM range."
        ));
        assert!(report.contains("A drone (solidly balanced) is nearby."));
    }

    #[test]
    fn test_assess_disengaged() {
        let (mut engine, actor) = room();
        engine.world.get_mut::<CombatStats>(actor).unwrap().disengage();
        let report = engine.assess(actor).unwrap();
        assert!(report.starts_with("You are facing nothing in particular."));
    }

    #[test]
    fn test_appraise_wounds() {
        let (mut engine, actor) = room();
        let ganger = spawn_npc(&mut engine, "ganger", CombatStats::default().with_balance(0.4));
        let mut wounds = WoundTable::new();
        wounds.apply(BodyPart::Chest, 6);
        engine.world.insert(ganger, wounds);

        let report = engine.appraise(actor, "ganger").unwrap();
        assert!(report.contains("[Appraisal: ganger]"));
        assert!(report.contains("The ganger is struggling to maintain their footing."));
        assert!(report.contains("Wounds: ragged chest."));
    }

    #[test]
    fn test_appraise_missing_target() {
        let (mut engine, actor) = room();
        assert!(engine.appraise(actor, "dragon").is_err());
        assert!(engine.narrator().saw(actor, "You don't see \"dragon\" here."));
    }
}
