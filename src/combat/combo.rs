//! Buffered action runs and combos
//!
//! `start_buffer` runs the first queued action at once; every later step is a
//! `ScheduledEvent::BufferStep` carrying the run's generation, so clearing the
//! buffer or despawning its owner turns pending steps into no-ops.

use crate::combat::buffer::{CombatAction, CombatActionType, CombatBuffer, Combo, Malware};
use crate::combat::calculator::SyncReport;
use crate::combat::maneuver::ManeuverDirection;
use crate::combat::state::CombatStats;
use crate::combat::sync::TimingChannel;
use crate::combat::targeting::resolve_target;
use crate::core::error::{CombatError, Result};
use crate::core::types::{EntityId, SimTime};
use crate::engine::CombatEngine;
use crate::messaging::{NarrationSink, Severity};
use crate::simulation::scheduler::ScheduledEvent;

use CombatActionType::{Dash, Parry, Slash, Thrust};

/// Damage multipliers of buffered strikes before any combo
pub const SLASH_MULTIPLIER: f32 = 1.2;
pub const THRUST_MULTIPLIER: f32 = 1.5;

/// Parry allocation gained by a buffered parry
const BUFFERED_PARRY_BONUS: u32 = 20;
/// Footing lost to a stumble
const STUMBLE_BALANCE_LOSS: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComboPattern {
    pub name: &'static str,
    pub sequence: &'static [CombatActionType],
    pub multiplier: f32,
}

/// Known combos, highest priority first
pub const COMBOS: [ComboPattern; 3] = [
    ComboPattern {
        name: "CRITICAL EXECUTION",
        sequence: &[Dash, Dash, Slash],
        multiplier: 3.0,
    },
    ComboPattern {
        name: "RIPOSTE",
        sequence: &[Parry, Slash, Thrust],
        multiplier: 2.5,
    },
    ComboPattern {
        name: "TRIPLE STRIKE",
        sequence: &[Slash, Slash, Slash],
        multiplier: 2.0,
    },
];

/// The known combo the whole queue spells out, if any
pub fn detect_combo(kinds: &[CombatActionType]) -> Option<Combo> {
    COMBOS
        .iter()
        .find(|pattern| kinds == pattern.sequence)
        .map(|pattern| Combo {
            name: pattern.name.to_string(),
            multiplier: pattern.multiplier,
        })
}

impl<N: NarrationSink, T: TimingChannel> CombatEngine<N, T> {
    /// Add an action to the actor's buffer. Returns the new queue length.
    pub fn queue_action(
        &mut self,
        actor: EntityId,
        kind: CombatActionType,
        target_name: Option<&str>,
    ) -> Result<usize> {
        let result = self.try_queue(actor, kind, target_name);
        self.surface(actor, result)
    }

    fn try_queue(
        &mut self,
        actor: EntityId,
        kind: CombatActionType,
        target_name: Option<&str>,
    ) -> Result<usize> {
        if kind == CombatActionType::Stumble {
            return Err(CombatError::rejected("You can't queue that."));
        }
        self.world.require::<CombatStats>(actor)?;

        let target = match target_name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => Some(resolve_target(&self.world, actor, Some(name))?),
            None => None,
        };
        let action = CombatAction { kind, target };

        if !self.world.has::<CombatBuffer>(actor) {
            self.world
                .insert(actor, CombatBuffer::new(self.config.buffer_base_slots));
        }
        let buffer = self.world.require_mut::<CombatBuffer>(actor)?;
        let len = buffer.push(action)?;
        let text = format!("[BUFFER] Queued {} ({}/{}).", kind, len, buffer.max_slots);
        self.tell(actor, Severity::System, &text);
        Ok(len)
    }

    /// Start executing the queue; returns the combo the run carries, if any
    pub fn start_buffer(&mut self, actor: EntityId) -> Result<Option<Combo>> {
        let result = self.try_start(actor);
        self.surface(actor, result)
    }

    fn try_start(&mut self, actor: EntityId) -> Result<Option<Combo>> {
        self.ensure_ready(actor)?;
        let buffer = self
            .world
            .get_mut::<CombatBuffer>(actor)
            .filter(|b| !b.is_empty())
            .ok_or_else(|| CombatError::rejected("[BUFFER] Nothing queued."))?;
        if buffer.is_executing {
            return Err(CombatError::rejected(
                "[BUFFER] Sequence already running. Wait for it to finish.",
            ));
        }

        let combo = detect_combo(&buffer.kinds());
        let generation = buffer.begin(combo.clone());
        tracing::debug!(actor = %actor, generation, combo = ?combo, "buffer run started");

        self.tell(actor, Severity::System, "[BUFFER] Initiating sequence upload...");
        if let Some(combo) = &combo {
            let text = format!("[!! COMBO DETECTED: {} !!]", combo.name);
            self.tell(actor, Severity::Success, &text);
        }

        self.buffer_step(actor, self.clock);
        Ok(combo)
    }

    /// Drop the queue and stop any run in progress
    pub fn clear_buffer(&mut self, actor: EntityId) -> bool {
        let Some(buffer) = self.world.get_mut::<CombatBuffer>(actor) else {
            return false;
        };
        buffer.clear();
        if let Some(combat) = self.world.get_mut::<CombatStats>(actor) {
            combat.is_parrying = false;
        }
        self.tell(actor, Severity::System, "[BUFFER] Buffer cleared.");
        true
    }

    /// Run one step of the actor's buffer at simulated time `now`
    pub(crate) fn buffer_step(&mut self, actor: EntityId, now: SimTime) {
        let Some(buffer) = self.world.get_mut::<CombatBuffer>(actor) else {
            return;
        };
        if !buffer.is_executing {
            return;
        }

        if buffer.consume_malware(Malware::Reboot) {
            buffer.clear();
            self.close_parry_window(actor);
            self.tell(actor, Severity::Error, "[MALWARE] REBOOT INJECTED. SYSTEM HALTED.");
            self.apply_roundtime(actor, self.config.reboot_stun);
            tracing::info!(actor = %actor, "buffer halted by reboot");
            return;
        }

        let Some(action) = buffer.pop() else {
            buffer.finish();
            self.close_parry_window(actor);
            self.tell(actor, Severity::System, "[BUFFER] Sequence complete.");
            return;
        };
        let multiplier = buffer.combo_multiplier();
        let generation = buffer.generation;

        self.close_parry_window(actor);
        self.perform_buffered(actor, action, multiplier);

        let still_running = self
            .world
            .get::<CombatBuffer>(actor)
            .is_some_and(|b| b.is_executing && b.generation == generation);
        if still_running {
            let wake = now + f64::from(action.kind.step_delay());
            self.scheduler.schedule(
                wake,
                ScheduledEvent::BufferStep {
                    entity: actor,
                    generation,
                },
            );
        }
    }

    fn close_parry_window(&mut self, actor: EntityId) {
        if let Some(combat) = self.world.get_mut::<CombatStats>(actor) {
            combat.is_parrying = false;
        }
    }

    /// Explicit target if still here, then the locked target, then a hostile
    /// NPC, then any NPC
    fn buffered_target(&self, actor: EntityId, action: &CombatAction) -> Option<EntityId> {
        let here = |id: &EntityId| self.world.co_located(actor, *id);
        if let Some(target) = action.target.filter(here) {
            return Some(target);
        }
        if let Some(locked) = self
            .world
            .get::<CombatStats>(actor)
            .and_then(|c| c.target)
            .filter(here)
        {
            return Some(locked);
        }
        let pos = self.world.position(actor)?;
        let npcs = self.world.npcs_at(pos);
        npcs.iter()
            .copied()
            .find(|id| {
                self.world
                    .get::<CombatStats>(*id)
                    .is_some_and(|c| c.is_hostile)
            })
            .or_else(|| npcs.first().copied())
    }

    fn perform_buffered(&mut self, actor: EntityId, action: CombatAction, multiplier: f32) {
        let Some(target) = self.buffered_target(actor, &action) else {
            let text = format!("[BUFFER] {} failed: No target.", action.kind);
            self.tell(actor, Severity::Info, &text);
            return;
        };

        let telegraph = self
            .world
            .get::<CombatStats>(target)
            .and_then(|c| c.telegraph);
        if let Some(telegraph) = telegraph.filter(|t| action.kind.counters(*t)) {
            let text = format!("[PERFECT SYNC] You countered the {}!", telegraph);
            self.tell(actor, Severity::Success, &text);
            self.award_flow(actor);
            if let Some(theirs) = self.world.get_mut::<CombatStats>(target) {
                theirs.telegraph = None;
            }
        }

        match action.kind {
            CombatActionType::Dash => {
                let text = format!("[BUFFER] You DASH toward {}!", self.world.display_name(target));
                self.tell(actor, Severity::Combat, &text);
                let result = self.perform_maneuver(actor, target, ManeuverDirection::Close);
                let _ = self.surface(actor, result);
            }
            CombatActionType::Slash => {
                self.tell(actor, Severity::Combat, "[BUFFER] You execute a precise SLASH!");
                let result = self.resolve_with(
                    actor,
                    target,
                    SyncReport::Hit,
                    SLASH_MULTIPLIER * multiplier,
                    None,
                );
                let _ = self.surface(actor, result);
            }
            CombatActionType::Parry => {
                self.tell(actor, Severity::Combat, "[BUFFER] You enter a PARRY stance.");
                if let Some(combat) = self.world.get_mut::<CombatStats>(actor) {
                    combat.allocation.raise_parry(BUFFERED_PARRY_BONUS);
                    combat.is_parrying = true;
                }
            }
            CombatActionType::Thrust => {
                self.tell(actor, Severity::Combat, "[BUFFER] You deliver a powerful THRUST!");
                let result = self.resolve_with(
                    actor,
                    target,
                    SyncReport::Hit,
                    THRUST_MULTIPLIER * multiplier,
                    None,
                );
                let _ = self.surface(actor, result);
            }
            CombatActionType::Stumble => {
                self.tell(actor, Severity::Combat, "[BUFFER] You STUMBLE blindly!");
                if let Some(combat) = self.world.get_mut::<CombatStats>(actor) {
                    combat.adjust_balance(-STUMBLE_BALANCE_LOSS);
                }
            }
        }
    }

    /// One flow point for `id`; narrates any capacity gained
    pub(crate) fn award_flow(&mut self, id: EntityId) -> Option<usize> {
        let per_slot = self.config.flow_per_slot;
        let cap = self.config.buffer_max_slots;
        let grown = self
            .world
            .get_mut::<CombatBuffer>(id)
            .and_then(|b| b.gain_flow(per_slot, cap))?;
        let text = format!("[FLOW STATE] Buffer capacity increased to {}!", grown);
        self.tell(id, Severity::Success, &text);
        Some(grown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::combat::tier::EngagementTier;
    use crate::combat::weapons::Weapon;
    use crate::core::config::CombatConfig;
    use crate::core::types::Position;
    use crate::entity::inventory::Inventory;
    use crate::entity::npc::Npc;
    use crate::entity::stats::{Attribute, Stats};
    use crate::simulation::tick::TickEvent;

    const HERE: Position = Position { x: 1, y: 9 };

    fn setup() -> (CombatEngine, EntityId, EntityId) {
        let mut engine = CombatEngine::new(CombatConfig::default()).unwrap();
        let pipe = engine
            .world
            .spawn_with([Weapon::melee("Pipe", "blunt", 10.0).into()]);
        let actor = engine.world.spawn_with([
            HERE.into(),
            CombatStats::default().at_tier(EngagementTier::Melee).into(),
            Stats::new().into(),
            Inventory::holding(pipe).into(),
        ]);
        let target = engine.world.spawn_with([
            HERE.into(),
            Npc::new("ganger").into(),
            CombatStats::new(500, 10.0, 0.0)
                .at_tier(EngagementTier::Melee)
                .into(),
        ]);
        (engine, actor, target)
    }

    fn queue(engine: &mut CombatEngine, actor: EntityId, kinds: &[CombatActionType]) {
        for kind in kinds {
            engine.queue_action(actor, *kind, None).unwrap();
        }
    }

    #[test]
    fn test_detect_combo_matches_whole_queue() {
        assert_eq!(
            detect_combo(&[Slash, Slash, Slash]).map(|c| c.multiplier),
            Some(2.0)
        );
        assert_eq!(
            detect_combo(&[Dash, Dash, Slash]).map(|c| c.name),
            Some("CRITICAL EXECUTION".to_string())
        );
        assert_eq!(
            detect_combo(&[Parry, Slash, Thrust]).map(|c| c.name),
            Some("RIPOSTE".to_string())
        );
        assert_eq!(detect_combo(&[Slash, Slash, Thrust]), None);
        assert_eq!(detect_combo(&[Slash, Dash, Slash]), None);
        assert_eq!(detect_combo(&[]), None);
    }

    #[test]
    fn test_extra_actions_break_a_combo() {
        assert_eq!(detect_combo(&[Slash, Slash, Slash, Thrust]), None);
        assert_eq!(detect_combo(&[Thrust, Dash, Dash, Slash]), None);
        assert_eq!(detect_combo(&[Parry, Slash, Thrust, Slash]), None);
        assert_eq!(detect_combo(&[Slash, Slash]), None);
    }

    #[test]
    fn test_queue_respects_capacity() {
        let (mut engine, actor, _) = setup();
        queue(&mut engine, actor, &[Slash, Parry, Thrust]);
        assert!(engine.queue_action(actor, Dash, None).is_err());
        assert!(engine.narrator().saw(actor, "[BUFFER] Buffer full (3/3 slots)."));
        assert!(engine.narrator().saw(actor, "[BUFFER] Queued THRUST (3/3)."));
    }

    #[test]
    fn test_stumble_cannot_be_queued() {
        let (mut engine, actor, _) = setup();
        assert!(engine
            .queue_action(actor, CombatActionType::Stumble, None)
            .is_err());
        assert!(!engine.world.has::<CombatBuffer>(actor));
    }

    #[test]
    fn test_queue_unknown_target_rejected() {
        let (mut engine, actor, _) = setup();
        assert!(engine.queue_action(actor, Slash, Some("dragon")).is_err());
        assert!(engine.narrator().saw(actor, "You don't see \"dragon\" here."));
    }

    #[test]
    fn test_empty_buffer_cannot_start() {
        let (mut engine, actor, _) = setup();
        assert!(engine.start_buffer(actor).is_err());
        assert!(engine.narrator().saw(actor, "[BUFFER] Nothing queued."));
    }

    #[test]
    fn test_triple_strike_runs_to_completion() {
        let (mut engine, actor, target) = setup();
        queue(&mut engine, actor, &[Slash, Slash, Slash]);
        let combo = engine.start_buffer(actor).unwrap().unwrap();
        assert_eq!(combo.name, "TRIPLE STRIKE");
        assert!(engine.narrator().saw(actor, "[!! COMBO DETECTED: TRIPLE STRIKE !!]"));

        // Marginal hits: floor(10 * 0.5 * 1.2 * 2.0)
        assert_eq!(engine.world.get::<CombatStats>(target).unwrap().hp, 488);
        assert!(engine.queue_action(actor, Slash, None).is_err());

        engine.tick(Duration::from_millis(1500));
        engine.tick(Duration::from_millis(1500));
        assert_eq!(engine.world.get::<CombatStats>(target).unwrap().hp, 464);

        let events = engine.tick(Duration::from_millis(1500));
        assert!(events.contains(&TickEvent::BufferStep(actor)));
        let buffer = engine.world.get::<CombatBuffer>(actor).unwrap();
        assert!(!buffer.is_executing);
        assert!(buffer.active_combo.is_none());
        assert!(engine.narrator().saw(actor, "[BUFFER] Sequence complete."));
        assert!(engine.scheduler().is_empty());
    }

    #[test]
    fn test_plain_slash_without_combo() {
        let (mut engine, actor, target) = setup();
        queue(&mut engine, actor, &[Slash]);
        assert_eq!(engine.start_buffer(actor).unwrap(), None);
        assert_eq!(engine.world.get::<CombatStats>(target).unwrap().hp, 494);
    }

    #[test]
    fn test_parry_opens_window_until_next_step() {
        let (mut engine, actor, _) = setup();
        queue(&mut engine, actor, &[Parry, Slash]);
        engine.start_buffer(actor).unwrap();
        let combat = engine.world.get::<CombatStats>(actor).unwrap();
        assert!(combat.is_parrying);
        assert_eq!(combat.allocation.parry, 53);

        engine.tick(Duration::from_secs(1));
        assert!(!engine.world.get::<CombatStats>(actor).unwrap().is_parrying);
    }

    #[test]
    fn test_stumble_costs_balance() {
        let (mut engine, actor, _) = setup();
        queue(&mut engine, actor, &[Parry]);
        engine.world.get_mut::<CombatBuffer>(actor).unwrap().scramble();
        engine.start_buffer(actor).unwrap();
        let balance = engine.world.get::<CombatStats>(actor).unwrap().balance;
        assert!((balance - 0.8).abs() < 1e-6);
        assert!(engine.narrator().saw(actor, "[BUFFER] You STUMBLE blindly!"));
    }

    #[test]
    fn test_dash_closes_range() {
        let (mut engine, actor, target) = setup();
        engine
            .world
            .insert(actor, Stats::new().with_attribute(Attribute::Agility, 500));
        queue(&mut engine, actor, &[Dash]);
        engine.start_buffer(actor).unwrap();
        assert_eq!(
            engine.world.get::<CombatStats>(target).unwrap().engagement_tier,
            EngagementTier::CloseQuarters
        );
        assert!(engine.narrator().saw(actor, "[BUFFER] You DASH toward ganger!"));
    }

    #[test]
    fn test_reboot_halts_and_stuns() {
        let (mut engine, actor, target) = setup();
        queue(&mut engine, actor, &[Slash, Slash]);
        engine
            .world
            .get_mut::<CombatBuffer>(actor)
            .unwrap()
            .inject(Malware::Reboot);
        engine.start_buffer(actor).unwrap();

        let buffer = engine.world.get::<CombatBuffer>(actor).unwrap();
        assert!(buffer.is_empty());
        assert!(!buffer.is_executing);
        assert!(buffer.malware.is_empty());
        assert_eq!(engine.roundtime_remaining(actor), 5.0);
        assert_eq!(engine.world.get::<CombatStats>(target).unwrap().hp, 500);
        assert!(engine.narrator().saw(actor, "[MALWARE] REBOOT INJECTED. SYSTEM HALTED."));
        assert!(engine.scheduler().is_empty());
    }

    #[test]
    fn test_countering_telegraph_grows_capacity() {
        let (mut engine, actor, target) = setup();
        queue(&mut engine, actor, &[Parry]);
        engine.world.get_mut::<CombatBuffer>(actor).unwrap().flow = 2;
        engine.telegraph(target, Thrust).unwrap();

        engine.start_buffer(actor).unwrap();
        let buffer = engine.world.get::<CombatBuffer>(actor).unwrap();
        assert_eq!(buffer.max_slots, 4);
        assert_eq!(buffer.flow, 0);
        assert!(engine.world.get::<CombatStats>(target).unwrap().telegraph.is_none());
        assert!(engine.narrator().saw(actor, "[PERFECT SYNC] You countered the THRUST!"));
        assert!(engine.narrator().saw(actor, "[FLOW STATE] Buffer capacity increased to 4!"));
    }

    #[test]
    fn test_cleared_run_leaves_stale_step() {
        let (mut engine, actor, target) = setup();
        queue(&mut engine, actor, &[Slash, Slash]);
        engine.start_buffer(actor).unwrap();
        assert!(engine.clear_buffer(actor));

        let events = engine.tick(Duration::from_secs(2));
        assert_eq!(events, vec![TickEvent::StaleStep(actor)]);
        assert_eq!(engine.world.get::<CombatStats>(target).unwrap().hp, 494);
    }

    #[test]
    fn test_no_target_fails_step_but_run_continues() {
        let (mut engine, actor, target) = setup();
        queue(&mut engine, actor, &[Slash, Slash]);
        engine.despawn(target);
        engine.start_buffer(actor).unwrap();
        assert!(engine.narrator().saw(actor, "[BUFFER] SLASH failed: No target."));
        assert!(engine.world.get::<CombatBuffer>(actor).unwrap().is_executing);
    }
}
