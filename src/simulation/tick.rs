//! Tick system - advances simulated time
//!
//! One tick, in order:
//! automation -> regeneration and roundtime -> clock -> scheduled events
//!
//! Everything runs on the caller's thread. Commands issued between ticks see
//! the state the previous tick left behind.

use std::time::Duration;

use crate::combat::buffer::CombatBuffer;
use crate::combat::roundtime::Roundtime;
use crate::combat::state::CombatStats;
use crate::combat::sync::TimingChannel;
use crate::core::types::EntityId;
use crate::engine::CombatEngine;
use crate::entity::stats::Stats;
use crate::messaging::NarrationSink;
use crate::simulation::regen::regenerate;
use crate::simulation::scheduler::ScheduledEvent;

/// Events generated during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    /// Fatigue bottomed out
    Exhausted(EntityId),
    /// Enough fatigue came back to lift exhaustion
    Recovered(EntityId),
    /// Roundtime ran out this tick
    Ready(EntityId),
    /// A buffered action ran
    BufferStep(EntityId),
    /// A scheduled step arrived for a run that no longer exists
    StaleStep(EntityId),
}

impl<N: NarrationSink, T: TimingChannel> CombatEngine<N, T> {
    /// Advance the simulation by `delta`
    pub fn tick(&mut self, delta: Duration) -> Vec<TickEvent> {
        let dt = delta.as_secs_f32();
        let mut events = Vec::new();

        self.process_automation();
        self.regenerate_all(dt, &mut events);

        self.clock += delta.as_secs_f64();
        self.world.tick();

        self.drain_scheduled(&mut events);
        events
    }

    fn regenerate_all(&mut self, dt: f32, events: &mut Vec<TickEvent>) {
        let default_stats = Stats::default();

        for id in self.world.entities_with::<CombatStats>() {
            let stats = self.world.get::<Stats>(id).cloned();
            let stats = stats.as_ref().unwrap_or(&default_stats);
            let Some(combat) = self.world.get_mut::<CombatStats>(id) else {
                continue;
            };
            let report = regenerate(combat, stats, dt, &self.config);
            if report.became_exhausted {
                tracing::debug!(entity = %id, "exhausted");
                events.push(TickEvent::Exhausted(id));
            }
            if report.recovered {
                events.push(TickEvent::Recovered(id));
            }
        }

        for id in self.world.entities_with::<Roundtime>() {
            if let Some(rt) = self.world.get_mut::<Roundtime>(id) {
                if rt.tick(dt) {
                    events.push(TickEvent::Ready(id));
                }
            }
        }
    }

    /// Run every event whose wake time has passed, earliest first
    fn drain_scheduled(&mut self, events: &mut Vec<TickEvent>) {
        while let Some((wake, event)) = self.scheduler.pop_due(self.clock) {
            match event {
                ScheduledEvent::BufferStep { entity, generation } => {
                    let live = self
                        .world
                        .get::<CombatBuffer>(entity)
                        .is_some_and(|b| b.is_executing && b.generation == generation);
                    if live {
                        self.buffer_step(entity, wake);
                        events.push(TickEvent::BufferStep(entity));
                    } else {
                        tracing::debug!(entity = %entity, generation, "stale buffer step");
                        events.push(TickEvent::StaleStep(entity));
                    }
                }
            }
        }
    }
}
