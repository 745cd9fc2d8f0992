//! Combat engine
//!
//! Owns the world, the seeded RNG, the scheduler and the outbound
//! collaborators. Every command is a method on `CombatEngine`; the combat
//! modules each add their own `impl` block.

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::catalog::{ItemCatalog, StaticCatalog};
use crate::combat::buffer::CombatActionType;
use crate::combat::roundtime::Roundtime;
use crate::combat::state::CombatStats;
use crate::combat::sync::{ChallengeLog, TimingChannel};
use crate::core::config::CombatConfig;
use crate::core::error::{CombatError, Result};
use crate::core::types::{EntityId, Position, SimTime};
use crate::ecs::world::World;
use crate::messaging::{MessageLog, NarrationSink, Severity};
use crate::simulation::scheduler::Scheduler;

pub struct CombatEngine<N: NarrationSink = MessageLog, T: TimingChannel = ChallengeLog> {
    pub world: World,
    pub(crate) config: CombatConfig,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) narrator: N,
    pub(crate) timing: T,
    pub(crate) catalog: Arc<dyn ItemCatalog>,
    pub(crate) scheduler: Scheduler,
    pub(crate) clock: SimTime,
}

impl CombatEngine {
    /// Engine with in-memory narration, recorded challenges and no catalog
    pub fn new(config: CombatConfig) -> Result<Self> {
        Self::with_collaborators(
            config,
            MessageLog::new(),
            ChallengeLog::new(),
            Arc::new(StaticCatalog::empty()),
        )
    }
}

impl<N: NarrationSink, T: TimingChannel> CombatEngine<N, T> {
    pub fn with_collaborators(
        config: CombatConfig,
        narrator: N,
        timing: T,
        catalog: Arc<dyn ItemCatalog>,
    ) -> Result<Self> {
        config.validate()?;
        tracing::debug!(seed = config.seed, "combat engine created");
        Ok(Self {
            world: World::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            narrator,
            timing,
            catalog,
            scheduler: Scheduler::new(),
            clock: 0.0,
        })
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn narrator(&self) -> &N {
        &self.narrator
    }

    pub fn narrator_mut(&mut self) -> &mut N {
        &mut self.narrator
    }

    pub fn timing(&self) -> &T {
        &self.timing
    }

    pub fn catalog(&self) -> &dyn ItemCatalog {
        self.catalog.as_ref()
    }

    /// Seconds of simulated time since the engine started
    pub fn clock(&self) -> SimTime {
        self.clock
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Remove an entity along with any continuations it still has queued
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let purged = self.scheduler.cancel_entity(id);
        if purged > 0 {
            tracing::debug!(entity = %id, purged, "dropped scheduled events");
        }
        self.world.despawn(id)
    }

    /// Broadcast the next move this combatant intends to make
    pub fn telegraph(&mut self, actor: EntityId, kind: CombatActionType) -> Result<()> {
        let combat = self.world.require_mut::<CombatStats>(actor)?;
        combat.telegraph = Some(kind);
        Ok(())
    }

    /// Remaining roundtime, or 0 when the entity is free to act
    pub fn roundtime_remaining(&self, id: EntityId) -> f32 {
        self.world.get::<Roundtime>(id).map_or(0.0, |rt| rt.remaining)
    }

    pub(crate) fn tell(&mut self, to: EntityId, severity: Severity, text: &str) {
        self.narrator.send(to, severity, text);
    }

    /// Send to every observer at `pos` except the excluded ids
    pub(crate) fn broadcast(
        &mut self,
        pos: Position,
        exclude: &[EntityId],
        severity: Severity,
        text: &str,
    ) {
        for observer in self.world.observers_at(pos, exclude) {
            self.narrator.send(observer, severity, text);
        }
    }

    pub(crate) fn apply_roundtime(&mut self, id: EntityId, seconds: f32) {
        if let Some(rt) = self.world.get_mut::<Roundtime>(id) {
            rt.apply(seconds);
            return;
        }
        self.world.insert(id, Roundtime::new(seconds));
    }

    /// First guard of every command
    pub(crate) fn ensure_ready(&self, id: EntityId) -> Result<()> {
        match self.world.get::<Roundtime>(id) {
            Some(rt) => rt.ensure_ready(),
            None => Ok(()),
        }
    }

    /// Narrate validation failures to the actor and log everything else.
    /// The result is handed back unchanged.
    pub(crate) fn surface<R>(&mut self, actor: EntityId, result: Result<R>) -> Result<R> {
        if let Err(err) = &result {
            if err.is_validation() {
                let text = err.to_string();
                self.tell(actor, Severity::Info, &text);
            } else {
                tracing::warn!(actor = %actor, error = %err, "combat action aborted");
            }
        }
        result
    }

    pub(crate) fn require_position(&self, id: EntityId) -> Result<Position> {
        self.world
            .position(id)
            .ok_or_else(|| CombatError::rejected("You don't have a position."))
    }
}
