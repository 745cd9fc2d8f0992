//! Opposed-roll range changes
//!
//! Closing or withdrawing moves both participants one tier from the
//! effective (closer) tier of the pair. Bounds are checked before anything
//! is spent; every rolled attempt costs fatigue and roundtime.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::state::CombatStats;
use crate::combat::targeting::{matching_npcs, parse_target_name};
use crate::combat::sync::TimingChannel;
use crate::combat::tier::EngagementTier;
use crate::core::error::{CombatError, Result};
use crate::core::types::EntityId;
use crate::engine::CombatEngine;
use crate::entity::posture::{Persona, Posture};
use crate::entity::stats::{Stats, DEFAULT_ATTRIBUTE};
use crate::messaging::{NarrationSink, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManeuverDirection {
    Close,
    Withdraw,
}

impl ManeuverDirection {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "close" | "advance" => Some(ManeuverDirection::Close),
            "withdraw" | "retreat" => Some(ManeuverDirection::Withdraw),
            _ => None,
        }
    }

    /// Next tier in this direction, None at the bound
    pub fn step(&self, from: EngagementTier) -> Option<EngagementTier> {
        match self {
            ManeuverDirection::Close => from.closer(),
            ManeuverDirection::Withdraw => from.farther(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManeuverOutcome {
    /// Both participants now sit at this tier
    Success(EngagementTier),
    /// Lost the opposed roll; costs were paid
    Failure,
    /// Already at the bound; nothing spent
    MaxRange,
    /// Cannot maneuver at all (posture, fatigue); nothing spent
    FailStop,
}

impl ManeuverOutcome {
    /// Should an automated maneuver stop after this result?
    pub fn is_terminal(&self) -> bool {
        matches!(self, ManeuverOutcome::MaxRange | ManeuverOutcome::FailStop)
    }
}

/// `max(0, (npcs - 1) * per_npc)`
pub fn crowd_penalty(npcs_in_room: usize, per_npc: f32) -> f32 {
    (npcs_in_room.saturating_sub(1) as f32 * per_npc).max(0.0)
}

impl<N: NarrationSink, T: TimingChannel> CombatEngine<N, T> {
    /// `close` / `withdraw` command
    pub fn maneuver(
        &mut self,
        actor: EntityId,
        direction: ManeuverDirection,
        target_name: Option<&str>,
    ) -> Result<ManeuverOutcome> {
        let result = self
            .ensure_ready(actor)
            .and_then(|_| self.find_opponent(actor, target_name))
            .and_then(|target| self.perform_maneuver(actor, target, direction));
        self.surface(actor, result)
    }

    /// Pick who a range change is against: a named NPC, else the one sharing
    /// the actor's tier, else the first NPC in the room
    pub(crate) fn find_opponent(&self, actor: EntityId, name: Option<&str>) -> Result<EntityId> {
        let pos = self.require_position(actor)?;
        let none = || CombatError::rejected("There is no one to maneuver against!");

        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            let parsed = parse_target_name(name);
            return matching_npcs(&self.world, actor, &parsed.name)
                .get(parsed.ordinal - 1)
                .copied()
                .ok_or_else(none);
        }

        let npcs = self.world.npcs_at(pos);
        let own_tier = self
            .world
            .get::<CombatStats>(actor)
            .map(|c| c.engagement_tier)
            .unwrap_or_default();
        let engaged = (own_tier != EngagementTier::Disengaged)
            .then(|| {
                npcs.iter().copied().find(|id| {
                    self.world
                        .get::<CombatStats>(*id)
                        .is_some_and(|c| c.engagement_tier == own_tier)
                })
            })
            .flatten();
        engaged.or_else(|| npcs.first().copied()).ok_or_else(none)
    }

    /// One maneuver attempt, without the roundtime gate
    ///
    /// Buffered dashes and automation call this directly.
    pub(crate) fn perform_maneuver(
        &mut self,
        actor: EntityId,
        target: EntityId,
        direction: ManeuverDirection,
    ) -> Result<ManeuverOutcome> {
        let own = self.world.require::<CombatStats>(actor)?;
        let (own_tier, fatigue) = (own.engagement_tier, own.fatigue);
        let theirs = self.world.require::<CombatStats>(target)?;
        let (their_tier, hang_back) = (theirs.engagement_tier, theirs.hang_back);

        let posture = self.world.get::<Posture>(actor).copied().unwrap_or_default();
        if !posture.permits_action(self.world.has::<Persona>(actor)) {
            self.tell(actor, Severity::Info, "You must be standing to maneuver!");
            return Ok(ManeuverOutcome::FailStop);
        }

        let cost = self.config.maneuver_fatigue_cost;
        if fatigue < cost {
            self.tell(actor, Severity::Info, "You are too exhausted to maneuver!");
            return Ok(ManeuverOutcome::FailStop);
        }

        let effective = EngagementTier::effective(own_tier, their_tier);
        let Some(next) = direction.step(effective) else {
            let text = match direction {
                ManeuverDirection::Close => "You are already as close as possible!",
                ManeuverDirection::Withdraw => "You cannot withdraw any further!",
            };
            self.tell(actor, Severity::Info, text);
            return Ok(ManeuverOutcome::MaxRange);
        };

        let pos = self.require_position(actor)?;
        self.world.require_mut::<CombatStats>(actor)?.spend_fatigue(cost);

        let agility = |id: EntityId| {
            self.world
                .get::<Stats>(id)
                .map_or(DEFAULT_ATTRIBUTE as f32, |s| s.agility())
        };
        let (own_agi, their_agi) = (agility(actor), agility(target));
        let penalty = crowd_penalty(self.world.npcs_at(pos).len(), self.config.crowd_penalty);

        let own_roll = own_agi + self.rng.gen_range(0.0..100.0f32) - penalty;
        let their_roll = their_agi + self.rng.gen_range(0.0..100.0f32);
        tracing::debug!(
            actor = %actor,
            target = %target,
            ?direction,
            own_roll,
            their_roll,
            penalty,
            "maneuver roll"
        );

        let target_name = self.world.display_name(target);
        let actor_name = self.world.display_name(actor);
        if direction == ManeuverDirection::Close && hang_back {
            let text = format!("{} is hanging back, trying to keep distance!", target_name);
            self.tell(actor, Severity::Info, &text);
        }

        let roundtime = self.config.maneuver_roundtime;
        if own_roll <= their_roll {
            let text = match (direction, hang_back) {
                (ManeuverDirection::Close, true) => format!(
                    "{} successfully hangs back, preventing you from closing!",
                    target_name
                ),
                _ => format!("You try to maneuver, but {} keeps you at bay!", target_name),
            };
            self.tell(actor, Severity::Info, &text);
            self.apply_roundtime(actor, roundtime);
            return Ok(ManeuverOutcome::Failure);
        }

        // Two separate writes; a concurrent maneuver may overwrite either
        self.world.require_mut::<CombatStats>(actor)?.engagement_tier = next;
        if let Some(theirs) = self.world.get_mut::<CombatStats>(target) {
            theirs.engagement_tier = next;
        }

        let (own_text, their_text, observer_text) = match direction {
            ManeuverDirection::Close => (
                format!("You rush forward, weaving past {}'s guard! Engagement: {}", target_name, next),
                format!("{} rushes at you! Engagement: {}", actor_name, next),
                format!("A combatant rushes at {}! (Range: {})", target_name, next),
            ),
            ManeuverDirection::Withdraw => (
                format!("You scramble back, putting distance between you and {}. Engagement: {}", target_name, next),
                format!("{} retreats! Engagement: {}", actor_name, next),
                format!("A combatant falls back from {}. (Range: {})", target_name, next),
            ),
        };
        self.tell(actor, Severity::Info, &own_text);
        self.tell(target, Severity::Combat, &their_text);
        self.broadcast(pos, &[actor, target], Severity::Combat, &observer_text);
        self.apply_roundtime(actor, roundtime);

        Ok(ManeuverOutcome::Success(next))
    }
}
