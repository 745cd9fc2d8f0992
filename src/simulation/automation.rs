//! Automated advance / retreat
//!
//! A directive re-arms every tick the entity is out of roundtime and removes
//! itself on any condition it cannot make progress through.

use serde::{Deserialize, Serialize};

use crate::combat::maneuver::{ManeuverDirection, ManeuverOutcome};
use crate::combat::roundtime::Roundtime;
use crate::combat::state::CombatStats;
use crate::combat::sync::TimingChannel;
use crate::combat::targeting::{matching_npcs, parse_target_name};
use crate::combat::tier::EngagementTier;
use crate::core::error::{CombatError, Result};
use crate::core::types::EntityId;
use crate::engine::CombatEngine;
use crate::messaging::{NarrationSink, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AutomationKind {
    Advance,
    Retreat,
}

impl AutomationKind {
    pub fn direction(&self) -> ManeuverDirection {
        match self {
            AutomationKind::Advance => ManeuverDirection::Close,
            AutomationKind::Retreat => ManeuverDirection::Withdraw,
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            AutomationKind::Advance => "advance",
            AutomationKind::Retreat => "retreat",
        }
    }
}

/// Directive component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomatedAction {
    pub kind: AutomationKind,
    pub target: EntityId,
}

impl<N: NarrationSink, T: TimingChannel> CombatEngine<N, T> {
    pub fn advance(&mut self, actor: EntityId, target_name: Option<&str>) -> Result<()> {
        self.begin_automation(actor, AutomationKind::Advance, target_name)
    }

    pub fn retreat(&mut self, actor: EntityId, target_name: Option<&str>) -> Result<()> {
        self.begin_automation(actor, AutomationKind::Retreat, target_name)
    }

    /// Cancel any automated maneuver
    pub fn stop(&mut self, actor: EntityId) -> bool {
        let stopped = self.world.remove::<AutomatedAction>(actor).is_some();
        let text = if stopped {
            "You stop your actions."
        } else {
            "You aren't doing anything automatically."
        };
        self.tell(actor, Severity::Info, text);
        stopped
    }

    fn begin_automation(
        &mut self,
        actor: EntityId,
        kind: AutomationKind,
        target_name: Option<&str>,
    ) -> Result<()> {
        let found = self.automation_target(actor, kind, target_name);
        let target = self.surface(actor, found)?;

        self.world.insert(actor, AutomatedAction { kind, target });
        let text = format!(
            "You begin to {} on {}...",
            kind.verb(),
            self.world.display_name(target)
        );
        self.tell(actor, Severity::Info, &text);

        let ready = self
            .world
            .get::<Roundtime>(actor)
            .map_or(true, |rt| !rt.is_active());
        if ready {
            self.step_automation(actor);
        }
        Ok(())
    }

    /// Named NPC, else the closest-engaged NPC in the room. Advancing prefers
    /// one already sharing the actor's tier.
    fn automation_target(
        &self,
        actor: EntityId,
        kind: AutomationKind,
        target_name: Option<&str>,
    ) -> Result<EntityId> {
        let pos = self.require_position(actor)?;
        let missing = || CombatError::rejected("You don't see them here.");

        if let Some(name) = target_name.map(str::trim).filter(|n| !n.is_empty()) {
            let parsed = parse_target_name(name);
            return matching_npcs(&self.world, actor, &parsed.name)
                .get(parsed.ordinal - 1)
                .copied()
                .ok_or_else(missing);
        }

        let tier_of = |id: EntityId| {
            self.world
                .get::<CombatStats>(id)
                .map(|c| c.engagement_tier)
                .unwrap_or_default()
        };
        let mut nearby = self.world.npcs_at(pos);
        nearby.sort_by_key(|id| std::cmp::Reverse(tier_of(*id)));

        let own_tier = tier_of(actor);
        let engaged = match kind {
            AutomationKind::Advance if own_tier != EngagementTier::Disengaged => {
                nearby.iter().copied().find(|id| tier_of(*id) == own_tier)
            }
            _ => None,
        };
        engaged.or_else(|| nearby.first().copied()).ok_or_else(missing)
    }

    /// Run every directive whose owner is out of roundtime
    pub(crate) fn process_automation(&mut self) {
        for actor in self.world.entities_with::<AutomatedAction>() {
            let busy = self
                .world
                .get::<Roundtime>(actor)
                .is_some_and(|rt| rt.is_active());
            if !busy {
                self.step_automation(actor);
            }
        }
    }

    fn step_automation(&mut self, actor: EntityId) {
        let Some(action) = self.world.get::<AutomatedAction>(actor).copied() else {
            return;
        };

        if !self.world.contains(action.target) {
            self.end_automation(actor, "Target lost. Stopping action.");
            return;
        }
        if !self.world.co_located(actor, action.target) {
            self.end_automation(actor, "Target is no longer here. Stopping action.");
            return;
        }

        let outcome = match self.perform_maneuver(actor, action.target, action.kind.direction()) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(actor = %actor, error = %err, "automated maneuver failed");
                self.world.remove::<AutomatedAction>(actor);
                return;
            }
        };

        match action.kind {
            AutomationKind::Advance => {
                let tier = self
                    .world
                    .get::<CombatStats>(actor)
                    .map(|c| c.engagement_tier)
                    .unwrap_or_default();
                if tier >= EngagementTier::Melee {
                    self.end_automation(actor, "You reach melee range and stop advancing.");
                } else if outcome.is_terminal() {
                    self.end_automation(actor, "You stop advancing.");
                }
            }
            AutomationKind::Retreat => {
                let at_bound = matches!(outcome, ManeuverOutcome::Success(t) if t.is_farthest());
                if outcome.is_terminal() || at_bound {
                    self.end_automation(actor, "You stop retreating.");
                }
            }
        }
    }

    fn end_automation(&mut self, actor: EntityId, text: &str) {
        self.world.remove::<AutomatedAction>(actor);
        self.tell(actor, Severity::Info, text);
    }
}
