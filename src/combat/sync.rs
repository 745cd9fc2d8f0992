//! Timing challenge ("sync bar")
//!
//! Phase one of an attack hands the actor a challenge; whoever plays it
//! reports back a `SyncReport`. The engine never renders or scores the bar.

use serde::{Deserialize, Serialize};

use crate::combat::weapons::Weapon;
use crate::core::types::EntityId;

/// Cursor never slows below this fraction of the weapon's base speed
const MIN_SPEED_FRACTION: f32 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncChallenge {
    pub target: EntityId,
    pub target_name: String,
    pub weapon_name: String,
    /// Cursor speed multiplier
    pub speed: f32,
    /// Width of the critical zone in cells
    pub crit_zone_size: u32,
    /// Chance per step that the cursor jumps
    pub jitter: f32,
    pub bar_length: u32,
}

impl SyncChallenge {
    /// Skill slows the cursor (5% per level); agility widens the zone
    /// (one cell per 5 points above 10).
    pub fn for_weapon(
        weapon: &Weapon,
        skill_level: u32,
        agility: f32,
        bar_length: u32,
        target: EntityId,
        target_name: impl Into<String>,
    ) -> Self {
        let base = weapon.difficulty;
        let speed = (base.speed * (1.0 - skill_level as f32 * 0.05))
            .max(base.speed * MIN_SPEED_FRACTION);
        let zone = (base.zone_size + (agility - 10.0) / 5.0).floor().max(1.0);
        Self {
            target,
            target_name: target_name.into(),
            weapon_name: weapon.name.clone(),
            speed,
            crit_zone_size: (zone as u32).min(bar_length),
            jitter: base.jitter,
            bar_length,
        }
    }
}

/// Outbound channel for challenges
pub trait TimingChannel {
    fn send_challenge(&mut self, to: EntityId, challenge: &SyncChallenge);
}

/// Records every challenge sent; the default channel
#[derive(Debug, Clone, Default)]
pub struct ChallengeLog {
    pub sent: Vec<(EntityId, SyncChallenge)>,
}

impl ChallengeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_for(&self, to: EntityId) -> Option<&SyncChallenge> {
        self.sent
            .iter()
            .rev()
            .find(|(id, _)| *id == to)
            .map(|(_, c)| c)
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }
}

impl TimingChannel for ChallengeLog {
    fn send_challenge(&mut self, to: EntityId, challenge: &SyncChallenge) {
        self.sent.push((to, challenge.clone()));
    }
}
