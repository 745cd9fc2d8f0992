//! Action lockout timer
//!
//! An entity with remaining roundtime cannot start another action. Applying
//! a shorter lockout on top of a longer one never shortens it.

use serde::{Deserialize, Serialize};

use crate::core::error::{CombatError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Roundtime {
    /// Seconds left
    pub remaining: f32,
    /// Length of the lockout that set `remaining`
    pub total: f32,
}

impl Roundtime {
    pub fn new(seconds: f32) -> Self {
        let seconds = seconds.max(0.0);
        Self {
            remaining: seconds,
            total: seconds,
        }
    }

    /// Arm a lockout; keeps whichever of the two ends later
    pub fn apply(&mut self, seconds: f32) {
        if seconds > self.remaining {
            self.remaining = seconds;
            self.total = seconds;
        }
    }

    /// Count down, clamping at zero. Returns true when the lockout just ended.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.remaining <= 0.0 {
            return false;
        }
        self.remaining = (self.remaining - dt).max(0.0);
        self.remaining <= 0.0
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }

    /// Remaining time as shown to players (rounded up)
    pub fn remaining_whole_seconds(&self) -> u32 {
        self.remaining.max(0.0).ceil() as u32
    }

    /// First guard of every action handler
    pub fn ensure_ready(&self) -> Result<()> {
        if self.is_active() {
            return Err(CombatError::InRoundtime(self.remaining_whole_seconds()));
        }
        Ok(())
    }
}
