//! Armor component
//!
//! Worn armor adds flat defense; bulky pieces carry a penalty that comes back
//! off defender power.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Armor {
    pub defense: f32,
    /// Agility/movement cost of wearing it
    pub penalty: f32,
}

impl Armor {
    pub fn new(defense: f32, penalty: f32) -> Self {
        Self { defense, penalty }
    }

    /// Net contribution to defender power
    pub fn net_defense(&self) -> f32 {
        self.defense - self.penalty.max(0.0)
    }
}
