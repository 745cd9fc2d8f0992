//! Physical posture
//!
//! Posture gates actions (only standing entities fight) and weakens defense.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Posture {
    #[default]
    Standing,
    Sitting,
    Lying,
    /// Body held in place while the mind is projected elsewhere
    Stasis,
}

impl Posture {
    /// Multiplier applied to defender power
    pub fn defense_factor(&self) -> f32 {
        match self {
            Posture::Sitting => 0.75,
            Posture::Lying => 0.5,
            Posture::Standing | Posture::Stasis => 1.0,
        }
    }

    /// Can an entity in this posture attack or maneuver?
    ///
    /// Stasis only counts when the entity is projected (a persona acting
    /// inside the net while its body stays put).
    pub fn permits_action(&self, projected: bool) -> bool {
        match self {
            Posture::Standing => true,
            Posture::Stasis => projected,
            Posture::Sitting | Posture::Lying => false,
        }
    }
}

impl fmt::Display for Posture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Posture::Standing => "standing",
            Posture::Sitting => "sitting",
            Posture::Lying => "lying down",
            Posture::Stasis => "in stasis",
        };
        f.write_str(name)
    }
}

/// Marker: this entity is a projected persona (cyberspace avatar)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Persona;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defense_factors() {
        assert_eq!(Posture::Standing.defense_factor(), 1.0);
        assert_eq!(Posture::Sitting.defense_factor(), 0.75);
        assert_eq!(Posture::Lying.defense_factor(), 0.5);
    }

    #[test]
    fn test_stasis_requires_projection() {
        assert!(!Posture::Stasis.permits_action(false));
        assert!(Posture::Stasis.permits_action(true));
        assert!(!Posture::Lying.permits_action(true));
    }
}
