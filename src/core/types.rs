//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for entities
///
/// Entities never own each other; a stored `EntityId` is a weak reference that
/// must be looked up again (and may have vanished) every time it is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First block of the uuid is plenty for log lines
        let full = self.0.simple().to_string();
        write!(f, "{}", &full[..8])
    }
}

/// Game tick counter (simulation time unit)
pub type Tick = u64;

/// Simulation time in seconds since the engine started
pub type SimTime = f64;

/// Room coordinate. Entities sharing a position are co-located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ids_are_unique() {
        let a = EntityId::new();
        let b = EntityId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_entity_id_display_is_short() {
        let id = EntityId::new();
        assert_eq!(id.to_string().len(), 8);
    }

    #[test]
    fn test_position_equality() {
        assert_eq!(Position::new(1, 2), Position::new(1, 2));
        assert_ne!(Position::new(1, 2), Position::new(2, 1));
    }

    #[test]
    fn test_position_hash() {
        use std::collections::HashMap;
        let mut map: HashMap<Position, &str> = HashMap::new();
        map.insert(Position::new(3, 4), "alley");
        assert_eq!(map.get(&Position::new(3, 4)), Some(&"alley"));
    }
}
