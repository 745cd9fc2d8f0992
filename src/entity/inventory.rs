//! Held and carried equipment
//!
//! Items are entities of their own. Inventories and containers only hold ids.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::EntityId;

/// Slot name for the backpack; excluded from quick (manual) reloads
pub const BACK_SLOT: &str = "back";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub right_hand: Option<EntityId>,
    pub left_hand: Option<EntityId>,
    /// Worn equipment by slot name ("torso", "belt", "back", ...)
    pub equipment: BTreeMap<String, EntityId>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holding(weapon: EntityId) -> Self {
        Self {
            right_hand: Some(weapon),
            ..Self::default()
        }
    }

    pub fn equip(&mut self, slot: impl Into<String>, item: EntityId) {
        self.equipment.insert(slot.into(), item);
    }

    /// Everything held or worn, hands first
    pub fn carried(&self) -> Vec<EntityId> {
        self.right_hand
            .iter()
            .chain(self.left_hand.iter())
            .chain(self.equipment.values())
            .copied()
            .collect()
    }

    pub fn clear(&mut self) {
        self.right_hand = None;
        self.left_hand = None;
        self.equipment.clear();
    }
}

/// Generic item data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    /// Stack size (magazines come in stacks)
    pub quantity: u32,
}

impl Item {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: 1,
        }
    }

    pub fn stack(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }
}

/// A magazine fits any weapon sharing its ammo type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Magazine {
    pub ammo_type: String,
}

impl Magazine {
    pub fn new(ammo_type: impl Into<String>) -> Self {
        Self {
            ammo_type: ammo_type.into(),
        }
    }

    pub fn fits(&self, ammo_type: &str) -> bool {
        self.ammo_type.eq_ignore_ascii_case(ammo_type)
    }
}

/// Worn storage (belts, pockets, backpacks)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub items: Vec<EntityId>,
}

impl Container {
    pub fn with_items(items: Vec<EntityId>) -> Self {
        Self { items }
    }

    pub fn take(&mut self, item: EntityId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| *i != item);
        self.items.len() != before
    }
}
