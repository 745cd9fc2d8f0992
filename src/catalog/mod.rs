//! Read-only item catalog
//!
//! Item templates come from outside the combat core. The engine holds an
//! `Arc<dyn ItemCatalog>` and only ever reads from it.

use serde::{Deserialize, Serialize};

use crate::combat::armor::Armor;
use crate::combat::weapons::Weapon;
use crate::core::types::{EntityId, Position};
use crate::ecs::component::AnyComponent;
use crate::ecs::world::World;
use crate::entity::inventory::Item;

/// Template for spawning an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemBlueprint {
    pub name: String,
    pub weapon: Option<Weapon>,
    pub armor: Option<Armor>,
}

impl ItemBlueprint {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weapon: None,
            armor: None,
        }
    }

    pub fn weapon(weapon: Weapon) -> Self {
        Self {
            name: weapon.name.clone(),
            weapon: Some(weapon),
            armor: None,
        }
    }

    pub fn armor(name: impl Into<String>, armor: Armor) -> Self {
        Self {
            name: name.into(),
            weapon: None,
            armor: Some(armor),
        }
    }

    /// Spawn a fresh instance lying at `pos`
    pub fn spawn(&self, world: &mut World, pos: Position) -> EntityId {
        let mut components: Vec<AnyComponent> = vec![pos.into(), Item::new(self.name.clone()).into()];
        if let Some(weapon) = &self.weapon {
            components.push(weapon.clone().into());
        }
        if let Some(armor) = self.armor {
            components.push(armor.into());
        }
        world.spawn_with(components)
    }
}

pub trait ItemCatalog: Send + Sync {
    /// Every unique item the catalog can produce
    fn blueprints(&self) -> &[ItemBlueprint];

    fn find(&self, name: &str) -> Option<&ItemBlueprint> {
        self.blueprints()
            .iter()
            .find(|b| b.name.eq_ignore_ascii_case(name))
    }
}

/// Fixed list of blueprints
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    items: Vec<ItemBlueprint>,
}

impl StaticCatalog {
    pub fn new(items: Vec<ItemBlueprint>) -> Self {
        Self { items }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

impl ItemCatalog for StaticCatalog {
    fn blueprints(&self) -> &[ItemBlueprint] {
        &self.items
    }
}
