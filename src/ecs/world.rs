//! ECS World - manages all entities and their components

use ahash::AHashMap;

use crate::combat::state::CombatStats;
use crate::core::error::{CombatError, Result};
use crate::core::types::{EntityId, Position, Tick};
use crate::ecs::component::{AnyComponent, Component, ComponentKind};
use crate::entity::npc::Npc;

/// Components owned by one entity, keyed by capability
#[derive(Debug, Clone, Default)]
pub struct EntityRecord {
    components: AHashMap<ComponentKind, AnyComponent>,
}

impl EntityRecord {
    pub fn get<T: Component>(&self) -> Option<&T> {
        self.components.get(&T::KIND).and_then(T::from_any)
    }

    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components.get_mut(&T::KIND).and_then(T::from_any_mut)
    }

    pub fn has(&self, kind: ComponentKind) -> bool {
        self.components.contains_key(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.components.keys().copied()
    }
}

/// The game world containing all entities
///
/// Spawn order is remembered so that "first"/"second" targeting and
/// iteration are deterministic.
#[derive(Debug, Default)]
pub struct World {
    pub current_tick: Tick,
    records: AHashMap<EntityId, EntityRecord>,
    order: Vec<EntityId>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self) -> EntityId {
        let id = EntityId::new();
        self.records.insert(id, EntityRecord::default());
        self.order.push(id);
        id
    }

    pub fn spawn_with(&mut self, components: impl IntoIterator<Item = AnyComponent>) -> EntityId {
        let id = self.spawn();
        if let Some(record) = self.records.get_mut(&id) {
            for component in components {
                record.components.insert(component.kind(), component);
            }
        }
        id
    }

    /// Remove an entity and everything attached to it
    pub fn despawn(&mut self, id: EntityId) -> bool {
        if self.records.remove(&id).is_some() {
            self.order.retain(|e| *e != id);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn entity_count(&self) -> usize {
        self.records.len()
    }

    pub fn record(&self, id: EntityId) -> Option<&EntityRecord> {
        self.records.get(&id)
    }

    /// Attach (or replace) a component. Returns false if the entity is gone.
    pub fn insert<T: Component>(&mut self, id: EntityId, component: T) -> bool {
        match self.records.get_mut(&id) {
            Some(record) => {
                record.components.insert(T::KIND, component.into_any());
                true
            }
            None => false,
        }
    }

    pub fn remove<T: Component>(&mut self, id: EntityId) -> Option<T> {
        self.records
            .get_mut(&id)
            .and_then(|record| record.components.remove(&T::KIND))
            .and_then(T::unwrap_any)
    }

    pub fn get<T: Component>(&self, id: EntityId) -> Option<&T> {
        self.records.get(&id).and_then(|r| r.get::<T>())
    }

    pub fn get_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        self.records.get_mut(&id).and_then(|r| r.get_mut::<T>())
    }

    pub fn has<T: Component>(&self, id: EntityId) -> bool {
        self.records.get(&id).is_some_and(|r| r.has(T::KIND))
    }

    /// Like `get`, but distinguishes a missing entity from a missing component
    pub fn require<T: Component>(&self, id: EntityId) -> Result<&T> {
        let record = self.records.get(&id).ok_or(CombatError::EntityNotFound(id))?;
        record.get::<T>().ok_or(CombatError::ComponentMissing {
            entity: id,
            kind: T::KIND,
        })
    }

    pub fn require_mut<T: Component>(&mut self, id: EntityId) -> Result<&mut T> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or(CombatError::EntityNotFound(id))?;
        record.get_mut::<T>().ok_or(CombatError::ComponentMissing {
            entity: id,
            kind: T::KIND,
        })
    }

    /// All entities carrying a component, in spawn order
    pub fn entities_with<T: Component>(&self) -> Vec<EntityId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.has::<T>(*id))
            .collect()
    }

    pub fn position(&self, id: EntityId) -> Option<Position> {
        self.get::<Position>(id).copied()
    }

    /// Are both entities in the same room?
    pub fn co_located(&self, a: EntityId, b: EntityId) -> bool {
        match (self.position(a), self.position(b)) {
            (Some(pa), Some(pb)) => pa == pb,
            _ => false,
        }
    }

    /// Every entity at a position, in spawn order
    pub fn entities_at(&self, pos: Position) -> Vec<EntityId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.position(*id) == Some(pos))
            .collect()
    }

    /// NPCs at a position, in spawn order
    pub fn npcs_at(&self, pos: Position) -> Vec<EntityId> {
        self.entities_at(pos)
            .into_iter()
            .filter(|id| self.has::<Npc>(*id))
            .collect()
    }

    /// Non-NPC combatants at a position, minus the excluded ids
    pub fn observers_at(&self, pos: Position, exclude: &[EntityId]) -> Vec<EntityId> {
        self.entities_at(pos)
            .into_iter()
            .filter(|id| {
                self.has::<CombatStats>(*id) && !self.has::<Npc>(*id) && !exclude.contains(id)
            })
            .collect()
    }

    /// Display name used in narration: NPC type name, item name or id
    pub fn display_name(&self, id: EntityId) -> String {
        if let Some(npc) = self.get::<Npc>(id) {
            return npc.type_name.clone();
        }
        if let Some(item) = self.get::<crate::entity::inventory::Item>(id) {
            return item.name.clone();
        }
        if let Some(weapon) = self.get::<crate::combat::weapons::Weapon>(id) {
            return weapon.name.clone();
        }
        id.to_string()
    }

    pub fn tick(&mut self) {
        self.current_tick += 1;
    }
}
