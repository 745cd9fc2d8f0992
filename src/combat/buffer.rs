//! Action buffer component
//!
//! A short queue of pre-committed actions executed one at a time. Capacity
//! starts small and grows with flow earned from good defensive reads.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::{CombatError, Result};
use crate::core::types::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatActionType {
    Dash,
    Slash,
    Parry,
    Thrust,
    /// Only ever injected by a scramble
    Stumble,
}

impl CombatActionType {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "dash" => Some(CombatActionType::Dash),
            "slash" => Some(CombatActionType::Slash),
            "parry" => Some(CombatActionType::Parry),
            "thrust" => Some(CombatActionType::Thrust),
            _ => None,
        }
    }

    /// Pause after this action before the next one runs (seconds)
    pub fn step_delay(&self) -> f32 {
        match self {
            CombatActionType::Dash | CombatActionType::Parry => 1.0,
            CombatActionType::Thrust => 2.0,
            CombatActionType::Slash | CombatActionType::Stumble => 1.5,
        }
    }

    /// Does `self` perfectly answer an opponent who telegraphed `telegraph`?
    pub fn counters(&self, telegraph: CombatActionType) -> bool {
        matches!(
            (self, telegraph),
            (CombatActionType::Parry, CombatActionType::Slash)
                | (CombatActionType::Parry, CombatActionType::Thrust)
                | (CombatActionType::Dash, CombatActionType::Dash)
        )
    }
}

impl fmt::Display for CombatActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CombatActionType::Dash => "DASH",
            CombatActionType::Slash => "SLASH",
            CombatActionType::Parry => "PARRY",
            CombatActionType::Thrust => "THRUST",
            CombatActionType::Stumble => "STUMBLE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatAction {
    pub kind: CombatActionType,
    pub target: Option<EntityId>,
}

impl CombatAction {
    pub fn new(kind: CombatActionType) -> Self {
        Self { kind, target: None }
    }

    pub fn at(kind: CombatActionType, target: EntityId) -> Self {
        Self {
            kind,
            target: Some(target),
        }
    }
}

/// Negative effects injected by hostile code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Malware {
    /// Halts the buffer and stuns on the next step
    Reboot,
}

/// A matched combo and its damage multiplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combo {
    pub name: String,
    pub multiplier: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatBuffer {
    pub actions: VecDeque<CombatAction>,
    pub max_slots: usize,
    pub flow: u32,
    pub is_executing: bool,
    pub active_combo: Option<Combo>,
    pub malware: Vec<Malware>,
    /// Bumped whenever a run starts or is torn down; scheduled steps
    /// carrying an older value are stale
    pub generation: u64,
}

impl CombatBuffer {
    pub fn new(max_slots: usize) -> Self {
        Self {
            actions: VecDeque::new(),
            max_slots,
            flow: 0,
            is_executing: false,
            active_combo: None,
            malware: Vec::new(),
            generation: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.actions.len() >= self.max_slots
    }

    pub fn kinds(&self) -> Vec<CombatActionType> {
        self.actions.iter().map(|a| a.kind).collect()
    }

    /// Queue an action while idle and under capacity
    pub fn push(&mut self, action: CombatAction) -> Result<usize> {
        if self.is_executing {
            return Err(CombatError::rejected(
                "[BUFFER] Sequence already running. Wait for it to finish.",
            ));
        }
        if self.is_full() {
            return Err(CombatError::rejected(format!(
                "[BUFFER] Buffer full ({}/{} slots).",
                self.actions.len(),
                self.max_slots
            )));
        }
        self.actions.push_back(action);
        Ok(self.actions.len())
    }

    /// Mark the run as started; returns the generation its steps must carry
    pub fn begin(&mut self, combo: Option<Combo>) -> u64 {
        self.is_executing = true;
        self.active_combo = combo;
        self.generation += 1;
        self.generation
    }

    pub fn pop(&mut self) -> Option<CombatAction> {
        self.actions.pop_front()
    }

    /// End the run cleanly (queue exhausted)
    pub fn finish(&mut self) {
        self.is_executing = false;
        self.active_combo = None;
        self.generation += 1;
    }

    /// Drop the queue and stop the run
    pub fn clear(&mut self) {
        self.actions.clear();
        self.finish();
    }

    pub fn combo_multiplier(&self) -> f32 {
        self.active_combo.as_ref().map_or(1.0, |c| c.multiplier)
    }

    /// Add malware unless the same strain is already present
    pub fn inject(&mut self, malware: Malware) -> bool {
        if self.malware.contains(&malware) {
            return false;
        }
        self.malware.push(malware);
        true
    }

    /// Remove one strain; true if it was present
    pub fn consume_malware(&mut self, malware: Malware) -> bool {
        let before = self.malware.len();
        self.malware.retain(|m| *m != malware);
        self.malware.len() != before
    }

    /// Replace every queued action with a stumble
    pub fn scramble(&mut self) -> usize {
        for action in self.actions.iter_mut() {
            action.kind = CombatActionType::Stumble;
        }
        self.actions.len()
    }

    /// Earn a flow point; every `per_slot` points buy one slot up to `cap`.
    ///
    /// Returns the new capacity when a slot was gained.
    pub fn gain_flow(&mut self, per_slot: u32, cap: usize) -> Option<usize> {
        self.flow += 1;
        if self.flow < per_slot {
            return None;
        }
        self.flow = 0;
        let grown = (self.max_slots + 1).min(cap).max(self.max_slots);
        let gained = grown > self.max_slots;
        self.max_slots = grown;
        gained.then_some(grown)
    }
}
