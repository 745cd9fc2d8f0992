//! Sprawl Combat - combat resolution core for a tick-driven multiplayer world

pub mod catalog;
pub mod combat;
pub mod core;
pub mod ecs;
pub mod engine;
pub mod entity;
pub mod messaging;
pub mod simulation;

pub use crate::core::config::CombatConfig;
pub use crate::core::error::{CombatError, Result};
pub use crate::engine::CombatEngine;
