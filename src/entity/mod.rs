pub mod inventory;
pub mod npc;
pub mod posture;
pub mod stats;

pub use inventory::{Container, Inventory, Item, Magazine};
pub use npc::{Npc, NpcTag};
pub use posture::{Persona, Posture};
pub use stats::{Attribute, Skill, SkillKind, Stats};
