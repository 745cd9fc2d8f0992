//! Time: automation, regeneration, scheduled continuations and the tick

pub mod automation;
pub mod regen;
pub mod scheduler;
pub mod tick;

pub use automation::{AutomatedAction, AutomationKind};
pub use scheduler::{ScheduledEvent, Scheduler};
pub use tick::TickEvent;
