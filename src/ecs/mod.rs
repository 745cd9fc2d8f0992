pub mod component;
pub mod world;

pub use component::{AnyComponent, Component, ComponentKind};
pub use world::{EntityRecord, World};
