//! Component registry
//!
//! Every component is a plain data record tagged by a `ComponentKind`. An
//! entity stores at most one component per kind; typed access goes through
//! the `Component` trait so callers never match on `AnyComponent` by hand.

use serde::{Deserialize, Serialize};

use crate::combat::armor::Armor;
use crate::combat::buffer::CombatBuffer;
use crate::combat::momentum::Momentum;
use crate::combat::roundtime::Roundtime;
use crate::combat::state::CombatStats;
use crate::combat::weapons::Weapon;
use crate::combat::wounds::WoundTable;
use crate::core::types::Position;
use crate::entity::inventory::{Container, Inventory, Item, Magazine};
use crate::entity::npc::Npc;
use crate::entity::posture::{Persona, Posture};
use crate::entity::stats::Stats;
use crate::simulation::automation::AutomatedAction;

/// Typed view over one variant of `AnyComponent`
pub trait Component: Sized {
    const KIND: ComponentKind;

    fn into_any(self) -> AnyComponent;
    fn from_any(any: &AnyComponent) -> Option<&Self>;
    fn from_any_mut(any: &mut AnyComponent) -> Option<&mut Self>;
    fn unwrap_any(any: AnyComponent) -> Option<Self>;
}

macro_rules! components {
    ($($name:ident => $ty:ty),* $(,)?) => {
        /// Capability tag used as the key of an entity's component map
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum ComponentKind {
            $($name),*
        }

        /// Type-erased component stored in an entity record
        #[derive(Debug, Clone, Serialize, Deserialize)]
        pub enum AnyComponent {
            $($name($ty)),*
        }

        impl AnyComponent {
            pub fn kind(&self) -> ComponentKind {
                match self {
                    $(AnyComponent::$name(_) => ComponentKind::$name),*
                }
            }
        }

        $(
            impl Component for $ty {
                const KIND: ComponentKind = ComponentKind::$name;

                fn into_any(self) -> AnyComponent {
                    AnyComponent::$name(self)
                }

                fn from_any(any: &AnyComponent) -> Option<&Self> {
                    match any {
                        AnyComponent::$name(c) => Some(c),
                        _ => None,
                    }
                }

                fn from_any_mut(any: &mut AnyComponent) -> Option<&mut Self> {
                    match any {
                        AnyComponent::$name(c) => Some(c),
                        _ => None,
                    }
                }

                fn unwrap_any(any: AnyComponent) -> Option<Self> {
                    match any {
                        AnyComponent::$name(c) => Some(c),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for AnyComponent {
                fn from(c: $ty) -> Self {
                    AnyComponent::$name(c)
                }
            }
        )*
    };
}

components! {
    Position => Position,
    Stats => Stats,
    Posture => Posture,
    Persona => Persona,
    Npc => Npc,
    Inventory => Inventory,
    Item => Item,
    Magazine => Magazine,
    Container => Container,
    CombatStats => CombatStats,
    Weapon => Weapon,
    Armor => Armor,
    WoundTable => WoundTable,
    Roundtime => Roundtime,
    CombatBuffer => CombatBuffer,
    Momentum => Momentum,
    AutomatedAction => AutomatedAction,
}
