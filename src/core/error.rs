use thiserror::Error;

use crate::core::types::EntityId;
use crate::ecs::component::ComponentKind;

#[derive(Error, Debug)]
pub enum CombatError {
    /// Validation failure: the message is shown to the actor verbatim
    #[error("{0}")]
    Rejected(String),

    #[error("...wait {0} seconds.")]
    InRoundtime(u32),

    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Component {kind:?} not found for entity {entity}")]
    ComponentMissing { entity: EntityId, kind: ComponentKind },

    #[error("Malformed weapon data: {0}")]
    MalformedWeapon(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CombatError {
    pub fn rejected(message: impl Into<String>) -> Self {
        CombatError::Rejected(message.into())
    }

    /// Validation failures are surfaced to the actor; everything else is logged
    pub fn is_validation(&self) -> bool {
        matches!(self, CombatError::Rejected(_) | CombatError::InRoundtime(_))
    }
}

pub type Result<T> = std::result::Result<T, CombatError>;
