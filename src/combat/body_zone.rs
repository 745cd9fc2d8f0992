//! Body parts for wound tracking
//!
//! Physical bodies and projected personas share one enum: a persona's
//! "body" is its logic processor and memory space.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BodyPart {
    Head,
    Eyes,
    Neck,
    /// Default target for crushing hits
    Chest,
    Abdomen,
    Back,
    RightArm,
    LeftArm,
    RightHand,
    LeftHand,
    RightLeg,
    LeftLeg,
    // Digital anatomy (personas only)
    LogicProcessor,
    MemoryAddress,
}

impl BodyPart {
    /// Parts a player can aim for
    pub fn physical() -> [BodyPart; 12] {
        [
            BodyPart::Head,
            BodyPart::Eyes,
            BodyPart::Neck,
            BodyPart::Chest,
            BodyPart::Abdomen,
            BodyPart::Back,
            BodyPart::RightArm,
            BodyPart::LeftArm,
            BodyPart::RightHand,
            BodyPart::LeftHand,
            BodyPart::RightLeg,
            BodyPart::LeftLeg,
        ]
    }

    pub fn parse(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "head" => Some(BodyPart::Head),
            "eyes" | "eye" => Some(BodyPart::Eyes),
            "neck" => Some(BodyPart::Neck),
            "chest" | "torso" => Some(BodyPart::Chest),
            "abdomen" | "stomach" | "gut" => Some(BodyPart::Abdomen),
            "back" => Some(BodyPart::Back),
            "rightarm" | "rarm" => Some(BodyPart::RightArm),
            "leftarm" | "larm" => Some(BodyPart::LeftArm),
            "righthand" | "rhand" => Some(BodyPart::RightHand),
            "lefthand" | "lhand" => Some(BodyPart::LeftHand),
            "rightleg" | "rleg" => Some(BodyPart::RightLeg),
            "leftleg" | "lleg" => Some(BodyPart::LeftLeg),
            _ => None,
        }
    }

    /// Where a hit on this part lands on a projected persona
    pub fn digital(&self) -> BodyPart {
        match self {
            BodyPart::Head | BodyPart::Eyes | BodyPart::LogicProcessor => BodyPart::LogicProcessor,
            _ => BodyPart::MemoryAddress,
        }
    }

    /// Head-like parts whose heavy wounds daze
    pub fn is_cranial(&self) -> bool {
        matches!(self, BodyPart::Head | BodyPart::LogicProcessor)
    }

    pub fn is_arm(&self) -> bool {
        matches!(self, BodyPart::RightArm | BodyPart::LeftArm)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BodyPart::Head => "head",
            BodyPart::Eyes => "eyes",
            BodyPart::Neck => "neck",
            BodyPart::Chest => "chest",
            BodyPart::Abdomen => "abdomen",
            BodyPart::Back => "back",
            BodyPart::RightArm => "right arm",
            BodyPart::LeftArm => "left arm",
            BodyPart::RightHand => "right hand",
            BodyPart::LeftHand => "left hand",
            BodyPart::RightLeg => "right leg",
            BodyPart::LeftLeg => "left leg",
            BodyPart::LogicProcessor => "logic processor",
            BodyPart::MemoryAddress => "memory address",
        }
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_spacing_variants() {
        assert_eq!(BodyPart::parse("right arm"), Some(BodyPart::RightArm));
        assert_eq!(BodyPart::parse("R_Arm"), Some(BodyPart::RightArm));
        assert_eq!(BodyPart::parse("rarm"), Some(BodyPart::RightArm));
        assert_eq!(BodyPart::parse("HEAD"), Some(BodyPart::Head));
        assert_eq!(BodyPart::parse("tail"), None);
    }

    #[test]
    fn test_digital_mapping() {
        assert_eq!(BodyPart::Eyes.digital(), BodyPart::LogicProcessor);
        assert_eq!(BodyPart::Chest.digital(), BodyPart::MemoryAddress);
        assert_eq!(BodyPart::LeftLeg.digital(), BodyPart::MemoryAddress);
    }

    #[test]
    fn test_physical_parts_exclude_digital() {
        assert!(!BodyPart::physical().contains(&BodyPart::LogicProcessor));
        assert_eq!(BodyPart::physical().len(), 12);
    }
}
