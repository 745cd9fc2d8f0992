//! NPC identity

use serde::{Deserialize, Serialize};

/// Behavioural tag that unlocks special combat rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NpcTag {
    #[default]
    Ordinary,
    /// Turing police: shutdown commands and REBOOT malware
    Turing,
    /// Reality glitch: may leave a catalog item behind on death
    Glitch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Npc {
    /// Name players target by ("ganger", "rat")
    pub type_name: String,
    pub tag: NpcTag,
}

impl Npc {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            tag: NpcTag::Ordinary,
        }
    }

    pub fn tagged(type_name: impl Into<String>, tag: NpcTag) -> Self {
        Self {
            type_name: type_name.into(),
            tag,
        }
    }

    /// Case-insensitive substring match used by target parsing
    pub fn matches(&self, name: &str) -> bool {
        self.type_name
            .to_lowercase()
            .contains(&name.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_match_is_partial_and_case_insensitive() {
        let npc = Npc::new("Street Ganger");
        assert!(npc.matches("ganger"));
        assert!(npc.matches("STREET"));
        assert!(!npc.matches("rat"));
    }
}
