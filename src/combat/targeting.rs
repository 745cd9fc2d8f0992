//! Target acquisition
//!
//! Resolution order: an explicit name (with ordinal), then the locked target
//! if still in the room, then the only NPC present.

use crate::combat::state::CombatStats;
use crate::core::error::{CombatError, Result};
use crate::core::types::EntityId;
use crate::ecs::world::World;
use crate::entity::npc::Npc;

pub const ORDINAL_NAMES: [&str; 10] = [
    "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth", "tenth",
];

/// A target name split into the base name and a 1-based ordinal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetName {
    pub name: String,
    pub ordinal: usize,
}

/// "second ganger" / "ganger 2" / "ganger" -> (name, ordinal)
pub fn parse_target_name(input: &str) -> TargetName {
    let words: Vec<&str> = input.split_whitespace().collect();

    if words.len() > 1 {
        let first = words[0].to_ascii_lowercase();
        if let Some(index) = ORDINAL_NAMES.iter().position(|o| *o == first) {
            return TargetName {
                name: words[1..].join(" "),
                ordinal: index + 1,
            };
        }
        if let Some(Ok(n)) = words.last().map(|w| w.parse::<usize>()) {
            if n > 0 {
                return TargetName {
                    name: words[..words.len() - 1].join(" "),
                    ordinal: n,
                };
            }
        }
    }

    TargetName {
        name: words.join(" "),
        ordinal: 1,
    }
}

pub(crate) fn ordinal_word(ordinal: usize) -> String {
    ORDINAL_NAMES
        .get(ordinal.wrapping_sub(1))
        .map(|s| s.to_string())
        .unwrap_or_else(|| ordinal.to_string())
}

/// NPCs in the actor's room whose type name matches, in spawn order
pub fn matching_npcs(world: &World, actor: EntityId, name: &str) -> Vec<EntityId> {
    let Some(pos) = world.position(actor) else {
        return Vec::new();
    };
    world
        .npcs_at(pos)
        .into_iter()
        .filter(|id| world.get::<Npc>(*id).is_some_and(|npc| npc.matches(name)))
        .collect()
}

/// Find the entity an actor means to fight
pub fn resolve_target(world: &World, actor: EntityId, name: Option<&str>) -> Result<EntityId> {
    let pos = world
        .position(actor)
        .ok_or_else(|| CombatError::rejected("You don't have a position."))?;

    let name = name.map(str::trim).filter(|n| !n.is_empty());
    let Some(raw) = name else {
        let locked = world
            .get::<CombatStats>(actor)
            .and_then(|c| c.target)
            .filter(|t| world.co_located(actor, *t));
        if let Some(target) = locked {
            return Ok(target);
        }

        let npcs = world.npcs_at(pos);
        return match npcs.as_slice() {
            [only] => Ok(*only),
            [] => Err(CombatError::rejected("Attack who?")),
            _ => Err(CombatError::rejected(
                "There are multiple targets here. Which one do you want to attack?",
            )),
        };
    };

    let parsed = parse_target_name(raw);
    let candidates = matching_npcs(world, actor, &parsed.name);
    if candidates.is_empty() {
        return Err(CombatError::rejected(format!("You don't see \"{}\" here.", raw)));
    }
    candidates
        .get(parsed.ordinal - 1)
        .copied()
        .ok_or_else(|| {
            CombatError::rejected(format!(
                "There is no {} \"{}\" here.",
                ordinal_word(parsed.ordinal),
                parsed.name
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Position;

    fn room() -> (World, EntityId, EntityId, EntityId) {
        let mut world = World::new();
        let here = Position::new(0, 0);
        let player = world.spawn_with([here.into(), CombatStats::default().into()]);
        let g1 = world.spawn_with([here.into(), Npc::new("ganger").into(), CombatStats::default().into()]);
        let g2 = world.spawn_with([here.into(), Npc::new("ganger").into(), CombatStats::default().into()]);
        (world, player, g1, g2)
    }

    #[test]
    fn test_parse_ordinal_forms() {
        assert_eq!(
            parse_target_name("second ganger"),
            TargetName { name: "ganger".into(), ordinal: 2 }
        );
        assert_eq!(
            parse_target_name("rat 3"),
            TargetName { name: "rat".into(), ordinal: 3 }
        );
        assert_eq!(
            parse_target_name("street ganger"),
            TargetName { name: "street ganger".into(), ordinal: 1 }
        );
    }

    #[test]
    fn test_named_ordinal_target() {
        let (world, player, g1, g2) = room();
        assert_eq!(resolve_target(&world, player, Some("ganger")).unwrap(), g1);
        assert_eq!(resolve_target(&world, player, Some("second ganger")).unwrap(), g2);
    }

    #[test]
    fn test_missing_ordinal_message() {
        let (world, player, _, _) = room();
        let err = resolve_target(&world, player, Some("third ganger")).unwrap_err();
        assert_eq!(err.to_string(), "There is no third \"ganger\" here.");
        let err = resolve_target(&world, player, Some("rat")).unwrap_err();
        assert_eq!(err.to_string(), "You don't see \"rat\" here.");
    }

    #[test]
    fn test_unnamed_target_is_ambiguous_with_two() {
        let (world, player, _, _) = room();
        let err = resolve_target(&world, player, None).unwrap_err();
        assert!(err.to_string().starts_with("There are multiple targets"));
    }

    #[test]
    fn test_locked_target_wins() {
        let (mut world, player, _, g2) = room();
        world.get_mut::<CombatStats>(player).unwrap().target = Some(g2);
        assert_eq!(resolve_target(&world, player, None).unwrap(), g2);

        world.insert(g2, Position::new(9, 9));
        assert!(resolve_target(&world, player, None).is_err());
    }

    #[test]
    fn test_empty_room() {
        let mut world = World::new();
        let player = world.spawn_with([Position::new(0, 0).into()]);
        let err = resolve_target(&world, player, None).unwrap_err();
        assert_eq!(err.to_string(), "Attack who?");
    }
}
