//! Narration flavor per weapon class and outcome

use crate::combat::calculator::HitType;

/// Weapon class derived from the category tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeaponClass {
    Brawling,
    Firearm,
    Blade,
    Wire,
    Blunt,
    Natural,
    Generic,
}

impl WeaponClass {
    pub fn of(category: &str) -> Self {
        let cat = category.to_lowercase();
        let has = |tags: &[&str]| tags.iter().any(|t| cat.contains(t));
        if has(&["brawling"]) {
            WeaponClass::Brawling
        } else if has(&["pistol", "rifle", "smg", "shotgun", "sweeper"]) {
            WeaponClass::Firearm
        } else if has(&["knife", "blade", "sword", "katana", "machete"]) {
            WeaponClass::Blade
        } else if has(&["whip", "wire"]) {
            WeaponClass::Wire
        } else if has(&["prod", "bat", "club", "knuckles", "hammer"]) {
            WeaponClass::Blunt
        } else if has(&["natural", "rat"]) {
            WeaponClass::Natural
        } else {
            WeaponClass::Generic
        }
    }
}

/// Labels and verb phrases for one (class, outcome) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flavor {
    pub label: &'static str,
    /// Second person ("You carve a deep wound")
    pub player_action: &'static str,
    /// Third person ("carves a deep wound")
    pub npc_action: &'static str,
    /// What bystanders see
    pub observer_label: &'static str,
}

const fn flavor(
    label: &'static str,
    player_action: &'static str,
    npc_action: &'static str,
    observer_label: &'static str,
) -> Flavor {
    Flavor {
        label,
        player_action,
        npc_action,
        observer_label,
    }
}

pub fn attack_flavor(category: &str, hit: HitType) -> Flavor {
    use HitType::*;
    match (WeaponClass::of(category), hit) {
        (WeaponClass::Brawling, Crushing) => flavor("[KNOCKOUT]", "land a devastating blow", "lands a devastating blow", "[KNOCKOUT]"),
        (WeaponClass::Brawling, Solid) => flavor("[SMACK]", "connect solidly", "connects solidly", "[SMACK]"),
        (WeaponClass::Brawling, Marginal) => flavor("[GRAZE]", "graze the target", "grazes the target", "[GRAZE]"),
        (WeaponClass::Brawling, Miss) => flavor("[MISS]", "swing wild", "swings wild", "The blow misses!"),

        (WeaponClass::Firearm, Crushing) => flavor("[CRITICAL SHOT]", "land a perfect shot", "lands a perfect shot", "[CRITICAL SHOT]"),
        (WeaponClass::Firearm, Solid) => flavor("[SOLID HIT]", "hit the target", "hits the target", "[SOLID HIT]"),
        (WeaponClass::Firearm, Marginal) => flavor("[GRAZE]", "graze the target", "grazes the target", "[GRAZE]"),
        (WeaponClass::Firearm, Miss) => flavor("[MISS]", "shoot wide", "shoots wide", "The shot goes wide!"),

        (WeaponClass::Blade, Crushing) => flavor("[DEEP SLASH]", "carve a deep wound", "carves a deep wound", "[DEEP SLASH]"),
        (WeaponClass::Blade, Solid) => flavor("[SLASH]", "cut into the target", "cuts into the target", "[SLASH]"),
        (WeaponClass::Blade, Marginal) => flavor("[NICK]", "nick the target", "nicks the target", "[NICK]"),
        (WeaponClass::Blade, Miss) => flavor("[MISS]", "swing at air", "swings at air", "The swing misses!"),

        (WeaponClass::Wire, Crushing) => flavor("[SEVER]", "whip bites deep", "whip bites deep", "[SEVER]"),
        (WeaponClass::Wire, Solid) => flavor("[LASH]", "lash the target", "lashes the target", "[LASH]"),
        (WeaponClass::Wire, Marginal) => flavor("[SNAG]", "snag the target", "snags the target", "[SNAG]"),
        (WeaponClass::Wire, Miss) => flavor("[MISS]", "snap harmlessly", "snaps harmlessly", "The wire snaps harmlessly!"),

        (WeaponClass::Blunt, Crushing) => flavor("[SMASH]", "land a bone-jarring blow", "lands a bone-jarring blow", "[SMASH]"),
        (WeaponClass::Blunt, Solid) => flavor("[THUMP]", "strike the target", "strikes the target", "[THUMP]"),
        (WeaponClass::Blunt, Marginal) => flavor("[GLANCE]", "glance off", "glances off", "[GLANCE]"),
        (WeaponClass::Blunt, Miss) => flavor("[MISS]", "swing wild", "swings wild", "The swing misses!"),

        (WeaponClass::Natural, Crushing) => flavor("[SAVAGE BITE]", "tear a chunk of flesh", "tears a chunk of flesh", "[SAVAGE BITE]"),
        (WeaponClass::Natural, Solid) => flavor("[BITE]", "sink teeth in", "sinks teeth in", "[BITE]"),
        (WeaponClass::Natural, Marginal) => flavor("[SCRATCH]", "scratch the target", "scratches the target", "[SCRATCH]"),
        (WeaponClass::Natural, Miss) => flavor("[MISS]", "snap at air", "snaps at air", "The attack misses!"),

        (WeaponClass::Generic, Crushing) => flavor("[CRUSHING]", "deal massive damage", "deals massive damage", "[CRUSHING HIT]"),
        (WeaponClass::Generic, Solid) => flavor("[SOLID]", "hit the target", "hits the target", "[SOLID HIT]"),
        (WeaponClass::Generic, Marginal) => flavor("[MARGINAL]", "graze the target", "grazes the target", "[MARGINAL HIT]"),
        (WeaponClass::Generic, Miss) => flavor("[MISS]", "miss", "misses", "The attack misses!"),
    }
}
