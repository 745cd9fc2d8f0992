//! Combat resolution
//!
//! Components live in the leaf modules; every command is an `impl` block on
//! `CombatEngine` in the module named after it.

pub mod armor;
pub mod attack;
pub mod body_zone;
pub mod buffer;
pub mod calculator;
pub mod combo;
pub mod flavor;
pub mod maneuver;
pub mod momentum;
pub mod npc_attack;
pub mod resolution;
pub mod roundtime;
pub mod stance;
pub mod state;
pub mod sync;
pub mod targeting;
pub mod tier;
pub mod weapons;
pub mod wounds;

pub use attack::AttackStart;
pub use body_zone::BodyPart;
pub use buffer::{CombatAction, CombatActionType, CombatBuffer, Combo, Malware};
pub use calculator::{HitType, OutcomePolicy, SyncReport};
pub use combo::detect_combo;
pub use maneuver::{ManeuverDirection, ManeuverOutcome};
pub use resolution::AttackOutcome;
pub use state::{CombatStats, DefenseAllocation, PendingAttack, StancePreset};
pub use sync::{ChallengeLog, SyncChallenge, TimingChannel};
pub use tier::EngagementTier;
pub use weapons::{AttackMove, Weapon};
