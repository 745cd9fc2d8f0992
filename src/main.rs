//! Sprawl Combat - scripted duel
//!
//! Stages a player against a ganger, plays the player's sync bar with a
//! seeded die and prints the resulting narration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use sprawl_combat::combat::buffer::{CombatActionType, CombatBuffer};
use sprawl_combat::combat::maneuver::ManeuverDirection;
use sprawl_combat::combat::state::CombatStats;
use sprawl_combat::combat::tier::EngagementTier;
use sprawl_combat::combat::weapons::Weapon;
use sprawl_combat::combat::{AttackStart, SyncChallenge, SyncReport};
use sprawl_combat::core::types::{EntityId, Position};
use sprawl_combat::entity::inventory::Inventory;
use sprawl_combat::entity::npc::Npc;
use sprawl_combat::entity::stats::{Attribute, SkillKind, Stats};
use sprawl_combat::messaging::Message;
use sprawl_combat::{CombatConfig, CombatEngine, Result};

/// Tick used while waiting out roundtime
const STEP: Duration = Duration::from_millis(500);
/// Upper bound on ticks spent waiting for anything
const MAX_WAIT_TICKS: u32 = 120;

/// Scripted duel between a player and a ganger
#[derive(Parser, Debug)]
#[command(name = "sprawl-combat")]
#[command(about = "Run a seeded, scripted duel and print the narration")]
struct Args {
    /// Random seed (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// TOML config file; missing keys keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum exchanges before the duel is called
    #[arg(long, default_value_t = 12)]
    rounds: u32,

    /// Chance the player lands the sync cursor in the crit zone
    #[arg(long, default_value_t = 0.25)]
    crit_rate: f64,

    /// Output format: text or json
    #[arg(long, default_value = "text")]
    format: String,
}

#[derive(Serialize)]
struct DuelReport<'a> {
    seed: u64,
    rounds: u32,
    winner: Option<&'static str>,
    challenges: Vec<&'a SyncChallenge>,
    messages: Vec<&'a Message>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sprawl_combat=info")),
        )
        .init();

    if let Err(err) = run(Args::parse()) {
        tracing::error!(error = %err, "duel failed");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => CombatConfig::load(path)?,
        None => CombatConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let seed = config.seed;
    tracing::info!(seed, "staging duel");

    let mut engine = CombatEngine::new(config)?;
    let mut dice = ChaCha8Rng::seed_from_u64(seed.rotate_left(17));
    let (player, ganger) = stage(&mut engine);

    let mut rounds = 0;
    while rounds < args.rounds {
        rounds += 1;
        wait_until_ready(&mut engine, player);

        let tier = engine
            .world
            .get::<CombatStats>(player)
            .map(|c| c.engagement_tier)
            .unwrap_or_default();
        if tier < EngagementTier::Melee {
            let _ = engine.maneuver(player, ManeuverDirection::Close, Some("ganger"));
        } else if rounds % 4 == 0 {
            buffered_flurry(&mut engine, player);
        } else if let Ok(AttackStart::Challenged(challenge)) =
            engine.initiate_attack(player, Some("ganger"), None)
        {
            let report = play_sync_bar(&mut dice, args.crit_rate);
            tracing::debug!(?report, speed = challenge.speed, "sync bar played");
            let _ = engine.resolve_attack(player, challenge.target, report);
        }

        if !engine.world.contains(ganger) {
            break;
        }
        let _ = engine.npc_attack(ganger, player);
        if engine
            .world
            .get::<CombatStats>(player)
            .map_or(true, |c| c.is_dead())
        {
            break;
        }
    }

    let winner = if !engine.world.contains(ganger) {
        Some("player")
    } else if engine
        .world
        .get::<CombatStats>(player)
        .map_or(true, |c| c.is_dead())
    {
        Some("ganger")
    } else {
        None
    };

    match args.format.as_str() {
        "json" => {
            let report = DuelReport {
                seed,
                rounds,
                winner,
                challenges: engine.timing().sent.iter().map(|(_, c)| c).collect(),
                messages: engine.narrator().messages.iter().collect(),
            };
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(err) => tracing::error!(error = %err, "could not encode report"),
            }
        }
        _ => {
            for message in engine.narrator().for_entity(player) {
                println!("[{}] {}", message.severity, message.text);
            }
            println!();
            println!(
                "=== {} after {} rounds (seed {}) ===",
                winner.map_or("DRAW", |w| if w == "player" { "VICTORY" } else { "DEFEAT" }),
                rounds,
                seed
            );
        }
    }
    Ok(())
}

fn stage(engine: &mut CombatEngine) -> (EntityId, EntityId) {
    let room = Position::new(0, 0);
    let katana = engine
        .world
        .spawn_with([Weapon::melee("katana", "blade", 12.0).into()]);
    let player = engine.world.spawn_with([
        room.into(),
        CombatStats::new(120, 10.0, 2.0).into(),
        Stats::new()
            .with_attribute(Attribute::Agility, 14)
            .with_skill(SkillKind::Kenjutsu, 3, 30)
            .into(),
        Inventory::holding(katana).into(),
    ]);

    let pipe = engine
        .world
        .spawn_with([Weapon::melee("lead pipe", "club", 9.0).into()]);
    let ganger = engine.world.spawn_with([
        room.into(),
        Npc::new("ganger").into(),
        CombatStats::new(80, 22.0, 4.0).hostile().into(),
        Inventory::holding(pipe).into(),
    ]);
    (player, ganger)
}

/// Tick until the entity's roundtime runs out
fn wait_until_ready(engine: &mut CombatEngine, id: EntityId) {
    for _ in 0..MAX_WAIT_TICKS {
        if engine.roundtime_remaining(id) <= 0.0 {
            return;
        }
        engine.tick(STEP);
    }
}

/// Queue three slashes and let the run play out
fn buffered_flurry(engine: &mut CombatEngine, player: EntityId) {
    for _ in 0..3 {
        if engine
            .queue_action(player, CombatActionType::Slash, None)
            .is_err()
        {
            break;
        }
    }
    if engine.start_buffer(player).is_err() {
        engine.clear_buffer(player);
        return;
    }
    for _ in 0..MAX_WAIT_TICKS {
        let running = engine
            .world
            .get::<CombatBuffer>(player)
            .is_some_and(|b| b.is_executing);
        if !running {
            return;
        }
        engine.tick(STEP);
    }
}

fn play_sync_bar(dice: &mut ChaCha8Rng, crit_rate: f64) -> SyncReport {
    let roll: f64 = dice.gen();
    if roll < crit_rate {
        SyncReport::Crit
    } else if roll < 0.9 {
        SyncReport::Hit
    } else {
        SyncReport::Miss
    }
}
