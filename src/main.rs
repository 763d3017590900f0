//! Dragon Combat headless driver
//!
//! Runs a scripted session against the combat core: the dragon travels,
//! auto-fires at the nearest hostile, and falls back when its health runs out.
//!
//! Usage: `dragon-combat [config.json] [events.ndjson] [--seed N] [--minutes M]`

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;

use dragon_combat::progression::LevelTrack;
use dragon_combat::sim::CombatContext;
use dragon_combat::{BigNum, Clock, CombatConfig, CombatSim, ManualClock, events_to_ndjson};

/// Frame length (60 Hz)
const FRAME_MS: f64 = 1000.0 / 60.0;
/// Travel speed of the scripted dragon (m/s)
const TRAVEL_SPEED_M_PER_S: f64 = 120.0;
/// Player shot cadence
const FIRE_INTERVAL_MS: f64 = 350.0;
/// Snapshot log cadence
const SNAPSHOT_INTERVAL_MS: f64 = 10_000.0;

/// Headless combat session runner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON tuning file (built-in tuning when omitted)
    config: Option<PathBuf>,

    /// Write every combat event here as NDJSON
    events: Option<PathBuf>,

    /// Run seed
    #[arg(short, long, default_value_t = 0x0D2A_6011)]
    seed: u64,

    /// Simulated session length in minutes
    #[arg(short, long, default_value_t = 20.0)]
    minutes: f64,
}

fn load_config(path: Option<&Path>) -> Result<CombatConfig> {
    let Some(path) = path else {
        log::info!("Using built-in tuning");
        return Ok(CombatConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading tuning from {}", path.display()))?;
    let config = CombatConfig::from_json_str(&text)
        .with_context(|| format!("invalid tuning in {}", path.display()))?;
    log::info!("Loaded tuning from {}", path.display());
    Ok(config)
}

/// Outer-loop stand-in for the player's stats
fn player_damage(level: u32) -> BigNum {
    BigNum::from_f64(20.0) * BigNum::from_f64(1.2).powf(f64::from(level.saturating_sub(1)))
}

fn player_max_health(level: u32) -> BigNum {
    BigNum::from_f64(100.0) * BigNum::from_f64(1.15).powf(f64::from(level.saturating_sub(1)))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    log::info!("Dragon Combat (headless) starting...");

    let config = load_config(args.config.as_deref())?;
    let track = LevelTrack::new(&config.levels);
    let session_ms = args.minutes.max(0.0) * 60.0 * 1000.0;

    let clock = ManualClock::new(0.0);
    let mut sim = CombatSim::new(args.seed, clock.clone());
    sim.init(config).context("initializing combat")?;

    let boss_down = Rc::new(Cell::new(false));
    let flag = boss_down.clone();
    sim.set_boss_defeated_callback(move || flag.set(true));

    // Damage taken since the last frame
    let taken = Rc::new(Cell::new(BigNum::ZERO));
    let sink = taken.clone();
    sim.set_player_hit_callback(move |amount| sink.set(sink.get() + amount));

    let mut ctx = CombatContext {
        traveling: true,
        ..CombatContext::default()
    };
    let mut health = player_max_health(1);
    let mut next_shot_ms = 0.0;
    let mut next_snapshot_ms = SNAPSHOT_INTERVAL_MS;
    let mut falls = 0u32;
    let mut ndjson = String::new();

    while clock.now_ms() < session_ms && !boss_down.get() {
        clock.advance(FRAME_MS);
        let now = clock.now_ms();

        if ctx.traveling {
            ctx.distance += TRAVEL_SPEED_M_PER_S * FRAME_MS / 1000.0;
        }
        ctx.level = track.level_for_distance(ctx.distance);
        // Stop while a boss is on the field
        ctx.traveling = !sim.is_boss_active();
        sim.set_context(ctx);
        sim.update(FRAME_MS);

        if now >= next_shot_ms {
            let nearest = sim
                .enemies()
                .iter()
                .filter(|e| e.is_alive())
                .min_by(|a, b| {
                    a.pos
                        .distance_squared(ctx.anchor)
                        .total_cmp(&b.pos.distance_squared(ctx.anchor))
                })
                .map(|e| e.pos);
            if let Some(target) = nearest {
                sim.spawn_player_projectile(ctx.anchor, target, player_damage(ctx.level));
            }
            next_shot_ms = now + FIRE_INTERVAL_MS;
        }

        health = health - taken.replace(BigNum::ZERO);
        let events = sim.drain_events();
        if args.events.is_some() {
            ndjson.push_str(&events_to_ndjson(&events).context("encoding events")?);
        }

        if !health.is_positive() {
            falls += 1;
            log::info!(
                "Dragon fell at level {} ({:.0} m); falling back to the level start",
                ctx.level,
                ctx.distance
            );
            sim.clear_all();
            ctx.distance = track.level_start(ctx.level);
            health = player_max_health(ctx.level);
        }

        if now >= next_snapshot_ms {
            let snap = sim.debug_snapshot();
            log::info!(
                "t={:.0}s level={} dist={:.0}m hp={} enemies={} (in range {}) shots={} numbers={} spawns/s={:.2}",
                now / 1000.0,
                ctx.level,
                ctx.distance,
                health,
                snap.active_enemies,
                snap.in_range,
                snap.active_projectiles,
                snap.active_damage_numbers,
                snap.spawns_per_sec
            );
            next_snapshot_ms += SNAPSHOT_INTERVAL_MS;
        }
    }

    if boss_down.get() {
        log::info!("Boss defeated after {:.0}s", clock.now_ms() / 1000.0);
    }
    log::info!(
        "Session over: level {}, {:.0} m, {} falls, final snapshot {}",
        ctx.level,
        ctx.distance,
        falls,
        serde_json::to_string(&sim.debug_snapshot()).unwrap_or_default()
    );

    if let Some(path) = args.events.as_deref() {
        std::fs::write(path, ndjson)
            .with_context(|| format!("writing events to {}", path.display()))?;
        log::info!("Wrote events to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_player_stats_grow_with_level() {
        assert_eq!(player_damage(1).to_f64(), 20.0);
        assert!(player_damage(5) > player_damage(4));
        assert_eq!(player_max_health(1).to_f64(), 100.0);
    }

    #[test]
    fn test_missing_config_path_uses_defaults() {
        assert_eq!(load_config(None).unwrap(), CombatConfig::default());
        let err = load_config(Some(Path::new("/nonexistent/dragon.json"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/dragon.json"));
    }

    #[test]
    fn test_args_parse_paths_and_flags() {
        let args = Args::try_parse_from(["dragon-combat"]).unwrap();
        assert!(args.config.is_none() && args.events.is_none());
        assert_eq!(args.minutes, 20.0);

        let args = Args::try_parse_from([
            "dragon-combat",
            "tuning.json",
            "events.ndjson",
            "--seed",
            "7",
            "-m",
            "1.5",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("tuning.json")));
        assert_eq!(args.events, Some(PathBuf::from("events.ndjson")));
        assert_eq!(args.seed, 7);
        assert_eq!(args.minutes, 1.5);
    }

    #[test]
    fn test_anchor_is_inside_default_area() {
        let ctx = CombatContext::default();
        assert!(ctx.anchor.cmplt(Vec2::new(ctx.width, ctx.height)).all());
    }
}
