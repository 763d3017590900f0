//! Dragon Combat - real-time combat core of an idle dragon game
//!
//! Core modules:
//! - `sim`: Combat simulation (arrivals, hostiles, projectiles, boss, feedback)
//! - `num`: Arbitrary-magnitude numbers for health and damage
//! - `config`: Validated tuning
//! - `progression`: Level lengths along the run
//! - `telemetry`: Semantic events for an external sink
//! - `clock`: Injected time sources

pub mod clock;
pub mod config;
pub mod num;
pub mod progression;
pub mod sim;
pub mod telemetry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CombatConfig, ConfigError};
pub use num::BigNum;
pub use sim::{CombatContext, CombatSim, DamageOutcome, DebugSnapshot};
pub use telemetry::{CombatEvent, EventRecord, events_to_ndjson};

/// Combat constants
pub mod consts {
    /// Hit radii (px)
    pub const DRAGON_RADIUS: f32 = 24.0;
    pub const ENEMY_RADIUS: f32 = 12.0;
    pub const PROJECTILE_RADIUS: f32 = 2.0;

    /// Hostiles appear this far past the right edge
    pub const SPAWN_EDGE_OFFSET: f32 = 32.0;
    /// Off-screen slack before a hostile is culled
    pub const ENEMY_CULL_MARGIN: f32 = 100.0;
    /// Off-screen slack before a shot is culled
    pub const PROJECTILE_CULL_MARGIN: f32 = 32.0;

    /// EWMA weight of the newest spawn interval in the spawns/sec gauge
    pub const SPAWN_RATE_SMOOTHING: f64 = 0.1;

    /// Undrained events beyond this are dropped
    pub const EVENT_BUFFER_CAP: usize = 4096;
}
