//! Combat simulation module
//!
//! All combat logic lives here. The simulation is single-threaded and
//! deterministic given:
//! - One seeded RNG
//! - An injected clock
//! - The same sequence of `set_context` / `update` calls

pub mod boss;
pub mod collision;
pub mod enemies;
pub mod feedback;
pub mod pool;
pub mod projectiles;
pub mod scaling;
pub mod scheduler;
pub mod state;
pub mod tick;

pub use feedback::{NumberFrame, animate, format_amount};
pub use pool::Pool;
pub use scaling::{ScalingContext, ScalingEngine, Stats};
pub use scheduler::ArrivalScheduler;
pub use state::{
    CombatContext, CombatSim, DamageNumber, DamageNumberId, DamageOutcome, DamageSource,
    DebugSnapshot, Enemy, EnemyId, EnemyKind, EnemyState, PoolStats, Projectile,
    ProjectileDespawnReason, ProjectileId, Side,
};
