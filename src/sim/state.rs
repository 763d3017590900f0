//! Combat state and core simulation types
//!
//! `CombatSim` owns every live list, the pools behind them, the RNG and the
//! clock. Behavior is split across the sibling modules as `impl CombatSim`
//! blocks.

use std::fmt;
use std::rc::Rc;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::pool::Pool;
use super::scaling::ScalingEngine;
use super::scheduler::ArrivalScheduler;
use crate::clock::Clock;
use crate::config::CombatConfig;
use crate::consts::EVENT_BUFFER_CAP;
use crate::num::BigNum;
use crate::telemetry::{CombatEvent, EventRecord};

macro_rules! entity_id {
    ($name:ident, $prefix:literal) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

entity_id!(EnemyId, "enemy");
entity_id!(ProjectileId, "proj");
entity_id!(DamageNumberId, "dmg");

/// Hostile variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    #[default]
    BasicShooter,
}

/// Hostile lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyState {
    /// Just created; replaced on the first movement step
    #[default]
    Spawning,
    /// Closing on its stop point
    Advance,
    /// Parked on the attack arc and firing
    InRange,
    /// Terminal
    Dead,
}

/// A hostile entity
#[derive(Debug, Clone, Default)]
pub struct Enemy {
    pub id: EnemyId,
    pub kind: EnemyKind,
    pub state: EnemyState,
    pub pos: Vec2,
    /// Current stop point on the attack arc
    pub target_stop: Vec2,
    /// Own horizontal speed (px/s), jitter and reverse scaling baked in
    pub own_speed: f32,
    pub max_health: BigNum,
    pub health: BigNum,
    pub damage: BigNum,
    pub last_fire_ms: f64,
    pub next_fire_delay_ms: f64,
    /// Level at spawn; stats never rescale afterwards
    pub spawn_level: u32,
    /// Cumulative run distance at spawn (m)
    pub spawn_distance: f64,
    pub hp_bar_visible: bool,
    /// When the bar started showing a full health pool
    pub hp_bar_full_since_ms: Option<f64>,
}

impl Enemy {
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_alive(&self) -> bool {
        self.state != EnemyState::Dead
    }

    /// Health as a fraction of max, for HP bars
    pub fn health_fraction(&self) -> f64 {
        if !self.max_health.is_positive() {
            return 0.0;
        }
        let log_ratio = self.health.log10() - self.max_health.log10();
        if self.health.is_positive() {
            10f64.powf(log_ratio).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Which side fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    Player,
    Enemy,
}

#[derive(Debug, Clone, Default)]
pub struct Projectile {
    pub id: ProjectileId,
    pub side: Side,
    pub pos: Vec2,
    pub vel: Vec2,
    pub spawn_ms: f64,
    pub lifetime_sec: f64,
    /// Pass-through hits left; only player shots use it
    pub chain_hits_remaining: u32,
    /// Damage applied on contact
    pub damage: BigNum,
}

impl Projectile {
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Who dealt the damage a number shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageSource {
    #[default]
    Player,
    Enemy,
}

/// A floating damage number
#[derive(Debug, Clone, Default)]
pub struct DamageNumber {
    pub id: DamageNumberId,
    /// Current draw position
    pub pos: Vec2,
    /// Spawn position with the stacking offset already applied
    pub origin: Vec2,
    /// One-time stacking offset (zero when spawned alone)
    pub offset: Vec2,
    pub amount: String,
    pub source: DamageSource,
    pub color: String,
    pub spawn_ms: f64,
    pub scale: f32,
    pub opacity: f32,
}

impl DamageNumber {
    pub(crate) fn reset(&mut self) {
        // Keep string buffers for reuse
        self.amount.clear();
        self.color.clear();
        self.id = DamageNumberId::default();
        self.pos = Vec2::ZERO;
        self.origin = Vec2::ZERO;
        self.offset = Vec2::ZERO;
        self.source = DamageSource::default();
        self.spawn_ms = 0.0;
        self.scale = 1.0;
        self.opacity = 1.0;
    }
}

/// Outer-simulation inputs read every step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatContext {
    /// Combat area size (px)
    pub width: f32,
    pub height: f32,
    /// Dragon position (px)
    pub anchor: Vec2,
    pub reversing: bool,
    pub traveling: bool,
    pub level: u32,
    /// Cumulative run distance (m)
    pub distance: f64,
}

impl Default for CombatContext {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            anchor: Vec2::new(160.0, 300.0),
            reversing: false,
            traveling: false,
            level: 1,
            distance: 0.0,
        }
    }
}

impl CombatContext {
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// Result of applying damage to a hostile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    pub killed: bool,
    /// How far the killing blow went past zero
    pub overkill: BigNum,
}

impl DamageOutcome {
    pub const NONE: Self = Self {
        killed: false,
        overkill: BigNum::ZERO,
    };
}

/// Why a hostile left the live set
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum DespawnReason {
    Killed { by_player: bool, overkill: BigNum },
    Offscreen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileDespawnReason {
    Hit,
    Timeout,
    Offscreen,
}

/// Timed action run at the start of a step once due
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PendingAction {
    pub due_ms: f64,
    pub kind: PendingKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum PendingKind {
    /// A delayed shot of a boss burst
    BossShot { boss: EnemyId },
}

/// Free-list sizes and construction counts of one pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub free: usize,
    pub created: usize,
}

/// Instrumentation view of the simulation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugSnapshot {
    pub active_enemies: usize,
    pub active_projectiles: usize,
    pub active_damage_numbers: usize,
    pub in_range: usize,
    /// Smoothed spawn rate
    pub spawns_per_sec: f64,
    pub cull_count: u64,
    pub enemy_pool: PoolStats,
    pub projectile_pool: PoolStats,
    pub damage_number_pool: PoolStats,
}

/// Uniform draw in `[min, max)`. Empty or inverted bands return `min`.
pub(crate) fn random_between<R: Rng>(rng: &mut R, min: f64, max: f64) -> f64 {
    if max <= min {
        return min;
    }
    min + rng.random::<f64>() * (max - min)
}

/// The combat simulation
pub struct CombatSim {
    pub(super) config: Option<Rc<CombatConfig>>,
    pub(super) scaling: Option<Rc<ScalingEngine>>,
    pub(super) scheduler: Option<ArrivalScheduler>,
    pub(super) clock: Box<dyn Clock>,
    pub(super) rng: Pcg32,
    pub(super) ctx: CombatContext,

    pub(super) enemies: Vec<Enemy>,
    pub(super) enemy_pool: Pool<Enemy>,
    pub(super) projectiles: Vec<Projectile>,
    pub(super) projectile_pool: Pool<Projectile>,
    pub(super) damage_numbers: Vec<DamageNumber>,
    pub(super) damage_number_pool: Pool<DamageNumber>,

    /// Tracked boss while it is alive
    pub(super) boss: Option<EnemyId>,
    pub(super) boss_spawned: bool,
    pub(super) regular_spawns_disabled: bool,
    pub(super) boss_defeated: bool,
    pub(super) on_boss_defeated: Option<Box<dyn FnMut()>>,
    pub(super) on_player_hit: Option<Box<dyn FnMut(BigNum)>>,
    pub(super) pending: Vec<PendingAction>,

    pub(super) events: Vec<EventRecord>,
    next_id: u64,

    pub(super) spawns_per_sec: f64,
    pub(super) last_spawn_ms: f64,
    pub(super) cull_count: u64,
    pub(super) low_fps_since_ms: Option<f64>,
    pub(super) fps_throttled: bool,
}

impl CombatSim {
    /// Create an uninitialized simulation. Nothing spawns or moves until
    /// `init` accepts a configuration.
    pub fn new(seed: u64, clock: impl Clock + 'static) -> Self {
        Self {
            config: None,
            scaling: None,
            scheduler: None,
            clock: Box::new(clock),
            rng: Pcg32::seed_from_u64(seed),
            ctx: CombatContext::default(),
            enemies: Vec::new(),
            enemy_pool: Pool::new(Enemy::default, Enemy::reset),
            projectiles: Vec::new(),
            projectile_pool: Pool::new(Projectile::default, Projectile::reset),
            damage_numbers: Vec::new(),
            damage_number_pool: Pool::new(DamageNumber::default, DamageNumber::reset),
            boss: None,
            boss_spawned: false,
            regular_spawns_disabled: false,
            boss_defeated: false,
            on_boss_defeated: None,
            on_player_hit: None,
            pending: Vec::new(),
            events: Vec::new(),
            next_id: 1,
            spawns_per_sec: 0.0,
            last_spawn_ms: 0.0,
            cull_count: 0,
            low_fps_since_ms: None,
            fps_throttled: false,
        }
    }

    /// Allocate a new entity ID
    pub(super) fn next_entity_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(super) fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    /// Buffer a semantic event for the external sink
    pub(super) fn emit(&mut self, event: CombatEvent) {
        log::debug!("{:?}", event);
        if self.events.len() >= EVENT_BUFFER_CAP {
            return;
        }
        let at_ms = self.now_ms();
        self.events.push(EventRecord { at_ms, event });
    }

    pub fn config(&self) -> Option<&CombatConfig> {
        self.config.as_deref()
    }

    pub fn context(&self) -> &CombatContext {
        &self.ctx
    }

    /// Live hostiles, for rendering
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn enemy(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    /// Live projectiles of both sides
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn damage_numbers(&self) -> &[DamageNumber] {
        &self.damage_numbers
    }

    /// Take every event buffered since the last drain
    pub fn drain_events(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.events)
    }
}

impl fmt::Debug for CombatSim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombatSim")
            .field("ready", &self.config.is_some())
            .field("ctx", &self.ctx)
            .field("enemies", &self.enemies.len())
            .field("projectiles", &self.projectiles.len())
            .field("damage_numbers", &self.damage_numbers.len())
            .field("boss", &self.boss)
            .field("regular_spawns_disabled", &self.regular_spawns_disabled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let mut sim = CombatSim::new(1, ManualClock::new(0.0));
        let a = sim.next_entity_id();
        let b = sim.next_entity_id();
        assert!(b > a);
        assert_eq!(EnemyId(a).to_string(), format!("enemy-{a}"));
    }

    #[test]
    fn test_random_between_handles_degenerate_band() {
        let mut rng = Pcg32::seed_from_u64(5);
        assert_eq!(random_between(&mut rng, 3.0, 3.0), 3.0);
        assert_eq!(random_between(&mut rng, 3.0, 1.0), 3.0);
        for _ in 0..1000 {
            let v = random_between(&mut rng, -6.0, 6.0);
            assert!((-6.0..6.0).contains(&v));
        }
    }

    #[test]
    fn test_health_fraction() {
        let enemy = Enemy {
            max_health: BigNum::from_f64(200.0),
            health: BigNum::from_f64(50.0),
            ..Enemy::default()
        };
        assert!((enemy.health_fraction() - 0.25).abs() < 1e-9);

        let huge = Enemy {
            max_health: BigNum::from_parts(4.0, 900),
            health: BigNum::from_parts(1.0, 900),
            ..Enemy::default()
        };
        assert!((huge.health_fraction() - 0.25).abs() < 1e-9);

        let dead = Enemy {
            max_health: BigNum::from_f64(10.0),
            health: BigNum::from_f64(-3.0),
            ..Enemy::default()
        };
        assert_eq!(dead.health_fraction(), 0.0);
    }

    #[test]
    fn test_damage_number_reset_keeps_buffers() {
        let mut n = DamageNumber::default();
        n.amount.push_str("1.2K");
        let cap = n.amount.capacity();
        n.scale = 1.2;
        n.reset();
        assert!(n.amount.is_empty());
        assert_eq!(n.amount.capacity(), cap);
        assert_eq!(n.scale, 1.0);
    }

    #[test]
    fn test_uninitialized_sim_is_inert() {
        let mut sim = CombatSim::new(9, ManualClock::new(0.0));
        sim.emit(CombatEvent::PlayerHit {
            damage: "1".into(),
        });
        assert_eq!(sim.drain_events().len(), 1);
        assert!(sim.drain_events().is_empty());
        assert!(sim.config().is_none());
    }
}
