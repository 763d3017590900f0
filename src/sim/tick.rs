//! Per-frame simulation step
//!
//! Order within one `update`: queued actions, arrivals (and the boss
//! checkpoint), movement, HP bars, enemy fire, projectiles, damage numbers.

use std::rc::Rc;

use super::scaling::ScalingEngine;
use super::scheduler::ArrivalScheduler;
use super::state::{CombatContext, CombatSim, DebugSnapshot, EnemyKind, EnemyState, PoolStats};
use crate::config::{CombatConfig, ConfigError};
use crate::progression::LevelTrack;
use crate::telemetry::CombatEvent;

impl CombatSim {
    /// Install a configuration. An invalid one is refused and the simulation
    /// keeps its previous state.
    pub fn init(&mut self, config: CombatConfig) -> Result<(), ConfigError> {
        if let Err(err) = config.validate() {
            log::warn!("Rejected combat config: {}", err);
            return Err(err);
        }
        let now = self.now_ms();
        let track = LevelTrack::new(&config.levels);
        self.scheduler = Some(ArrivalScheduler::new(&config.spawning, now, &mut self.rng));
        self.scaling = Some(Rc::new(ScalingEngine::new(config.scaling.clone(), track)));
        self.last_spawn_ms = now;
        log::info!(
            "Combat initialized: mean spawn interval {}s, caps {}/{}/{}",
            config.spawning.mean_interval_sec,
            config.caps.enemies,
            config.caps.projectiles,
            config.caps.damage_numbers
        );
        self.config = Some(Rc::new(config));
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.config.is_some() && self.scheduler.is_some() && self.scaling.is_some()
    }

    /// Feed the outer simulation's view of the world for the coming steps.
    /// A negative or NaN area size is read as zero.
    pub fn set_context(&mut self, ctx: CombatContext) {
        self.ctx = CombatContext {
            width: ctx.width.max(0.0),
            height: ctx.height.max(0.0),
            ..ctx
        };
    }

    /// Advance everything by one frame of `delta_ms` milliseconds
    pub fn update(&mut self, delta_ms: f64) {
        let Some(config) = self.config.clone() else {
            return;
        };
        let now = self.now_ms();
        let dt = (delta_ms.max(0.0) / 1000.0) as f32;

        self.run_pending_actions(now, &config);
        self.update_spawning(now, &config);
        self.update_enemy_movement(dt, &config);
        self.update_hp_bars(now, &config);
        self.update_enemy_attacks(now, &config);
        self.update_projectiles(dt, now);
        self.update_damage_numbers(now, &config);
    }

    fn update_spawning(&mut self, now: f64, config: &CombatConfig) {
        if !self.ctx.traveling {
            return;
        }
        if self.boss_checkpoint_reached(config) {
            self.spawn_boss();
            return;
        }
        if self.regular_spawns_disabled {
            return;
        }
        let due = match self.scheduler.as_mut() {
            Some(scheduler) => scheduler.should_spawn(now, &mut self.rng),
            None => false,
        };
        if due && self.enemies.len() < config.caps.enemies {
            self.spawn_enemy(EnemyKind::BasicShooter, config);
        }
    }

    /// Drain every live list back into its pool and reset boss state.
    /// Queued burst shots are dropped.
    pub fn clear_all(&mut self) {
        for enemy in self.enemies.drain(..) {
            self.enemy_pool.release(enemy);
        }
        for shot in self.projectiles.drain(..) {
            self.projectile_pool.release(shot);
        }
        for number in self.damage_numbers.drain(..) {
            self.damage_number_pool.release(number);
        }
        self.pending.clear();
        self.boss = None;
        self.boss_spawned = false;
        self.boss_defeated = false;
        self.regular_spawns_disabled = false;
        log::info!("Combat cleared");
    }

    /// Stretch the mean arrival interval by `factor`
    pub fn throttle_spawns(&mut self, factor: f64) {
        if let Some(scheduler) = self.scheduler.as_mut() {
            scheduler.throttle(factor);
            log::info!(
                "Spawn rate throttled x{}: mean interval now {:.2}s",
                factor,
                scheduler.mean_interval_sec()
            );
        }
    }

    /// Report the renderer's frame rate. A drop below the threshold that lasts
    /// the configured duration throttles arrivals once until it recovers.
    pub fn report_frame_rate(&mut self, fps: f64) {
        let Some(config) = self.config.clone() else {
            return;
        };
        let perf = &config.performance;
        let now = self.now_ms();

        if fps >= perf.fps_throttle_threshold {
            self.low_fps_since_ms = None;
            self.fps_throttled = false;
            return;
        }
        let since = *self.low_fps_since_ms.get_or_insert(now);
        let sustained_ms = now - since;
        if !self.fps_throttled && sustained_ms >= perf.fps_throttle_duration_ms {
            self.fps_throttled = true;
            self.throttle_spawns(perf.throttle_interval_factor);
            self.emit(CombatEvent::FpsDrop { fps, sustained_ms });
        }
    }

    pub fn debug_snapshot(&self) -> DebugSnapshot {
        DebugSnapshot {
            active_enemies: self.enemies.len(),
            active_projectiles: self.projectiles.len(),
            active_damage_numbers: self.damage_numbers.len(),
            in_range: self
                .enemies
                .iter()
                .filter(|e| e.state == EnemyState::InRange)
                .count(),
            spawns_per_sec: self.spawns_per_sec,
            cull_count: self.cull_count,
            enemy_pool: PoolStats {
                free: self.enemy_pool.free_len(),
                created: self.enemy_pool.created(),
            },
            projectile_pool: PoolStats {
                free: self.projectile_pool.free_len(),
                created: self.projectile_pool.created(),
            },
            damage_number_pool: PoolStats {
                free: self.damage_number_pool.free_len(),
                created: self.damage_number_pool.created(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::num::BigNum;
    use crate::sim::scaling::ScalingContext;
    use glam::Vec2;

    fn traveling() -> CombatContext {
        CombatContext {
            traveling: true,
            ..CombatContext::default()
        }
    }

    fn ready_sim(seed: u64) -> (CombatSim, ManualClock) {
        let clock = ManualClock::new(0.0);
        let mut sim = CombatSim::new(seed, clock.clone());
        sim.init(CombatConfig::default()).unwrap();
        sim.set_context(traveling());
        (sim, clock)
    }

    #[test]
    fn test_uninitialized_update_is_noop() {
        let clock = ManualClock::new(0.0);
        let mut sim = CombatSim::new(1, clock.clone());
        sim.set_context(traveling());
        for _ in 0..100 {
            clock.advance(100.0);
            sim.update(100.0);
        }
        assert!(!sim.is_ready());
        assert!(sim.enemies().is_empty());
        assert!(sim.spawn_player_projectile(Vec2::ZERO, Vec2::X, BigNum::ONE).is_none());
        assert!(sim.spawn_boss().is_none());
        sim.damage_player(BigNum::ONE);
        assert!(sim.damage_numbers().is_empty());
    }

    #[test]
    fn test_invalid_config_is_refused() {
        let mut sim = CombatSim::new(1, ManualClock::new(0.0));
        let mut config = CombatConfig::default();
        config.caps.enemies = 0;
        assert!(sim.init(config).is_err());
        assert!(!sim.is_ready());
    }

    #[test]
    fn test_due_scheduler_spawns_exactly_one() {
        let (mut sim, clock) = ready_sim(2);
        sim.set_context(CombatContext {
            level: 2,
            distance: 2100.0,
            ..traveling()
        });
        let due = sim.scheduler.as_ref().unwrap().next_spawn_ms();
        clock.set(due);

        sim.update_spawning(clock.now_ms(), &CombatConfig::default());
        assert_eq!(sim.enemies().len(), 1);
        let enemy = &sim.enemies()[0];
        assert_eq!(enemy.state, EnemyState::Spawning);
        let expected = sim.scaling.as_ref().unwrap().stats(ScalingContext {
            level: 2,
            distance: 2100.0,
        });
        assert_eq!(enemy.max_health, expected.health);
        assert_eq!(enemy.damage, expected.damage);
        assert_eq!(sim.debug_snapshot().enemy_pool.created, 1);
    }

    #[test]
    fn test_no_spawns_while_stopped() {
        let (mut sim, clock) = ready_sim(3);
        sim.set_context(CombatContext::default());
        for _ in 0..200 {
            clock.advance(50.0);
            sim.update(50.0);
        }
        assert!(sim.enemies().is_empty());
    }

    #[test]
    fn test_traveling_session_spawns_and_pools_recycle() {
        let (mut sim, clock) = ready_sim(4);
        for step in 0..6000 {
            clock.advance(16.0);
            sim.update(16.0);
            // Clear the field now and then so pooled objects come back
            if step % 1000 == 999 {
                sim.clear_all();
            }
        }
        let snap = sim.debug_snapshot();
        assert!(snap.spawns_per_sec > 0.0);
        assert!(snap.enemy_pool.created <= CombatConfig::default().caps.enemies);
        assert!(snap.enemy_pool.free + snap.active_enemies == snap.enemy_pool.created);
    }

    #[test]
    fn test_clear_all_drains_everything_into_pools() {
        let (mut sim, _) = ready_sim(5);
        sim.try_spawn_enemy().unwrap();
        sim.try_spawn_enemy().unwrap();
        sim.spawn_player_projectile(Vec2::ZERO, Vec2::X, BigNum::ONE);
        sim.damage_player(BigNum::ONE);
        sim.spawn_boss().unwrap();

        sim.clear_all();
        let snap = sim.debug_snapshot();
        assert_eq!(snap.active_enemies, 0);
        assert_eq!(snap.active_projectiles, 0);
        assert_eq!(snap.active_damage_numbers, 0);
        assert_eq!(snap.enemy_pool.free, 3);
        assert_eq!(snap.projectile_pool.free, 1);
        assert_eq!(snap.damage_number_pool.free, 1);
        assert!(sim.spawn_boss().is_some());
    }

    #[test]
    fn test_sustained_low_fps_throttles_once() {
        let (mut sim, clock) = ready_sim(6);
        let before = sim.scheduler.as_ref().unwrap().mean_interval_sec();

        sim.report_frame_rate(40.0);
        clock.advance(999.0);
        sim.report_frame_rate(40.0);
        assert_eq!(sim.scheduler.as_ref().unwrap().mean_interval_sec(), before);

        clock.advance(1.0);
        sim.report_frame_rate(40.0);
        clock.advance(500.0);
        sim.report_frame_rate(40.0);
        let after = sim.scheduler.as_ref().unwrap().mean_interval_sec();
        assert!((after - before * 2.0).abs() < 1e-9);

        let drops = sim
            .drain_events()
            .iter()
            .filter(|r| matches!(r.event, CombatEvent::FpsDrop { .. }))
            .count();
        assert_eq!(drops, 1);

        // A brief recovery re-arms the detector
        sim.report_frame_rate(60.0);
        assert!(sim.low_fps_since_ms.is_none());
    }

    #[test]
    fn test_same_seed_same_run() {
        fn run(seed: u64) -> Vec<(u64, Vec2)> {
            let (mut sim, clock) = ready_sim(seed);
            for _ in 0..1500 {
                clock.advance(16.0);
                sim.update(16.0);
            }
            sim.enemies().iter().map(|e| (e.id.0, e.pos)).collect()
        }
        let a = run(77);
        assert!(!a.is_empty());
        assert_eq!(a, run(77));
    }
}
