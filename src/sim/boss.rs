//! Checkpoint boss
//!
//! The boss is an ordinary hostile with boosted end-of-level stats, its own
//! fire band and a multi-shot burst. Once it appears, ordinary arrivals stay
//! off for the rest of the run.

use glam::Vec2;

use super::state::{
    CombatSim, Enemy, EnemyId, EnemyKind, EnemyState, PendingAction, PendingKind, random_between,
};
use crate::config::CombatConfig;
use crate::consts::SPAWN_EDGE_OFFSET;
use crate::num::BigNum;
use crate::telemetry::CombatEvent;

impl CombatSim {
    /// True when the run sits at or past the boss point of the checkpoint
    /// level and no boss has appeared yet
    pub(super) fn boss_checkpoint_reached(&self, config: &CombatConfig) -> bool {
        if self.boss_spawned || self.ctx.level != config.boss.checkpoint_level {
            return false;
        }
        let Some(scaling) = self.scaling.as_ref() else {
            return false;
        };
        scaling.track().level_progress(self.ctx.level, self.ctx.distance)
            >= config.boss.checkpoint_progress
    }

    /// Summon the boss at the spawn edge and shut off ordinary arrivals.
    ///
    /// Only the first call per run succeeds.
    pub fn spawn_boss(&mut self) -> Option<EnemyId> {
        let config = self.config.clone()?;
        let scaling = self.scaling.clone()?;
        if self.boss_spawned {
            return None;
        }
        let now = self.now_ms();
        let ctx = self.ctx;
        let boss_cfg = &config.boss;
        let id = EnemyId(self.next_entity_id());

        let base = scaling.end_of_level_stats(ctx.level);
        let health = base.health * boss_cfg.health_mult;
        let damage = base.damage * boss_cfg.damage_mult;

        let mut boss = self.enemy_pool.acquire();
        boss.id = id;
        boss.kind = EnemyKind::BasicShooter;
        boss.state = EnemyState::Spawning;
        boss.pos = Vec2::new(ctx.width + SPAWN_EDGE_OFFSET, ctx.height / 2.0);
        boss.target_stop = boss.pos;
        // No jitter and no reverse scaling
        boss.own_speed = config.movement.own_speed_px_per_s;
        boss.max_health = health;
        boss.health = health;
        boss.damage = damage;
        boss.next_fire_delay_ms = random_between(
            &mut self.rng,
            boss_cfg.fire_interval_min_sec * 1000.0,
            boss_cfg.fire_interval_max_sec * 1000.0,
        );
        boss.last_fire_ms = now;
        boss.spawn_level = ctx.level;
        boss.spawn_distance = ctx.distance;
        boss.hp_bar_visible = !config.ui.hp_bar.visible_only_when_damaged;
        self.enemies.push(boss);

        self.boss = Some(id);
        self.boss_spawned = true;
        self.regular_spawns_disabled = true;

        log::info!("Boss {} spawned at level {}: hp={}, damage={}", id, ctx.level, health, damage);
        self.emit(CombatEvent::BossSpawn {
            enemy: id,
            health: health.to_string(),
            damage: damage.to_string(),
        });
        Some(id)
    }

    /// First shot now, the rest queued `burst_gap_ms` apart
    pub(super) fn fire_boss_burst(
        &mut self,
        boss: EnemyId,
        pos: Vec2,
        damage: BigNum,
        now: f64,
        config: &CombatConfig,
    ) {
        self.spawn_enemy_projectile(pos, damage, config);
        for k in 1..config.boss.burst_shots {
            self.pending.push(PendingAction {
                due_ms: now + config.boss.burst_gap_ms * f64::from(k),
                kind: PendingKind::BossShot { boss },
            });
        }
    }

    /// Run queued actions that are due. A queued boss shot whose boss is gone
    /// or no longer in range does nothing.
    pub(super) fn run_pending_actions(&mut self, now: f64, config: &CombatConfig) {
        if self.pending.is_empty() {
            return;
        }
        let (due, later): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|a| a.due_ms <= now);
        self.pending = later;

        for action in due {
            match action.kind {
                PendingKind::BossShot { boss } => {
                    let shooter = self
                        .enemies
                        .iter()
                        .find(|e| e.id == boss && e.state == EnemyState::InRange)
                        .map(|e| (e.pos, e.damage));
                    if let Some((pos, damage)) = shooter {
                        self.spawn_enemy_projectile(pos, damage, config);
                    }
                }
            }
        }
    }

    pub(super) fn handle_boss_death(&mut self, id: EnemyId) {
        self.regular_spawns_disabled = true;
        if self.boss_defeated {
            return;
        }
        self.boss_defeated = true;
        log::info!("Boss {} defeated", id);
        self.emit(CombatEvent::BossDeath { enemy: id });
        if let Some(callback) = self.on_boss_defeated.as_mut() {
            callback();
        }
    }

    /// Register the single boss-defeated callback, replacing any earlier one
    pub fn set_boss_defeated_callback(&mut self, callback: impl FnMut() + 'static) {
        self.on_boss_defeated = Some(Box::new(callback));
    }

    pub fn is_boss_active(&self) -> bool {
        self.boss.is_some()
    }

    /// The live boss, if any
    pub fn boss(&self) -> Option<&Enemy> {
        self.boss.and_then(|id| self.enemy(id))
    }

    /// True once ordinary arrivals are shut off for this run
    pub fn spawns_disabled(&self) -> bool {
        self.regular_spawns_disabled
    }
}
