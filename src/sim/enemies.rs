//! Hostile spawning, movement and lifecycle
//!
//! Each step a hostile re-aims at its stop point on the attack arc around the
//! dragon, closes on it, and parks there (`InRange`) to fire.

use glam::Vec2;
use rand::Rng;

use super::collision::{arc_stop_point, step_toward};
use super::scaling::ScalingContext;
use super::state::{
    CombatSim, DamageOutcome, DamageSource, DespawnReason, Enemy, EnemyId, EnemyKind, EnemyState,
    random_between,
};
use crate::config::{CombatConfig, MovementConfig};
use crate::consts::{ENEMY_CULL_MARGIN, SPAWN_EDGE_OFFSET, SPAWN_RATE_SMOOTHING};
use crate::num::BigNum;
use crate::telemetry::{CombatEvent, DeathCause};

impl CombatSim {
    /// Spawn one ordinary hostile now, bypassing the arrival scheduler.
    ///
    /// Still honors the travel gate, the boss lockout and the live ceiling;
    /// returns `None` when any of them refuses.
    pub fn try_spawn_enemy(&mut self) -> Option<EnemyId> {
        let config = self.config.clone()?;
        if !self.ctx.traveling
            || self.regular_spawns_disabled
            || self.enemies.len() >= config.caps.enemies
        {
            return None;
        }
        self.spawn_enemy(EnemyKind::BasicShooter, &config)
    }

    pub(super) fn spawn_enemy(&mut self, kind: EnemyKind, config: &CombatConfig) -> Option<EnemyId> {
        let scaling = self.scaling.clone()?;
        let now = self.now_ms();
        let id = EnemyId(self.next_entity_id());
        let ctx = self.ctx;
        let movement = &config.movement;

        let mut enemy = self.enemy_pool.acquire();
        enemy.id = id;
        enemy.kind = kind;
        enemy.state = EnemyState::Spawning;
        enemy.pos = Vec2::new(
            ctx.width + SPAWN_EDGE_OFFSET,
            self.rng.random::<f32>() * ctx.height,
        );
        enemy.target_stop = enemy.pos;

        let jitter = 1.0 + (self.rng.random::<f32>() - 0.5) * 2.0 * movement.jitter_percent;
        enemy.own_speed = movement.own_speed_px_per_s * jitter;
        if ctx.reversing {
            enemy.own_speed *= movement.reverse_spawn_speed_scale;
        }

        let stats = scaling.stats(ScalingContext {
            level: ctx.level,
            distance: ctx.distance,
        });
        enemy.max_health = stats.health;
        enemy.health = stats.health;
        enemy.damage = stats.damage;

        let fire = &config.projectiles.enemy;
        enemy.next_fire_delay_ms = random_between(
            &mut self.rng,
            fire.fire_interval_min_sec * 1000.0,
            fire.fire_interval_max_sec * 1000.0,
        );
        enemy.last_fire_ms = now;
        enemy.spawn_level = ctx.level;
        enemy.spawn_distance = ctx.distance;
        enemy.hp_bar_visible = !config.ui.hp_bar.visible_only_when_damaged;
        enemy.hp_bar_full_since_ms = None;

        let pos = enemy.pos;
        self.enemies.push(enemy);

        let since_last = (now - self.last_spawn_ms) / 1000.0;
        if since_last > 0.0 {
            self.spawns_per_sec = self.spawns_per_sec * (1.0 - SPAWN_RATE_SMOOTHING)
                + (1.0 / since_last) * SPAWN_RATE_SMOOTHING;
        }
        self.last_spawn_ms = now;

        self.emit(CombatEvent::EnemySpawn {
            enemy: id,
            kind,
            level: ctx.level,
            x: pos.x,
            y: pos.y,
        });
        Some(id)
    }

    /// Horizontal world scroll: leftward while traveling, rightward while
    /// reversing, still otherwise
    pub(super) fn world_scroll_speed(&self, movement: &MovementConfig) -> f32 {
        if self.ctx.reversing {
            -movement.world_scroll_px_per_s
        } else if self.ctx.traveling {
            movement.world_scroll_px_per_s
        } else {
            0.0
        }
    }

    pub(super) fn update_enemy_movement(&mut self, dt: f32, config: &CombatConfig) {
        let movement = &config.movement;
        let ctx = self.ctx;
        let scroll = self.world_scroll_speed(movement);
        let attack_range = movement.attack_range_frac * ctx.width;

        for i in (0..self.enemies.len()).rev() {
            let mut arrived = false;
            {
                let enemy = &mut self.enemies[i];
                if enemy.state == EnemyState::Dead {
                    continue;
                }

                if let Some(stop) = arc_stop_point(enemy.pos, ctx.anchor, attack_range) {
                    enemy.target_stop = stop;
                }
                let dist_to_stop = enemy.pos.distance(enemy.target_stop);

                if enemy.state == EnemyState::InRange && ctx.reversing {
                    // Parked attackers cannot be out-walked
                } else if dist_to_stop <= movement.arrival_epsilon_px {
                    if enemy.state != EnemyState::InRange {
                        enemy.state = EnemyState::InRange;
                        let jiggle = random_between(
                            &mut self.rng,
                            -f64::from(movement.arrival_jiggle_px),
                            f64::from(movement.arrival_jiggle_px),
                        ) as f32;
                        enemy.pos.y = (enemy.pos.y + jiggle).max(0.0).min(ctx.height.max(0.0));
                        arrived = true;
                    }
                } else {
                    enemy.state = EnemyState::Advance;
                    let own = if ctx.reversing {
                        enemy.own_speed * movement.reverse_advance_scale
                    } else {
                        enemy.own_speed
                    };
                    let step = (scroll + own) * dt;
                    enemy.pos = step_toward(enemy.pos, enemy.target_stop, step);
                }
            }

            if arrived {
                self.resolve_overlap(i, movement);
            }

            let x = self.enemies[i].pos.x;
            if x < -ENEMY_CULL_MARGIN || x > ctx.width + ENEMY_CULL_MARGIN {
                self.despawn_enemy(i, DespawnReason::Offscreen);
            }
        }
    }

    /// Nudge a fresh arrival off the first live hostile it sits on top of
    fn resolve_overlap(&mut self, index: usize, movement: &MovementConfig) {
        let Some(arrival) = self.enemies.get(index) else {
            return;
        };
        let (id, pos) = (arrival.id, arrival.pos);
        let tolerance = movement.overlap_tolerance_px;
        let clumped = self.enemies.iter().any(|other| {
            other.id != id
                && other.state != EnemyState::Dead
                && (other.pos.x - pos.x).abs() < tolerance
                && (other.pos.y - pos.y).abs() < tolerance
        });
        if !clumped {
            return;
        }

        let reach = f64::from(movement.overlap_nudge_px);
        let nudge = Vec2::new(
            random_between(&mut self.rng, -reach, reach) as f32,
            random_between(&mut self.rng, -reach, reach) as f32,
        );
        let bounds = self.ctx.size().max(Vec2::ZERO);
        let enemy = &mut self.enemies[index];
        enemy.pos = (enemy.pos + nudge).max(Vec2::ZERO).min(bounds);
    }

    /// Show bars on damage; hide them once health has sat at full long enough
    pub(super) fn update_hp_bars(&mut self, now: f64, config: &CombatConfig) {
        let bar = &config.ui.hp_bar;
        let hide_after_ms = bar.hide_delay_at_full_sec * 1000.0;
        for enemy in self.enemies.iter_mut().filter(|e| e.is_alive()) {
            if !bar.visible_only_when_damaged {
                enemy.hp_bar_visible = true;
                enemy.hp_bar_full_since_ms = None;
            } else if enemy.health < enemy.max_health {
                enemy.hp_bar_visible = true;
                enemy.hp_bar_full_since_ms = None;
            } else if enemy.hp_bar_visible {
                let since = *enemy.hp_bar_full_since_ms.get_or_insert(now);
                if now - since >= hide_after_ms {
                    enemy.hp_bar_visible = false;
                    enemy.hp_bar_full_since_ms = None;
                }
            }
        }
    }

    /// Fire every parked hostile whose attack timer has elapsed
    pub(super) fn update_enemy_attacks(&mut self, now: f64, config: &CombatConfig) {
        for i in 0..self.enemies.len() {
            let enemy = &self.enemies[i];
            if enemy.state != EnemyState::InRange
                || now - enemy.last_fire_ms < enemy.next_fire_delay_ms
            {
                continue;
            }
            let (id, pos, damage) = (enemy.id, enemy.pos, enemy.damage);
            let is_boss = self.boss == Some(id);

            let (min_sec, max_sec) = if is_boss {
                self.fire_boss_burst(id, pos, damage, now, config);
                (config.boss.fire_interval_min_sec, config.boss.fire_interval_max_sec)
            } else {
                self.spawn_enemy_projectile(pos, damage, config);
                (
                    config.projectiles.enemy.fire_interval_min_sec,
                    config.projectiles.enemy.fire_interval_max_sec,
                )
            };

            let delay = random_between(&mut self.rng, min_sec * 1000.0, max_sec * 1000.0);
            let enemy = &mut self.enemies[i];
            enemy.next_fire_delay_ms = delay;
            enemy.last_fire_ms = now;
        }
    }

    /// Apply damage to a live hostile.
    ///
    /// Unknown or already-dead ids are a no-op returning `DamageOutcome::NONE`.
    /// Health never rises above max, so negative amounts heal at most to full.
    pub fn damage_enemy(&mut self, id: EnemyId, amount: BigNum, caused_by_player: bool) -> DamageOutcome {
        let Some(config) = self.config.clone() else {
            return DamageOutcome::NONE;
        };
        let Some(index) = self.enemies.iter().position(|e| e.id == id && e.is_alive()) else {
            return DamageOutcome::NONE;
        };

        let enemy = &mut self.enemies[index];
        enemy.health = (enemy.health - amount).min(enemy.max_health);
        enemy.hp_bar_visible = true;
        let (pos, kind, health) = (enemy.pos, enemy.kind, enemy.health);

        let source = if caused_by_player {
            DamageSource::Player
        } else {
            DamageSource::Enemy
        };
        let rise = config.ui.damage_numbers.enemy_rise_px;
        self.spawn_damage_number(pos - Vec2::new(0.0, rise), amount, source);
        self.emit(CombatEvent::EnemyHit {
            enemy: id,
            kind,
            damage: amount.to_string(),
        });

        if health.is_positive() {
            return DamageOutcome::NONE;
        }

        let overkill = health.abs();
        self.enemies[index].state = EnemyState::Dead;
        self.despawn_enemy(
            index,
            DespawnReason::Killed {
                by_player: caused_by_player,
                overkill,
            },
        );
        DamageOutcome {
            killed: true,
            overkill,
        }
    }

    /// Remove the hostile at `index` from the live set and pool it
    pub(super) fn despawn_enemy(&mut self, index: usize, reason: DespawnReason) {
        if index >= self.enemies.len() {
            return;
        }
        let mut enemy: Enemy = self.enemies.swap_remove(index);
        enemy.state = EnemyState::Dead;
        let was_boss = self.boss == Some(enemy.id);

        let (cause, overkill) = match reason {
            DespawnReason::Killed { by_player, overkill } => {
                let cause = if by_player {
                    DeathCause::Player
                } else {
                    DeathCause::Other
                };
                (cause, overkill)
            }
            DespawnReason::Offscreen => {
                self.cull_count += 1;
                (DeathCause::Offscreen, BigNum::ZERO)
            }
        };
        self.emit(CombatEvent::EnemyDeath {
            enemy: enemy.id,
            kind: enemy.kind,
            cause,
            overkill: overkill.to_string(),
        });

        if was_boss {
            self.boss = None;
            if matches!(reason, DespawnReason::Killed { .. }) {
                self.handle_boss_death(enemy.id);
            } else {
                log::info!("Boss {} left the combat area", enemy.id);
            }
        }
        self.enemy_pool.release(enemy);
    }
}
