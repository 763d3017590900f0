//! Shots from both sides
//!
//! Enemy shots only test the dragon; player shots test hostiles in list order
//! and may pass through kills while they have chain hits left.

use glam::Vec2;

use super::collision::{circles_overlap, direction_to, outside_area};
use super::state::{CombatSim, DamageSource, EnemyState, ProjectileDespawnReason, ProjectileId, Side};
use crate::config::CombatConfig;
use crate::consts::{DRAGON_RADIUS, ENEMY_RADIUS, PROJECTILE_CULL_MARGIN, PROJECTILE_RADIUS};
use crate::num::BigNum;
use crate::telemetry::CombatEvent;

/// Launch parameters shared by both sides
struct Launch {
    side: Side,
    start: Vec2,
    target: Vec2,
    speed: f32,
    lifetime_sec: f64,
    chain_hits: u32,
    damage: BigNum,
}

impl CombatSim {
    /// Fire a player shot from `start` toward `target` carrying `damage`.
    ///
    /// Dropped silently (returns `None`) when uninitialized or at the
    /// projectile ceiling.
    pub fn spawn_player_projectile(
        &mut self,
        start: Vec2,
        target: Vec2,
        damage: BigNum,
    ) -> Option<ProjectileId> {
        let config = self.config.clone()?;
        let player = &config.projectiles.player;
        self.launch(
            Launch {
                side: Side::Player,
                start,
                target,
                speed: player.speed_px_per_s,
                lifetime_sec: player.lifetime_sec,
                chain_hits: player.chain_hits_max,
                damage,
            },
            &config,
        )
    }

    /// Fire an enemy shot from `from` at the dragon
    pub(super) fn spawn_enemy_projectile(
        &mut self,
        from: Vec2,
        damage: BigNum,
        config: &CombatConfig,
    ) -> Option<ProjectileId> {
        let enemy = &config.projectiles.enemy;
        self.launch(
            Launch {
                side: Side::Enemy,
                start: from,
                target: self.ctx.anchor,
                speed: enemy.speed_px_per_s,
                lifetime_sec: enemy.lifetime_sec,
                chain_hits: 0,
                damage,
            },
            config,
        )
    }

    fn launch(&mut self, launch: Launch, config: &CombatConfig) -> Option<ProjectileId> {
        if self.projectiles.len() >= config.caps.projectiles {
            return None;
        }
        let now = self.now_ms();
        let id = ProjectileId(self.next_entity_id());

        let mut shot = self.projectile_pool.acquire();
        shot.id = id;
        shot.side = launch.side;
        shot.pos = launch.start;
        // A shot aimed at its own origin sits still until it times out
        shot.vel = direction_to(launch.start, launch.target).unwrap_or(Vec2::ZERO) * launch.speed;
        shot.spawn_ms = now;
        shot.lifetime_sec = launch.lifetime_sec;
        shot.chain_hits_remaining = launch.chain_hits;
        shot.damage = launch.damage;
        self.projectiles.push(shot);

        self.emit(CombatEvent::ProjectileSpawn { side: launch.side });
        Some(id)
    }

    /// Age, move, cull and resolve every live shot
    pub(super) fn update_projectiles(&mut self, dt: f32, now: f64) {
        let size = self.ctx.size();
        let anchor = self.ctx.anchor;

        for i in (0..self.projectiles.len()).rev() {
            let shot = &mut self.projectiles[i];
            let age_sec = (now - shot.spawn_ms) / 1000.0;
            if age_sec >= shot.lifetime_sec {
                self.despawn_projectile(i, ProjectileDespawnReason::Timeout);
                continue;
            }

            shot.pos += shot.vel * dt;
            if outside_area(shot.pos, size, PROJECTILE_CULL_MARGIN) {
                self.despawn_projectile(i, ProjectileDespawnReason::Offscreen);
                continue;
            }

            let (side, pos, damage) = (shot.side, shot.pos, shot.damage);
            match side {
                Side::Enemy => {
                    if circles_overlap(pos, PROJECTILE_RADIUS, anchor, DRAGON_RADIUS) {
                        self.damage_player(damage);
                        self.despawn_projectile(i, ProjectileDespawnReason::Hit);
                    }
                }
                Side::Player => {
                    let target = self.enemies.iter().find(|e| {
                        e.state != EnemyState::Dead
                            && circles_overlap(pos, PROJECTILE_RADIUS, e.pos, ENEMY_RADIUS)
                    });
                    let Some(target) = target.map(|e| e.id) else {
                        continue;
                    };
                    let outcome = self.damage_enemy(target, damage, true);
                    let shot = &mut self.projectiles[i];
                    if outcome.killed && shot.chain_hits_remaining > 0 {
                        // Keeps its trajectory toward the next hostile
                        shot.chain_hits_remaining -= 1;
                    } else {
                        self.despawn_projectile(i, ProjectileDespawnReason::Hit);
                    }
                }
            }
        }
    }

    fn despawn_projectile(&mut self, index: usize, reason: ProjectileDespawnReason) {
        if index >= self.projectiles.len() {
            return;
        }
        let shot = self.projectiles.swap_remove(index);
        let side = shot.side;
        self.projectile_pool.release(shot);
        self.emit(CombatEvent::ProjectileDespawn { side, reason });
    }

    /// Record a hit on the dragon. The outer simulation owns the dragon's
    /// health and learns the amount through the player-hit callback.
    pub fn damage_player(&mut self, amount: BigNum) {
        let Some(config) = self.config.clone() else {
            return;
        };
        let rise = config.ui.damage_numbers.player_rise_px;
        let at = self.ctx.anchor - Vec2::new(0.0, rise);
        self.spawn_damage_number(at, amount, DamageSource::Enemy);
        self.emit(CombatEvent::PlayerHit {
            damage: amount.to_string(),
        });
        if let Some(callback) = self.on_player_hit.as_mut() {
            callback(amount);
        }
    }

    /// Register the single player-hit callback, replacing any earlier one
    pub fn set_player_hit_callback(&mut self, callback: impl FnMut(BigNum) + 'static) {
        self.on_player_hit = Some(Box::new(callback));
    }
}
