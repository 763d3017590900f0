//! Combat tuning configuration
//!
//! The simulation consumes one validated `CombatConfig`. Defaults are the
//! shipped tuning values; `validate` enforces the ranges the tuning file is
//! allowed to use.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must be within [{min}, {max}] (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{field}: max {max} is below min {min}")]
    InvertedBand {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Poisson arrival band for ordinary spawns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawningConfig {
    pub mean_interval_sec: f64,
    pub min_delta_sec: f64,
    pub max_delta_sec: f64,
}

impl Default for SpawningConfig {
    fn default() -> Self {
        Self {
            mean_interval_sec: 1.8,
            min_delta_sec: 0.6,
            max_delta_sec: 3.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementConfig {
    /// Base horizontal speed of a hostile (px/s)
    pub own_speed_px_per_s: f32,
    /// Random speed jitter, ± fraction of base speed
    pub jitter_percent: f32,
    /// Speed scale for hostiles spawned while the player reverses
    pub reverse_spawn_speed_scale: f32,
    /// Own-speed scale for advancing hostiles while the player reverses
    pub reverse_advance_scale: f32,
    /// Attack range as a fraction of combat-area width
    pub attack_range_frac: f32,
    pub arrival_epsilon_px: f32,
    /// Max |Δy| applied on reaching the stop point
    pub arrival_jiggle_px: f32,
    /// Entities closer than this on both axes get nudged apart
    pub overlap_tolerance_px: f32,
    /// Max |Δ| per axis of the de-clumping nudge
    pub overlap_nudge_px: f32,
    /// World scroll speed while traveling (px/s, positive = leftward)
    pub world_scroll_px_per_s: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            own_speed_px_per_s: 140.0,
            jitter_percent: 0.2,
            reverse_spawn_speed_scale: 0.9,
            reverse_advance_scale: 0.75,
            attack_range_frac: 0.28,
            arrival_epsilon_px: 2.0,
            arrival_jiggle_px: 6.0,
            overlap_tolerance_px: 5.0,
            overlap_nudge_px: 6.0,
            world_scroll_px_per_s: 44.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyShotConfig {
    pub speed_px_per_s: f32,
    pub lifetime_sec: f64,
    pub fire_interval_min_sec: f64,
    pub fire_interval_max_sec: f64,
}

impl Default for EnemyShotConfig {
    fn default() -> Self {
        Self {
            speed_px_per_s: 480.0,
            lifetime_sec: 2.5,
            fire_interval_min_sec: 0.85,
            fire_interval_max_sec: 1.35,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerShotConfig {
    pub speed_px_per_s: f32,
    pub lifetime_sec: f64,
    /// Pass-through hits granted to each new player shot
    pub chain_hits_max: u32,
}

impl Default for PlayerShotConfig {
    fn default() -> Self {
        Self {
            speed_px_per_s: 600.0,
            lifetime_sec: 3.0,
            chain_hits_max: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectilesConfig {
    pub enemy: EnemyShotConfig,
    pub player: PlayerShotConfig,
}

/// Live-count ceilings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapsConfig {
    pub enemies: usize,
    pub projectiles: usize,
    pub damage_numbers: usize,
}

impl Default for CapsConfig {
    fn default() -> Self {
        Self {
            enemies: 48,
            projectiles: 160,
            damage_numbers: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingConfig {
    /// Max health of a level-1 hostile
    pub base_health: f64,
    /// Damage of a level-1 hostile
    pub base_damage: f64,
    pub health_across_levels_mul: f64,
    pub damage_across_levels_mul: f64,
    /// Fraction of the next level's base reached at the end of a level
    pub within_level_end_ratio: f64,
    pub within_level_step_meters: f64,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            // 2.3 × player base damage (20)
            base_health: 46.0,
            // 0.08 × player base health (100)
            base_damage: 8.0,
            health_across_levels_mul: 1.18,
            damage_across_levels_mul: 1.12,
            within_level_end_ratio: 0.85,
            within_level_step_meters: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossConfig {
    /// Level whose midpoint summons the boss
    pub checkpoint_level: u32,
    /// Level progress (0..1) at which the boss appears
    pub checkpoint_progress: f64,
    pub health_mult: f64,
    pub damage_mult: f64,
    pub burst_shots: u32,
    pub burst_gap_ms: f64,
    pub fire_interval_min_sec: f64,
    pub fire_interval_max_sec: f64,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            checkpoint_level: 10,
            checkpoint_progress: 0.5,
            health_mult: 2.8,
            damage_mult: 2.0,
            burst_shots: 2,
            burst_gap_ms: 150.0,
            fire_interval_min_sec: 0.8,
            fire_interval_max_sec: 1.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HpBarConfig {
    pub visible_only_when_damaged: bool,
    pub hide_delay_at_full_sec: f64,
}

impl Default for HpBarConfig {
    fn default() -> Self {
        Self {
            visible_only_when_damaged: true,
            hide_delay_at_full_sec: 1.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageNumberConfig {
    /// Peak scale reached at the end of the pop phase
    pub pop_scale: f32,
    pub pop_duration_sec: f64,
    pub float_up_px: f32,
    /// Total lifetime; the number is gone once it is this old
    pub fade_duration_sec: f64,
    /// Numbers spawned within this window of another get jittered
    pub stack_window_ms: f64,
    pub offset_jitter_x: f32,
    pub offset_jitter_y: f32,
    /// Spawn height above a damaged hostile
    pub enemy_rise_px: f32,
    /// Spawn height above the dragon
    pub player_rise_px: f32,
    /// Tint for damage the player dealt to a hostile
    pub player_caused_color: String,
    /// Tint for damage a hostile dealt to the dragon
    pub enemy_caused_color: String,
}

impl Default for DamageNumberConfig {
    fn default() -> Self {
        Self {
            pop_scale: 1.2,
            pop_duration_sec: 0.12,
            float_up_px: 20.0,
            fade_duration_sec: 2.2,
            stack_window_ms: 250.0,
            offset_jitter_x: 8.0,
            offset_jitter_y: 6.0,
            enemy_rise_px: 10.0,
            player_rise_px: 20.0,
            player_caused_color: "#ffffff".to_string(),
            enemy_caused_color: "#ff4444".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    pub hp_bar: HpBarConfig,
    pub damage_numbers: DamageNumberConfig,
}

/// Spawn throttling under sustained low frame rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceConfig {
    pub fps_throttle_threshold: f64,
    pub fps_throttle_duration_ms: f64,
    /// Mean spawn interval is multiplied by this once throttled
    pub throttle_interval_factor: f64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            fps_throttle_threshold: 55.0,
            fps_throttle_duration_ms: 1000.0,
            throttle_interval_factor: 2.0,
        }
    }
}

/// Level lengths along the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelTrackConfig {
    pub level_base_km: f64,
    pub level_growth: f64,
    pub max_levels: u32,
    /// Per-level length overrides (km)
    #[serde(default)]
    pub overrides: BTreeMap<u32, f64>,
}

impl Default for LevelTrackConfig {
    fn default() -> Self {
        Self {
            level_base_km: 1.5,
            level_growth: 1.25,
            max_levels: 2000,
            overrides: BTreeMap::from([(1, 1.5), (2, 1.9), (10, 8.0)]),
        }
    }
}

/// Complete combat configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatConfig {
    pub spawning: SpawningConfig,
    pub movement: MovementConfig,
    pub projectiles: ProjectilesConfig,
    pub caps: CapsConfig,
    pub scaling: ScalingConfig,
    pub boss: BossConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub levels: LevelTrackConfig,
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn within(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

fn band(field: &'static str, min: f64, max: f64) -> Result<(), ConfigError> {
    if max >= min {
        Ok(())
    } else {
        Err(ConfigError::InvertedBand { field, min, max })
    }
}

impl CombatConfig {
    /// Parse and validate a JSON tuning file
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every tunable against its allowed range
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.spawning;
        positive("spawning.mean_interval_sec", s.mean_interval_sec)?;
        within("spawning.min_delta_sec", s.min_delta_sec, 0.0, f64::MAX)?;
        positive("spawning.max_delta_sec", s.max_delta_sec)?;
        band("spawning.delta_sec", s.min_delta_sec, s.max_delta_sec)?;

        let m = &self.movement;
        positive("movement.own_speed_px_per_s", f64::from(m.own_speed_px_per_s))?;
        within("movement.jitter_percent", f64::from(m.jitter_percent), 0.0, 0.5)?;
        within(
            "movement.reverse_spawn_speed_scale",
            f64::from(m.reverse_spawn_speed_scale),
            0.0,
            2.0,
        )?;
        within(
            "movement.reverse_advance_scale",
            f64::from(m.reverse_advance_scale),
            0.0,
            2.0,
        )?;
        within("movement.attack_range_frac", f64::from(m.attack_range_frac), 0.1, 0.9)?;
        within("movement.arrival_epsilon_px", f64::from(m.arrival_epsilon_px), 0.5, 10.0)?;
        within("movement.arrival_jiggle_px", f64::from(m.arrival_jiggle_px), 0.0, 50.0)?;
        within("movement.overlap_tolerance_px", f64::from(m.overlap_tolerance_px), 0.0, 50.0)?;
        within("movement.overlap_nudge_px", f64::from(m.overlap_nudge_px), 0.0, 50.0)?;
        within("movement.world_scroll_px_per_s", f64::from(m.world_scroll_px_per_s), 0.0, 10_000.0)?;

        let e = &self.projectiles.enemy;
        positive("projectiles.enemy.speed_px_per_s", f64::from(e.speed_px_per_s))?;
        positive("projectiles.enemy.lifetime_sec", e.lifetime_sec)?;
        positive("projectiles.enemy.fire_interval_min_sec", e.fire_interval_min_sec)?;
        band(
            "projectiles.enemy.fire_interval_sec",
            e.fire_interval_min_sec,
            e.fire_interval_max_sec,
        )?;
        let p = &self.projectiles.player;
        positive("projectiles.player.speed_px_per_s", f64::from(p.speed_px_per_s))?;
        positive("projectiles.player.lifetime_sec", p.lifetime_sec)?;
        within("projectiles.player.chain_hits_max", f64::from(p.chain_hits_max), 0.0, 8.0)?;

        let c = &self.caps;
        within("caps.enemies", c.enemies as f64, 1.0, 512.0)?;
        within("caps.projectiles", c.projectiles as f64, 1.0, 2048.0)?;
        within("caps.damage_numbers", c.damage_numbers as f64, 1.0, 2048.0)?;

        let sc = &self.scaling;
        positive("scaling.base_health", sc.base_health)?;
        positive("scaling.base_damage", sc.base_damage)?;
        within("scaling.health_across_levels_mul", sc.health_across_levels_mul, 1.01, 3.0)?;
        within("scaling.damage_across_levels_mul", sc.damage_across_levels_mul, 1.01, 3.0)?;
        within("scaling.within_level_end_ratio", sc.within_level_end_ratio, 0.3, 0.99)?;
        within("scaling.within_level_step_meters", sc.within_level_step_meters, 1.0, 50.0)?;

        let b = &self.boss;
        within("boss.checkpoint_level", f64::from(b.checkpoint_level), 1.0, f64::from(self.levels.max_levels))?;
        within("boss.checkpoint_progress", b.checkpoint_progress, 0.0, 1.0)?;
        within("boss.health_mult", b.health_mult, 1.0, 10.0)?;
        within("boss.damage_mult", b.damage_mult, 1.0, 10.0)?;
        within("boss.burst_shots", f64::from(b.burst_shots), 1.0, 5.0)?;
        within("boss.burst_gap_ms", b.burst_gap_ms, 50.0, 1000.0)?;
        positive("boss.fire_interval_min_sec", b.fire_interval_min_sec)?;
        band("boss.fire_interval_sec", b.fire_interval_min_sec, b.fire_interval_max_sec)?;

        let hp = &self.ui.hp_bar;
        within("ui.hp_bar.hide_delay_at_full_sec", hp.hide_delay_at_full_sec, 0.0, f64::MAX)?;
        let d = &self.ui.damage_numbers;
        positive("ui.damage_numbers.pop_scale", f64::from(d.pop_scale))?;
        positive("ui.damage_numbers.fade_duration_sec", d.fade_duration_sec)?;
        within(
            "ui.damage_numbers.pop_duration_sec",
            d.pop_duration_sec,
            0.0,
            d.fade_duration_sec,
        )?;
        within("ui.damage_numbers.stack_window_ms", d.stack_window_ms, 0.0, f64::MAX)?;
        within("ui.damage_numbers.offset_jitter_x", f64::from(d.offset_jitter_x), 0.0, f64::MAX)?;
        within("ui.damage_numbers.offset_jitter_y", f64::from(d.offset_jitter_y), 0.0, f64::MAX)?;

        let perf = &self.performance;
        positive("performance.fps_throttle_threshold", perf.fps_throttle_threshold)?;
        within("performance.fps_throttle_duration_ms", perf.fps_throttle_duration_ms, 0.0, f64::MAX)?;
        within("performance.throttle_interval_factor", perf.throttle_interval_factor, 1.0, 10.0)?;

        let l = &self.levels;
        positive("levels.level_base_km", l.level_base_km)?;
        within("levels.level_growth", l.level_growth, 1.0, 3.0)?;
        within("levels.max_levels", f64::from(l.max_levels), 1.0, 10_000.0)?;
        for km in l.overrides.values() {
            positive("levels.overrides", *km)?;
        }

        Ok(())
    }
}
