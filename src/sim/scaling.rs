//! Hostile stat scaling
//!
//! Stats grow geometrically between levels and in small compounding steps
//! within a level, so the end of level L lands at `end_ratio` of level L+1's
//! base instead of jumping at the boundary:
//!
//! ```text
//! base(L)     = base(1) × G^(L-1)
//! step_mul    = (end_ratio × G)^(1 / steps)     steps = floor(level_m / step_m)
//! value(L, m) = base(L) × step_mul^floor(m / step_m)
//! ```

use crate::config::ScalingConfig;
use crate::num::BigNum;
use crate::progression::LevelTrack;

/// Where along the run a hostile spawned
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingContext {
    pub level: u32,
    /// Cumulative run distance in meters
    pub distance: f64,
}

/// Health and damage of one hostile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub health: BigNum,
    pub damage: BigNum,
}

#[derive(Debug, Clone)]
pub struct ScalingEngine {
    config: ScalingConfig,
    track: LevelTrack,
}

impl ScalingEngine {
    pub fn new(config: ScalingConfig, track: LevelTrack) -> Self {
        Self { config, track }
    }

    pub fn track(&self) -> &LevelTrack {
        &self.track
    }

    /// Level-start value before any within-level steps
    fn level_base(base_at_level1: f64, across_levels_mul: f64, level: u32) -> BigNum {
        let growth = BigNum::from_f64(across_levels_mul).powf(f64::from(level.max(1) - 1));
        BigNum::from_f64(base_at_level1) * growth
    }

    /// Compounded within-level multiplier after `meters_into_level`
    pub fn step_multiplier(&self, level: u32, meters_into_level: f64, across_levels_mul: f64) -> f64 {
        let step = self.config.within_level_step_meters;
        if step <= 0.0 {
            return 1.0;
        }
        let steps = (self.track.level_length(level) / step).floor();
        if steps <= 0.0 {
            return 1.0;
        }
        let current = (meters_into_level.max(0.0) / step).floor().min(steps);
        let step_mul = (self.config.within_level_end_ratio * across_levels_mul).powf(1.0 / steps);
        step_mul.powf(current)
    }

    pub fn base_health(&self, level: u32) -> BigNum {
        Self::level_base(
            self.config.base_health,
            self.config.health_across_levels_mul,
            level,
        )
    }

    pub fn base_damage(&self, level: u32) -> BigNum {
        Self::level_base(
            self.config.base_damage,
            self.config.damage_across_levels_mul,
            level,
        )
    }

    /// Max health `meters_into_level` meters into `level`
    pub fn health_in_level(&self, level: u32, meters_into_level: f64) -> BigNum {
        let mul = self.step_multiplier(
            level,
            meters_into_level,
            self.config.health_across_levels_mul,
        );
        self.base_health(level) * mul
    }

    /// Damage `meters_into_level` meters into `level`
    pub fn damage_in_level(&self, level: u32, meters_into_level: f64) -> BigNum {
        let mul = self.step_multiplier(
            level,
            meters_into_level,
            self.config.damage_across_levels_mul,
        );
        self.base_damage(level) * mul
    }

    pub fn health(&self, ctx: ScalingContext) -> BigNum {
        let meters = self.track.meters_into_level(ctx.level, ctx.distance);
        self.health_in_level(ctx.level, meters)
    }

    pub fn damage(&self, ctx: ScalingContext) -> BigNum {
        let meters = self.track.meters_into_level(ctx.level, ctx.distance);
        self.damage_in_level(ctx.level, meters)
    }

    pub fn stats(&self, ctx: ScalingContext) -> Stats {
        Stats {
            health: self.health(ctx),
            damage: self.damage(ctx),
        }
    }

    /// Stats at the very end of `level`
    pub fn end_of_level_stats(&self, level: u32) -> Stats {
        let length = self.track.level_length(level);
        Stats {
            health: self.health_in_level(level, length),
            damage: self.damage_in_level(level, length),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LevelTrackConfig;

    fn engine() -> ScalingEngine {
        ScalingEngine::new(
            ScalingConfig::default(),
            LevelTrack::new(&LevelTrackConfig::default()),
        )
    }

    fn rel_err(a: BigNum, b: BigNum) -> f64 {
        ((a - b).to_f64() / b.to_f64()).abs()
    }

    #[test]
    fn test_level_one_start_is_base() {
        let e = engine();
        let stats = e.stats(ScalingContext {
            level: 1,
            distance: 0.0,
        });
        assert_eq!(stats.health.to_f64(), 46.0);
        assert_eq!(stats.damage.to_f64(), 8.0);
    }

    #[test]
    fn test_end_of_level_meets_next_base() {
        let e = engine();
        let cfg = ScalingConfig::default();
        for level in 1..=20 {
            let ctx = ScalingContext {
                level,
                distance: e.track().level_end(level),
            };
            let expected_hp = e.base_health(level + 1) * cfg.within_level_end_ratio;
            let expected_dmg = e.base_damage(level + 1) * cfg.within_level_end_ratio;
            assert!(rel_err(e.health(ctx), expected_hp) < 1e-3, "level {level} health");
            assert!(rel_err(e.damage(ctx), expected_dmg) < 1e-3, "level {level} damage");
        }
    }

    #[test]
    fn test_within_level_growth_is_monotonic() {
        let e = engine();
        let start = e.track().level_start(4);
        let mut last = BigNum::ZERO;
        for m in (0..=4000).step_by(250) {
            let hp = e.health(ScalingContext {
                level: 4,
                distance: start + f64::from(m),
            });
            assert!(hp >= last);
            last = hp;
        }
    }

    #[test]
    fn test_zero_steps_is_neutral() {
        let cfg = ScalingConfig {
            within_level_step_meters: 10_000_000.0,
            ..ScalingConfig::default()
        };
        let e = ScalingEngine::new(cfg, LevelTrack::new(&LevelTrackConfig::default()));
        assert_eq!(e.step_multiplier(3, 2000.0, 1.18), 1.0);
        assert_eq!(e.health_in_level(1, 1500.0).to_f64(), 46.0);
    }

    #[test]
    fn test_far_levels_stay_finite_and_ordered() {
        let e = engine();
        let l1500 = e.base_health(1500);
        let l2000 = e.base_health(2000);
        assert!(l1500.is_positive());
        assert!(l2000 > l1500);
        // 1.18^1999 ≈ 10^143.7
        assert_eq!(l2000.exponent(), 145);
    }
}
