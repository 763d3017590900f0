//! Floating damage numbers
//!
//! Animation is a pure function of age: a short scale-up pop, then a linear
//! float-and-fade until the number expires.

use glam::Vec2;

use super::state::{CombatSim, DamageNumberId, DamageSource, random_between};
use crate::config::{CombatConfig, DamageNumberConfig};
use crate::num::BigNum;

/// Derived animation fields at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberFrame {
    pub scale: f32,
    /// Vertical offset from the spawn point (negative is up)
    pub rise: f32,
    pub opacity: f32,
}

/// Animation state of a number `age_sec` seconds after spawning
pub fn animate(age_sec: f64, config: &DamageNumberConfig) -> NumberFrame {
    let pop = config.pop_duration_sec;
    if pop > 0.0 && age_sec <= pop {
        let t = (age_sec.max(0.0) / pop) as f32;
        return NumberFrame {
            scale: 1.0 + (config.pop_scale - 1.0) * t,
            rise: 0.0,
            opacity: 1.0,
        };
    }

    let float_span = config.fade_duration_sec - pop;
    let t = if float_span > 0.0 {
        ((age_sec - pop) / float_span).clamp(0.0, 1.0) as f32
    } else {
        1.0
    };
    NumberFrame {
        scale: config.pop_scale,
        rise: -config.float_up_px * t,
        opacity: 1.0 - t,
    }
}

/// Short display form: `950`, `12.3K`, `4.56e7`
pub fn format_amount(amount: BigNum) -> String {
    let thousand = BigNum::from_f64(1000.0);
    let million = BigNum::from_f64(1_000_000.0);
    if amount < thousand {
        format!("{:.0}", amount.to_f64())
    } else if amount < million {
        format!("{:.1}K", amount.to_f64() / 1000.0)
    } else {
        amount.to_exponential(2)
    }
}

impl CombatSim {
    /// Raise a number at `at`. Dropped at the ceiling.
    pub(super) fn spawn_damage_number(
        &mut self,
        at: Vec2,
        amount: BigNum,
        source: DamageSource,
    ) -> Option<DamageNumberId> {
        let config = self.config.clone()?;
        if self.damage_numbers.len() >= config.caps.damage_numbers {
            return None;
        }
        let style = &config.ui.damage_numbers;
        let now = self.now_ms();

        // Only the newcomer is jittered; older numbers never move sideways
        let crowded = self
            .damage_numbers
            .iter()
            .any(|n| now - n.spawn_ms <= style.stack_window_ms);
        let offset = if crowded {
            let jx = f64::from(style.offset_jitter_x);
            let jy = f64::from(style.offset_jitter_y);
            Vec2::new(
                random_between(&mut self.rng, -jx, jx) as f32,
                random_between(&mut self.rng, -jy, jy) as f32,
            )
        } else {
            Vec2::ZERO
        };

        let id = DamageNumberId(self.next_entity_id());
        let mut number = self.damage_number_pool.acquire();
        number.id = id;
        number.source = source;
        number.spawn_ms = now;
        number.offset = offset;
        number.origin = at + offset;
        number.pos = number.origin;
        number.scale = 1.0;
        number.opacity = 1.0;
        number.amount.clear();
        number.amount.push_str(&format_amount(amount));
        number.color.clear();
        number.color.push_str(match source {
            DamageSource::Player => &style.player_caused_color,
            DamageSource::Enemy => &style.enemy_caused_color,
        });
        self.damage_numbers.push(number);
        Some(id)
    }

    pub(super) fn update_damage_numbers(&mut self, now: f64, config: &CombatConfig) {
        let style = &config.ui.damage_numbers;
        for i in (0..self.damage_numbers.len()).rev() {
            let number = &mut self.damage_numbers[i];
            let age_sec = (now - number.spawn_ms) / 1000.0;
            if age_sec >= style.fade_duration_sec {
                let expired = self.damage_numbers.swap_remove(i);
                self.damage_number_pool.release(expired);
                continue;
            }
            let frame = animate(age_sec, style);
            number.scale = frame.scale;
            number.opacity = frame.opacity;
            number.pos = number.origin + Vec2::new(0.0, frame.rise);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};

    fn ready_sim() -> (CombatSim, ManualClock) {
        let clock = ManualClock::new(0.0);
        let mut sim = CombatSim::new(31, clock.clone());
        sim.init(CombatConfig::default()).unwrap();
        (sim, clock)
    }

    #[test]
    fn test_animation_phases() {
        let cfg = DamageNumberConfig::default();
        let start = animate(0.0, &cfg);
        assert_eq!(start, NumberFrame { scale: 1.0, rise: 0.0, opacity: 1.0 });

        let mid_pop = animate(0.06, &cfg);
        assert!((mid_pop.scale - 1.1).abs() < 1e-5);

        let peak = animate(0.12, &cfg);
        assert!((peak.scale - 1.2).abs() < 1e-5);
        assert_eq!(peak.opacity, 1.0);

        let halfway = animate(0.12 + (2.2 - 0.12) / 2.0, &cfg);
        assert!((halfway.rise + 10.0).abs() < 1e-3);
        assert!((halfway.opacity - 0.5).abs() < 1e-3);

        let end = animate(2.2, &cfg);
        assert!(end.opacity.abs() < 1e-6);
    }

    #[test]
    fn test_animation_without_pop_phase() {
        let cfg = DamageNumberConfig {
            pop_duration_sec: 0.0,
            ..DamageNumberConfig::default()
        };
        let frame = animate(0.0, &cfg);
        assert_eq!(frame.scale, cfg.pop_scale);
        assert_eq!(frame.opacity, 1.0);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(BigNum::from_f64(15.0)), "15");
        assert_eq!(format_amount(BigNum::from_f64(999.0)), "999");
        assert_eq!(format_amount(BigNum::from_f64(1000.0)), "1.0K");
        assert_eq!(format_amount(BigNum::from_f64(12_345.0)), "12.3K");
        assert_eq!(format_amount(BigNum::from_f64(2_500_000.0)), "2.50e6");
        assert_eq!(format_amount(BigNum::from_parts(3.0, 450)), "3.00e450");
    }

    #[test]
    fn test_numbers_close_in_time_are_jittered() {
        let (mut sim, clock) = ready_sim();
        let at = Vec2::new(200.0, 200.0);
        sim.spawn_damage_number(at, BigNum::ONE, DamageSource::Player);
        clock.advance(100.0);
        sim.spawn_damage_number(at, BigNum::ONE, DamageSource::Player);

        let numbers = sim.damage_numbers();
        assert_eq!(numbers[0].offset, Vec2::ZERO);
        assert_eq!(numbers[0].origin, at);
        assert_ne!(numbers[1].origin, at);
        assert!(numbers[1].offset.x.abs() <= 8.0 && numbers[1].offset.y.abs() <= 6.0);
    }

    #[test]
    fn test_numbers_far_apart_are_not_jittered() {
        let (mut sim, clock) = ready_sim();
        let at = Vec2::new(200.0, 200.0);
        sim.spawn_damage_number(at, BigNum::ONE, DamageSource::Player);
        clock.advance(300.0);
        sim.spawn_damage_number(at, BigNum::ONE, DamageSource::Enemy);

        for number in sim.damage_numbers() {
            assert_eq!(number.offset, Vec2::ZERO);
            assert_eq!(number.origin, at);
        }
        assert_eq!(sim.damage_numbers()[0].color, "#ffffff");
        assert_eq!(sim.damage_numbers()[1].color, "#ff4444");
    }

    #[test]
    fn test_numbers_float_then_expire_into_pool() {
        let (mut sim, clock) = ready_sim();
        let config = CombatConfig::default();
        sim.spawn_damage_number(Vec2::new(50.0, 80.0), BigNum::ONE, DamageSource::Player);

        clock.advance(1160.0);
        sim.update_damage_numbers(clock.now_ms(), &config);
        let number = &sim.damage_numbers()[0];
        assert!((number.pos.y - 70.0).abs() < 1e-3);
        assert!((number.opacity - 0.5).abs() < 1e-3);

        clock.advance(1040.0);
        sim.update_damage_numbers(clock.now_ms(), &config);
        assert!(sim.damage_numbers().is_empty());
        assert_eq!(sim.damage_number_pool.free_len(), 1);
    }

    #[test]
    fn test_ceiling_drops_numbers() {
        let (mut sim, _) = ready_sim();
        for _ in 0..130 {
            sim.spawn_damage_number(Vec2::ZERO, BigNum::ONE, DamageSource::Player);
        }
        assert_eq!(sim.damage_numbers().len(), 120);
    }
}
