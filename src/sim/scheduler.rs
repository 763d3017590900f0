//! Poisson arrival scheduler
//!
//! Inter-arrival times are exponential with rate `λ = 1 / mean`, clamped to a
//! band so spawns never burst or dry up beyond the configured limits.

use rand::Rng;

use crate::config::SpawningConfig;

#[derive(Debug, Clone)]
pub struct ArrivalScheduler {
    /// Arrivals per second
    lambda: f64,
    min_delta_sec: f64,
    max_delta_sec: f64,
    pub(crate) next_spawn_ms: f64,
}

impl ArrivalScheduler {
    /// Build and draw the first arrival relative to `now_ms`
    pub fn new<R: Rng>(config: &SpawningConfig, now_ms: f64, rng: &mut R) -> Self {
        let mut scheduler = Self {
            lambda: 1.0 / config.mean_interval_sec,
            min_delta_sec: config.min_delta_sec,
            max_delta_sec: config.max_delta_sec,
            next_spawn_ms: now_ms,
        };
        scheduler.schedule_next(now_ms, rng);
        scheduler
    }

    /// One clamped exponential draw, in seconds
    pub fn draw_delta_sec<R: Rng>(&self, rng: &mut R) -> f64 {
        // U in (0, 1] so ln(U) is finite
        let u = 1.0 - rng.random::<f64>();
        let delta = -u.ln() / self.lambda;
        delta.clamp(self.min_delta_sec, self.max_delta_sec)
    }

    fn schedule_next<R: Rng>(&mut self, now_ms: f64, rng: &mut R) {
        self.next_spawn_ms = now_ms + self.draw_delta_sec(rng) * 1000.0;
    }

    /// True once per due arrival; redraws the next arrival when it fires
    pub fn should_spawn<R: Rng>(&mut self, now_ms: f64, rng: &mut R) -> bool {
        if now_ms >= self.next_spawn_ms {
            self.schedule_next(now_ms, rng);
            true
        } else {
            false
        }
    }

    /// Stretch the mean interval by `factor` (λ is divided by it)
    pub fn throttle(&mut self, factor: f64) {
        if factor > 0.0 && factor.is_finite() {
            self.lambda /= factor;
        }
    }

    pub fn mean_interval_sec(&self) -> f64 {
        1.0 / self.lambda
    }

    pub fn next_spawn_ms(&self) -> f64 {
        self.next_spawn_ms
    }
}
