//! Level track: where each level starts and how long it is
//!
//! The outer progression system owns distance→level leveling; combat only
//! needs the geometry to know how far into a level a spawn happened.

use crate::config::LevelTrackConfig;

/// Precomputed level lengths and cumulative starts, in meters
#[derive(Debug, Clone)]
pub struct LevelTrack {
    /// `lengths[i]` is the length of level `i + 1`
    lengths: Vec<f64>,
    /// `ends[i]` is the cumulative distance at the end of level `i + 1`
    ends: Vec<f64>,
}

impl LevelTrack {
    pub fn new(config: &LevelTrackConfig) -> Self {
        let count = config.max_levels.max(1) as usize;
        let mut lengths = Vec::with_capacity(count);
        let mut ends = Vec::with_capacity(count);
        let mut total = 0.0;
        for level in 1..=count as u32 {
            let km = config.overrides.get(&level).copied().unwrap_or_else(|| {
                config.level_base_km * config.level_growth.powi(level as i32 - 1)
            });
            let meters = km * 1000.0;
            total += meters;
            lengths.push(meters);
            ends.push(total);
        }
        Self { lengths, ends }
    }

    pub fn max_level(&self) -> u32 {
        self.lengths.len() as u32
    }

    #[inline]
    fn index(&self, level: u32) -> usize {
        (level.max(1) as usize - 1).min(self.lengths.len() - 1)
    }

    /// Length of a level in meters
    pub fn level_length(&self, level: u32) -> f64 {
        self.lengths[self.index(level)]
    }

    /// Cumulative distance at which a level begins
    pub fn level_start(&self, level: u32) -> f64 {
        let i = self.index(level);
        if i == 0 { 0.0 } else { self.ends[i - 1] }
    }

    /// Cumulative distance at which a level ends
    pub fn level_end(&self, level: u32) -> f64 {
        self.ends[self.index(level)]
    }

    /// Meters traveled inside `level`, clamped to the level's extent
    pub fn meters_into_level(&self, level: u32, distance: f64) -> f64 {
        (distance - self.level_start(level)).clamp(0.0, self.level_length(level))
    }

    /// Progress through `level` in `[0, 1]`
    pub fn level_progress(&self, level: u32, distance: f64) -> f64 {
        let length = self.level_length(level);
        if length <= 0.0 {
            return 1.0;
        }
        self.meters_into_level(level, distance) / length
    }

    /// Level containing a cumulative distance (1-based, capped at the last level)
    pub fn level_for_distance(&self, distance: f64) -> u32 {
        if distance <= 0.0 {
            return 1;
        }
        let i = self.ends.partition_point(|&end| end <= distance);
        (i as u32 + 1).min(self.max_level())
    }
}
