//! Semantic combat events
//!
//! The simulation only records what happened; shipping the records somewhere
//! is up to the caller. Amounts are rendered as decimal strings so arbitrarily
//! large values survive JSON.

use serde::Serialize;

use crate::sim::state::{EnemyId, EnemyKind, ProjectileDespawnReason, Side};

/// What ended a hostile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Player,
    Other,
    Offscreen,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CombatEvent {
    EnemySpawn {
        enemy: EnemyId,
        kind: EnemyKind,
        level: u32,
        x: f32,
        y: f32,
    },
    EnemyDeath {
        enemy: EnemyId,
        kind: EnemyKind,
        cause: DeathCause,
        overkill: String,
    },
    EnemyHit {
        enemy: EnemyId,
        kind: EnemyKind,
        damage: String,
    },
    PlayerHit {
        damage: String,
    },
    ProjectileSpawn {
        side: Side,
    },
    ProjectileDespawn {
        side: Side,
        reason: ProjectileDespawnReason,
    },
    BossSpawn {
        enemy: EnemyId,
        health: String,
        damage: String,
    },
    BossDeath {
        enemy: EnemyId,
    },
    FpsDrop {
        fps: f64,
        sustained_ms: f64,
    },
}

/// An event stamped with the simulation clock
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub at_ms: f64,
    #[serde(flatten)]
    pub event: CombatEvent,
}

/// Render a batch as newline-delimited JSON
pub fn events_to_ndjson(records: &[EventRecord]) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ndjson_lines_are_tagged() {
        let records = vec![
            EventRecord {
                at_ms: 12.5,
                event: CombatEvent::PlayerHit {
                    damage: "8".into(),
                },
            },
            EventRecord {
                at_ms: 20.0,
                event: CombatEvent::EnemyDeath {
                    enemy: EnemyId(4),
                    kind: EnemyKind::BasicShooter,
                    cause: DeathCause::Offscreen,
                    overkill: "0".into(),
                },
            },
        ];
        let text = events_to_ndjson(&records).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["type"], "player_hit");
        assert_eq!(first["at_ms"], 12.5);
        assert_eq!(first["damage"], "8");

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["type"], "enemy_death");
        assert_eq!(second["enemy"], 4);
        assert_eq!(second["kind"], "basic_shooter");
        assert_eq!(second["cause"], "offscreen");
    }

    #[test]
    fn test_empty_batch() {
        assert_eq!(events_to_ndjson(&[]).unwrap(), "");
    }
}
