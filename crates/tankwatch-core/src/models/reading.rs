//! History readings recorded for tanks and generators

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of monitored entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Tank,
    Generator,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Tank => "tank",
            EntityKind::Generator => "generator",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tank" | "tanks" => Ok(EntityKind::Tank),
            "generator" | "generators" => Ok(EntityKind::Generator),
            other => Err(format!("unknown entity type '{}'", other)),
        }
    }
}

/// One timestamped level observation
///
/// Readings are immutable once recorded. `level` is a percentage of
/// capacity; the writer clamps it to 0-100 but consumers should not rely
/// on that (see [`clamp_level`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub entity_id: String,
    pub entity_type: EntityKind,
    pub level: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default = "default_recorded_by")]
    pub recorded_by: String,
}

fn default_recorded_by() -> String {
    "system".to_string()
}

impl Reading {
    pub fn new(
        entity_type: EntityKind,
        entity_id: impl Into<String>,
        level: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_type,
            level,
            timestamp,
            recorded_by: default_recorded_by(),
        }
    }

    pub fn recorded_by(mut self, who: impl Into<String>) -> Self {
        self.recorded_by = who.into();
        self
    }

    /// Level clamped into 0-100
    pub fn clamped_level(&self) -> f64 {
        clamp_level(self.level)
    }
}

/// Clamp a level percentage into `[0, 100]`; NaN becomes 0
pub fn clamp_level(level: f64) -> f64 {
    if level.is_nan() {
        return 0.0;
    }
    level.clamp(0.0, 100.0)
}

/// Flattened history row used by the multi-entity summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub entity_type: EntityKind,
    pub entity_id: String,
    pub level: f64,
    pub timestamp: DateTime<Utc>,
    pub recorded_by: String,
}

impl HistoryRecord {
    /// Build a summary row; `idx` disambiguates readings sharing a timestamp
    pub fn from_reading(reading: &Reading, idx: usize) -> Self {
        Self {
            id: format!(
                "{}-{}-{}-{}",
                reading.entity_type,
                reading.entity_id,
                reading.timestamp.timestamp_millis(),
                idx
            ),
            entity_type: reading.entity_type,
            entity_id: reading.entity_id.clone(),
            level: reading.level,
            timestamp: reading.timestamp,
            recorded_by: reading.recorded_by.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_clamp_level() {
        assert_eq!(clamp_level(-3.0), 0.0);
        assert_eq!(clamp_level(150.0), 100.0);
        assert_eq!(clamp_level(42.5), 42.5);
        assert_eq!(clamp_level(f64::NAN), 0.0);
        assert_eq!(clamp_level(f64::INFINITY), 100.0);
    }

    #[test]
    fn test_entity_kind_parse() {
        assert_eq!("Tank".parse::<EntityKind>().unwrap(), EntityKind::Tank);
        assert_eq!(
            "generators".parse::<EntityKind>().unwrap(),
            EntityKind::Generator
        );
        assert!("pump".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_reading_wire_format() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let reading = Reading::new(EntityKind::Generator, "g-1", 64.0, ts).recorded_by("ali");
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["entityId"], "g-1");
        assert_eq!(json["entityType"], "generator");
        assert_eq!(json["recordedBy"], "ali");
    }

    #[test]
    fn test_history_record_id() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let reading = Reading::new(EntityKind::Tank, "t-1", 50.0, ts);
        let record = HistoryRecord::from_reading(&reading, 3);
        assert_eq!(record.id, format!("tank-t-1-{}-3", ts.timestamp_millis()));
        assert_eq!(record.recorded_by, "system");
    }
}
