//! Typed entity DTOs (tanks, generators) and the seed file format

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::permission::{Permission, SiteUser};
use super::reading::{EntityKind, Reading};
use crate::error::CoreError;

/// What a tank holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TankKind {
    Fuel,
    Water,
}

/// Storage tank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tank {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TankKind,
    /// Capacity in litres
    pub capacity: f64,
    /// Current level in percent of capacity
    pub current_level: f64,
    #[serde(default)]
    pub location: Option<String>,
}

impl Tank {
    /// Litres currently held, rounded to whole litres
    pub fn litres(&self) -> f64 {
        ((self.current_level / 100.0) * self.capacity).round()
    }
}

/// Generator run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorStatus {
    Running,
    #[default]
    Stopped,
    Maintenance,
}

/// Generator with its fuel level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Generator {
    pub id: String,
    pub name: String,
    /// Fuel capacity in litres
    pub capacity: f64,
    /// Current fuel level in percent
    pub current_level: f64,
    #[serde(default)]
    pub status: GeneratorStatus,
}

/// Initial data for the in-memory store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    #[serde(default)]
    pub tanks: Vec<Tank>,
    #[serde(default)]
    pub generators: Vec<Generator>,
    #[serde(default)]
    pub readings: Vec<Reading>,
    /// Users allowed to have recorded readings; empty means no check
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<SiteUser>,
}

impl SeedData {
    /// Load a seed file (JSON)
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::SeedRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content, path)
    }

    fn from_json(content: &str, path: &Path) -> Result<Self, CoreError> {
        serde_json::from_str(content).map_err(|source| CoreError::SeedParse {
            path: path.to_path_buf(),
            message: source.to_string(),
            source,
        })
    }

    /// Whether `recorded_by` may have written a level reading
    ///
    /// Readings by `system` always pass, as does everything when no users
    /// are declared.
    pub fn may_record(&self, recorded_by: &str) -> bool {
        if self.users.is_empty() || recorded_by == "system" {
            return true;
        }
        self.users
            .iter()
            .any(|u| u.name == recorded_by && u.can(Permission::UpdateLevels))
    }

    /// Readings that reference an entity not declared in the seed
    pub fn orphan_readings(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter().filter(|r| match r.entity_type {
            EntityKind::Tank => !self.tanks.iter().any(|t| t.id == r.entity_id),
            EntityKind::Generator => !self.generators.iter().any(|g| g.id == r.entity_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SEED: &str = r#"{
        "tanks": [
            {"id": "t-1", "name": "Fuel A", "type": "fuel", "capacity": 5000, "currentLevel": 40}
        ],
        "generators": [
            {"id": "g-1", "name": "Gen 1", "capacity": 800, "currentLevel": 75, "status": "running"}
        ],
        "readings": [
            {"entityId": "t-1", "entityType": "tank", "level": 41, "timestamp": "2026-03-01T08:00:00Z"},
            {"entityId": "x-9", "entityType": "generator", "level": 10, "timestamp": "2026-03-01T08:00:00Z", "recordedBy": "ops"}
        ]
    }"#;

    #[test]
    fn test_seed_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEED.as_bytes()).unwrap();

        let seed = SeedData::load(file.path()).unwrap();
        assert_eq!(seed.tanks.len(), 1);
        assert_eq!(seed.tanks[0].kind, TankKind::Fuel);
        assert_eq!(seed.generators[0].status, GeneratorStatus::Running);
        assert_eq!(seed.readings[0].recorded_by, "system");

        let orphans: Vec<_> = seed.orphan_readings().collect();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].entity_id, "x-9");
    }

    #[test]
    fn test_seed_users_gate_recorders() {
        let seed: SeedData = serde_json::from_str(
            r#"{
                "users": [
                    {"name": "ops", "role": "operator"},
                    {"name": "viewer", "role": "supervisor", "permissions": ["view-dashboard"]},
                    {"name": "lead", "role": "manager", "permissions": ["update-tank-levels"]}
                ]
            }"#,
        )
        .unwrap();

        assert!(seed.may_record("system"));
        assert!(seed.may_record("ops"));
        assert!(seed.may_record("lead"));
        assert!(!seed.may_record("viewer"));
        assert!(!seed.may_record("stranger"));

        assert!(SeedData::default().may_record("stranger"));
    }

    #[test]
    fn test_seed_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();

        let err = SeedData::load(file.path()).unwrap_err();
        assert!(matches!(err, CoreError::SeedParse { .. }));
    }

    #[test]
    fn test_tank_litres() {
        let tank = Tank {
            id: "t-1".into(),
            name: "Water".into(),
            kind: TankKind::Water,
            capacity: 1200.0,
            current_level: 37.5,
            location: None,
        };
        assert_eq!(tank.litres(), 450.0);
    }
}
