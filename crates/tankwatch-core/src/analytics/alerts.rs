//! Level severity classification
//!
//! Two call sites classify levels with their own cutoffs: status tables
//! (critical / warning / normal) and entity cards (critical / low /
//! medium / good). The cutoff sets are configured independently.

use serde::{Deserialize, Serialize};

use crate::models::clamp_level;

/// Severity shown in status tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Critical,
    Warning,
    Normal,
}

/// Cutoffs for [`AlertLevel`], in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusThresholds {
    pub critical_below: f64,
    pub warning_below: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            critical_below: 20.0,
            warning_below: 30.0,
        }
    }
}

impl StatusThresholds {
    pub fn classify(&self, level: f64) -> AlertLevel {
        let level = clamp_level(level);
        if level < self.critical_below {
            AlertLevel::Critical
        } else if level < self.warning_below {
            AlertLevel::Warning
        } else {
            AlertLevel::Normal
        }
    }
}

/// Status badge shown on tank and generator cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    Critical,
    Low,
    Medium,
    Good,
}

impl CardStatus {
    pub fn is_critical(&self) -> bool {
        matches!(self, CardStatus::Critical)
    }

    pub fn label(&self) -> &'static str {
        match self {
            CardStatus::Critical => "critical",
            CardStatus::Low => "low",
            CardStatus::Medium => "medium",
            CardStatus::Good => "good",
        }
    }
}

/// Cutoffs for [`CardStatus`], in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardThresholds {
    pub critical_below: f64,
    pub low_below: f64,
    pub medium_below: f64,
}

impl Default for CardThresholds {
    fn default() -> Self {
        Self {
            critical_below: 20.0,
            low_below: 40.0,
            medium_below: 70.0,
        }
    }
}

impl CardThresholds {
    pub fn classify(&self, level: f64) -> CardStatus {
        let level = clamp_level(level);
        if level < self.critical_below {
            CardStatus::Critical
        } else if level < self.low_below {
            CardStatus::Low
        } else if level < self.medium_below {
            CardStatus::Medium
        } else {
            CardStatus::Good
        }
    }
}

/// Classify with the default status-table cutoffs
pub fn classify(level: f64) -> AlertLevel {
    StatusThresholds::default().classify(level)
}
