//! Short-term level trend over a history window
//!
//! Compares the oldest and the latest reading of the window and classifies
//! the relative change as up, down or stable.

use serde::{Deserialize, Serialize};

use super::round_to;
use crate::models::{Reading, clamp_level};

/// Direction of a level trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

/// Noise filter for trend classification, in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendThresholds {
    /// changeRate above this is `up`
    pub up: f64,
    /// changeRate below this is `down`
    pub down: f64,
}

impl Default for TrendThresholds {
    fn default() -> Self {
        Self {
            up: 5.0,
            down: -5.0,
        }
    }
}

/// Trend of one entity over a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendResult {
    pub trend: TrendDirection,
    /// Signed percent change from oldest to latest, 2 decimals
    pub change_rate: f64,
    pub current_level: f64,
    pub previous_level: f64,
    pub data_points: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TrendResult {
    /// Placeholder for an entity whose data could not be loaded
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            trend: TrendDirection::Stable,
            change_rate: 0.0,
            current_level: 0.0,
            previous_level: 0.0,
            data_points: 0,
            message: None,
            error: Some(reason.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Trend classifier with configurable thresholds
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendAnalyzer {
    thresholds: TrendThresholds,
}

impl TrendAnalyzer {
    pub fn new(thresholds: TrendThresholds) -> Self {
        Self { thresholds }
    }

    /// Compute the trend of an ascending reading window
    ///
    /// Fewer than two readings give a stable trend with zero change. A zero
    /// baseline also yields zero change instead of dividing by it.
    pub fn compute(&self, readings: &[Reading]) -> TrendResult {
        let (Some(first), Some(last)) = (readings.first(), readings.last()) else {
            return insufficient(0.0, 0);
        };
        if readings.len() < 2 {
            return insufficient(last.clamped_level(), readings.len());
        }

        let previous = first.clamped_level();
        let latest = last.clamped_level();
        let change_rate = if previous > 0.0 {
            (latest - previous) / previous * 100.0
        } else {
            0.0
        };

        TrendResult {
            trend: self.classify(change_rate),
            change_rate: round_to(change_rate, 2),
            current_level: latest,
            previous_level: previous,
            data_points: readings.len(),
            message: None,
            error: None,
        }
    }

    /// Map a percent change to a direction
    pub fn classify(&self, change_rate: f64) -> TrendDirection {
        if change_rate > self.thresholds.up {
            TrendDirection::Up
        } else if change_rate < self.thresholds.down {
            TrendDirection::Down
        } else {
            TrendDirection::Stable
        }
    }
}

fn insufficient(level: f64, data_points: usize) -> TrendResult {
    let level = clamp_level(level);
    TrendResult {
        trend: TrendDirection::Stable,
        change_rate: 0.0,
        current_level: level,
        previous_level: level,
        data_points,
        message: Some("insufficient data".to_string()),
        error: None,
    }
}

/// Compute a trend with the default thresholds
pub fn compute_trend(readings: &[Reading]) -> TrendResult {
    TrendAnalyzer::default().compute(readings)
}
