//! Fleet-wide level averages

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::TrendResult;
use crate::models::{Generator, GeneratorStatus, Tank, TankKind, clamp_level};

/// Average levels per entity group, in percent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EfficiencyMetrics {
    /// Fuel tanks
    pub fuel_efficiency: f64,
    /// Water tanks
    pub water_usage: f64,
    /// Running generators only; 0 when none run
    pub generator_performance: f64,
}

/// Level to report for one entity: the trend's latest level when the
/// trend saw readings, otherwise the stored level
fn effective_level(trends: &HashMap<String, TrendResult>, id: &str, stored: f64) -> f64 {
    match trends.get(id) {
        Some(trend) if !trend.is_failed() && trend.data_points > 0 => trend.current_level,
        _ => clamp_level(stored),
    }
}

fn average(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Average levels of fuel tanks, water tanks and running generators
///
/// Empty groups average to 0.
pub fn efficiency_metrics(
    tanks: &[Tank],
    generators: &[Generator],
    trends: &HashMap<String, TrendResult>,
) -> EfficiencyMetrics {
    let tank_average = |kind: TankKind| {
        average(
            tanks
                .iter()
                .filter(|t| t.kind == kind)
                .map(|t| effective_level(trends, &t.id, t.current_level)),
        )
    };

    EfficiencyMetrics {
        fuel_efficiency: tank_average(TankKind::Fuel),
        water_usage: tank_average(TankKind::Water),
        generator_performance: average(
            generators
                .iter()
                .filter(|g| g.status == GeneratorStatus::Running)
                .map(|g| effective_level(trends, &g.id, g.current_level)),
        ),
    }
}
