//! Level analytics for tanks and generators
//!
//! Pure functions over an ascending window of readings: trend direction,
//! depletion forecast, severity classification and fleet averages.
//! Fetching the window and running many entities at once is the job of
//! [`crate::aggregator::BulkAggregator`].

pub mod alerts;
pub mod efficiency;
pub mod forecasting;
pub mod trends;


pub use alerts::{AlertLevel, CardStatus, CardThresholds, StatusThresholds, classify};
pub use efficiency::{EfficiencyMetrics, efficiency_metrics};
pub use forecasting::{
    Confidence, PredictionConfig, PredictionResult, UsagePredictor, predict_depletion,
};
pub use trends::{TrendAnalyzer, TrendDirection, TrendResult, TrendThresholds, compute_trend};

/// Round half away from zero to `decimals` places
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
