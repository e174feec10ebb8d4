//! Bulk analytics over many tanks and generators
//!
//! Every entity runs as its own tokio task (history fetch, trend, forecast)
//! and all tasks are awaited before results are merged. A failing or
//! panicking entity only replaces its own entries with placeholders; the
//! batch itself fails only when the store is down for every entity.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::analytics::{
    EfficiencyMetrics, PredictionResult, TrendAnalyzer, TrendResult, UsagePredictor,
    efficiency_metrics,
};
use crate::config::AnalyticsConfig;
use crate::error::CoreError;
use crate::models::{EntityKind, Generator, HistoryRecord, Tank};
use crate::store::{Clock, HistoryStore, window_start};

/// Error text attached to placeholder results
pub const LOAD_FAILED: &str = "failed to load data";

/// Merged analytics for a set of entities, keyed by entity id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAnalytics {
    pub trends: HashMap<String, TrendResult>,
    pub predictions: HashMap<String, PredictionResult>,
    pub timestamp: DateTime<Utc>,
}

impl BulkAnalytics {
    /// Ids whose trend or prediction could not be computed
    pub fn failed_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .trends
            .iter()
            .filter(|(_, t)| t.is_failed())
            .map(|(id, _)| id.as_str())
            .chain(
                self.predictions
                    .iter()
                    .filter(|(_, p)| p.is_failed())
                    .map(|(id, _)| id.as_str()),
            )
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Per-entity outcome of one analytics task
struct EntityOutcome {
    trend: Result<TrendResult, CoreError>,
    prediction: Result<PredictionResult, CoreError>,
}

/// Fan-out/fan-in runner for trend and depletion analytics
#[derive(Clone)]
pub struct BulkAggregator {
    store: Arc<dyn HistoryStore>,
    clock: Arc<dyn Clock>,
    config: AnalyticsConfig,
    trends: TrendAnalyzer,
    predictor: UsagePredictor,
}

impl BulkAggregator {
    pub fn new(store: Arc<dyn HistoryStore>, clock: Arc<dyn Clock>, config: AnalyticsConfig) -> Self {
        Self {
            trends: TrendAnalyzer::new(config.trend),
            predictor: UsagePredictor::new(config.prediction),
            store,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Trend of one entity over the last `hours`
    pub async fn trend_for(
        &self,
        kind: EntityKind,
        id: &str,
        hours: u32,
    ) -> Result<TrendResult, CoreError> {
        self.check_window(hours)?;
        let readings = self
            .store
            .history(kind, id, hours, self.config.history_limit)
            .await?;
        Ok(self.trends.compute(&readings))
    }

    /// Depletion forecast of one entity over the prediction window
    pub async fn prediction_for(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<PredictionResult, CoreError> {
        let current_level = self.store.current_level(kind, id).await?;
        let readings = self
            .store
            .history(
                kind,
                id,
                self.config.prediction_window_hours,
                self.config.history_limit,
            )
            .await?;
        Ok(self.predictor.predict(&readings, current_level, kind))
    }

    /// Reject windows the store cannot represent before any work starts
    fn check_window(&self, hours: u32) -> Result<(), CoreError> {
        window_start(self.clock.now(), hours).map(|_| ())
    }

    async fn analyze(&self, kind: EntityKind, id: &str, hours: u32) -> EntityOutcome {
        let (trend, prediction) =
            tokio::join!(self.trend_for(kind, id, hours), self.prediction_for(kind, id));
        EntityOutcome { trend, prediction }
    }

    /// Trends and forecasts for every listed tank and generator
    ///
    /// Output maps hold exactly the requested ids. Entities that fail carry
    /// placeholder results with `error` set. Returns
    /// `CoreError::StoreUnavailable` only if nothing succeeded and every
    /// failure was a store outage.
    pub async fn aggregate(
        &self,
        tank_ids: &[String],
        generator_ids: &[String],
        window_hours: u32,
    ) -> Result<BulkAnalytics, CoreError> {
        self.check_window(window_hours)?;
        let start = Instant::now();
        let jobs: Vec<(EntityKind, String)> = tank_ids
            .iter()
            .map(|id| (EntityKind::Tank, id.clone()))
            .chain(
                generator_ids
                    .iter()
                    .map(|id| (EntityKind::Generator, id.clone())),
            )
            .collect();

        let handles: Vec<_> = jobs
            .iter()
            .map(|(kind, id)| {
                let this = self.clone();
                let (kind, id) = (*kind, id.clone());
                tokio::spawn(async move { this.analyze(kind, &id, window_hours).await })
            })
            .collect();
        let outcomes = join_all(handles).await;

        let mut trends = HashMap::with_capacity(jobs.len());
        let mut predictions = HashMap::with_capacity(jobs.len());
        let mut failures: Vec<CoreError> = Vec::new();
        let mut succeeded = 0usize;

        for ((kind, id), outcome) in jobs.iter().zip(outcomes) {
            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    warn!(%kind, %id, error = %join_error, "Analytics task aborted");
                    let message = join_error.to_string();
                    EntityOutcome {
                        trend: Err(CoreError::TaskFailed {
                            id: id.clone(),
                            message: message.clone(),
                        }),
                        prediction: Err(CoreError::TaskFailed {
                            id: id.clone(),
                            message,
                        }),
                    }
                }
            };

            let trend = match outcome.trend {
                Ok(trend) => {
                    succeeded += 1;
                    trend
                }
                Err(e) => {
                    warn!(%kind, %id, error = %e, "Trend unavailable");
                    failures.push(e);
                    TrendResult::failed(LOAD_FAILED)
                }
            };
            let prediction = match outcome.prediction {
                Ok(prediction) => {
                    succeeded += 1;
                    prediction
                }
                Err(e) => {
                    warn!(%kind, %id, error = %e, "Prediction unavailable");
                    failures.push(e);
                    PredictionResult::failed(*kind, LOAD_FAILED)
                }
            };

            // An id listed under both kinds keeps its successful result
            let keep_trend = trends.get(id).is_none_or(|t: &TrendResult| t.is_failed());
            if keep_trend {
                trends.insert(id.clone(), trend);
            }
            let keep_prediction = predictions
                .get(id)
                .is_none_or(|p: &PredictionResult| p.is_failed());
            if keep_prediction {
                predictions.insert(id.clone(), prediction);
            }
        }

        if succeeded == 0 && !failures.is_empty() && failures.iter().all(CoreError::is_unavailable) {
            let reason = match failures.swap_remove(0) {
                CoreError::StoreUnavailable { reason } => reason,
                other => other.to_string(),
            };
            return Err(CoreError::StoreUnavailable { reason });
        }

        info!(
            entities = jobs.len(),
            failed = failures.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Bulk analytics computed"
        );

        Ok(BulkAnalytics {
            trends,
            predictions,
            timestamp: self.clock.now(),
        })
    }

    /// Fleet-wide level averages from the current trend window
    ///
    /// Entities whose trend could not be loaded fall back to their stored
    /// level.
    pub async fn efficiency(
        &self,
        tanks: &[Tank],
        generators: &[Generator],
    ) -> Result<EfficiencyMetrics, CoreError> {
        let tank_ids: Vec<String> = tanks.iter().map(|t| t.id.clone()).collect();
        let generator_ids: Vec<String> = generators.iter().map(|g| g.id.clone()).collect();
        let analytics = self
            .aggregate(&tank_ids, &generator_ids, self.config.trend_window_hours)
            .await?;
        Ok(efficiency_metrics(tanks, generators, &analytics.trends))
    }

    /// Recent readings of many entities merged newest-first
    ///
    /// Entities whose history cannot be read are skipped.
    pub async fn history_summary(
        &self,
        tank_ids: &[String],
        generator_ids: &[String],
        hours: u32,
        limit: usize,
    ) -> Result<Vec<HistoryRecord>, CoreError> {
        self.check_window(hours)?;
        let requests = tank_ids
            .iter()
            .map(|id| (EntityKind::Tank, id))
            .chain(generator_ids.iter().map(|id| (EntityKind::Generator, id)))
            .map(|(kind, id)| async move {
                match self.store.history(kind, id, hours, limit).await {
                    Ok(history) => history
                        .iter()
                        .enumerate()
                        .map(|(idx, r)| HistoryRecord::from_reading(r, idx))
                        .collect::<Vec<_>>(),
                    Err(e) => {
                        warn!(%kind, %id, error = %e, "Skipping entity in history summary");
                        Vec::new()
                    }
                }
            });

        let mut records: Vec<HistoryRecord> = join_all(requests).await.into_iter().flatten().collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records.truncate(limit);
        debug!(records = records.len(), "History summary built");
        Ok(records)
    }
}
