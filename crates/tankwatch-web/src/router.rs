//! Web router using Axum

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use std::sync::Arc;
use tankwatch_core::analytics::EfficiencyMetrics;
use tankwatch_core::models::EntityKind;
use tankwatch_core::{BulkAggregator, InMemoryHistoryStore, StoreHealth};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::api::{
    ApiError, BulkRequest, BulkResponse, GeneratorView, PeriodQuery, PredictionResponse,
    SummaryRequest, SummaryResponse, TankView,
};
use crate::sse;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<InMemoryHistoryStore>,
    pub aggregator: BulkAggregator,
}

impl AppState {
    pub fn new(store: Arc<InMemoryHistoryStore>, aggregator: BulkAggregator) -> Self {
        Self { store, aggregator }
    }
}

/// Create the web router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/tanks", get(tanks_handler))
        .route("/api/generators", get(generators_handler))
        .route("/api/analytics/trends/{kind}/{id}", get(trend_handler))
        .route("/api/analytics/predictions/{kind}/{id}", get(prediction_handler))
        .route("/api/analytics/bulk", post(bulk_handler))
        .route("/api/analytics/efficiency", get(efficiency_handler))
        .route("/api/historical-data/summary", post(summary_handler))
        .route("/api/events", get(sse_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn parse_kind(raw: &str) -> Result<EntityKind, ApiError> {
    raw.parse().map_err(ApiError::BadRequest)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.health() {
        StoreHealth::Healthy => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "healthy",
                "tanks": state.store.tank_ids().len(),
                "generators": state.store.generator_ids().len(),
            })),
        ),
        StoreHealth::Offline { reason } => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "offline", "reason": reason })),
        ),
    }
}

async fn tanks_handler(State(state): State<AppState>) -> Json<Vec<TankView>> {
    let config = state.aggregator.config();
    let views = state
        .store
        .tanks()
        .into_iter()
        .map(|tank| TankView {
            litres: tank.litres(),
            card_status: config.card.classify(tank.current_level),
            alert_level: config.status.classify(tank.current_level),
            tank,
        })
        .collect();
    Json(views)
}

async fn generators_handler(State(state): State<AppState>) -> Json<Vec<GeneratorView>> {
    let config = state.aggregator.config();
    let views = state
        .store
        .generators()
        .into_iter()
        .map(|generator| GeneratorView {
            card_status: config.card.classify(generator.current_level),
            alert_level: config.status.classify(generator.current_level),
            generator,
        })
        .collect();
    Json(views)
}

async fn trend_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    Query(query): Query<PeriodQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    let hours = query
        .period
        .unwrap_or(state.aggregator.config().trend_window_hours);
    let trend = state.aggregator.trend_for(kind, &id, hours).await?;
    Ok(Json(trend))
}

async fn prediction_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    let prediction = state.aggregator.prediction_for(kind, &id).await?;
    Ok(Json(prediction.into()))
}

async fn bulk_handler(
    State(state): State<AppState>,
    Json(req): Json<BulkRequest>,
) -> Result<Json<BulkResponse>, ApiError> {
    let hours = match &req.period {
        None => state.aggregator.config().trend_window_hours,
        Some(period) => period
            .hours()
            .ok_or_else(|| ApiError::BadRequest("period must be a number of hours".into()))?,
    };
    debug!(
        tanks = req.tank_ids.len(),
        generators = req.generator_ids.len(),
        hours,
        "Bulk analytics requested"
    );

    let analytics = state
        .aggregator
        .aggregate(&req.tank_ids, &req.generator_ids, hours)
        .await?;

    Ok(Json(BulkResponse {
        trends: analytics.trends,
        predictions: analytics
            .predictions
            .into_iter()
            .map(|(id, p)| (id, p.into()))
            .collect(),
        timestamp: analytics.timestamp,
    }))
}

async fn summary_handler(
    State(state): State<AppState>,
    Json(req): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let records = state
        .aggregator
        .history_summary(&req.tank_ids, &req.generator_ids, req.hours, req.limit)
        .await?;
    Ok(Json(SummaryResponse {
        total_count: records.len(),
        records,
    }))
}

async fn efficiency_handler(
    State(state): State<AppState>,
) -> Result<Json<EfficiencyMetrics>, ApiError> {
    let metrics = state
        .aggregator
        .efficiency(&state.store.tanks(), &state.store.generators())
        .await?;
    Ok(Json(metrics))
}

async fn sse_handler(State(state): State<AppState>) -> impl IntoResponse {
    sse::create_sse_stream(state.store.event_bus().clone())
}
