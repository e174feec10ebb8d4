//! Request and response bodies of the HTTP API

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tankwatch_core::CoreError;
use tankwatch_core::analytics::{
    AlertLevel, CardStatus, Confidence, PredictionResult, TrendResult,
};
use tankwatch_core::models::{EntityKind, Generator, HistoryRecord, Tank};

/// Period as sent by clients: `"24"` or `24`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PeriodParam {
    Hours(u32),
    Text(String),
}

impl PeriodParam {
    /// Hours, or `None` if the text is not a number
    pub fn hours(&self) -> Option<u32> {
        match self {
            PeriodParam::Hours(h) => Some(*h),
            PeriodParam::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// `POST /api/analytics/bulk`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRequest {
    #[serde(default)]
    pub tank_ids: Vec<String>,
    #[serde(default)]
    pub generator_ids: Vec<String>,
    #[serde(default)]
    pub period: Option<PeriodParam>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResponse {
    pub trends: HashMap<String, TrendResult>,
    pub predictions: HashMap<String, PredictionResponse>,
    pub timestamp: DateTime<Utc>,
}

/// `GET /api/analytics/trends/{kind}/{id}?period=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<u32>,
}

/// Prediction body; field names depend on the entity kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictionResponse {
    Tank(TankPrediction),
    Generator(GeneratorPrediction),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TankPrediction {
    pub predicted_days: Option<f64>,
    pub daily_consumption: f64,
    pub current_level: f64,
    pub recommendation: String,
    pub confidence: Confidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorPrediction {
    pub predicted_hours: Option<f64>,
    pub predicted_days: Option<f64>,
    pub hourly_consumption: f64,
    pub current_level: f64,
    pub recommendation: String,
    pub confidence: Confidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<PredictionResult> for PredictionResponse {
    fn from(p: PredictionResult) -> Self {
        match p.kind {
            EntityKind::Tank => PredictionResponse::Tank(TankPrediction {
                predicted_days: p.predicted_remaining,
                daily_consumption: p.daily_consumption,
                current_level: p.current_level,
                recommendation: p.recommendation,
                confidence: p.confidence,
                error: p.error,
            }),
            EntityKind::Generator => PredictionResponse::Generator(GeneratorPrediction {
                predicted_days: p.remaining_days(),
                predicted_hours: p.predicted_remaining,
                hourly_consumption: p.consumption_rate,
                current_level: p.current_level,
                recommendation: p.recommendation,
                confidence: p.confidence,
                error: p.error,
            }),
        }
    }
}

/// `POST /api/historical-data/summary`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    #[serde(default)]
    pub tank_ids: Vec<String>,
    #[serde(default)]
    pub generator_ids: Vec<String>,
    #[serde(default = "default_summary_hours")]
    pub hours: u32,
    #[serde(default = "default_summary_limit")]
    pub limit: usize,
}

fn default_summary_hours() -> u32 {
    24
}

fn default_summary_limit() -> usize {
    50
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub records: Vec<HistoryRecord>,
    pub total_count: usize,
}

/// Entity with its display classifications
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TankView {
    #[serde(flatten)]
    pub tank: Tank,
    pub litres: f64,
    pub card_status: CardStatus,
    pub alert_level: AlertLevel,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorView {
    #[serde(flatten)]
    pub generator: Generator,
    pub card_status: CardStatus,
    pub alert_level: AlertLevel,
}

/// Error response mapping core errors to status codes
#[derive(Debug)]
pub enum ApiError {
    Core(CoreError),
    BadRequest(String),
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        ApiError::Core(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Core(e) if e.is_invalid_input() => StatusCode::BAD_REQUEST,
            ApiError::Core(CoreError::EntityNotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Core(CoreError::StoreUnavailable { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Core(e) => e.to_string(),
            ApiError::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            tracing::error!(error = %message, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_param() {
        let req: BulkRequest =
            serde_json::from_str(r#"{"tankIds":["t-1"],"period":"48"}"#).unwrap();
        assert_eq!(req.period.and_then(|p| p.hours()), Some(48));

        let req: BulkRequest = serde_json::from_str(r#"{"period":12}"#).unwrap();
        assert_eq!(req.period.and_then(|p| p.hours()), Some(12));
        assert!(req.tank_ids.is_empty());

        let bad = PeriodParam::Text("soon".into());
        assert_eq!(bad.hours(), None);
    }

    #[test]
    fn test_generator_prediction_shape() {
        let result = PredictionResult {
            kind: EntityKind::Generator,
            predicted_remaining: Some(50.0),
            consumption_rate: 1.0,
            daily_consumption: 24.0,
            current_level: 50.0,
            recommendation: "low, schedule refuel".into(),
            confidence: Confidence::High,
            error: None,
        };
        let json = serde_json::to_value(PredictionResponse::from(result)).unwrap();
        assert_eq!(json["predictedHours"], 50.0);
        assert_eq!(json["predictedDays"], 2.1);
        assert_eq!(json["hourlyConsumption"], 1.0);
        assert_eq!(json["confidence"], "high");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_tank_prediction_shape() {
        let json = serde_json::to_value(PredictionResponse::from(
            PredictionResult::insufficient(EntityKind::Tank, 40.0),
        ))
        .unwrap();
        assert!(json["predictedDays"].is_null());
        assert_eq!(json["dailyConsumption"], 0.0);
        assert_eq!(json["confidence"], "low");
        assert_eq!(json["recommendation"], "insufficient data");
    }

    #[test]
    fn test_error_status_codes() {
        let not_found = ApiError::from(CoreError::EntityNotFound {
            kind: EntityKind::Tank,
            id: "x".into(),
        });
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let down = ApiError::from(CoreError::StoreUnavailable {
            reason: "down".into(),
        });
        assert_eq!(down.status(), StatusCode::SERVICE_UNAVAILABLE);

        let bad = ApiError::BadRequest("unknown entity type 'boat'".into());
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let window = ApiError::from(CoreError::InvalidWindow {
            hours: u32::MAX,
            max: tankwatch_core::MAX_WINDOW_HOURS,
        });
        assert_eq!(window.status(), StatusCode::BAD_REQUEST);
    }
}
