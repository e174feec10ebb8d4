//! Integration tests for the HTTP API

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tankwatch_core::models::{EntityKind, Generator, GeneratorStatus, Reading, Tank, TankKind};
use tankwatch_core::{AnalyticsConfig, BulkAggregator, FixedClock, InMemoryHistoryStore};
use tankwatch_web::{AppState, create_router};
use tower::ServiceExt;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
}

/// t-1 and g-1 drain from 80 to 20 over 12 hourly readings; t-2 has no history
fn state() -> AppState {
    let clock = Arc::new(FixedClock::new(now()));
    let store = Arc::new(InMemoryHistoryStore::new(clock.clone()));

    store.upsert_tank(Tank {
        id: "t-1".into(),
        name: "Main diesel".into(),
        kind: TankKind::Fuel,
        capacity: 2000.0,
        current_level: 80.0,
        location: Some("North yard".into()),
    })
    .unwrap();
    store.upsert_tank(Tank {
        id: "t-2".into(),
        name: "Potable water".into(),
        kind: TankKind::Water,
        capacity: 5000.0,
        current_level: 55.0,
        location: None,
    })
    .unwrap();
    store.upsert_generator(Generator {
        id: "g-1".into(),
        name: "Backup".into(),
        capacity: 300.0,
        current_level: 80.0,
        status: GeneratorStatus::Running,
    })
    .unwrap();

    for (kind, id) in [(EntityKind::Tank, "t-1"), (EntityKind::Generator, "g-1")] {
        for i in 0..12 {
            let level = if i == 11 { 20.0 } else { 80.0 - i as f64 * 60.0 / 11.0 };
            let ts = now() - Duration::hours(11 - i);
            store.record(Reading::new(kind, id, level, ts)).unwrap();
        }
    }

    let aggregator = BulkAggregator::new(store.clone(), clock, AnalyticsConfig::default());
    AppState::new(store, aggregator)
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(create_router(state()), get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["tanks"], 2);
    assert_eq!(body["generators"], 1);
}

#[tokio::test]
async fn test_health_offline() {
    let state = state();
    state.store.set_offline(Some("maintenance".into()));
    let (status, body) = send(create_router(state), get("/api/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["reason"], "maintenance");
}

#[tokio::test]
async fn test_tank_list_is_classified() {
    let (status, body) = send(create_router(state()), get("/api/tanks")).await;
    assert_eq!(status, StatusCode::OK);

    let tanks = body.as_array().unwrap();
    assert_eq!(tanks.len(), 2);

    // Current level follows the newest reading
    assert_eq!(tanks[0]["id"], "t-1");
    assert_eq!(tanks[0]["type"], "fuel");
    assert_eq!(tanks[0]["currentLevel"], 20.0);
    assert_eq!(tanks[0]["cardStatus"], "low");
    assert_eq!(tanks[0]["alertLevel"], "warning");

    assert_eq!(tanks[1]["cardStatus"], "medium");
    assert_eq!(tanks[1]["alertLevel"], "normal");
}

#[tokio::test]
async fn test_trend_endpoint() {
    let (status, body) =
        send(create_router(state()), get("/api/analytics/trends/tank/t-1?period=24")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trend"], "down");
    assert_eq!(body["changeRate"], -75.0);
    assert_eq!(body["previousLevel"], 80.0);
    assert_eq!(body["currentLevel"], 20.0);
    assert_eq!(body["dataPoints"], 12);
}

#[tokio::test]
async fn test_trend_without_history() {
    let (status, body) = send(create_router(state()), get("/api/analytics/trends/tanks/t-2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trend"], "stable");
    assert_eq!(body["dataPoints"], 0);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_trend_errors() {
    let (status, body) =
        send(create_router(state()), get("/api/analytics/trends/tank/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("missing"));

    let (status, _) = send(create_router(state()), get("/api/analytics/trends/boat/t-1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_period_is_rejected() {
    let (status, body) = send(
        create_router(state()),
        get("/api/analytics/trends/tank/t-1?period=4294967295"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("4294967295"));

    let request = post(
        "/api/analytics/bulk",
        json!({ "tankIds": ["t-1"], "generatorIds": ["g-1"], "period": "4294967295" }),
    );
    let (status, _) = send(create_router(state()), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = post(
        "/api/historical-data/summary",
        json!({ "tankIds": ["t-1"], "hours": 4294967295u32 }),
    );
    let (status, _) = send(create_router(state()), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The server keeps answering afterwards
    let (status, _) =
        send(create_router(state()), get("/api/analytics/trends/tank/t-1?period=24")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_efficiency_metrics() {
    let (status, body) = send(create_router(state()), get("/api/analytics/efficiency")).await;
    assert_eq!(status, StatusCode::OK);
    // t-1 ends at 20; t-2 has no history and keeps its stored 55
    assert_eq!(body["fuelEfficiency"], 20.0);
    assert_eq!(body["waterUsage"], 55.0);
    assert_eq!(body["generatorPerformance"], 20.0);
}

#[tokio::test]
async fn test_efficiency_without_running_generators() {
    let state = state();
    let mut generator = state.store.generators().remove(0);
    generator.status = GeneratorStatus::Stopped;
    state.store.upsert_generator(generator).unwrap();

    let (status, body) = send(create_router(state), get("/api/analytics/efficiency")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["generatorPerformance"], 0.0);
}

#[tokio::test]
async fn test_tank_prediction() {
    let (status, body) =
        send(create_router(state()), get("/api/analytics/predictions/tank/t-1")).await;
    assert_eq!(status, StatusCode::OK);
    // 60 points over 12 readings: 5 per hour, 120 per day
    assert_eq!(body["predictedDays"], 0.2);
    assert_eq!(body["dailyConsumption"], 120.0);
    assert_eq!(body["currentLevel"], 20.0);
    assert_eq!(body["recommendation"], "critical, act immediately");
    assert_eq!(body["confidence"], "medium");
}

#[tokio::test]
async fn test_generator_prediction() {
    let (status, body) =
        send(create_router(state()), get("/api/analytics/predictions/generator/g-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predictedHours"], 4.0);
    assert_eq!(body["predictedDays"], 0.2);
    assert_eq!(body["hourlyConsumption"], 5.0);
    assert_eq!(body["recommendation"], "critical, refuel immediately");
}

#[tokio::test]
async fn test_bulk_analytics() {
    let request = post(
        "/api/analytics/bulk",
        json!({ "tankIds": ["t-1", "t-2", "nope"], "generatorIds": ["g-1"], "period": "24" }),
    );
    let (status, body) = send(create_router(state()), request).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["trends"].as_object().unwrap().len(), 4);
    assert_eq!(body["predictions"].as_object().unwrap().len(), 4);
    assert_eq!(body["trends"]["t-1"]["trend"], "down");
    assert_eq!(body["predictions"]["g-1"]["predictedHours"], 4.0);
    assert_eq!(body["predictions"]["t-2"]["recommendation"], "insufficient data");

    // Unknown ids are flagged, not fatal
    assert_eq!(body["trends"]["nope"]["error"], "failed to load data");
    assert_eq!(body["predictions"]["nope"]["error"], "failed to load data");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_bulk_store_outage() {
    let state = state();
    state.store.set_offline(Some("disk gone".into()));
    let request = post("/api/analytics/bulk", json!({ "tankIds": ["t-1"] }));
    let (status, body) = send(create_router(state), request).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_bulk_rejects_bad_period() {
    let request = post("/api/analytics/bulk", json!({ "tankIds": ["t-1"], "period": "week" }));
    let (status, _) = send(create_router(state()), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_history_summary() {
    let request = post(
        "/api/historical-data/summary",
        json!({ "tankIds": ["t-1"], "generatorIds": ["g-1"], "hours": 24, "limit": 5 }),
    );
    let (status, body) = send(create_router(state()), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCount"], 5);

    let records = body["records"].as_array().unwrap();
    assert_eq!(records.len(), 5);
    let stamps: Vec<&str> = records
        .iter()
        .map(|r| r["timestamp"].as_str().unwrap())
        .collect();
    let mut sorted = stamps.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(stamps, sorted);
    assert!(records[0]["id"].as_str().unwrap().contains("-"));
}

#[tokio::test]
async fn test_sse_endpoint_exists() {
    let response = create_router(state())
        .oneshot(get("/api/events"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok());
    assert!(content_type.is_some_and(|ct| ct.contains("text/event-stream")));
}
