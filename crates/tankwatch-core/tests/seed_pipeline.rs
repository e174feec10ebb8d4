//! Seed file -> history store -> aggregator, end to end

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;
use tankwatch_core::analytics::{Confidence, TrendDirection};
use tankwatch_core::models::{EntityKind, SeedData};
use tankwatch_core::{AnalyticsConfig, BulkAggregator, DataEvent, FixedClock, InMemoryHistoryStore};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
}

fn reading(kind: &str, id: &str, level: f64, hours_ago: i64) -> serde_json::Value {
    json!({
        "entityId": id,
        "entityType": kind,
        "level": level,
        "timestamp": now() - Duration::hours(hours_ago),
    })
}

/// t-1: three recent readings plus one far outside retention
/// g-1: 30 hourly readings from 90 down to 61
/// plus one reading for an undeclared tank
fn seed_json() -> serde_json::Value {
    let mut readings = vec![
        reading("tank", "t-1", 50.0, 2),
        reading("tank", "t-1", 45.0, 1),
        reading("tank", "t-1", 40.0, 0),
        reading("tank", "t-1", 99.0, 24 * 120),
        reading("tank", "t-ghost", 10.0, 1),
    ];
    for i in 0..30 {
        readings.push(reading("generator", "g-1", 90.0 - i as f64, 29 - i));
    }

    json!({
        "tanks": [
            {"id": "t-1", "name": "Diesel", "type": "fuel", "capacity": 4000, "currentLevel": 55},
            {"id": "t-2", "name": "Water", "type": "water", "capacity": 10000, "currentLevel": 90}
        ],
        "generators": [
            {"id": "g-1", "name": "Backup", "capacity": 250, "currentLevel": 95, "status": "running"}
        ],
        "readings": readings
    })
}

fn load() -> (Arc<InMemoryHistoryStore>, BulkAggregator) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("site.json");
    std::fs::write(&path, seed_json().to_string()).unwrap();

    let seed = SeedData::load(&path).unwrap();
    assert_eq!(seed.orphan_readings().count(), 1);

    let clock = Arc::new(FixedClock::new(now()));
    let store = Arc::new(InMemoryHistoryStore::new(clock.clone()));
    assert_eq!(store.load_seed(seed), 34);

    let config = AnalyticsConfig::default();
    let removed = store.retain(Duration::days(i64::from(config.retention_days)));
    assert_eq!(removed, 1);

    let aggregator = BulkAggregator::new(store.clone(), clock, config);
    (store, aggregator)
}

#[tokio::test]
async fn test_seed_drives_current_levels() {
    let (store, _) = load();
    let tanks = store.tanks();
    // Newest reading wins over the declared level
    assert_eq!(tanks[0].current_level, 40.0);
    // No readings: declared level stays
    assert_eq!(tanks[1].current_level, 90.0);
    assert_eq!(store.generators()[0].current_level, 61.0);
    assert_eq!(store.reading_count(EntityKind::Tank, "t-1"), 3);
}

#[tokio::test]
async fn test_bulk_over_seeded_site() {
    let (store, aggregator) = load();
    let analytics = aggregator
        .aggregate(&store.tank_ids(), &store.generator_ids(), 24)
        .await
        .unwrap();

    assert!(analytics.failed_ids().is_empty());
    assert_eq!(analytics.timestamp, now());

    let t1 = &analytics.trends["t-1"];
    assert_eq!(t1.trend, TrendDirection::Down);
    assert_eq!(t1.change_rate, -20.0);
    assert_eq!(analytics.predictions["t-1"].confidence, Confidence::Low);
    assert_eq!(analytics.predictions["t-1"].current_level, 40.0);

    assert_eq!(analytics.trends["t-2"].data_points, 0);

    // 29 points over 30 readings, 61 left
    let g1 = &analytics.predictions["g-1"];
    assert_eq!(g1.predicted_remaining, Some(63.1));
    assert_eq!(g1.consumption_rate, 0.967);
    assert_eq!(g1.confidence, Confidence::Medium);
    assert_eq!(g1.recommendation, "low, schedule refuel");
    // 24h trend window holds the last 25 readings
    assert_eq!(analytics.trends["g-1"].data_points, 25);
}

#[tokio::test]
async fn test_summary_over_seeded_site() {
    let (store, aggregator) = load();
    let records = aggregator
        .history_summary(&store.tank_ids(), &store.generator_ids(), 3, 10)
        .await
        .unwrap();

    assert_eq!(records.len(), 7);
    assert!(records.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    assert!(records.iter().all(|r| r.timestamp >= now() - Duration::hours(3)));
}

#[tokio::test]
async fn test_load_publishes_events() {
    let clock = Arc::new(FixedClock::new(now()));
    let store = InMemoryHistoryStore::new(clock);
    let mut rx = store.event_bus().subscribe();

    let seed: SeedData = serde_json::from_value(seed_json()).unwrap();
    store.load_seed(seed);

    let mut recorded = 0;
    let mut completed = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            DataEvent::ReadingRecorded { .. } => recorded += 1,
            DataEvent::LoadCompleted => completed = true,
            _ => {}
        }
    }
    assert_eq!(recorded, 34);
    assert!(completed);
}
