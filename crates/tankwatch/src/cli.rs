//! Terminal rendering for the analytics commands
//!
//! Every formatter returns either pretty JSON or a comfy-table, so the
//! command handlers in `main.rs` only fetch data and print.

use comfy_table::{Cell, Color, ContentArrangement, Row, Table};
use serde::Serialize;
use tankwatch_core::analytics::{
    AlertLevel, CardStatus, EfficiencyMetrics, PredictionResult, TrendDirection, TrendResult,
};
use tankwatch_core::models::{EntityKind, HistoryRecord};
use tankwatch_core::{AnalyticsConfig, BulkAnalytics};

/// One row of the per-entity tables
///
/// Rows are matched to analytics by `id` alone. The store refuses an id
/// already used by the other kind, so a tank and a generator never share one.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRow {
    pub kind: EntityKind,
    pub id: String,
    pub name: String,
    pub level: f64,
    pub card_status: CardStatus,
    pub alert_level: AlertLevel,
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

fn new_table(headers: &[&str], no_color: bool) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    if no_color {
        table.set_header(headers.to_vec());
    } else {
        table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    }
    table
}

fn status_cell(status: CardStatus, no_color: bool) -> Cell {
    let cell = Cell::new(status.label());
    if no_color {
        return cell;
    }
    match status {
        CardStatus::Critical => cell.fg(Color::Red),
        CardStatus::Low => cell.fg(Color::Yellow),
        CardStatus::Medium => cell.fg(Color::Blue),
        CardStatus::Good => cell.fg(Color::Green),
    }
}

fn trend_label(trend: &TrendResult) -> String {
    if let Some(error) = &trend.error {
        return format!("error: {}", error);
    }
    let arrow = match trend.trend {
        TrendDirection::Up => "up",
        TrendDirection::Down => "down",
        TrendDirection::Stable => "stable",
    };
    match &trend.message {
        Some(msg) => format!("{} ({})", arrow, msg),
        None => format!("{} {:+.2}%", arrow, trend.change_rate),
    }
}

fn remaining_label(prediction: &PredictionResult) -> String {
    match (prediction.kind, prediction.predicted_remaining) {
        (_, None) => "-".to_string(),
        (EntityKind::Tank, Some(days)) => format!("{:.1} d", days),
        (EntityKind::Generator, Some(hours)) => format!("{:.1} h", hours),
    }
}

/// Build table rows for every entity, classified with both cutoff sets
pub fn entity_rows(
    tanks: &[tankwatch_core::models::Tank],
    generators: &[tankwatch_core::models::Generator],
    config: &AnalyticsConfig,
) -> Vec<EntityRow> {
    let tank_rows = tanks.iter().map(|t| EntityRow {
        kind: EntityKind::Tank,
        id: t.id.clone(),
        name: t.name.clone(),
        level: t.current_level,
        card_status: config.card.classify(t.current_level),
        alert_level: config.status.classify(t.current_level),
    });
    let generator_rows = generators.iter().map(|g| EntityRow {
        kind: EntityKind::Generator,
        id: g.id.clone(),
        name: g.name.clone(),
        level: g.current_level,
        card_status: config.card.classify(g.current_level),
        alert_level: config.status.classify(g.current_level),
    });
    tank_rows.chain(generator_rows).collect()
}

/// Trend table
pub fn format_trends(rows: &[EntityRow], analytics: &BulkAnalytics, json: bool, no_color: bool) -> String {
    if json {
        return to_json(&analytics.trends);
    }
    if rows.is_empty() {
        return "No tanks or generators found.".to_string();
    }

    let mut table = new_table(&["Kind", "ID", "Name", "Level", "Status", "Trend", "Points"], no_color);
    for row in rows {
        let Some(trend) = analytics.trends.get(&row.id) else {
            continue;
        };
        table.add_row(Row::from(vec![
            Cell::new(row.kind),
            Cell::new(&row.id),
            Cell::new(&row.name),
            Cell::new(format!("{:.1}%", row.level)),
            status_cell(row.card_status, no_color),
            Cell::new(trend_label(trend)),
            Cell::new(trend.data_points),
        ]));
    }
    table.to_string()
}

/// Depletion forecast table
pub fn format_predictions(
    rows: &[EntityRow],
    analytics: &BulkAnalytics,
    json: bool,
    no_color: bool,
) -> String {
    if json {
        return to_json(&analytics.predictions);
    }
    if rows.is_empty() {
        return "No tanks or generators found.".to_string();
    }

    let mut table = new_table(
        &["Kind", "ID", "Level", "Remaining", "Per day", "Confidence", "Recommendation"],
        no_color,
    );
    for row in rows {
        let Some(prediction) = analytics.predictions.get(&row.id) else {
            continue;
        };
        let recommendation = prediction
            .error
            .as_deref()
            .map(|e| format!("error: {}", e))
            .unwrap_or_else(|| prediction.recommendation.clone());
        table.add_row(Row::from(vec![
            Cell::new(row.kind),
            Cell::new(&row.id),
            Cell::new(format!("{:.1}%", prediction.current_level)),
            Cell::new(remaining_label(prediction)),
            Cell::new(format!("{:.2}%", prediction.daily_consumption)),
            Cell::new(prediction.confidence.as_str()),
            Cell::new(recommendation),
        ]));
    }
    table.to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportJson<'a> {
    entities: &'a [EntityRow],
    efficiency: &'a EfficiencyMetrics,
    #[serde(flatten)]
    analytics: &'a BulkAnalytics,
}

/// Combined status, trend and forecast report
pub fn format_report(
    rows: &[EntityRow],
    analytics: &BulkAnalytics,
    efficiency: &EfficiencyMetrics,
    json: bool,
    no_color: bool,
) -> String {
    if json {
        return to_json(&ReportJson {
            entities: rows,
            efficiency,
            analytics,
        });
    }

    let mut out = vec![
        format!("Report generated {}", analytics.timestamp.format("%Y-%m-%d %H:%M UTC")),
        String::new(),
        format_trends(rows, analytics, false, no_color),
        String::new(),
        format_predictions(rows, analytics, false, no_color),
        String::new(),
        format!(
            "Fuel efficiency: {:.1}%  Water usage: {:.1}%  Generator performance: {:.1}%",
            efficiency.fuel_efficiency, efficiency.water_usage, efficiency.generator_performance
        ),
    ];

    let critical: Vec<&str> = rows
        .iter()
        .filter(|r| r.alert_level == AlertLevel::Critical)
        .map(|r| r.id.as_str())
        .collect();
    if !critical.is_empty() {
        out.push(String::new());
        out.push(format!("Critical: {}", critical.join(", ")));
    }

    let failed = analytics.failed_ids();
    if !failed.is_empty() {
        out.push(format!("Failed to load: {}", failed.join(", ")));
    }
    out.join("\n")
}

/// History summary table, newest first
pub fn format_summary(records: &[HistoryRecord], json: bool, no_color: bool) -> String {
    if json {
        return to_json(&serde_json::json!({
            "records": records,
            "totalCount": records.len(),
        }));
    }
    if records.is_empty() {
        return "No readings in window.".to_string();
    }

    let mut table = new_table(&["Time", "Kind", "ID", "Level", "Recorded by"], no_color);
    for record in records {
        table.add_row(Row::from(vec![
            Cell::new(record.timestamp.format("%Y-%m-%d %H:%M")),
            Cell::new(record.entity_type),
            Cell::new(&record.entity_id),
            Cell::new(format!("{:.1}%", record.level)),
            Cell::new(&record.recorded_by),
        ]));
    }
    format!("{}\n{} readings", table, records.len())
}
