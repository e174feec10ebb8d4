//! Server-Sent Events for live level updates

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use tankwatch_core::{DataEvent, EventBus};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

/// JSON payload of an event
fn payload(event: &DataEvent) -> serde_json::Value {
    match event {
        DataEvent::ReadingRecorded { kind, id, level } => {
            json!({ "entityType": kind, "entityId": id, "level": level })
        }
        DataEvent::EntityUpdated { kind, id } => json!({ "entityType": kind, "entityId": id }),
        DataEvent::LoadCompleted => json!({}),
        DataEvent::HistoryPruned { removed } => json!({ "removed": removed }),
    }
}

/// Create an SSE stream from the event bus
///
/// Lagged receivers skip the missed events instead of closing the stream.
pub fn create_sse_stream(
    event_bus: EventBus,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(event_bus.subscribe());

    let sse_stream = stream.filter_map(|result: Result<DataEvent, _>| {
        result.ok().map(|event| {
            Ok(Event::default()
                .event(event.name())
                .data(payload(&event).to_string()))
        })
    });

    Sse::new(sse_stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tankwatch_core::models::EntityKind;

    #[test]
    fn test_reading_payload() {
        let value = payload(&DataEvent::ReadingRecorded {
            kind: EntityKind::Generator,
            id: "g-1".into(),
            level: 42.5,
        });
        assert_eq!(value["entityType"], "generator");
        assert_eq!(value["entityId"], "g-1");
        assert_eq!(value["level"], 42.5);
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(payload(&DataEvent::LoadCompleted).to_string(), "{}");
    }
}
