//! Server-sent events filters and streaming helpers.

use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::sse::{self, Sse},
};
use futures_util::{StreamExt, future};
use linewatch_events::{EventBus, EventEnvelope, EventId};
use serde::Deserialize;
use tracing::{debug, error};

use crate::http::constants::{EVENT_KIND_WHITELIST, HEADER_LAST_EVENT_ID, SSE_KEEP_ALIVE_SECS};
use crate::http::errors::ApiError;
use crate::state::ApiState;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SseQuery {
    #[serde(default)]
    pub(crate) line: Option<String>,
    #[serde(default)]
    pub(crate) event: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SseFilter {
    pub(crate) line_ids: HashSet<String>,
    pub(crate) event_kinds: HashSet<String>,
}

pub(crate) async fn stream_events(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(query): Query<SseQuery>,
) -> Result<Sse<impl futures_core::Stream<Item = Result<sse::Event, Infallible>> + Send>, ApiError>
{
    let last_id = headers
        .get(HEADER_LAST_EVENT_ID)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<EventId>().ok());
    let filter = build_sse_filter(&query)?;
    debug!(?last_id, ?filter, "opening event stream");

    let stream = event_sse_stream(state.events().clone(), last_id, filter);
    Ok(Sse::new(stream).keep_alive(
        sse::KeepAlive::new()
            .interval(Duration::from_secs(SSE_KEEP_ALIVE_SECS))
            .text("keep-alive"),
    ))
}

pub(crate) fn build_sse_filter(query: &SseQuery) -> Result<SseFilter, ApiError> {
    let mut filter = SseFilter::default();

    if let Some(lines) = query.line.as_deref() {
        filter.line_ids.extend(split_comma_separated(lines));
    }

    if let Some(events) = query.event.as_deref() {
        for value in split_comma_separated(events) {
            if !EVENT_KIND_WHITELIST.contains(&value.as_str()) {
                return Err(ApiError::bad_request(format!(
                    "event filter '{value}' is not recognised"
                )));
            }
            filter.event_kinds.insert(value);
        }
    }

    Ok(filter)
}

/// Events pass when their kind is selected and, with a line filter, when
/// they are scoped to one of the selected lines.
pub(crate) fn matches_sse_filter(envelope: &EventEnvelope, filter: &SseFilter) -> bool {
    if !filter.event_kinds.is_empty() && !filter.event_kinds.contains(envelope.event.kind()) {
        return false;
    }
    if !filter.line_ids.is_empty() {
        return envelope
            .event
            .line_id()
            .is_some_and(|line_id| filter.line_ids.contains(line_id));
    }
    true
}

fn split_comma_separated(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub(crate) fn event_replay_stream(
    bus: EventBus,
    since: Option<EventId>,
) -> impl futures_core::Stream<Item = EventEnvelope> + Send {
    stream! {
        let mut stream = bus.subscribe(since);
        while let Some(result) = stream.next().await {
            if let Ok(envelope) = result {
                yield envelope;
            }
        }
    }
}

pub(crate) fn event_sse_stream(
    bus: EventBus,
    since: Option<EventId>,
    filter: SseFilter,
) -> impl futures_core::Stream<Item = Result<sse::Event, Infallible>> + Send {
    let filter = Arc::new(filter);
    event_replay_stream(bus, since)
        .filter(move |envelope| future::ready(matches_sse_filter(envelope, &filter)))
        .filter_map(|envelope| async move {
            match serde_json::to_string(&envelope) {
                Ok(payload) => Some(Ok(sse::Event::default()
                    .id(envelope.id.to_string())
                    .event(envelope.event.kind())
                    .data(payload))),
                Err(err) => {
                    error!(error = %err, "failed to serialise SSE event payload");
                    None
                }
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use linewatch_events::{Alert, AlertKind, MonitorEvent};

    fn envelope(event: MonitorEvent) -> EventEnvelope {
        EventEnvelope {
            id: 1,
            timestamp: Utc::now(),
            event,
        }
    }

    fn alert_on(line_id: &str) -> MonitorEvent {
        MonitorEvent::AlertRaised {
            line_id: line_id.to_string(),
            alert: Alert {
                id: "u2".into(),
                kind: AlertKind::Error,
                message: "Fault on Reflow: E201".into(),
                time: "14:24:00".into(),
            },
        }
    }

    #[test]
    fn build_sse_filter_parses_filters() -> Result<(), ApiError> {
        let filter = build_sse_filter(&SseQuery {
            line: Some("line-a, line-b".into()),
            event: Some("alert_raised,status_changed".into()),
        })?;
        assert_eq!(filter.line_ids.len(), 2);
        assert!(filter.event_kinds.contains("alert_raised"));
        Ok(())
    }

    #[test]
    fn unknown_event_kinds_are_rejected() {
        let err = build_sse_filter(&SseQuery {
            line: None,
            event: Some("progress".into()),
        })
        .expect_err("unknown kind");
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn line_filter_drops_unscoped_and_foreign_events() {
        let filter = SseFilter {
            line_ids: HashSet::from(["line-a".to_string()]),
            event_kinds: HashSet::new(),
        };
        assert!(matches_sse_filter(&envelope(alert_on("line-a")), &filter));
        assert!(!matches_sse_filter(&envelope(alert_on("line-b")), &filter));
        assert!(!matches_sse_filter(
            &envelope(MonitorEvent::SessionReset),
            &filter
        ));
        assert!(matches_sse_filter(
            &envelope(MonitorEvent::SessionReset),
            &SseFilter::default()
        ));
    }

    #[tokio::test]
    async fn stream_replays_from_last_event_id() {
        let bus = EventBus::with_capacity(8);
        let first = bus.publish(MonitorEvent::SessionReset);
        let second = bus.publish(alert_on("line-a"));
        let mut stream = Box::pin(event_replay_stream(bus, Some(first)));
        let envelope = stream.next().await.expect("replayed event");
        assert_eq!(envelope.id, second);
    }
}
