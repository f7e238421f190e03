//! Broadcast bus with a bounded replay ring.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::broadcast::{self, Sender};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::{Stream, StreamExt};

use crate::payloads::{DEFAULT_REPLAY_CAPACITY, EventEnvelope, EventId, MonitorEvent};

/// Stream handed to subscribers: replayed backlog first, then live events.
pub type EventStream =
    Pin<Box<dyn Stream<Item = Result<EventEnvelope, BroadcastStreamRecvError>> + Send>>;

/// Shared event bus built on top of `tokio::broadcast`.
#[derive(Clone)]
pub struct EventBus {
    sender: Sender<EventEnvelope>,
    replay: Arc<Mutex<Replay>>,
    replay_capacity: usize,
}

/// Replay ring and id counter; one lock keeps ring order equal to id order.
struct Replay {
    ring: VecDeque<EventEnvelope>,
    next_id: EventId,
}

impl EventBus {
    /// Construct a bus with a custom replay capacity (at least one).
    #[must_use]
    pub fn with_capacity(replay_capacity: usize) -> Self {
        let replay_capacity = replay_capacity.max(1);
        let (sender, _) = broadcast::channel(replay_capacity);
        Self {
            sender,
            replay: Arc::new(Mutex::new(Replay {
                ring: VecDeque::with_capacity(replay_capacity),
                next_id: 1,
            })),
            replay_capacity,
        }
    }

    /// Construct a bus with the default replay capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_REPLAY_CAPACITY)
    }

    /// Subscribe to the bus. With `last_event_id`, buffered events newer than
    /// that id are delivered first.
    #[must_use]
    pub fn subscribe(&self, last_event_id: Option<EventId>) -> EventStream {
        let rx = self.sender.subscribe();
        let backlog = last_event_id.map_or_else(Vec::new, |last| self.backlog_since(last));
        let replayed_up_to = backlog.last().map_or(0, |env| env.id);
        let live = BroadcastStream::new(rx)
            .filter(move |item| !matches!(item, Ok(env) if env.id <= replayed_up_to));
        Box::pin(tokio_stream::iter(backlog.into_iter().map(Ok)).chain(live))
    }

    /// Publish an event to all subscribers and return its id.
    ///
    /// Publishing with no subscribers is not an error; the event still lands
    /// in the replay ring.
    pub fn publish(&self, event: MonitorEvent) -> EventId {
        let mut replay = self.lock_replay();
        let id = replay.next_id;
        replay.next_id = id.saturating_add(1);

        let envelope = EventEnvelope {
            id,
            timestamp: Utc::now(),
            event,
        };
        if replay.ring.len() == self.replay_capacity {
            let _ = replay.ring.pop_front();
        }
        replay.ring.push_back(envelope.clone());
        let _ = self.sender.send(envelope);
        id
    }

    /// Last event id observed in the replay buffer.
    #[must_use]
    pub fn last_event_id(&self) -> Option<EventId> {
        self.lock_replay().ring.back().map(|env| env.id)
    }

    /// Collect a backlog of events emitted after the specified id.
    #[must_use]
    pub fn backlog_since(&self, id: EventId) -> Vec<EventEnvelope> {
        self.lock_replay()
            .ring
            .iter()
            .filter(|env| env.id > id)
            .cloned()
            .collect()
    }

    fn lock_replay(&self) -> MutexGuard<'_, Replay> {
        self.replay.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
