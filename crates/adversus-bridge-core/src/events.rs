//! Webhook event types, debug ring buffer, and event sink trait.
//!
//! Every accepted webhook is recorded twice: into an [`EventSink`] (the
//! durable, append-only store when one is configured) and into the
//! process-lifetime [`DebugEventBuffer`] that the debug endpoint reads.
//! Sink failures are logged and swallowed — the webhook acknowledgment
//! must never depend on persistence (at-least-once delivery from the
//! caller is favored over consistency here).

use crate::Timestamp;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::warn;

/// Default capacity of the debug ring buffer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 200;

/// One received webhook callback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookEvent {
    /// When the bridge accepted the callback.
    #[serde(rename = "receivedAt")]
    pub received_at: Timestamp,
    /// The payload's self-declared event type, when it carried one.
    #[serde(rename = "eventType")]
    pub event_type: Option<String>,
    /// The raw JSON payload, stored verbatim.
    pub payload: Value,
}

impl WebhookEvent {
    /// Capture a payload now, lifting its `event` / `eventType` / `type`
    /// member as the event type when present.
    pub fn capture(payload: Value) -> Self {
        let event_type = ["event", "eventType", "type"]
            .iter()
            .find_map(|key| payload.get(key))
            .and_then(Value::as_str)
            .map(|s| s.to_string());
        Self {
            received_at: Timestamp::now(),
            event_type,
            payload,
        }
    }
}

// ============================================================================
// Debug ring buffer
// ============================================================================

/// Bounded, newest-first buffer of recent webhook events.
///
/// Capacity is fixed at construction; appending beyond it evicts the
/// oldest entry. The buffer is an explicit object owned by the
/// process-lifetime application state and passed by reference to handlers,
/// not a module-level global.
#[derive(Debug)]
pub struct DebugEventBuffer {
    events: VecDeque<WebhookEvent>,
    capacity: usize,
}

impl DebugEventBuffer {
    /// Create a buffer holding at most `capacity` events (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an event, evicting the oldest when full.
    pub fn push(&mut self, event: WebhookEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_back();
        }
        self.events.push_front(event);
    }

    /// Snapshot the buffer, newest first.
    pub fn snapshot(&self) -> Vec<WebhookEvent> {
        self.events.iter().cloned().collect()
    }

    /// Number of buffered events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when nothing has been buffered.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The fixed capacity chosen at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for DebugEventBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

// ============================================================================
// Event sink
// ============================================================================

/// Failure writing to or reading from an event sink.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SinkError {
    #[error("Event sink unavailable: {message}")]
    Unavailable { message: String },

    #[error("Event sink write failed: {message}")]
    WriteFailed { message: String },
}

/// Append-only store of received webhook events with a recency query.
///
/// Implementations are injected at startup; the in-memory implementation
/// below backs development and tests, a relational store slots in behind
/// the same trait.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Append one event.
    async fn record(&self, event: WebhookEvent) -> Result<(), SinkError>;

    /// The most recent events, newest first, at most `limit`.
    async fn recent(&self, limit: usize) -> Result<Vec<WebhookEvent>, SinkError>;
}

/// Record an event into a sink, logging and swallowing any failure.
pub async fn record_best_effort(sink: &dyn EventSink, event: WebhookEvent) {
    if let Err(error) = sink.record(event).await {
        warn!(%error, "Failed to persist webhook event; acknowledging anyway");
    }
}

/// In-memory [`EventSink`] over a [`DebugEventBuffer`].
#[derive(Debug)]
pub struct MemoryEventSink {
    buffer: Mutex<DebugEventBuffer>,
}

impl MemoryEventSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(DebugEventBuffer::new(capacity)),
        }
    }
}

impl Default for MemoryEventSink {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

#[async_trait]
impl EventSink for MemoryEventSink {
    async fn record(&self, event: WebhookEvent) -> Result<(), SinkError> {
        let mut buffer = self.buffer.lock().map_err(|_| SinkError::Unavailable {
            message: "buffer lock poisoned".to_string(),
        })?;
        buffer.push(event);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<WebhookEvent>, SinkError> {
        let buffer = self.buffer.lock().map_err(|_| SinkError::Unavailable {
            message: "buffer lock poisoned".to_string(),
        })?;
        let mut events = buffer.snapshot();
        events.truncate(limit);
        Ok(events)
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
