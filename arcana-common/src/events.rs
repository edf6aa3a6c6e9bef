//! Event types for the Arcana event system
//!
//! Provides shared event definitions and the EventBus used by Arcana
//! services to broadcast analysis lifecycle events to observers (SSE
//! bridges, metrics collectors, tests).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Arcana event types
///
/// Events are broadcast via EventBus and can be serialized for SSE
/// transmission by the routing layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ArcanaEvent {
    /// An analysis request passed admission control and entered the pipeline
    AnalysisStarted {
        request_id: Uuid,
        client_id: String,
        locale: String,
        timestamp: DateTime<Utc>,
    },

    /// An analysis request was denied by admission control
    AnalysisRateLimited {
        client_id: String,
        /// Moment at which enough window history expires to admit again
        reset_at: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    /// One provider attempt inside the cascade failed
    ProviderAttemptFailed {
        request_id: Uuid,
        provider_id: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Every provider attempt failed; the deterministic fallback took over
    FallbackEngaged {
        request_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// An analysis request completed and a result was returned to the caller
    AnalysisCompleted {
        request_id: Uuid,
        /// Provider that produced the interpretation, or "rule-based"
        model_used: String,
        confidence: f32,
        requires_human_review: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

impl ArcanaEvent {
    /// Event type name as transmitted in the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            ArcanaEvent::AnalysisStarted { .. } => "AnalysisStarted",
            ArcanaEvent::AnalysisRateLimited { .. } => "AnalysisRateLimited",
            ArcanaEvent::ProviderAttemptFailed { .. } => "ProviderAttemptFailed",
            ArcanaEvent::FallbackEngaged { .. } => "FallbackEngaged",
            ArcanaEvent::AnalysisCompleted { .. } => "AnalysisCompleted",
        }
    }
}

/// Broadcast event bus shared across pipeline components
///
/// Wraps a tokio broadcast channel. Subscribers receive events emitted
/// after subscription; slow subscribers may observe lagged drops, which
/// is acceptable for observability traffic.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ArcanaEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<ArcanaEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` when at least one subscriber exists,
    /// `Err` when none are listening.
    pub fn emit(
        &self,
        event: ArcanaEvent,
    ) -> std::result::Result<usize, broadcast::error::SendError<ArcanaEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the absence of subscribers
    ///
    /// Lifecycle events are advisory; a service with no observers attached
    /// must not treat emission as an error.
    pub fn emit_lossy(&self, event: ArcanaEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::trace!(event = %e.0.event_type(), "No subscribers for event");
        }
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of currently attached subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
