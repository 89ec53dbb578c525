// External change-notification transport contract
//
// The multiplexer consumes the transport through this seam only: one open
// stream per topic, events delivered over the handle's receiver, close by
// handle id. The real service client lives outside this crate; the
// in-memory implementation here backs development and tests.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::event::ChangeEvent;

// Public API - what other modules can use
pub use in_memory::InMemoryTransport;

// Internal modules
mod in_memory;

/// Errors surfaced by the transport
///
/// Only open failures cross the multiplexer boundary; they are delivered to
/// subscriber error sinks and the affected topic is evicted (no automatic
/// retry; the next subscribe starts a fresh attempt).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open change stream for topic {topic_key}: {reason}")]
    OpenFailed { topic_key: String, reason: String },
}

impl TransportError {
    /// Create an open failure for a topic
    pub fn open_failed(topic_key: impl Into<String>, reason: impl Into<String>) -> Self {
        TransportError::OpenFailed {
            topic_key: topic_key.into(),
            reason: reason.into(),
        }
    }
}

/// One live change stream opened for a topic
///
/// The handle is exclusively owned by the channel that opened it; events for
/// the topic arrive on `events` in upstream production order.
pub struct TransportHandle {
    /// Unique id of this stream, used for closing
    pub id: Uuid,
    /// Topic the stream was opened for
    pub topic_key: String,
    /// Receiver of change events for this stream
    pub events: mpsc::UnboundedReceiver<ChangeEvent>,
}

/// Trait for the external change-notification service
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens a live change stream for a topic
    async fn open(&self, topic_key: &str) -> Result<TransportHandle, TransportError>;

    /// Closes a previously opened stream
    ///
    /// Idempotent and best-effort: closing an unknown or already-closed
    /// handle is a no-op.
    async fn close(&self, handle_id: Uuid);
}
