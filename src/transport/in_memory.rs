use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use super::{Transport, TransportError, TransportHandle};
use crate::event::ChangeEvent;

/// In-memory implementation of Transport for development and testing
///
/// Streams are plain unbounded channels: `publish` feeds the open stream of
/// a topic, if any. Open/close calls are counted so tests can assert channel
/// dedup and teardown behavior, and opens can be made to fail or take time.
pub struct InMemoryTransport {
    /// topic key -> (handle id, sender feeding that handle's receiver)
    streams: Mutex<HashMap<String, (Uuid, mpsc::UnboundedSender<ChangeEvent>)>>,
    /// live handle id -> topic key
    handles: Mutex<HashMap<Uuid, String>>,
    open_count: AtomicUsize,
    close_count: AtomicUsize,
    fail_opens: AtomicBool,
    open_delay: Mutex<Option<Duration>>,
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTransport {
    /// Creates a new transport with no open streams
    pub fn new() -> Self {
        Self {
            streams: Mutex::new(HashMap::new()),
            handles: Mutex::new(HashMap::new()),
            open_count: AtomicUsize::new(0),
            close_count: AtomicUsize::new(0),
            fail_opens: AtomicBool::new(false),
            open_delay: Mutex::new(None),
        }
    }

    /// Make every subsequent `open` call fail (or succeed again)
    pub fn set_open_failure(&self, fail: bool) {
        self.fail_opens.store(fail, Ordering::Relaxed);
    }

    /// Delay every subsequent `open` call by the given duration
    ///
    /// Lets tests exercise the window where a channel is still Creating.
    pub fn set_open_delay(&self, delay: Duration) {
        *self.open_delay.lock().unwrap() = Some(delay);
    }

    /// Delivers an event to the open stream of its topic
    ///
    /// Returns `true` if a stream was open for the topic and accepted the
    /// event, `false` if the event was dropped.
    pub fn publish(&self, event: ChangeEvent) -> bool {
        let streams = self.streams.lock().unwrap();
        match streams.get(&event.topic_key) {
            Some((_, sender)) => sender.send(event).is_ok(),
            None => {
                debug!(topic_key = %event.topic_key, "publish with no open stream, event dropped");
                false
            }
        }
    }

    /// Total `open` calls, including failed ones
    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::Relaxed)
    }

    /// Total `close` calls, including redundant ones
    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::Relaxed)
    }

    /// Number of handles currently open
    pub fn live_handle_count(&self) -> usize {
        self.handles.lock().unwrap().len()
    }

    /// Whether a stream is currently open for the topic
    pub fn is_open(&self, topic_key: &str) -> bool {
        self.streams.lock().unwrap().contains_key(topic_key)
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn open(&self, topic_key: &str) -> Result<TransportHandle, TransportError> {
        self.open_count.fetch_add(1, Ordering::Relaxed);

        let delay = *self.open_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_opens.load(Ordering::Relaxed) {
            debug!(topic_key = %topic_key, "injected open failure");
            return Err(TransportError::open_failed(topic_key, "open failure injected"));
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.streams
            .lock()
            .unwrap()
            .insert(topic_key.to_string(), (id, sender));
        self.handles
            .lock()
            .unwrap()
            .insert(id, topic_key.to_string());

        debug!(topic_key = %topic_key, handle_id = %id, "stream opened");
        Ok(TransportHandle {
            id,
            topic_key: topic_key.to_string(),
            events: receiver,
        })
    }

    async fn close(&self, handle_id: Uuid) {
        self.close_count.fetch_add(1, Ordering::Relaxed);

        let topic_key = self.handles.lock().unwrap().remove(&handle_id);
        match topic_key {
            Some(topic_key) => {
                // Only drop the stream if it still belongs to this handle; a
                // newer open for the same topic must survive a stale close.
                let mut streams = self.streams.lock().unwrap();
                if let Some((current_id, _)) = streams.get(&topic_key) {
                    if *current_id == handle_id {
                        streams.remove(&topic_key);
                    }
                }
                debug!(topic_key = %topic_key, handle_id = %handle_id, "stream closed");
            }
            None => {
                debug!(handle_id = %handle_id, "close for unknown handle ignored");
            }
        }
    }
}
