use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::channel::{Channel, ChannelState};
use super::handle::SubscriptionHandle;
use super::registry::{ListenerRegistry, Subscription};
use crate::event::{CallbackHandler, ChangeEvent, ChangeHandler};
use crate::transport::{Transport, TransportError, TransportHandle};

/// Configuration for channel teardown timing
#[derive(Debug, Clone)]
pub struct MultiplexerConfig {
    /// Grace window after the last subscriber leaves before the stream is
    /// closed; a re-subscribe within the window reuses the open stream
    pub drain_grace: Duration,
    /// Upper bound on a transport close before teardown is forced
    pub close_timeout: Duration,
}

impl Default for MultiplexerConfig {
    fn default() -> Self {
        Self {
            drain_grace: Duration::from_millis(250),
            close_timeout: Duration::from_secs(5),
        }
    }
}

/// Per-topic pair of channel lifecycle and subscriber registry
struct TopicEntry {
    channel: Channel,
    registry: ListenerRegistry,
}

/// Subscription multiplexer over a change-notification transport
///
/// Many independent consumers subscribe to the same topic key while exactly
/// one transport stream per topic stays open. The multiplexer owns the map
/// from topic key to (channel, registry); every mutation goes through its
/// write lock, so concurrent subscribe/unsubscribe calls and incoming
/// transport events always observe a consistent topic state.
///
/// Cloning is cheap (shared state behind `Arc`); background tasks and
/// subscription handles hold clones.
#[derive(Clone)]
pub struct Multiplexer {
    transport: Arc<dyn Transport>,
    topics: Arc<RwLock<HashMap<String, TopicEntry>>>,
    generations: Arc<AtomicU64>,
    config: MultiplexerConfig,
}

impl Multiplexer {
    /// Creates a multiplexer with default teardown timing
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, MultiplexerConfig::default())
    }

    /// Creates a multiplexer with explicit teardown timing
    pub fn with_config(transport: Arc<dyn Transport>, config: MultiplexerConfig) -> Self {
        Self {
            transport,
            topics: Arc::new(RwLock::new(HashMap::new())),
            generations: Arc::new(AtomicU64::new(0)),
            config,
        }
    }

    /// Registers a handler for a topic and returns its unsubscribe handle
    ///
    /// The first subscriber of a topic triggers the transport open in a
    /// background task; this call itself only touches the topic map and
    /// never waits on the transport. Transport failures are not returned
    /// here; they reach subscribers through [`ChangeHandler::on_error`].
    #[instrument(skip(self, handler))]
    pub async fn subscribe(
        &self,
        topic_key: &str,
        handler: Arc<dyn ChangeHandler>,
    ) -> SubscriptionHandle {
        let subscription = Subscription::new(handler);
        let subscription_id = subscription.id;

        let mut topics = self.topics.write().await;
        match topics.get_mut(topic_key) {
            Some(entry) => {
                entry.registry.add(subscription);
                if entry.channel.state == ChannelState::Draining {
                    // Reuse the open stream instead of a close/reopen churn
                    let generation = self.next_generation();
                    entry.channel.cancel_drain(generation);
                    debug!(
                        topic_key = %topic_key,
                        subscribers = entry.registry.len(),
                        "scheduled teardown cancelled by re-subscribe"
                    );
                } else {
                    debug!(
                        topic_key = %topic_key,
                        subscribers = entry.registry.len(),
                        "subscriber added to existing channel"
                    );
                }
            }
            None => {
                let generation = self.next_generation();
                let mut registry = ListenerRegistry::new();
                registry.add(subscription);
                topics.insert(
                    topic_key.to_string(),
                    TopicEntry {
                        channel: Channel::creating(generation),
                        registry,
                    },
                );
                info!(topic_key = %topic_key, "first subscriber, opening channel");
                self.spawn_open(topic_key.to_string(), generation);
            }
        }
        drop(topics);

        SubscriptionHandle::new(subscription_id, topic_key.to_string(), self.clone())
    }

    /// Registers a closure for a topic
    ///
    /// Convenience wrapper building a [`CallbackHandler`]; use
    /// [`subscribe`](Self::subscribe) with a custom handler to also receive
    /// transport errors.
    pub async fn subscribe_fn(
        &self,
        topic_key: &str,
        on_event: impl Fn(ChangeEvent) + Send + Sync + 'static,
    ) -> SubscriptionHandle {
        self.subscribe(topic_key, Arc::new(CallbackHandler::new(on_event)))
            .await
    }

    /// Removes a subscription; called by [`SubscriptionHandle::unsubscribe`]
    ///
    /// Idempotent. When the last subscription of a topic is removed the
    /// channel starts draining (or, if the stream was still opening, the
    /// pending open is cancelled outright).
    #[instrument(skip(self))]
    pub(crate) async fn unsubscribe(&self, topic_key: &str, subscription_id: Uuid) {
        let mut topics = self.topics.write().await;
        let Some(entry) = topics.get_mut(topic_key) else {
            return;
        };
        if !entry.registry.remove(subscription_id) {
            return;
        }
        debug!(
            topic_key = %topic_key,
            remaining = entry.registry.len(),
            "subscriber removed"
        );
        if !entry.registry.is_empty() {
            return;
        }

        match entry.channel.state {
            ChannelState::Creating => {
                // The open completion will find the entry gone and close the
                // fresh handle immediately.
                topics.remove(topic_key);
                info!(topic_key = %topic_key, "last subscriber left before open completed, pending open cancelled");
            }
            ChannelState::Active => {
                let generation = self.next_generation();
                entry.channel.begin_drain(generation);
                debug!(
                    topic_key = %topic_key,
                    grace_ms = self.config.drain_grace.as_millis() as u64,
                    "last subscriber left, channel draining"
                );
                self.spawn_drain(topic_key.to_string(), generation);
            }
            ChannelState::Draining => {
                // Close already scheduled
            }
        }
    }

    /// Current channel state for a topic (`None` when no channel exists)
    pub async fn channel_state(&self, topic_key: &str) -> Option<ChannelState> {
        let topics = self.topics.read().await;
        topics.get(topic_key).map(|entry| entry.channel.state)
    }

    /// Number of subscriptions currently registered for a topic
    pub async fn subscriber_count(&self, topic_key: &str) -> usize {
        let topics = self.topics.read().await;
        topics
            .get(topic_key)
            .map(|entry| entry.registry.len())
            .unwrap_or(0)
    }

    /// Topic keys that currently have a channel (any live state)
    pub async fn active_topics(&self) -> Vec<String> {
        let topics = self.topics.read().await;
        topics.keys().cloned().collect()
    }

    /// Fans one event out to the topic's subscribers in registration order
    ///
    /// The subscriber list is snapshotted under the read lock and handlers
    /// run outside it, so a subscription removed mid-dispatch may still see
    /// this in-flight event but never a later one. A failing handler is
    /// logged and does not stop its siblings.
    async fn dispatch(&self, event: ChangeEvent) {
        let subscribers = {
            let topics = self.topics.read().await;
            match topics.get(&event.topic_key) {
                Some(entry) => entry.registry.snapshot(),
                None => {
                    // Expected during teardown races
                    debug!(topic_key = %event.topic_key, "event for unknown topic dropped");
                    return;
                }
            }
        };

        debug!(
            topic_key = %event.topic_key,
            event_type = event.event_type(),
            subscribers = subscribers.len(),
            "dispatching change event"
        );

        for subscription in subscribers {
            if let Err(error) = subscription.handler.on_event(&event).await {
                warn!(
                    topic_key = %event.topic_key,
                    handler = subscription.handler.name(),
                    subscription_id = %subscription.id,
                    error = %error,
                    "change handler failed, continuing with remaining handlers"
                );
            }
        }
    }

    /// Spawns the transport open for a new channel incarnation
    fn spawn_open(&self, topic_key: String, generation: u64) {
        let mux = self.clone();
        tokio::spawn(async move {
            match mux.transport.open(&topic_key).await {
                Ok(handle) => mux.complete_open(topic_key, generation, handle).await,
                Err(error) => mux.fail_open(topic_key, generation, error).await,
            }
        });
    }

    /// Creating -> Active, or closes the handle if the channel was superseded
    async fn complete_open(&self, topic_key: String, generation: u64, handle: TransportHandle) {
        let TransportHandle {
            id: handle_id,
            events,
            ..
        } = handle;

        let adopted = {
            let mut topics = self.topics.write().await;
            match topics.get_mut(&topic_key) {
                Some(entry) if entry.channel.generation == generation => {
                    entry.channel.activate(handle_id);
                    true
                }
                _ => false,
            }
        };

        if adopted {
            info!(topic_key = %topic_key, handle_id = %handle_id, "channel active");
            self.spawn_pump(topic_key, events);
        } else {
            debug!(
                topic_key = %topic_key,
                handle_id = %handle_id,
                "channel gone before open completed, closing fresh handle"
            );
            self.transport.close(handle_id).await;
        }
    }

    /// Evicts the failed topic and reports the error to its subscribers
    async fn fail_open(&self, topic_key: String, generation: u64, error: TransportError) {
        let subscribers = {
            let mut topics = self.topics.write().await;
            let current = matches!(
                topics.get(&topic_key),
                Some(entry) if entry.channel.generation == generation
            );
            if !current {
                // A newer incarnation took over; this failure is stale
                return;
            }
            match topics.remove(&topic_key) {
                Some(entry) => entry.registry.snapshot(),
                None => return,
            }
        };

        warn!(
            topic_key = %topic_key,
            subscribers = subscribers.len(),
            error = %error,
            "transport open failed, topic evicted"
        );

        // Every subscriber registered at the time of failure hears about it
        // exactly once, in registration order
        for subscription in subscribers {
            subscription.handler.on_error(&error).await;
        }
    }

    /// Spawns the per-channel pump reading transport events until the
    /// stream closes
    fn spawn_pump(&self, topic_key: String, mut events: mpsc::UnboundedReceiver<ChangeEvent>) {
        let mux = self.clone();
        tokio::spawn(async move {
            debug!(topic_key = %topic_key, "event pump started");
            while let Some(event) = events.recv().await {
                mux.dispatch(event).await;
            }
            debug!(topic_key = %topic_key, "event pump stopped, stream closed");
        });
    }

    /// Spawns the drain timer for a draining channel incarnation
    fn spawn_drain(&self, topic_key: String, generation: u64) {
        let mux = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(mux.config.drain_grace).await;
            mux.finish_drain(topic_key, generation).await;
        });
    }

    /// Draining -> Closed, unless a re-subscribe won the race
    async fn finish_drain(&self, topic_key: String, generation: u64) {
        let handle_id = {
            let mut topics = self.topics.write().await;
            let current = matches!(
                topics.get(&topic_key),
                Some(entry) if entry.channel.generation == generation
            );
            if !current {
                debug!(topic_key = %topic_key, "drain timer stale, channel back in use");
                return;
            }
            match topics.remove(&topic_key) {
                Some(entry) => entry.channel.handle_id,
                None => return,
            }
        };

        info!(topic_key = %topic_key, "grace window elapsed, channel closed and topic evicted");
        if let Some(handle_id) = handle_id {
            if timeout(self.config.close_timeout, self.transport.close(handle_id))
                .await
                .is_err()
            {
                warn!(
                    topic_key = %topic_key,
                    handle_id = %handle_id,
                    "transport close timed out, teardown forced"
                );
            }
        }
    }

    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed)
    }
}
