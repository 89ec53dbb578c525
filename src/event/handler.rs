use async_trait::async_trait;
use thiserror::Error;

use super::events::ChangeEvent;
use crate::transport::TransportError;

/// Errors a handler can return from [`ChangeHandler::on_event`]
///
/// Handler failures are isolated by the multiplexer: they are logged and do
/// not affect sibling handlers or the channel itself.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("handler failed: {0}")]
    Failed(String),
}

impl HandlerError {
    /// Create a handler failure from any displayable cause
    pub fn failed(msg: impl Into<String>) -> Self {
        HandlerError::Failed(msg.into())
    }
}

/// Trait for components that consume change events from a topic
///
/// Handlers are the reactive edge of the sync layer. Each subscriber
/// registers one handler per subscription; the multiplexer fans incoming
/// events out to every handler of the topic in registration order.
///
/// Examples:
/// - a view-model cache invalidating itself on row changes
/// - a local store applying upstream rows
/// - a badge counter recomputing on inserts
#[async_trait]
pub trait ChangeHandler: Send + Sync {
    /// Handle one change event
    ///
    /// Returning an error marks this handler as failed for this event only;
    /// other handlers still run and the subscription stays registered.
    async fn on_event(&self, event: &ChangeEvent) -> Result<(), HandlerError>;

    /// Receive an asynchronous transport failure for the subscribed topic
    ///
    /// Called at most once per failure, after which the topic is evicted and
    /// must be re-subscribed. Default is a no-op for handlers that only care
    /// about data.
    async fn on_error(&self, _error: &TransportError) {}

    /// Get a human-readable name for this handler (for logging/debugging)
    fn name(&self) -> &'static str;
}

/// A no-op change handler for testing
pub struct NoOpChangeHandler;

#[async_trait]
impl ChangeHandler for NoOpChangeHandler {
    async fn on_event(&self, _event: &ChangeEvent) -> Result<(), HandlerError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "NoOpChangeHandler"
    }
}

type EventCallback = Box<dyn Fn(ChangeEvent) + Send + Sync>;
type ErrorCallback = Box<dyn Fn(&TransportError) + Send + Sync>;

/// Adapter that wraps plain closures as a [`ChangeHandler`]
///
/// This is what `Multiplexer::subscribe_fn` uses under the hood; the error
/// sink is optional and defaults to ignoring transport failures.
pub struct CallbackHandler {
    on_event: EventCallback,
    on_error: Option<ErrorCallback>,
}

impl CallbackHandler {
    /// Creates a handler that forwards each event to the given closure
    pub fn new(on_event: impl Fn(ChangeEvent) + Send + Sync + 'static) -> Self {
        Self {
            on_event: Box::new(on_event),
            on_error: None,
        }
    }

    /// Attach a closure that receives asynchronous transport failures
    pub fn with_error_sink(mut self, on_error: impl Fn(&TransportError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(on_error));
        self
    }
}

#[async_trait]
impl ChangeHandler for CallbackHandler {
    async fn on_event(&self, event: &ChangeEvent) -> Result<(), HandlerError> {
        (self.on_event)(event.clone());
        Ok(())
    }

    async fn on_error(&self, error: &TransportError) {
        if let Some(sink) = &self.on_error {
            sink(error);
        }
    }

    fn name(&self) -> &'static str {
        "CallbackHandler"
    }
}
