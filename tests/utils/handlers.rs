use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use feedmux::{ChangeEvent, ChangeHandler, HandlerError, TransportError};

// ============================================================================
// Mock Handlers
// ============================================================================

/// Handler that records every event it receives, tagged with its label
pub struct RecordingHandler {
    label: &'static str,
    log: Arc<Mutex<Vec<(&'static str, ChangeEvent)>>>,
}

impl RecordingHandler {
    /// Creates a handler appending to a log shared across handlers, so
    /// tests can assert cross-handler delivery order
    pub fn new(
        label: &'static str,
        log: Arc<Mutex<Vec<(&'static str, ChangeEvent)>>>,
    ) -> Arc<Self> {
        Arc::new(Self { label, log })
    }
}

#[async_trait]
impl ChangeHandler for RecordingHandler {
    async fn on_event(&self, event: &ChangeEvent) -> Result<(), HandlerError> {
        self.log.lock().unwrap().push((self.label, event.clone()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        self.label
    }
}

/// Handler that always fails, for isolation tests
pub struct FailingHandler;

#[async_trait]
impl ChangeHandler for FailingHandler {
    async fn on_event(&self, _event: &ChangeEvent) -> Result<(), HandlerError> {
        Err(HandlerError::failed("simulated failure"))
    }

    fn name(&self) -> &'static str {
        "FailingHandler"
    }
}

/// Handler that records transport errors delivered to its error sink
pub struct ErrorSinkHandler {
    errors: Arc<Mutex<Vec<String>>>,
}

impl ErrorSinkHandler {
    pub fn new(errors: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self { errors })
    }
}

#[async_trait]
impl ChangeHandler for ErrorSinkHandler {
    async fn on_event(&self, _event: &ChangeEvent) -> Result<(), HandlerError> {
        Ok(())
    }

    async fn on_error(&self, error: &TransportError) {
        self.errors.lock().unwrap().push(error.to_string());
    }

    fn name(&self) -> &'static str {
        "ErrorSinkHandler"
    }
}
