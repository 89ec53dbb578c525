use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use feedmux::{InMemoryTransport, Multiplexer, MultiplexerConfig};

/// Installs a log subscriber once so failing runs can be inspected with
/// RUST_LOG; later calls are no-ops
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub transport: Arc<InMemoryTransport>,
    pub multiplexer: Multiplexer,
    pub drain_grace: Duration,
}

impl TestSetup {
    /// Gives spawned open/pump/dispatch tasks a moment to run
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    /// Waits well past the drain grace window
    pub async fn wait_past_grace(&self) {
        tokio::time::sleep(self.drain_grace * 3).await;
    }
}

pub struct TestSetupBuilder {
    drain_grace: Duration,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            drain_grace: Duration::from_millis(50),
        }
    }

    #[allow(dead_code)]
    pub fn with_drain_grace(mut self, drain_grace: Duration) -> Self {
        self.drain_grace = drain_grace;
        self
    }

    pub fn build(self) -> TestSetup {
        init_tracing();

        let transport = Arc::new(InMemoryTransport::new());
        let multiplexer = Multiplexer::with_config(
            transport.clone(),
            MultiplexerConfig {
                drain_grace: self.drain_grace,
                close_timeout: Duration::from_secs(1),
            },
        );
        TestSetup {
            transport,
            multiplexer,
            drain_grace: self.drain_grace,
        }
    }
}

impl Default for TestSetupBuilder {
    fn default() -> Self {
        Self::new()
    }
}
