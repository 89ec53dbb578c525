pub mod handlers;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use handlers::{ErrorSinkHandler, FailingHandler, RecordingHandler};
#[allow(unused_imports)]
pub use setup::{TestSetup, TestSetupBuilder};
