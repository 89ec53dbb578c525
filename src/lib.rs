// Library crate for the feedmux realtime sync layer
// This file exposes the public API for integration tests

pub mod event;
pub mod multiplexer;
pub mod transport;

// Re-export commonly used types for easier access in tests
pub use event::{
    CallbackHandler, ChangeEvent, ChangeHandler, ChangeOperation, HandlerError, NoOpChangeHandler,
};
pub use multiplexer::{ChannelState, Multiplexer, MultiplexerConfig, SubscriptionHandle};
pub use transport::{InMemoryTransport, Transport, TransportError, TransportHandle};
