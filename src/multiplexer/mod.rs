// Topic-keyed subscription multiplexing
//
// This module owns the core coordination logic: the facade callers subscribe
// through, the per-topic channel lifecycle, and the ordered listener
// registry it fans events out to.

// Public API - what other modules can use
pub use channel::ChannelState;
pub use handle::SubscriptionHandle;
pub use service::{Multiplexer, MultiplexerConfig};

// Internal modules
mod channel;
mod handle;
mod registry;
mod service;
