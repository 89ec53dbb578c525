// Change-event types and the subscriber handler seam
//
// This module defines what flows through the multiplexer: the change
// notifications produced by the transport and the handler trait every
// subscriber implements (or has wrapped around a closure).

// Public API - what other modules can use
pub use events::{ChangeEvent, ChangeOperation};
pub use handler::{CallbackHandler, ChangeHandler, HandlerError, NoOpChangeHandler};

// Internal modules
mod events;
mod handler;
