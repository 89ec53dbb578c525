use uuid::Uuid;

/// Lifecycle state of a topic's channel
///
/// Only live states are represented: a topic with no entry in the topic map
/// is conceptually Absent (never opened, or Closed and evicted). Teardown
/// always evicts the entry, so Closed never appears in the map either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Transport open is in flight
    Creating,
    /// Stream is open and events are flowing
    Active,
    /// Last subscriber left; close is scheduled after the grace window
    Draining,
}

/// Per-topic channel record wrapping one transport handle
///
/// `generation` changes on every transition that invalidates scheduled work
/// (a pending open or a drain timer); stale tasks compare their captured
/// generation before acting.
#[derive(Debug)]
pub(crate) struct Channel {
    pub state: ChannelState,
    pub handle_id: Option<Uuid>,
    pub generation: u64,
}

impl Channel {
    /// Creates a channel awaiting its transport open
    pub fn creating(generation: u64) -> Self {
        Self {
            state: ChannelState::Creating,
            handle_id: None,
            generation,
        }
    }

    /// Creating -> Active: the transport confirmed the stream
    pub fn activate(&mut self, handle_id: Uuid) {
        self.state = ChannelState::Active;
        self.handle_id = Some(handle_id);
    }

    /// Active -> Draining: last subscriber left, close scheduled
    pub fn begin_drain(&mut self, generation: u64) {
        self.state = ChannelState::Draining;
        self.generation = generation;
    }

    /// Draining -> Active: a re-subscribe cancelled the scheduled close
    ///
    /// The existing transport handle is reused; bumping the generation makes
    /// the pending drain timer a no-op.
    pub fn cancel_drain(&mut self, generation: u64) {
        self.state = ChannelState::Active;
        self.generation = generation;
    }
}
