use std::fmt;
use uuid::Uuid;

use super::service::Multiplexer;

/// Caller-facing token for one registered subscription
///
/// The handle's sole operation is [`unsubscribe`](Self::unsubscribe).
/// Dropping the handle does NOT unsubscribe; the caller owns the
/// subscription's lifetime explicitly.
pub struct SubscriptionHandle {
    id: Uuid,
    topic_key: String,
    multiplexer: Multiplexer,
}

impl SubscriptionHandle {
    pub(crate) fn new(id: Uuid, topic_key: String, multiplexer: Multiplexer) -> Self {
        Self {
            id,
            topic_key,
            multiplexer,
        }
    }

    /// The unique id of this subscription
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The topic this subscription is registered for
    pub fn topic_key(&self) -> &str {
        &self.topic_key
    }

    /// Removes this subscription from its topic
    ///
    /// Idempotent: calling it again after the first has no effect. If this
    /// was the topic's last subscription, channel teardown begins (subject
    /// to the drain grace window).
    pub async fn unsubscribe(&self) {
        self.multiplexer.unsubscribe(&self.topic_key, self.id).await;
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("topic_key", &self.topic_key)
            .finish()
    }
}
