use std::sync::Arc;
use uuid::Uuid;

use crate::event::ChangeHandler;

/// One registered subscriber of a topic
#[derive(Clone)]
pub(crate) struct Subscription {
    pub id: Uuid,
    pub handler: Arc<dyn ChangeHandler>,
}

impl Subscription {
    pub fn new(handler: Arc<dyn ChangeHandler>) -> Self {
        Self {
            id: Uuid::new_v4(),
            handler,
        }
    }
}

/// Ordered set of subscriptions for one topic
///
/// Insertion order is fan-out order. Removal is by subscription id and
/// idempotent; ids are v4 UUIDs so a released id is never reissued.
pub(crate) struct ListenerRegistry {
    subscriptions: Vec<Subscription>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
        }
    }

    /// Appends a subscription; it will be the last to receive events
    pub fn add(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Removes a subscription by id
    ///
    /// Returns `false` if the id was not registered (already removed).
    pub fn remove(&mut self, subscription_id: Uuid) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != subscription_id);
        self.subscriptions.len() < before
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Copies the current subscriptions for dispatch outside the lock
    pub fn snapshot(&self) -> Vec<Subscription> {
        self.subscriptions.clone()
    }
}
