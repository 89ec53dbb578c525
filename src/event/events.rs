use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of row change carried by a [`ChangeEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOperation {
    Insert,
    Update,
    Delete,
}

impl ChangeOperation {
    /// Get a human-readable name for the operation (for logging/debugging)
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeOperation::Insert => "insert",
            ChangeOperation::Update => "update",
            ChangeOperation::Delete => "delete",
        }
    }
}

/// A change notification delivered by the transport
///
/// Events represent facts about rows that have already changed upstream.
/// They are tagged with the topic key of the feed they belong to so the
/// multiplexer can route them without inspecting the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Topic key of the feed this event belongs to
    pub topic_key: String,
    /// What happened to the row
    pub operation: ChangeOperation,
    /// The row after the change (`Null` for deletes)
    pub record: Value,
    /// The row before the change, when the upstream provides it
    pub previous_record: Option<Value>,
    /// Upstream commit time of the change
    pub commit_timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    /// Creates an insert event carrying the new row
    pub fn insert(topic_key: impl Into<String>, record: Value) -> Self {
        Self {
            topic_key: topic_key.into(),
            operation: ChangeOperation::Insert,
            record,
            previous_record: None,
            commit_timestamp: Utc::now(),
        }
    }

    /// Creates an update event carrying the new and previous rows
    pub fn update(topic_key: impl Into<String>, record: Value, previous_record: Value) -> Self {
        Self {
            topic_key: topic_key.into(),
            operation: ChangeOperation::Update,
            record,
            previous_record: Some(previous_record),
            commit_timestamp: Utc::now(),
        }
    }

    /// Creates a delete event carrying the removed row
    pub fn delete(topic_key: impl Into<String>, previous_record: Value) -> Self {
        Self {
            topic_key: topic_key.into(),
            operation: ChangeOperation::Delete,
            record: Value::Null,
            previous_record: Some(previous_record),
            commit_timestamp: Utc::now(),
        }
    }

    /// Get a human-readable description of the event type
    pub fn event_type(&self) -> &'static str {
        self.operation.as_str()
    }
}
