use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::AssignError;

/// One subject's routing entry inside a room record.
///
/// The invariant the protocol enforces: at most one entry per `subject_id`
/// within a room. Serialized field names are camelCase (`subjectId`,
/// `payload`, `insertedAt`) to match the message shape on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectEntry {
    pub subject_id: String,
    pub payload: String,
    pub inserted_at: DateTime<Utc>,
}

impl SubjectEntry {
    /// Create an entry stamped with the current time.
    pub fn new(subject_id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            payload: payload.into(),
            inserted_at: Utc::now(),
        }
    }
}

/// Request to attach `payload` to `subject_id` within `room_id`.
///
/// Immutable once constructed; deserializable from a camelCase JSON body
/// (`{"roomId": ..., "subjectId": ..., "payload": ...}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub room_id: String,
    pub subject_id: String,
    pub payload: String,
}

impl AssignRequest {
    pub fn new(
        room_id: impl Into<String>,
        subject_id: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            subject_id: subject_id.into(),
            payload: payload.into(),
        }
    }

    /// Checked before any store access; a malformed request never issues a
    /// store call.
    pub(crate) fn validate(&self) -> Result<(), AssignError> {
        if self.payload.is_empty() {
            return Err(AssignError::validation("payload must be a non-empty string"));
        }
        if self.room_id.is_empty() {
            return Err(AssignError::validation("room id must not be empty"));
        }
        if self.subject_id.is_empty() {
            return Err(AssignError::validation("subject id must not be empty"));
        }
        Ok(())
    }
}

/// Identifies the room record a [`RoomUpdate`] applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSelector {
    pub room_id: String,
}

impl RoomSelector {
    pub fn by_id(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
        }
    }
}

/// The two store operations the protocol issues, always in this order.
#[derive(Debug, Clone)]
pub enum RoomUpdate {
    /// Evict any entry whose subject id matches. Removing zero entries is a
    /// valid outcome.
    RemoveSubject { subject_id: String },
    /// Append a fresh entry.
    AppendEntry { entry: SubjectEntry },
}

/// Terminal success report for one assignment.
#[derive(Debug, Clone)]
pub struct Fulfillment {
    pub room_id: String,
    pub subject_id: String,
    /// Store round trips it took for the insert to land.
    pub attempts: u32,
    pub elapsed: Duration,
}
