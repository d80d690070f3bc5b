use std::io;
use std::time::Duration;
use thiserror::Error;

/// Faults surfaced by a [`RoomStore`](crate::store::RoomStore) implementation.
///
/// Every store error is terminal for the assignment that hit it; only a zero
/// affected count keeps the retry loop alive. Backends that want transient
/// faults absorbed must do so behind the trait.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

/// Terminal failure outcomes of an assignment.
#[derive(Debug, Error)]
pub enum AssignError {
    #[error("invalid assignment request: {reason}")]
    Validation { reason: String },

    #[error("store fault assigning subject {subject_id} to room {room_id}: {source}")]
    Store {
        room_id: String,
        subject_id: String,
        #[source]
        source: StoreError,
    },

    #[error("room {room_id} not visible after {attempts} attempts ({elapsed:?})")]
    Timeout {
        room_id: String,
        attempts: u32,
        elapsed: Duration,
    },

    #[error("assignment cancelled for room {room_id}")]
    Cancelled { room_id: String },

    #[error("coordinator is shutting down")]
    Shutdown,

    #[error("assignment worker failed: {reason}")]
    Worker { reason: String },
}

impl AssignError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// A condition retrying cannot fix (malformed request or store fault).
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Store { .. })
    }

    /// The caller or the coordinator abandoned the assignment.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled { .. } | Self::Shutdown)
    }

    /// A configured retry bound expired before the room became visible.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type alias for assignment outcomes.
pub type Result<T> = std::result::Result<T, AssignError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let validation = AssignError::validation("payload empty");
        assert!(validation.is_fatal());
        assert!(!validation.is_cancellation());

        let fault = AssignError::Store {
            room_id: "room-1".into(),
            subject_id: "user-1".into(),
            source: StoreError::unavailable("primary down"),
        };
        assert!(fault.is_fatal());
        assert!(!fault.is_timeout());

        let timeout = AssignError::Timeout {
            room_id: "room-1".into(),
            attempts: 5,
            elapsed: Duration::from_secs(5),
        };
        assert!(timeout.is_timeout());
        assert!(!timeout.is_fatal());

        assert!(AssignError::Shutdown.is_cancellation());
        assert!(AssignError::Cancelled {
            room_id: "room-1".into()
        }
        .is_cancellation());
    }

    #[test]
    fn test_error_display() {
        let fault = AssignError::Store {
            room_id: "breakout-7".to_string(),
            subject_id: "user-42".to_string(),
            source: StoreError::unavailable("connection refused"),
        };

        let display = fault.to_string();
        assert!(display.contains("breakout-7"));
        assert!(display.contains("user-42"));
        assert!(display.contains("connection refused"));
    }
}
