use crate::error::StoreError;
use crate::model::{RoomSelector, RoomUpdate, SubjectEntry};
use crate::store::RoomStore;
use async_trait::async_trait;
use dashmap::DashMap;

/// In-memory room store backed by a concurrent map.
///
/// Rooms become visible through [`create_room`](Self::create_room), which
/// stands in for the unrelated actor that creates rooms. The map's per-key
/// locking supplies the per-record atomicity a single update needs.
#[derive(Debug, Default)]
pub struct MemoryRoomStore {
    rooms: DashMap<String, RoomRecord>,
}

#[derive(Debug, Default)]
struct RoomRecord {
    entries: Vec<SubjectEntry>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a room visible. Idempotent: an existing room keeps its entries.
    pub fn create_room(&self, room_id: impl Into<String>) {
        self.rooms.entry(room_id.into()).or_default();
    }

    /// Entries currently attached to a room, or `None` if the room is not
    /// visible yet.
    pub fn entries(&self, room_id: &str) -> Option<Vec<SubjectEntry>> {
        self.rooms.get(room_id).map(|record| record.entries.clone())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

#[async_trait]
impl RoomStore for MemoryRoomStore {
    async fn update(
        &self,
        selector: &RoomSelector,
        update: RoomUpdate,
    ) -> Result<u64, StoreError> {
        let Some(mut record) = self.rooms.get_mut(&selector.room_id) else {
            return Ok(0);
        };

        match update {
            RoomUpdate::RemoveSubject { subject_id } => {
                let before = record.entries.len();
                record.entries.retain(|entry| entry.subject_id != subject_id);
                Ok((before - record.entries.len()) as u64)
            }
            RoomUpdate::AppendEntry { entry } => {
                record.entries.push(entry);
                Ok(1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_updates_against_missing_room_affect_nothing() {
        let store = MemoryRoomStore::new();
        let selector = RoomSelector::by_id("ghost");

        let evicted = store
            .update(
                &selector,
                RoomUpdate::RemoveSubject {
                    subject_id: "user-1".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(evicted, 0);

        let appended = store
            .update(
                &selector,
                RoomUpdate::AppendEntry {
                    entry: SubjectEntry::new("user-1", "https://example/join"),
                },
            )
            .await
            .unwrap();
        assert_eq!(appended, 0);
        assert_eq!(store.room_count(), 0);
    }

    #[tokio::test]
    async fn test_append_and_evict_semantics() {
        let store = MemoryRoomStore::new();
        store.create_room("room-1");
        let selector = RoomSelector::by_id("room-1");

        let appended = store
            .update(
                &selector,
                RoomUpdate::AppendEntry {
                    entry: SubjectEntry::new("user-1", "https://example/join/a"),
                },
            )
            .await
            .unwrap();
        assert_eq!(appended, 1);

        // Evicting a subject with no entry matches nothing.
        let evicted = store
            .update(
                &selector,
                RoomUpdate::RemoveSubject {
                    subject_id: "user-2".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(evicted, 0);

        let evicted = store
            .update(
                &selector,
                RoomUpdate::RemoveSubject {
                    subject_id: "user-1".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(evicted, 1);
        assert!(store.entries("room-1").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_room_is_idempotent() {
        let store = MemoryRoomStore::new();
        store.create_room("room-1");

        store
            .update(
                &RoomSelector::by_id("room-1"),
                RoomUpdate::AppendEntry {
                    entry: SubjectEntry::new("user-1", "https://example/join"),
                },
            )
            .await
            .unwrap();

        store.create_room("room-1");
        assert_eq!(store.entries("room-1").unwrap().len(), 1);
        assert_eq!(store.room_count(), 1);
    }
}
