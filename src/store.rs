use crate::error::StoreError;
use crate::model::{RoomSelector, RoomUpdate};
use async_trait::async_trait;

/// Mutable document store holding room records.
///
/// The store is an external collaborator: it owns room lifecycle and
/// per-record consistency. The protocol only requires that a single update
/// is atomic with respect to the targeted room record.
///
/// Affected-count contract:
/// - `0`: no matching room record (or, for an eviction, no matching entry).
///   This is the "not yet ready" signal, never an error.
/// - `>= 1`: the write landed.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Apply `update` to the room record matching `selector`, returning the
    /// number of records the write affected.
    async fn update(&self, selector: &RoomSelector, update: RoomUpdate)
        -> Result<u64, StoreError>;
}
