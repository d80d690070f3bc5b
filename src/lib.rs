//! # Roomlink: Retry-Until-Visible Room Assignment
//!
//! Attaches per-subject routing payloads (join URLs) to room records held in
//! a shared store, tolerating the store not containing the target room yet.
//! Room creation and assignment arrive from unrelated actors with no
//! ordering guarantee, so each assignment retries an evict-then-insert pair
//! until the store confirms the write landed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roomlink::{AssignRequest, AssignmentCoordinator, MemoryRoomStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryRoomStore::new());
//!     let coordinator = AssignmentCoordinator::new(store.clone());
//!
//!     // Rooms appear asynchronously; assignments wait for visibility.
//!     store.create_room("breakout-1");
//!
//!     let fulfillment = coordinator
//!         .assign(AssignRequest::new(
//!             "breakout-1",
//!             "user-42",
//!             "https://rooms.example/join/abc",
//!         ))
//!         .await?;
//!     println!("assigned after {} attempt(s)", fulfillment.attempts);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod coordinator;
pub mod error;
pub mod memory_store;
pub mod model;
pub mod store;

// Re-exports for convenience
pub use config::{AssignConfig, AssignConfigBuilder};
pub use coordinator::{AssignmentCoordinator, AssignmentHandle};
pub use error::{AssignError, Result, StoreError};
pub use memory_store::MemoryRoomStore;
pub use model::{AssignRequest, Fulfillment, RoomSelector, RoomUpdate, SubjectEntry};
pub use store::RoomStore;
