//! Assignment coordinator - the heart of the retry-until-visible protocol.
//!
//! Each assignment runs as an owned task that retries an evict-then-insert
//! pair against the store until the insert reports a nonzero affected count.
//! A zero affected count means the target room is not visible yet and keeps
//! the loop alive; validation errors and store faults stop it immediately.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::AssignConfig;
use crate::error::{AssignError, Result, StoreError};
use crate::model::{AssignRequest, Fulfillment, RoomSelector, RoomUpdate, SubjectEntry};
use crate::store::RoomStore;

/// Coordinates retry-until-visible assignments against a shared room store.
///
/// Every spawned assignment owns its retry timer and cancellation trigger;
/// one assignment's retry loop never blocks another. The coordinator holds
/// no lock across attempts; each attempt is a fresh request relying on the
/// store's own per-record atomicity.
///
/// Dropping the coordinator counts as shutdown for in-flight assignments.
pub struct AssignmentCoordinator {
    store: Arc<dyn RoomStore>,
    config: AssignConfig,
    shutdown_tx: watch::Sender<bool>,
    in_flight: Arc<DashMap<Uuid, String>>,
}

impl AssignmentCoordinator {
    /// Create a coordinator with the default retry policy.
    pub fn new(store: Arc<dyn RoomStore>) -> Self {
        Self::with_config(store, AssignConfig::default())
    }

    pub fn with_config(store: Arc<dyn RoomStore>, config: AssignConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            store,
            config,
            shutdown_tx,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    pub fn config(&self) -> &AssignConfig {
        &self.config
    }

    /// Number of assignments still retrying.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Attach `request.payload` to `request.subject_id` within the target
    /// room, awaiting the terminal outcome.
    pub async fn assign(&self, request: AssignRequest) -> Result<Fulfillment> {
        self.spawn(request)?.wait().await
    }

    /// Spawn an owned assignment task and return its handle.
    ///
    /// Dropping the handle detaches the assignment: it keeps retrying until
    /// fulfilled, bounded out, or shut down. Cancellation is always explicit
    /// via [`AssignmentHandle::cancel`] or [`shutdown`](Self::shutdown).
    pub fn spawn(&self, request: AssignRequest) -> Result<AssignmentHandle> {
        if *self.shutdown_tx.borrow() {
            return Err(AssignError::Shutdown);
        }
        if let Err(e) = request.validate() {
            error!(room_id = %request.room_id, error = %e, "rejected assignment request");
            return Err(e);
        }

        let id = Uuid::new_v4();
        let room_id = request.room_id.clone();
        let (cancel_tx, cancel_rx) = oneshot::channel();

        self.in_flight.insert(id, room_id.clone());
        let worker = AssignWorker {
            store: self.store.clone(),
            config: self.config.clone(),
            shutdown_rx: self.shutdown_tx.subscribe(),
            _guard: InFlightGuard {
                registry: self.in_flight.clone(),
                id,
            },
        };
        let join = tokio::spawn(worker.run(request, cancel_rx));

        Ok(AssignmentHandle {
            room_id,
            cancel: Some(cancel_tx),
            join,
        })
    }

    /// Stop every in-flight assignment and reject new submissions.
    ///
    /// Live assignments resolve with [`AssignError::Shutdown`] no later than
    /// the end of their current retry delay.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Owned handle to one spawned assignment.
#[derive(Debug)]
pub struct AssignmentHandle {
    room_id: String,
    cancel: Option<oneshot::Sender<()>>,
    join: JoinHandle<Result<Fulfillment>>,
}

impl AssignmentHandle {
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Request cancellation. The assignment stops issuing store calls and
    /// resolves with [`AssignError::Cancelled`] no later than the end of the
    /// current retry delay. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    /// Await the terminal outcome.
    pub async fn wait(self) -> Result<Fulfillment> {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(e) => Err(AssignError::Worker {
                reason: e.to_string(),
            }),
        }
    }
}

/// State owned by one spawned assignment task.
struct AssignWorker {
    store: Arc<dyn RoomStore>,
    config: AssignConfig,
    shutdown_rx: watch::Receiver<bool>,
    _guard: InFlightGuard,
}

impl AssignWorker {
    async fn run(
        mut self,
        request: AssignRequest,
        mut cancel_rx: oneshot::Receiver<()>,
    ) -> Result<Fulfillment> {
        let started = Instant::now();
        let selector = RoomSelector::by_id(request.room_id.clone());
        let mut attempts = 0u32;
        // Set once the handle is dropped without cancelling.
        let mut detached = false;

        loop {
            attempts += 1;
            let outcome = self.attempt(&selector, &request).await;
            match outcome {
                Ok(affected) if affected > 0 => {
                    info!(
                        room_id = %request.room_id,
                        subject_id = %request.subject_id,
                        attempts,
                        "assignment fulfilled"
                    );
                    return Ok(Fulfillment {
                        room_id: request.room_id,
                        subject_id: request.subject_id,
                        attempts,
                        elapsed: started.elapsed(),
                    });
                }
                Ok(_) => {
                    debug!(room_id = %request.room_id, attempts, "room not visible yet");
                }
                Err(source) => {
                    error!(
                        room_id = %request.room_id,
                        subject_id = %request.subject_id,
                        error = %source,
                        "assignment failed"
                    );
                    return Err(AssignError::Store {
                        room_id: request.room_id,
                        subject_id: request.subject_id,
                        source,
                    });
                }
            }

            if self.bounds_exceeded(attempts, started) {
                warn!(
                    room_id = %request.room_id,
                    attempts,
                    elapsed = ?started.elapsed(),
                    "assignment gave up waiting for room"
                );
                return Err(AssignError::Timeout {
                    room_id: request.room_id,
                    attempts,
                    elapsed: started.elapsed(),
                });
            }

            // Wait out one retry interval, staying responsive to
            // cancellation and shutdown.
            let delay = sleep(self.config.retry_interval);
            tokio::pin!(delay);
            loop {
                tokio::select! {
                    _ = &mut delay => break,
                    cancelled = &mut cancel_rx, if !detached => match cancelled {
                        Ok(()) => {
                            debug!(room_id = %request.room_id, "assignment cancelled");
                            return Err(AssignError::Cancelled {
                                room_id: request.room_id,
                            });
                        }
                        // Handle dropped without cancelling: keep retrying.
                        Err(_) => detached = true,
                    },
                    changed = self.shutdown_rx.changed() => {
                        // A dropped coordinator counts as shutdown.
                        if changed.is_err() || *self.shutdown_rx.borrow_and_update() {
                            debug!(room_id = %request.room_id, "assignment stopped by shutdown");
                            return Err(AssignError::Shutdown);
                        }
                    }
                }
            }
        }
    }

    /// One store round trip: evict any stale entry for the subject, then
    /// insert the fresh one. Eviction comes first so repeated retries and
    /// racing callers converge on a single entry per subject; evicting
    /// nothing is a valid outcome and never aborts the insert.
    async fn attempt(
        &self,
        selector: &RoomSelector,
        request: &AssignRequest,
    ) -> std::result::Result<u64, StoreError> {
        self.store
            .update(
                selector,
                RoomUpdate::RemoveSubject {
                    subject_id: request.subject_id.clone(),
                },
            )
            .await?;

        let entry = SubjectEntry::new(request.subject_id.clone(), request.payload.clone());
        self.store
            .update(selector, RoomUpdate::AppendEntry { entry })
            .await
    }

    fn bounds_exceeded(&self, attempts: u32, started: Instant) -> bool {
        if let Some(max_attempts) = self.config.max_attempts {
            if attempts >= max_attempts {
                return true;
            }
        }
        if let Some(max_wait) = self.config.max_wait {
            // Never sleep into a window the budget cannot cover.
            if started.elapsed() + self.config.retry_interval >= max_wait {
                return true;
            }
        }
        false
    }
}

/// Releases the coordinator's in-flight slot when the worker finishes,
/// whatever the outcome.
struct InFlightGuard {
    registry: Arc<DashMap<Uuid, String>>,
    id: Uuid,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.remove(&self.id);
    }
}
