//! Capture orchestrator: binds to the write lifecycle of an order and turns
//! each committed write into one history entry, off the caller's path.
//!
//! Correlation between the before-write and after-write hooks is carried by
//! an explicit [`CaptureTicket`] handed back to the write path. Both snapshots
//! are taken before the corresponding hook returns: the "after" state is read
//! as soon as the caller reports the commit, or passed in directly. Only
//! diffing and storing run in the background.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::domain::batch::{aggregate, item_operations};
use crate::domain::diff::diff;
use crate::domain::errors::CaptureError;
use crate::domain::history::{
    AppendOutcome, HistoryPayload, HistoryRecord, NewHistoryEntry, Operation, SequenceSlot,
    SnapshotSide,
};
use crate::domain::ports::{HistoryStore, SnapshotLoader};
use crate::domain::snapshot::OrderSnapshot;

/// A failed append is retried once before the entry is dropped.
const MAX_APPEND_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOperation {
    Insert,
    Update,
    Delete,
}

/// Lifecycle notification fired by the order-management write path.
#[derive(Debug, Clone)]
pub struct LifecycleEvent {
    pub operation: WriteOperation,
    pub order_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

impl LifecycleEvent {
    pub fn new(operation: WriteOperation, order_id: Uuid, actor_id: Option<Uuid>) -> Self {
        Self {
            operation,
            order_id,
            actor_id,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug)]
enum BeforeState {
    /// Inserts have no prior state.
    NotRead,
    Missing,
    Captured(OrderSnapshot),
    Failed(CaptureError),
}

/// Write-scoped correlation token returned by [`CaptureOrchestrator::before_write`].
#[derive(Debug)]
pub struct CaptureTicket {
    token: Uuid,
    event: LifecycleEvent,
    slot: Option<SequenceSlot>,
    before: BeforeState,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Recorded { sequence: i64, operation: Operation },
    Duplicate,
    Unchanged,
    Skipped(CaptureError),
}

#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub snapshot_timeout: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            snapshot_timeout: Duration::from_secs(2),
        }
    }
}

pub struct CaptureOrchestrator<L, S> {
    loader: Arc<L>,
    store: Arc<S>,
    config: CaptureConfig,
    runtime: Handle,
}

impl<L, S> Clone for CaptureOrchestrator<L, S> {
    fn clone(&self) -> Self {
        Self {
            loader: Arc::clone(&self.loader),
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<L: SnapshotLoader, S: HistoryStore> CaptureOrchestrator<L, S> {
    pub fn new(loader: L, store: S, config: CaptureConfig, runtime: Handle) -> Self {
        Self {
            loader: Arc::new(loader),
            store: Arc::new(store),
            config,
            runtime,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Before-write hook. Runs on the caller's (blocking) thread, before the
    /// write is applied, and never fails: problems are recorded in the ticket.
    /// Each database call waits at most the snapshot timeout.
    ///
    /// The sequence slot is taken here so entries sort in mutation order no
    /// matter in which order their captures complete.
    pub fn before_write(&self, event: LifecycleEvent) -> CaptureTicket {
        let store = Arc::clone(&self.store);
        let (order_id, at) = (event.order_id, event.timestamp);
        let reserved = self
            .bounded("sequence reservation", move || store.reserve_sequence(order_id, at))
            .and_then(|result| result.map_err(CaptureError::from));
        let slot = match reserved {
            Ok(slot) => Some(slot),
            Err(e) => {
                log::warn!(
                    "Could not reserve history sequence for order {}: {}",
                    event.order_id,
                    e
                );
                None
            }
        };

        let before = match event.operation {
            WriteOperation::Insert => BeforeState::NotRead,
            WriteOperation::Update | WriteOperation::Delete => {
                match self.read_snapshot(event.order_id) {
                    Ok(snapshot) => BeforeState::Captured(snapshot),
                    Err(CaptureError::NotFound) => BeforeState::Missing,
                    Err(e) => BeforeState::Failed(e),
                }
            }
        };

        CaptureTicket {
            token: Uuid::new_v4(),
            event,
            slot,
            before,
        }
    }

    /// After-commit hook. Reads the committed state before returning, so a
    /// later write to the same order cannot leak into this entry, then
    /// records the entry in the background. The returned handle may be
    /// ignored.
    pub fn after_commit(&self, ticket: CaptureTicket) -> JoinHandle<CaptureOutcome> {
        let after = match ticket.event.operation {
            WriteOperation::Delete => Ok(None),
            WriteOperation::Insert | WriteOperation::Update => {
                match self.read_snapshot(ticket.event.order_id) {
                    Ok(snapshot) => Ok(Some(snapshot)),
                    Err(CaptureError::NotFound) => Ok(None),
                    Err(e) => Err(e),
                }
            }
        };
        self.spawn(ticket, after)
    }

    /// After-commit hook for write paths that already hold the after state.
    /// `None` means the order no longer exists.
    pub fn after_commit_with(
        &self,
        ticket: CaptureTicket,
        after: Option<OrderSnapshot>,
    ) -> JoinHandle<CaptureOutcome> {
        self.spawn(ticket, Ok(after))
    }

    /// The write was rolled back; nothing is recorded.
    pub fn discard(&self, ticket: CaptureTicket) {
        log::debug!(
            "Discarding history capture {} for order {}",
            ticket.token,
            ticket.event.order_id
        );
    }

    /// Runs `write` between the lifecycle hooks. The write's result is
    /// returned as is once both snapshots are taken; storing the entry
    /// happens in the background.
    pub fn capture_write<T, E, F>(&self, event: LifecycleEvent, write: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let ticket = self.before_write(event);
        match write() {
            Ok(value) => {
                drop(self.after_commit(ticket));
                Ok(value)
            }
            Err(e) => {
                self.discard(ticket);
                Err(e)
            }
        }
    }

    fn read_snapshot(&self, order_id: Uuid) -> Result<OrderSnapshot, CaptureError> {
        let loader = Arc::clone(&self.loader);
        self.bounded("snapshot read", move || loader.load(order_id))
            .and_then(|result| result)
    }

    /// Runs a blocking call on the runtime's blocking pool and waits for it
    /// at most `snapshot_timeout`. A late result is dropped.
    fn bounded<T, F>(&self, what: &str, call: F) -> Result<T, CaptureError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        self.runtime.spawn_blocking(move || {
            let _ = tx.send(call());
        });
        match rx.recv_timeout(self.config.snapshot_timeout) {
            Ok(value) => Ok(value),
            Err(RecvTimeoutError::Timeout) => Err(CaptureError::CaptureFailure(format!(
                "{} timed out after {:?}",
                what, self.config.snapshot_timeout
            ))),
            Err(RecvTimeoutError::Disconnected) => {
                Err(CaptureError::CaptureFailure(format!("{} panicked", what)))
            }
        }
    }

    fn spawn(
        &self,
        ticket: CaptureTicket,
        after: Result<Option<OrderSnapshot>, CaptureError>,
    ) -> JoinHandle<CaptureOutcome> {
        let this = self.clone();
        self.runtime.spawn(async move { this.run(ticket, after).await })
    }

    async fn run(
        self,
        ticket: CaptureTicket,
        after: Result<Option<OrderSnapshot>, CaptureError>,
    ) -> CaptureOutcome {
        let CaptureTicket {
            token,
            event,
            slot,
            before,
        } = ticket;

        let before = match before {
            BeforeState::Captured(snapshot) => Some(snapshot),
            BeforeState::NotRead | BeforeState::Missing => None,
            BeforeState::Failed(e) => return skip(token, &event, e),
        };

        let after = match (event.operation, after) {
            (WriteOperation::Delete, _) => None,
            (_, Ok(snapshot)) => snapshot,
            (_, Err(e)) => return skip(token, &event, e),
        };

        let record = match build_record(event.operation, before, after) {
            Ok(Some(record)) => record,
            Ok(None) => {
                log::debug!("Order {} unchanged by write {}", event.order_id, token);
                return CaptureOutcome::Unchanged;
            }
            Err(e) => return skip(token, &event, e),
        };

        let entry = NewHistoryEntry {
            order_id: event.order_id,
            slot,
            operation: record.operation,
            changed_by: event.actor_id,
            changed_at: slot.map(|s| s.changed_at).unwrap_or(event.timestamp),
            idempotency_key: Some(token.to_string()),
            payload: record.payload,
        };
        self.persist(entry).await
    }

    async fn persist(&self, entry: NewHistoryEntry) -> CaptureOutcome {
        let mut attempt = 1;
        loop {
            let store = Arc::clone(&self.store);
            let pending = entry.clone();
            let result = match tokio::task::spawn_blocking(move || store.append(pending)).await {
                Ok(result) => result.map_err(CaptureError::from),
                Err(join_error) => Err(CaptureError::PersistenceFailure(join_error.to_string())),
            };

            match result {
                Ok(AppendOutcome::Appended { sequence }) => {
                    log::info!(
                        "Recorded {} history entry #{} for order {}",
                        entry.operation,
                        sequence,
                        entry.order_id
                    );
                    return CaptureOutcome::Recorded {
                        sequence,
                        operation: entry.operation,
                    };
                }
                Ok(AppendOutcome::Duplicate) => {
                    log::debug!("History entry for order {} already stored", entry.order_id);
                    return CaptureOutcome::Duplicate;
                }
                Err(e) if attempt < MAX_APPEND_ATTEMPTS => {
                    log::warn!(
                        "Append of history entry for order {} failed, retrying: {}",
                        entry.order_id,
                        e
                    );
                    attempt += 1;
                }
                Err(e) => {
                    log::error!(
                        "ALERT: dropping {} history entry for order {} after {} attempts: {}",
                        entry.operation,
                        entry.order_id,
                        attempt,
                        e
                    );
                    return CaptureOutcome::Skipped(e);
                }
            }
        }
    }
}

fn skip(token: Uuid, event: &LifecycleEvent, error: CaptureError) -> CaptureOutcome {
    log::warn!(
        "Skipping history capture {} of {:?} on order {}: {}",
        token,
        event.operation,
        event.order_id,
        error
    );
    CaptureOutcome::Skipped(error)
}

/// Decides what gets recorded for a write given whichever snapshots could be
/// read. `Ok(None)` means the write changed nothing.
pub fn build_record(
    operation: WriteOperation,
    before: Option<OrderSnapshot>,
    after: Option<OrderSnapshot>,
) -> Result<Option<HistoryRecord>, CaptureError> {
    for snapshot in before.iter().chain(after.iter()) {
        snapshot.validate()?;
    }

    match operation {
        WriteOperation::Insert => {
            let snapshot = after.ok_or(CaptureError::NotFound)?;
            Ok(Some(HistoryRecord {
                operation: Operation::Insert,
                payload: HistoryPayload::Snapshot { snapshot },
            }))
        }
        WriteOperation::Delete => {
            let snapshot = before.ok_or_else(|| {
                CaptureError::CaptureFailure("no snapshot of the deleted order".to_string())
            })?;
            Ok(Some(HistoryRecord {
                operation: Operation::Delete,
                payload: HistoryPayload::Snapshot { snapshot },
            }))
        }
        WriteOperation::Update => match (before, after) {
            (Some(before), Some(after)) => {
                if before.id != after.id {
                    return Err(CaptureError::MalformedSnapshot(format!(
                        "before snapshot {} and after snapshot {} describe different orders",
                        before.id, after.id
                    )));
                }
                let order_diff = diff(&before, &after);
                let ops = item_operations(&order_diff);
                Ok(aggregate(order_diff, ops))
            }
            (None, Some(snapshot)) => Ok(Some(HistoryRecord {
                operation: Operation::Update,
                payload: HistoryPayload::Partial {
                    side: SnapshotSide::After,
                    snapshot,
                },
            })),
            (Some(snapshot), None) => Ok(Some(HistoryRecord {
                operation: Operation::Update,
                payload: HistoryPayload::Partial {
                    side: SnapshotSide::Before,
                    snapshot,
                },
            })),
            (None, None) => Err(CaptureError::NotFound),
        },
    }
}
