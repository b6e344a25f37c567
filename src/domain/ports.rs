use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::{CaptureError, DomainError};
use super::history::{AppendOutcome, HistoryPage, NewHistoryEntry, SequenceSlot, SortDirection};
use super::snapshot::OrderSnapshot;

/// Reads the full order aggregate from the system of record.
pub trait SnapshotLoader: Send + Sync + 'static {
    /// Last committed state of the order. `Err(CaptureError::NotFound)` when
    /// the order does not exist (any more).
    fn load(&self, order_id: Uuid) -> Result<OrderSnapshot, CaptureError>;
}

/// Append-only storage of history entries.
pub trait HistoryStore: Send + Sync + 'static {
    /// Takes the next per-order sequence number.
    fn reserve_sequence(&self, order_id: Uuid, at: DateTime<Utc>)
        -> Result<SequenceSlot, DomainError>;

    /// Stores an entry; reserves a slot first when the entry has none.
    fn append(&self, entry: NewHistoryEntry) -> Result<AppendOutcome, DomainError>;

    fn list_by_order(
        &self,
        order_id: Uuid,
        page: i64,
        page_size: i64,
        direction: SortDirection,
    ) -> Result<HistoryPage, DomainError>;
}
