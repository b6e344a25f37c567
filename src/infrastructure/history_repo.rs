use std::time::Duration;

use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::history::{
    AppendOutcome, HistoryEntry, HistoryPage, HistoryPayload, NewHistoryEntry, Operation,
    SequenceSlot, SortDirection,
};
use crate::domain::ports::HistoryStore;
use crate::schema::order_history;

use super::models::{HistoryEntryRow, NewHistoryEntryRow, SequenceSlotRow};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselHistoryStore {
    pool: DbPool,
    statement_timeout: Option<Duration>,
}

impl DieselHistoryStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            statement_timeout: None,
        }
    }

    /// Bounds the reservation and append statements run on the write path.
    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = Some(timeout);
        self
    }
}

fn set_statement_timeout(
    conn: &mut PgConnection,
    timeout: Option<Duration>,
) -> Result<(), DomainError> {
    if let Some(timeout) = timeout {
        diesel::sql_query(format!(
            "SET LOCAL statement_timeout = {}",
            timeout.as_millis()
        ))
        .execute(conn)?;
    }
    Ok(())
}

/// Bumps the per-order counter. The upsert locks the order's counter row, so
/// reservations for one order serialize while other orders are unaffected.
fn reserve(
    conn: &mut PgConnection,
    order_id: Uuid,
    at: DateTime<Utc>,
) -> Result<SequenceSlot, DomainError> {
    let row = diesel::sql_query(
        "INSERT INTO order_history_sequences (order_id, last_sequence, last_changed_at) \
         VALUES ($1, 1, $2) \
         ON CONFLICT (order_id) DO UPDATE SET \
             last_sequence = order_history_sequences.last_sequence + 1, \
             last_changed_at = GREATEST(order_history_sequences.last_changed_at, \
                                        EXCLUDED.last_changed_at) \
         RETURNING last_sequence, last_changed_at",
    )
    .bind::<diesel::sql_types::Uuid, _>(order_id)
    .bind::<diesel::sql_types::Timestamptz, _>(at)
    .get_result::<SequenceSlotRow>(conn)?;

    Ok(SequenceSlot {
        sequence: row.last_sequence,
        changed_at: row.last_changed_at,
    })
}

fn to_entry(row: HistoryEntryRow) -> Option<HistoryEntry> {
    let operation = match row.operation.parse::<Operation>() {
        Ok(operation) => operation,
        Err(e) => {
            log::warn!("Skipping history entry {}: {}", row.id, e);
            return None;
        }
    };
    let payload = match serde_json::from_value::<HistoryPayload>(row.payload) {
        Ok(payload) => payload,
        Err(e) => {
            log::warn!("Skipping history entry {} with unreadable payload: {}", row.id, e);
            return None;
        }
    };
    Some(HistoryEntry {
        id: row.id,
        order_id: row.order_id,
        sequence: row.sequence,
        operation,
        changed_by: row.changed_by,
        changed_at: row.changed_at,
        recorded_at: row.recorded_at,
        payload,
    })
}

impl HistoryStore for DieselHistoryStore {
    fn reserve_sequence(
        &self,
        order_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<SequenceSlot, DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            set_statement_timeout(conn, self.statement_timeout)?;
            reserve(conn, order_id, at)
        })
    }

    fn append(&self, entry: NewHistoryEntry) -> Result<AppendOutcome, DomainError> {
        let payload = serde_json::to_value(&entry.payload)
            .map_err(|e| DomainError::Internal(format!("Unserializable payload: {}", e)))?;
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            set_statement_timeout(conn, self.statement_timeout)?;
            let slot = match entry.slot {
                Some(slot) => slot,
                None => reserve(conn, entry.order_id, entry.changed_at)?,
            };

            // Both unique keys, (order_id, sequence) and
            // (order_id, idempotency_key), identify a resubmission.
            let inserted = diesel::insert_into(order_history::table)
                .values(&NewHistoryEntryRow {
                    order_id: entry.order_id,
                    sequence: slot.sequence,
                    operation: entry.operation.as_str().to_string(),
                    changed_by: entry.changed_by,
                    changed_at: slot.changed_at,
                    idempotency_key: entry.idempotency_key.clone(),
                    payload,
                })
                .on_conflict_do_nothing()
                .execute(conn)?;

            if inserted == 0 {
                Ok(AppendOutcome::Duplicate)
            } else {
                Ok(AppendOutcome::Appended {
                    sequence: slot.sequence,
                })
            }
        })
    }

    fn list_by_order(
        &self,
        order_id: Uuid,
        page: i64,
        page_size: i64,
        direction: SortDirection,
    ) -> Result<HistoryPage, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = (page - 1) * page_size;
        // Count and page come from the same database snapshot.
        conn.build_transaction()
            .read_only()
            .repeatable_read()
            .run::<_, DomainError, _>(|conn| {
                let total: i64 = order_history::table
                    .filter(order_history::order_id.eq(order_id))
                    .count()
                    .get_result(conn)?;

                let mut query = order_history::table
                    .filter(order_history::order_id.eq(order_id))
                    .select(HistoryEntryRow::as_select())
                    .into_boxed();
                query = match direction {
                    SortDirection::Asc => query.order(order_history::sequence.asc()),
                    SortDirection::Desc => query.order(order_history::sequence.desc()),
                };
                let rows = query.limit(page_size).offset(offset).load(conn)?;

                Ok(HistoryPage {
                    items: rows.into_iter().filter_map(to_entry).collect(),
                    total,
                })
            })
    }
}
