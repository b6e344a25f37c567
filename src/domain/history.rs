use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::diff::{ItemDiff, OrderDiff};
use super::snapshot::{OrderItemSnapshot, OrderSnapshot, UnknownCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Insert,
    Update,
    Delete,
    Batch,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
            Operation::Batch => "BATCH",
        }
    }
}

impl FromStr for Operation {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INSERT" => Ok(Operation::Insert),
            "UPDATE" => Ok(Operation::Update),
            "DELETE" => Ok(Operation::Delete),
            "BATCH" => Ok(Operation::Batch),
            other => Err(UnknownCode {
                kind: "Operation",
                code: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One item-level change inside a batch, tagged with its own operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchSubEntry {
    Insert { item: OrderItemSnapshot },
    Update { item_diff: ItemDiff },
    Delete { item: OrderItemSnapshot },
}

impl BatchSubEntry {
    pub fn operation(&self) -> Operation {
        match self {
            BatchSubEntry::Insert { .. } => Operation::Insert,
            BatchSubEntry::Update { .. } => Operation::Update,
            BatchSubEntry::Delete { .. } => Operation::Delete,
        }
    }

    pub fn item_id(&self) -> Uuid {
        match self {
            BatchSubEntry::Insert { item } | BatchSubEntry::Delete { item } => item.id,
            BatchSubEntry::Update { item_diff } => item_diff.item_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPayload {
    /// Order-level changes made by the same write, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<OrderDiff>,
    pub operations: Vec<BatchSubEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSide {
    Before,
    After,
}

/// Stored document of a history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryPayload {
    /// Full aggregate, for INSERT and DELETE.
    Snapshot { snapshot: OrderSnapshot },
    Diff { diff: OrderDiff },
    Batch(BatchPayload),
    /// An UPDATE for which only one side could be read.
    Partial {
        side: SnapshotSide,
        snapshot: OrderSnapshot,
    },
}

/// Operation and payload produced for one captured write, before it is
/// sequenced and stored.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub operation: Operation,
    pub payload: HistoryPayload,
}

/// Position of an entry in its order's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceSlot {
    pub sequence: i64,
    /// Never earlier than the previous slot's timestamp for the same order.
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryEntry {
    pub order_id: Uuid,
    pub slot: Option<SequenceSlot>,
    pub operation: Operation,
    pub changed_by: Option<Uuid>,
    pub changed_at: DateTime<Utc>,
    pub idempotency_key: Option<String>,
    pub payload: HistoryPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: i64,
    pub order_id: Uuid,
    pub sequence: i64,
    pub operation: Operation,
    pub changed_by: Option<Uuid>,
    pub changed_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
    pub payload: HistoryPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct HistoryPage {
    pub items: Vec<HistoryEntry>,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended { sequence: i64 },
    /// Same idempotency key already stored for this order.
    Duplicate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{item, order};

    #[test]
    fn operation_codes_parse() {
        assert_eq!("BATCH".parse::<Operation>(), Ok(Operation::Batch));
        assert!("MERGE".parse::<Operation>().is_err());
    }

    #[test]
    fn payload_is_tagged_by_kind() {
        let payload = HistoryPayload::Snapshot {
            snapshot: order(vec![item("Pizza", 1)]),
        };
        let json = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(json["kind"], "snapshot");

        let back: HistoryPayload = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, payload);
    }

    #[test]
    fn batch_sub_entries_carry_their_operation_tag() {
        let entry = BatchSubEntry::Delete {
            item: item("Refresco", 1),
        };
        let json = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(json["operation"], "DELETE");
        assert_eq!(entry.operation(), Operation::Delete);
    }
}
