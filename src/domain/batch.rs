//! Collapses the item-level changes of one logical write into one record.

use super::diff::OrderDiff;
use super::history::{BatchPayload, BatchSubEntry, HistoryPayload, HistoryRecord, Operation};

/// Elementary item operations of a diff: additions, then modifications, then
/// removals, each in snapshot order.
pub fn item_operations(diff: &OrderDiff) -> Vec<BatchSubEntry> {
    let items = &diff.items;
    let mut ops = Vec::with_capacity(items.change_count());
    ops.extend(
        items
            .added
            .iter()
            .map(|item| BatchSubEntry::Insert { item: item.clone() }),
    );
    ops.extend(items.modified.iter().map(|item_diff| BatchSubEntry::Update {
        item_diff: item_diff.clone(),
    }));
    ops.extend(
        items
            .removed
            .iter()
            .map(|item| BatchSubEntry::Delete { item: item.clone() }),
    );
    ops
}

/// Builds the history record for one UPDATE.
///
/// More than one item operation yields a single `BATCH` record whose summary
/// holds the order-level part of the diff. Anything smaller stays a plain
/// `UPDATE` carrying the full diff. Returns `None` when nothing changed.
pub fn aggregate(order_diff: OrderDiff, item_ops: Vec<BatchSubEntry>) -> Option<HistoryRecord> {
    if item_ops.len() > 1 {
        let summary = order_diff
            .has_order_level_changes()
            .then(|| order_diff.order_level_only());
        return Some(HistoryRecord {
            operation: Operation::Batch,
            payload: HistoryPayload::Batch(BatchPayload {
                summary,
                operations: item_ops,
            }),
        });
    }

    if order_diff.is_empty() {
        return None;
    }

    Some(HistoryRecord {
        operation: Operation::Update,
        payload: HistoryPayload::Diff { diff: order_diff },
    })
}
