use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::history::{HistoryPage, SortDirection};
use crate::domain::ports::HistoryStore;

pub const MAX_PAGE_SIZE: i64 = 100;

pub struct HistoryService<S> {
    store: S,
}

impl<S: HistoryStore> HistoryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists an order's history in sequence order. An order without entries
    /// yields an empty page, never an error.
    pub fn list_history(
        &self,
        order_id: Uuid,
        page: i64,
        page_size: i64,
        direction: SortDirection,
    ) -> Result<HistoryPage, DomainError> {
        if page < 1 {
            return Err(DomainError::InvalidInput(format!(
                "page must be at least 1, got {}",
                page
            )));
        }
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self.store
            .list_by_order(order_id, page, page_size, direction)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{DateTime, Utc};

    use super::*;
    use crate::domain::history::{AppendOutcome, NewHistoryEntry, SequenceSlot};

    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<(i64, i64, SortDirection)>>,
    }

    impl HistoryStore for RecordingStore {
        fn reserve_sequence(
            &self,
            _order_id: Uuid,
            at: DateTime<Utc>,
        ) -> Result<SequenceSlot, DomainError> {
            Ok(SequenceSlot {
                sequence: 1,
                changed_at: at,
            })
        }

        fn append(&self, _entry: NewHistoryEntry) -> Result<AppendOutcome, DomainError> {
            Ok(AppendOutcome::Duplicate)
        }

        fn list_by_order(
            &self,
            _order_id: Uuid,
            page: i64,
            page_size: i64,
            direction: SortDirection,
        ) -> Result<HistoryPage, DomainError> {
            self.calls.lock().unwrap().push((page, page_size, direction));
            Ok(HistoryPage {
                items: vec![],
                total: 0,
            })
        }
    }

    #[test]
    fn page_size_is_clamped() {
        let service = HistoryService::new(RecordingStore::default());
        service
            .list_history(Uuid::new_v4(), 1, 1000, SortDirection::Desc)
            .expect("list");
        service
            .list_history(Uuid::new_v4(), 2, 0, SortDirection::Asc)
            .expect("list");
        let calls = service.store.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![(1, MAX_PAGE_SIZE, SortDirection::Desc), (2, 1, SortDirection::Asc)]
        );
    }

    #[test]
    fn page_zero_is_invalid_input() {
        let service = HistoryService::new(RecordingStore::default());
        let result = service.list_history(Uuid::new_v4(), 0, 20, SortDirection::Asc);
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn unknown_order_yields_empty_page() {
        let service = HistoryService::new(RecordingStore::default());
        let page = service
            .list_history(Uuid::new_v4(), 1, 20, SortDirection::Asc)
            .expect("list");
        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());
    }
}
