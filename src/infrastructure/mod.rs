pub mod history_repo;
pub mod models;
pub mod snapshot_loader;

#[cfg(test)]
pub(crate) mod test_db;

pub use history_repo::DieselHistoryStore;
pub use snapshot_loader::{load_snapshot, DieselSnapshotLoader};
