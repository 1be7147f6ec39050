//! SQLite storage implementation for snapshots and their line items.

mod model;
mod repository;

pub use model::{
    NewSnapshotCashDB, NewSnapshotDB, NewSnapshotPositionDB, NewSnapshotTransactionDB,
    SnapshotCashDB, SnapshotDB, SnapshotPositionDB, SnapshotTransactionDB,
};
pub use repository::SnapshotRepository;
