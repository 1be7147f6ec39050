use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

use super::snapshots_input::{SnapshotCommitInput, SnapshotCommitResult};
use super::snapshots_model::{
    LineCounts, Snapshot, SnapshotLines, SnapshotListFilter, SnapshotListQuery, SnapshotPage,
    SnapshotSummary, SnapshotWrite, WrittenSnapshot,
};
use crate::Result;

/// Trait defining the contract for Snapshot repository operations.
///
/// Every read is scoped to the owning user; a snapshot of another user is
/// reported as absent.
#[async_trait]
pub trait SnapshotRepositoryTrait: Send + Sync {
    fn find_by_date(&self, user_id: &str, snapshot_date: NaiveDate) -> Result<Option<Snapshot>>;

    fn get_by_id(&self, user_id: &str, snapshot_id: i64) -> Result<Option<Snapshot>>;

    /// Most recent snapshot by date, then by creation time.
    fn find_latest(&self, user_id: &str) -> Result<Option<Snapshot>>;

    /// Snapshots ordered by date descending, then id descending.
    fn list(&self, user_id: &str, filter: &SnapshotListFilter) -> Result<Vec<Snapshot>>;

    /// Line counts keyed by snapshot id. Snapshots without lines may be absent.
    fn count_lines(&self, snapshot_ids: &[i64]) -> Result<HashMap<i64, LineCounts>>;

    fn load_lines(&self, snapshot_id: i64) -> Result<SnapshotLines>;

    /// Deletes the replaced snapshot (if any), inserts the header and bulk
    /// inserts every line category as one atomic unit.
    async fn write_snapshot(&self, write: SnapshotWrite) -> Result<WrittenSnapshot>;
}

/// Trait for the snapshot ingestion service.
#[async_trait]
pub trait SnapshotServiceTrait: Send + Sync {
    async fn commit_snapshot(
        &self,
        user_id: &str,
        input: SnapshotCommitInput,
    ) -> Result<SnapshotCommitResult>;

    fn list_snapshots(&self, user_id: &str, query: SnapshotListQuery) -> Result<SnapshotPage>;

    fn get_snapshot(&self, user_id: &str, snapshot_id: i64) -> Result<Option<SnapshotSummary>>;
}
