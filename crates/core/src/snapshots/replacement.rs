//! Same-date replacement of snapshots.
//!
//! A (user, date) pair is either absent or holds exactly one snapshot. A commit
//! to an occupied date replaces the existing snapshot when allowed and fails
//! with a conflict otherwise.

use chrono::NaiveDate;
use dashmap::DashMap;
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::snapshots_model::{NewSnapshot, SnapshotWrite, StagedLines, WrittenSnapshot};
use super::snapshots_traits::SnapshotRepositoryTrait;
use crate::errors::DatabaseError;
use crate::{Error, Result};

/// Decision taken for a commit before anything is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementPlan {
    Create,
    Replace { existing_id: i64 },
}

pub struct ReplacementCoordinator {
    snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
}

impl ReplacementCoordinator {
    pub fn new(snapshot_repository: Arc<dyn SnapshotRepositoryTrait>) -> Self {
        Self {
            snapshot_repository,
        }
    }

    /// Inspects the current state of (user, date). Performs no mutation.
    pub fn plan(
        &self,
        user_id: &str,
        snapshot_date: NaiveDate,
        replace_same_date: bool,
    ) -> Result<ReplacementPlan> {
        match self
            .snapshot_repository
            .find_by_date(user_id, snapshot_date)?
        {
            None => Ok(ReplacementPlan::Create),
            Some(existing) if replace_same_date => {
                debug!(
                    "Snapshot {} for {} will be replaced",
                    existing.id, snapshot_date
                );
                Ok(ReplacementPlan::Replace {
                    existing_id: existing.id,
                })
            }
            Some(_) => Err(date_conflict(snapshot_date)),
        }
    }

    /// Applies `plan` by writing the header and its lines in one unit.
    pub async fn execute(
        &self,
        plan: ReplacementPlan,
        header: NewSnapshot,
        lines: StagedLines,
    ) -> Result<WrittenSnapshot> {
        let snapshot_date = header.snapshot_date;
        let replaces = match plan {
            ReplacementPlan::Create => None,
            ReplacementPlan::Replace { existing_id } => Some(existing_id),
        };

        let written = self
            .snapshot_repository
            .write_snapshot(SnapshotWrite {
                header,
                replaces,
                lines,
            })
            .await
            .map_err(|err| match err {
                Error::Database(DatabaseError::UniqueViolation(_)) => date_conflict(snapshot_date),
                other => other,
            })?;

        if let Some(existing_id) = replaces {
            info!(
                "Replaced snapshot {} with {} for {}",
                existing_id, written.snapshot.id, snapshot_date
            );
        }
        Ok(written)
    }
}

fn date_conflict(snapshot_date: NaiveDate) -> Error {
    Error::Conflict(format!(
        "Snapshot for {} already exists. Set replace_same_date: true to overwrite.",
        snapshot_date
    ))
}

type CommitKey = (String, NaiveDate);

/// Registry of per-(user, date) commit locks.
///
/// Commits for the same key run one at a time; distinct keys do not contend.
/// Entries are removed once no commit holds or waits on them.
#[derive(Default)]
pub struct SnapshotCommitLocks {
    locks: DashMap<CommitKey, Arc<Mutex<()>>>,
}

impl SnapshotCommitLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, user_id: &str, snapshot_date: NaiveDate) -> SnapshotCommitGuard<'_> {
        let key = (user_id.to_string(), snapshot_date);
        let mutex = self.locks.entry(key.clone()).or_default().clone();
        let guard = mutex.lock_owned().await;
        SnapshotCommitGuard {
            registry: self,
            key,
            guard: Some(guard),
        }
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Held for the duration of one commit.
pub struct SnapshotCommitGuard<'a> {
    registry: &'a SnapshotCommitLocks,
    key: CommitKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SnapshotCommitGuard<'_> {
    fn drop(&mut self) {
        // Release before counting so only the registry's reference remains.
        drop(self.guard.take());
        self.registry
            .locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_lock_entry_removed_after_release() {
        let locks = SnapshotCommitLocks::new();
        {
            let _guard = locks.acquire("user-1", date("2024-01-31")).await;
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let locks = SnapshotCommitLocks::new();
        let _a = locks.acquire("user-1", date("2024-01-31")).await;
        let b = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire("user-1", date("2024-02-29")),
        )
        .await;
        assert!(b.is_ok());
        let c = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire("user-2", date("2024-01-31")),
        )
        .await;
        assert!(c.is_ok());
    }

    #[tokio::test]
    async fn test_same_key_waits_for_release() {
        let locks = Arc::new(SnapshotCommitLocks::new());
        let first = locks.acquire("user-1", date("2024-01-31")).await;

        let blocked = tokio::time::timeout(
            Duration::from_millis(50),
            locks.acquire("user-1", date("2024-01-31")),
        )
        .await;
        assert!(blocked.is_err());

        drop(first);
        let second = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire("user-1", date("2024-01-31")),
        )
        .await;
        assert!(second.is_ok());
    }
}
