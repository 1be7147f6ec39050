use async_trait::async_trait;
use chrono::Utc;
use log::{error, info, warn};
use std::sync::Arc;
use uuid::Uuid;

use super::entity_resolver::EntityResolver;
use super::line_committer::stage_lines;
use super::replacement::{ReplacementCoordinator, SnapshotCommitLocks};
use super::snapshots_input::{SnapshotCommitInput, SnapshotCommitResult};
use super::snapshots_model::{
    NewSnapshot, SnapshotCursor, SnapshotListFilter, SnapshotListQuery, SnapshotPage,
    SnapshotStatus, SnapshotSummary,
};
use super::snapshots_traits::{SnapshotRepositoryTrait, SnapshotServiceTrait};
use crate::accounts::AccountRepositoryTrait;
use crate::constants::{DEFAULT_SNAPSHOT_PAGE_SIZE, MAX_SNAPSHOT_PAGE_SIZE};
use crate::ingest::{IngestLogRecorder, IngestLogRepositoryTrait};
use crate::instruments::InstrumentRepositoryTrait;
use crate::Result;

/// Service committing and reading snapshots.
pub struct SnapshotService {
    snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
    resolver: EntityResolver,
    coordinator: ReplacementCoordinator,
    ingest_recorder: IngestLogRecorder,
    locks: SnapshotCommitLocks,
}

impl SnapshotService {
    pub fn new(
        account_repository: Arc<dyn AccountRepositoryTrait>,
        instrument_repository: Arc<dyn InstrumentRepositoryTrait>,
        snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
        ingest_log_repository: Arc<dyn IngestLogRepositoryTrait>,
    ) -> Self {
        Self {
            resolver: EntityResolver::new(account_repository, instrument_repository),
            coordinator: ReplacementCoordinator::new(snapshot_repository.clone()),
            ingest_recorder: IngestLogRecorder::new(ingest_log_repository),
            snapshot_repository,
            locks: SnapshotCommitLocks::new(),
        }
    }

    async fn commit_locked(
        &self,
        user_id: &str,
        input: &SnapshotCommitInput,
        commit_id: Uuid,
    ) -> Result<SnapshotCommitResult> {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        // Decided before any entity is created so a conflict leaves no trace.
        let plan = self.coordinator.plan(
            user_id,
            input.snapshot_date,
            input.options.replace_same_date,
        )?;

        let resolved = self.resolver.resolve(user_id, input, &mut warnings).await?;
        let lines = stage_lines(input, &resolved, Utc::now(), &mut warnings);

        let header = NewSnapshot {
            user_id: user_id.to_string(),
            snapshot_date: input.snapshot_date,
            source: input.source,
            status: SnapshotStatus::Completed,
            notes: input.notes.clone(),
        };
        let written = self.coordinator.execute(plan, header, lines).await?;

        if !warnings.is_empty() {
            // The snapshot is already durable; a failed audit entry is reported, not fatal.
            if let Err(err) = self
                .ingest_recorder
                .record_commit_warnings(written.snapshot.id, commit_id, &warnings)
                .await
            {
                warn!(
                    "Snapshot commit {}: failed to record ingest log for snapshot {}: {}",
                    commit_id, written.snapshot.id, err
                );
                errors.push(format!("Failed to record ingest log: {}", err));
            }
        }

        info!(
            "Snapshot commit {} stored snapshot {} for {} (cash {}, positions {}, transactions {}, warnings {})",
            commit_id,
            written.snapshot.id,
            written.snapshot.snapshot_date,
            written.counts.cash,
            written.counts.positions,
            written.counts.transactions,
            warnings.len()
        );

        Ok(SnapshotCommitResult {
            snapshot_id: written.snapshot.id,
            date: written.snapshot.snapshot_date,
            lines: written.counts,
            warnings,
            errors,
        })
    }
}

#[async_trait]
impl SnapshotServiceTrait for SnapshotService {
    async fn commit_snapshot(
        &self,
        user_id: &str,
        input: SnapshotCommitInput,
    ) -> Result<SnapshotCommitResult> {
        input.validate()?;

        let commit_id = Uuid::now_v7();
        let counts = input.input_counts();
        info!(
            "Snapshot commit {} for {} from {} ({} cash, {} positions, {} transactions)",
            commit_id,
            input.snapshot_date,
            input.source,
            counts.cash,
            counts.positions,
            counts.transactions
        );

        let _guard = self.locks.acquire(user_id, input.snapshot_date).await;
        let result = self.commit_locked(user_id, &input, commit_id).await;
        if let Err(err) = &result {
            error!("Snapshot commit {} failed: {}", commit_id, err);
        }
        result
    }

    fn list_snapshots(&self, user_id: &str, query: SnapshotListQuery) -> Result<SnapshotPage> {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_SNAPSHOT_PAGE_SIZE)
            .clamp(1, MAX_SNAPSHOT_PAGE_SIZE) as usize;

        // One extra row tells whether another page follows.
        let filter = SnapshotListFilter {
            from: query.from,
            to: query.to,
            cursor: query.cursor,
            limit: limit as i64 + 1,
        };
        let mut snapshots = self.snapshot_repository.list(user_id, &filter)?;
        let has_more = snapshots.len() > limit;
        snapshots.truncate(limit);
        let next_cursor = if has_more {
            snapshots.last().map(SnapshotCursor::after)
        } else {
            None
        };

        let ids: Vec<i64> = snapshots.iter().map(|snapshot| snapshot.id).collect();
        let counts = self.snapshot_repository.count_lines(&ids)?;

        let items = snapshots
            .into_iter()
            .map(|snapshot| {
                let line_counts = counts.get(&snapshot.id).copied().unwrap_or_default();
                SnapshotSummary::new(snapshot, line_counts)
            })
            .collect();

        Ok(SnapshotPage { items, next_cursor })
    }

    fn get_snapshot(&self, user_id: &str, snapshot_id: i64) -> Result<Option<SnapshotSummary>> {
        let Some(snapshot) = self.snapshot_repository.get_by_id(user_id, snapshot_id)? else {
            return Ok(None);
        };
        let counts = self.snapshot_repository.count_lines(&[snapshot.id])?;
        let line_counts = counts.get(&snapshot.id).copied().unwrap_or_default();
        Ok(Some(SnapshotSummary::new(snapshot, line_counts)))
    }
}
