use log::debug;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::ingest_model::{IngestLevel, IngestLog, NewIngestLog};
use super::ingest_traits::IngestLogRepositoryTrait;
use crate::Result;

/// Message of the entry recorded for a commit that produced warnings.
pub const COMMIT_WARNINGS_MESSAGE: &str = "Snapshot committed with warnings";

/// Records ingest log entries for snapshots.
pub struct IngestLogRecorder {
    repository: Arc<dyn IngestLogRepositoryTrait>,
}

impl IngestLogRecorder {
    pub fn new(repository: Arc<dyn IngestLogRepositoryTrait>) -> Self {
        Self { repository }
    }

    pub async fn append(
        &self,
        snapshot_id: i64,
        level: IngestLevel,
        message: impl Into<String>,
        context: Option<serde_json::Value>,
    ) -> Result<IngestLog> {
        self.repository
            .append(NewIngestLog {
                snapshot_id,
                level,
                message: message.into(),
                context,
            })
            .await
    }

    /// Records the single warning entry of a commit, carrying the full
    /// warning list as context.
    pub async fn record_commit_warnings(
        &self,
        snapshot_id: i64,
        commit_id: Uuid,
        warnings: &[String],
    ) -> Result<IngestLog> {
        debug!(
            "Recording {} warning(s) for snapshot {} (commit {})",
            warnings.len(),
            snapshot_id,
            commit_id
        );
        self.append(
            snapshot_id,
            IngestLevel::Warning,
            COMMIT_WARNINGS_MESSAGE,
            Some(json!({
                "commit_id": commit_id.to_string(),
                "warnings": warnings,
            })),
        )
        .await
    }
}
