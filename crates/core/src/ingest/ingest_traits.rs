use async_trait::async_trait;

use super::ingest_model::{IngestLog, NewIngestLog};
use crate::Result;

/// Append-only sink for ingest log entries.
#[async_trait]
pub trait IngestLogRepositoryTrait: Send + Sync {
    async fn append(&self, entry: NewIngestLog) -> Result<IngestLog>;
}
