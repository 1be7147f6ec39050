use async_trait::async_trait;
use diesel::prelude::*;

use crate::db::WriteHandle;
use crate::errors::IntoCore;
use crate::schema::ingest_logs;

use super::model::{IngestLogDB, NewIngestLogDB};
use donmoa_core::ingest::{IngestLog, IngestLogRepositoryTrait, NewIngestLog};
use donmoa_core::Result;

/// Append-only repository for ingest log entries. Entries are only ever
/// written; they disappear with their snapshot.
pub struct IngestLogRepository {
    writer: WriteHandle,
}

impl IngestLogRepository {
    pub fn new(writer: WriteHandle) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl IngestLogRepositoryTrait for IngestLogRepository {
    async fn append(&self, entry: NewIngestLog) -> Result<IngestLog> {
        self.writer
            .exec(move |conn| {
                let row = diesel::insert_into(ingest_logs::table)
                    .values(NewIngestLogDB::from_domain(
                        entry,
                        chrono::Utc::now().naive_utc(),
                    ))
                    .returning(IngestLogDB::as_returning())
                    .get_result::<IngestLogDB>(conn)
                    .into_core()?;
                Ok(IngestLog::try_from(row)?)
            })
            .await
    }
}
