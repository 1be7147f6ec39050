use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::errors::StorageError;
use donmoa_core::ingest::{IngestLevel, IngestLog, NewIngestLog};

#[derive(Queryable, Identifiable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::ingest_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct IngestLogDB {
    pub id: i64,
    pub snapshot_id: i64,
    pub level: String,
    pub message: String,
    /// JSON document.
    pub context: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::ingest_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NewIngestLogDB {
    pub snapshot_id: i64,
    pub level: String,
    pub message: String,
    pub context: Option<String>,
    pub created_at: NaiveDateTime,
}

impl TryFrom<IngestLogDB> for IngestLog {
    type Error = StorageError;

    fn try_from(db: IngestLogDB) -> Result<Self, Self::Error> {
        let level = db
            .level
            .parse::<IngestLevel>()
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        let context = db
            .context
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        Ok(Self {
            id: db.id,
            snapshot_id: db.snapshot_id,
            level,
            message: db.message,
            context,
            created_at: db.created_at,
        })
    }
}

impl NewIngestLogDB {
    pub fn from_domain(domain: NewIngestLog, now: NaiveDateTime) -> Self {
        Self {
            snapshot_id: domain.snapshot_id,
            level: domain.level.as_str().to_string(),
            message: domain.message,
            context: domain.context.map(|value| value.to_string()),
            created_at: now,
        }
    }
}
