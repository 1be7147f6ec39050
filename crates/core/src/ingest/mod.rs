//! Ingest log module - append-only audit entries attached to snapshots.

mod ingest_model;
mod ingest_recorder;
mod ingest_traits;

pub use ingest_model::{IngestLevel, IngestLog, NewIngestLog};
pub use ingest_recorder::{IngestLogRecorder, COMMIT_WARNINGS_MESSAGE};
pub use ingest_traits::IngestLogRepositoryTrait;
