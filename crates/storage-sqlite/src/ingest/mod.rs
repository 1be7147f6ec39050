//! SQLite storage implementation for ingest logs.

mod model;
mod repository;

pub use model::{IngestLogDB, NewIngestLogDB};
pub use repository::IngestLogRepository;
