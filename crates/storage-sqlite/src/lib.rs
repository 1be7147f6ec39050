//! SQLite storage implementation for Donmoa.
//!
//! Implements the repository traits of `donmoa-core` with Diesel over SQLite:
//! - connection pooling and embedded migrations
//! - a single writer actor through which every write is serialised
//! - database model types and their conversions to domain types
//!
//! ```text
//!   donmoa-core (traits, services)
//!              │
//!              ▼
//!   donmoa-storage-sqlite (this crate)
//!              │
//!              ▼
//!          SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod accounts;
pub mod ingest;
pub mod instruments;
pub mod snapshots;

pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

pub use errors::{IntoCore, StorageError};

pub use accounts::AccountRepository;
pub use ingest::IngestLogRepository;
pub use instruments::InstrumentRepository;
pub use snapshots::SnapshotRepository;

pub use donmoa_core::errors::{DatabaseError, Error, Result};
