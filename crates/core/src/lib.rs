//! Donmoa Core - snapshot ingestion and reconciliation.
//!
//! This crate contains the domain models, services and repository traits of
//! the ingestion pipeline. It is database-agnostic; the traits are
//! implemented by the `storage-sqlite` crate.

pub mod accounts;
pub mod constants;
pub mod creation;
pub mod errors;
pub mod ingest;
pub mod instruments;
pub mod money;
pub mod portfolio;
pub mod snapshots;

// Re-export error types
pub use creation::Creation;
pub use errors::Error;
pub use errors::Result;
