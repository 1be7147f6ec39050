//! Snapshots module - ingestion and reconciliation of dated snapshots.
//!
//! A commit flows through the entity resolver, the replacement coordinator,
//! the line committer and finally the ingest log recorder.

mod entity_resolver;
mod line_committer;
mod replacement;
mod snapshots_input;
mod snapshots_model;
mod snapshots_service;
mod snapshots_traits;


pub use entity_resolver::{EntityResolver, ResolvedEntities};
pub use line_committer::stage_lines;
pub use replacement::{
    ReplacementCoordinator, ReplacementPlan, SnapshotCommitGuard, SnapshotCommitLocks,
};
pub use snapshots_input::{
    CashInput, CommitOptions, EntityMapping, PositionInput, SnapshotCommitInput,
    SnapshotCommitResult, TransactionInput,
};
pub(crate) use snapshots_input::validate_currency;
pub use snapshots_model::*;
pub use snapshots_service::SnapshotService;
pub use snapshots_traits::{SnapshotRepositoryTrait, SnapshotServiceTrait};
