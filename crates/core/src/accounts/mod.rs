//! Accounts module - domain models and repository trait.
//!
//! Accounts are long-lived reference entities owned by a user. The ingestion
//! pipeline only reads and creates them; it never deletes them.

mod accounts_constants;
mod accounts_model;
mod accounts_traits;


// Re-export the public interface
pub use accounts_constants::*;
pub use accounts_model::{Account, AccountExternalId, ExternalIdLink, NewAccount};
pub use accounts_traits::AccountRepositoryTrait;
