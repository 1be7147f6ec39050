//! Account repository trait.
//!
//! This trait defines the contract for account persistence without any
//! database-specific types, allowing for different storage implementations.

use async_trait::async_trait;

use super::accounts_model::{Account, AccountExternalId, NewAccount};
use crate::errors::Result;
use crate::Creation;

/// Trait defining the contract for Account repository operations.
#[async_trait]
pub trait AccountRepositoryTrait: Send + Sync {
    /// Creates accounts together with their external-id mappings.
    ///
    /// All accounts are created in a single write; the returned accounts are in
    /// the same order as the input. An account already linked to the same
    /// external id is returned as [`Creation::Existing`].
    async fn create_accounts(
        &self,
        new_accounts: Vec<NewAccount>,
    ) -> Result<Vec<Creation<Account>>>;

    /// Looks up persisted external-id mappings of accounts owned by `user_id`.
    ///
    /// Matching is exact; no case or whitespace normalization is applied.
    fn find_external_ids(
        &self,
        user_id: &str,
        external_ids: &[String],
    ) -> Result<Vec<AccountExternalId>>;

    /// Retrieves an account owned by `user_id`.
    fn get_by_id(&self, user_id: &str, account_id: i64) -> Result<Account>;

    /// Lists all accounts owned by `user_id`.
    fn list(&self, user_id: &str) -> Result<Vec<Account>>;
}
