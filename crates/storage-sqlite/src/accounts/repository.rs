use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::sync::Arc;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::{account_external_ids, accounts};
use crate::utils::chunk_for_sqlite;

use super::model::{AccountDB, AccountExternalIdDB, NewAccountDB, NewAccountExternalIdDB};
use donmoa_core::accounts::{Account, AccountExternalId, AccountRepositoryTrait, NewAccount};
use donmoa_core::{Creation, Error, Result};

/// Repository for accounts and their external-id associations.
pub struct AccountRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl AccountRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

/// Finds the account of `user_id` already associated with `external_id`.
fn find_linked_account(
    conn: &mut SqliteConnection,
    user_id: &str,
    external_id: &str,
) -> Result<Option<AccountDB>> {
    account_external_ids::table
        .inner_join(accounts::table)
        .filter(accounts::user_id.eq(user_id))
        .filter(account_external_ids::external_id.eq(external_id))
        .order(account_external_ids::id.asc())
        .select(AccountDB::as_select())
        .first::<AccountDB>(conn)
        .optional()
        .into_core()
}

fn insert_account(conn: &mut SqliteConnection, new_account: &NewAccount) -> Result<AccountDB> {
    let now = chrono::Utc::now().naive_utc();

    let created = diesel::insert_into(accounts::table)
        .values(NewAccountDB::from_domain(new_account, now))
        .returning(AccountDB::as_returning())
        .get_result::<AccountDB>(conn)
        .into_core()?;

    if let Some(link) = &new_account.external_id {
        diesel::insert_into(account_external_ids::table)
            .values(NewAccountExternalIdDB {
                account_id: created.id,
                external_id: link.external_id.clone(),
                source: link.source.clone(),
                created_at: now,
            })
            .execute(conn)
            .into_core()?;
    }

    Ok(created)
}

#[async_trait]
impl AccountRepositoryTrait for AccountRepository {
    /// Creates the accounts in one write.
    ///
    /// An account whose external id was registered for the same user since the
    /// caller's lookup is returned instead of being created twice.
    async fn create_accounts(
        &self,
        new_accounts: Vec<NewAccount>,
    ) -> Result<Vec<Creation<Account>>> {
        for new_account in &new_accounts {
            new_account.validate()?;
        }

        self.writer
            .exec(move |conn| {
                let mut created = Vec::with_capacity(new_accounts.len());
                for new_account in &new_accounts {
                    let existing = match &new_account.external_id {
                        Some(link) => {
                            find_linked_account(conn, &new_account.user_id, &link.external_id)?
                        }
                        None => None,
                    };
                    let account = match existing {
                        Some(account) => {
                            debug!(
                                "Account {} already linked to '{}'",
                                account.id, account.name
                            );
                            Creation::Existing(Account::from(account))
                        }
                        None => {
                            let inserted = insert_account(conn, new_account)?;
                            Creation::Created(Account::from(inserted))
                        }
                    };
                    created.push(account);
                }
                Ok(created)
            })
            .await
    }

    fn find_external_ids(
        &self,
        user_id: &str,
        external_ids: &[String],
    ) -> Result<Vec<AccountExternalId>> {
        if external_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = get_connection(&self.pool)?;

        let mut found = Vec::new();
        for chunk in chunk_for_sqlite(external_ids) {
            let rows = account_external_ids::table
                .inner_join(accounts::table)
                .filter(accounts::user_id.eq(user_id))
                .filter(account_external_ids::external_id.eq_any(chunk))
                .order(account_external_ids::id.asc())
                .select(AccountExternalIdDB::as_select())
                .load::<AccountExternalIdDB>(&mut conn)
                .into_core()?;
            found.extend(rows.into_iter().map(AccountExternalId::from));
        }
        Ok(found)
    }

    fn get_by_id(&self, user_id: &str, account_id: i64) -> Result<Account> {
        let mut conn = get_connection(&self.pool)?;

        accounts::table
            .filter(accounts::id.eq(account_id))
            .filter(accounts::user_id.eq(user_id))
            .select(AccountDB::as_select())
            .first::<AccountDB>(&mut conn)
            .optional()
            .into_core()?
            .map(Account::from)
            .ok_or_else(|| Error::NotFound(format!("Account {} not found", account_id)))
    }

    fn list(&self, user_id: &str) -> Result<Vec<Account>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = accounts::table
            .filter(accounts::user_id.eq(user_id))
            .order((accounts::is_active.desc(), accounts::name.asc(), accounts::id.asc()))
            .select(AccountDB::as_select())
            .load::<AccountDB>(&mut conn)
            .into_core()?;

        Ok(rows.into_iter().map(Account::from).collect())
    }
}
