//! Database models for accounts.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use donmoa_core::accounts::{Account, AccountExternalId, NewAccount};

/// Database model for accounts
#[derive(Queryable, Identifiable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccountDB {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub account_type: String,
    pub currency: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NewAccountDB {
    pub user_id: String,
    pub name: String,
    pub account_type: String,
    pub currency: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Queryable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::account_external_ids)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccountExternalIdDB {
    pub id: i64,
    pub account_id: i64,
    pub external_id: String,
    pub source: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::account_external_ids)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NewAccountExternalIdDB {
    pub account_id: i64,
    pub external_id: String,
    pub source: String,
    pub created_at: NaiveDateTime,
}

impl From<AccountDB> for Account {
    fn from(db: AccountDB) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            name: db.name,
            account_type: db.account_type,
            currency: db.currency,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<AccountExternalIdDB> for AccountExternalId {
    fn from(db: AccountExternalIdDB) -> Self {
        Self {
            account_id: db.account_id,
            external_id: db.external_id,
            source: db.source,
        }
    }
}

impl NewAccountDB {
    pub fn from_domain(domain: &NewAccount, now: NaiveDateTime) -> Self {
        Self {
            user_id: domain.user_id.clone(),
            name: domain.name.clone(),
            account_type: domain.account_type.clone(),
            currency: domain.currency.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
