//! Account domain models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::accounts_constants::{is_valid_account_type, DEFAULT_ACCOUNT_TYPE};
use crate::constants::{CURRENCY_CODE_LEN, DEFAULT_ENTITY_CURRENCY};
use crate::{Error, Result};

/// Domain model representing an account in the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub account_type: String,
    pub currency: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Persistent association between an external identifier and an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountExternalId {
    pub account_id: i64,
    pub external_id: String,
    pub source: String,
}

/// External identifier to register alongside a newly created account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdLink {
    pub external_id: String,
    pub source: String,
}

/// Input model for creating a new account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAccount {
    pub user_id: String,
    pub name: String,
    pub account_type: String,
    pub currency: String,
    pub external_id: Option<ExternalIdLink>,
}

impl NewAccount {
    /// Builds the placeholder account synthesized for an unmapped external id.
    ///
    /// The account is named after the external id and the id is registered as
    /// an external-id mapping for `source`.
    pub fn synthesized(user_id: &str, external_id: &str, source: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            name: external_id.to_string(),
            account_type: DEFAULT_ACCOUNT_TYPE.to_string(),
            currency: DEFAULT_ENTITY_CURRENCY.to_string(),
            external_id: Some(ExternalIdLink {
                external_id: external_id.to_string(),
                source: source.to_string(),
            }),
        }
    }

    /// Validates the new account data.
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(Error::invalid_input("Account owner cannot be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(Error::invalid_input("Account name cannot be empty"));
        }
        if !is_valid_account_type(&self.account_type) {
            return Err(Error::invalid_input(format!(
                "Unknown account type '{}'",
                self.account_type
            )));
        }
        if self.currency.chars().count() != CURRENCY_CODE_LEN {
            return Err(Error::invalid_input(format!(
                "Currency '{}' must be a 3-letter code",
                self.currency
            )));
        }
        Ok(())
    }
}
