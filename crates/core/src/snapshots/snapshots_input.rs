//! Commit request and response types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::snapshots_model::{LineCounts, SnapshotSource, TransactionType};
use crate::constants::CURRENCY_CODE_LEN;
use crate::{Error, Result};

/// A batch of external records to commit as one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotCommitInput {
    pub snapshot_date: NaiveDate,
    pub source: SnapshotSource,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub cash: Vec<CashInput>,
    #[serde(default)]
    pub positions: Vec<PositionInput>,
    #[serde(default)]
    pub transactions: Vec<TransactionInput>,
    #[serde(default)]
    pub mapping: EntityMapping,
    #[serde(default)]
    pub options: CommitOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashInput {
    pub account_external_id: String,
    pub currency: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionInput {
    pub account_external_id: String,
    pub symbol: String,
    pub currency: String,
    pub qty: Decimal,
    #[serde(default)]
    pub avg_cost: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub account_external_id: String,
    #[serde(rename = "type")]
    pub txn_type: TransactionType,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub trade_datetime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub settle_date: Option<NaiveDate>,
    #[serde(default)]
    pub qty: Option<Decimal>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    pub currency: String,
    #[serde(default)]
    pub note: Option<String>,
}

/// Caller-supplied identifier overrides. These always win over lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMapping {
    #[serde(default)]
    pub account_map: HashMap<String, i64>,
    #[serde(default)]
    pub instrument_map: HashMap<String, i64>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitOptions {
    #[serde(default = "default_true")]
    pub replace_same_date: bool,
    #[serde(default = "default_true")]
    pub create_missing_accounts: bool,
    #[serde(default = "default_true")]
    pub create_missing_instruments: bool,
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self {
            replace_same_date: true,
            create_missing_accounts: true,
            create_missing_instruments: true,
        }
    }
}

impl SnapshotCommitInput {
    /// Structural validation performed before any resolution or write.
    pub fn validate(&self) -> Result<()> {
        for (index, line) in self.cash.iter().enumerate() {
            let at = format!("cash[{}]", index);
            validate_external_id(&line.account_external_id, &at)?;
            validate_currency(&line.currency, &at)?;
        }
        for (index, line) in self.positions.iter().enumerate() {
            let at = format!("positions[{}]", index);
            validate_external_id(&line.account_external_id, &at)?;
            validate_symbol(&line.symbol, &at)?;
            validate_currency(&line.currency, &at)?;
        }
        for (index, line) in self.transactions.iter().enumerate() {
            let at = format!("transactions[{}]", index);
            validate_external_id(&line.account_external_id, &at)?;
            if let Some(symbol) = &line.symbol {
                validate_symbol(symbol, &at)?;
            }
            validate_currency(&line.currency, &at)?;
        }
        Ok(())
    }

    /// Number of input lines per category.
    pub fn input_counts(&self) -> LineCounts {
        LineCounts {
            cash: self.cash.len(),
            positions: self.positions.len(),
            transactions: self.transactions.len(),
        }
    }
}

fn validate_external_id(external_id: &str, at: &str) -> Result<()> {
    if external_id.is_empty() {
        return Err(Error::invalid_input(format!(
            "{}: account_external_id cannot be empty",
            at
        )));
    }
    Ok(())
}

fn validate_symbol(symbol: &str, at: &str) -> Result<()> {
    if symbol.is_empty() {
        return Err(Error::invalid_input(format!("{}: symbol cannot be empty", at)));
    }
    Ok(())
}

/// Currency codes must be exactly three characters. Case is not checked.
pub(crate) fn validate_currency(currency: &str, at: &str) -> Result<()> {
    if currency.chars().count() != CURRENCY_CODE_LEN {
        return Err(Error::invalid_input(format!(
            "{}: currency '{}' must be a 3-letter code",
            at, currency
        )));
    }
    Ok(())
}

/// Outcome of a committed snapshot.
///
/// `lines` counts inserted lines, not input lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotCommitResult {
    pub snapshot_id: i64,
    pub date: NaiveDate,
    pub lines: LineCounts,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}
