//! Database models for snapshots and lines.
//!
//! Fixed-point values are `i128` in the domain and decimal TEXT in the
//! database; conversions out of the database are fallible.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;

use crate::errors::StorageError;
use crate::utils::{parse_optional_text_column, parse_text_column};
use donmoa_core::snapshots::{
    NewSnapshot, NewSnapshotCash, NewSnapshotPosition, NewSnapshotTransaction, Snapshot,
    SnapshotCash, SnapshotPosition, SnapshotSource, SnapshotStatus, SnapshotTransaction,
    TransactionType,
};

fn parse_enum<T>(column: &str, raw: &str) -> Result<T, StorageError>
where
    T: std::str::FromStr<Err = donmoa_core::Error>,
{
    raw.parse::<T>()
        .map_err(|e| StorageError::SerializationError(format!("{}: {}", column, e)))
}

#[derive(Queryable, Identifiable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SnapshotDB {
    pub id: i64,
    pub user_id: String,
    pub snapshot_date: NaiveDate,
    pub source: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NewSnapshotDB {
    pub user_id: String,
    pub snapshot_date: NaiveDate,
    pub source: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<SnapshotDB> for Snapshot {
    type Error = StorageError;

    fn try_from(db: SnapshotDB) -> Result<Self, Self::Error> {
        Ok(Self {
            id: db.id,
            source: parse_enum::<SnapshotSource>("source", &db.source)?,
            status: parse_enum::<SnapshotStatus>("status", &db.status)?,
            user_id: db.user_id,
            snapshot_date: db.snapshot_date,
            notes: db.notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

impl NewSnapshotDB {
    pub fn from_domain(domain: NewSnapshot, now: NaiveDateTime) -> Self {
        Self {
            user_id: domain.user_id,
            snapshot_date: domain.snapshot_date,
            source: domain.source.as_str().to_string(),
            status: domain.status.as_str().to_string(),
            notes: domain.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

// --- Cash ---

#[derive(Queryable, Identifiable, Selectable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::snapshot_cash)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SnapshotCashDB {
    pub id: i64,
    pub snapshot_id: i64,
    pub account_id: i64,
    pub currency: String,
    pub amount_minor: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::snapshot_cash)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NewSnapshotCashDB {
    pub snapshot_id: i64,
    pub account_id: i64,
    pub currency: String,
    pub amount_minor: String,
}

impl TryFrom<SnapshotCashDB> for SnapshotCash {
    type Error = StorageError;

    fn try_from(db: SnapshotCashDB) -> Result<Self, Self::Error> {
        Ok(Self {
            id: db.id,
            snapshot_id: db.snapshot_id,
            account_id: db.account_id,
            amount_minor: parse_text_column("amount_minor", &db.amount_minor)?,
            currency: db.currency,
        })
    }
}

impl From<&SnapshotCash> for SnapshotCashDB {
    fn from(line: &SnapshotCash) -> Self {
        Self {
            id: line.id,
            snapshot_id: line.snapshot_id,
            account_id: line.account_id,
            currency: line.currency.clone(),
            amount_minor: line.amount_minor.to_string(),
        }
    }
}

impl NewSnapshotCashDB {
    pub fn from_staged(snapshot_id: i64, line: NewSnapshotCash) -> Self {
        Self {
            snapshot_id,
            account_id: line.account_id,
            currency: line.currency,
            amount_minor: line.amount_minor.to_string(),
        }
    }
}

// --- Positions ---

#[derive(Queryable, Identifiable, Selectable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::snapshot_positions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct SnapshotPositionDB {
    pub id: i64,
    pub snapshot_id: i64,
    pub account_id: i64,
    pub instrument_id: i64,
    pub qty_nano: String,
    pub avg_cost: Option<String>,
    pub currency: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::snapshot_positions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_default_value = false)]
pub struct NewSnapshotPositionDB {
    pub snapshot_id: i64,
    pub account_id: i64,
    pub instrument_id: i64,
    pub qty_nano: String,
    pub avg_cost: Option<String>,
    pub currency: String,
}

impl TryFrom<SnapshotPositionDB> for SnapshotPosition {
    type Error = StorageError;

    fn try_from(db: SnapshotPositionDB) -> Result<Self, Self::Error> {
        Ok(Self {
            id: db.id,
            snapshot_id: db.snapshot_id,
            account_id: db.account_id,
            instrument_id: db.instrument_id,
            qty_nano: parse_text_column("qty_nano", &db.qty_nano)?,
            avg_cost: parse_optional_text_column::<Decimal>("avg_cost", db.avg_cost.as_deref())?,
            currency: db.currency,
        })
    }
}

impl From<&SnapshotPosition> for SnapshotPositionDB {
    fn from(line: &SnapshotPosition) -> Self {
        Self {
            id: line.id,
            snapshot_id: line.snapshot_id,
            account_id: line.account_id,
            instrument_id: line.instrument_id,
            qty_nano: line.qty_nano.to_string(),
            avg_cost: line.avg_cost.map(|cost| cost.to_string()),
            currency: line.currency.clone(),
        }
    }
}

impl NewSnapshotPositionDB {
    pub fn from_staged(snapshot_id: i64, line: NewSnapshotPosition) -> Self {
        Self {
            snapshot_id,
            account_id: line.account_id,
            instrument_id: line.instrument_id,
            qty_nano: line.qty_nano.to_string(),
            avg_cost: line.avg_cost.map(|cost| cost.to_string()),
            currency: line.currency,
        }
    }
}

// --- Transactions ---

/// Transaction line row. `trade_datetime` is stored as naive UTC.
#[derive(Queryable, Identifiable, Selectable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::snapshot_transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct SnapshotTransactionDB {
    pub id: i64,
    pub snapshot_id: i64,
    pub account_id: i64,
    pub trade_datetime: NaiveDateTime,
    pub settle_date: Option<NaiveDate>,
    pub txn_type: String,
    pub instrument_id: Option<i64>,
    pub qty_nano: Option<String>,
    pub price_nano: Option<String>,
    pub amount_minor: Option<String>,
    pub currency: String,
    pub note: Option<String>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::snapshot_transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_default_value = false)]
pub struct NewSnapshotTransactionDB {
    pub snapshot_id: i64,
    pub account_id: i64,
    pub trade_datetime: NaiveDateTime,
    pub settle_date: Option<NaiveDate>,
    pub txn_type: String,
    pub instrument_id: Option<i64>,
    pub qty_nano: Option<String>,
    pub price_nano: Option<String>,
    pub amount_minor: Option<String>,
    pub currency: String,
    pub note: Option<String>,
}

impl TryFrom<SnapshotTransactionDB> for SnapshotTransaction {
    type Error = StorageError;

    fn try_from(db: SnapshotTransactionDB) -> Result<Self, Self::Error> {
        Ok(Self {
            id: db.id,
            snapshot_id: db.snapshot_id,
            account_id: db.account_id,
            trade_datetime: db.trade_datetime.and_utc(),
            settle_date: db.settle_date,
            txn_type: parse_enum::<TransactionType>("txn_type", &db.txn_type)?,
            instrument_id: db.instrument_id,
            qty_nano: parse_optional_text_column("qty_nano", db.qty_nano.as_deref())?,
            price_nano: parse_optional_text_column("price_nano", db.price_nano.as_deref())?,
            amount_minor: parse_optional_text_column("amount_minor", db.amount_minor.as_deref())?,
            currency: db.currency,
            note: db.note,
        })
    }
}

impl From<&SnapshotTransaction> for SnapshotTransactionDB {
    fn from(line: &SnapshotTransaction) -> Self {
        Self {
            id: line.id,
            snapshot_id: line.snapshot_id,
            account_id: line.account_id,
            trade_datetime: line.trade_datetime.naive_utc(),
            settle_date: line.settle_date,
            txn_type: line.txn_type.as_str().to_string(),
            instrument_id: line.instrument_id,
            qty_nano: line.qty_nano.map(|v| v.to_string()),
            price_nano: line.price_nano.map(|v| v.to_string()),
            amount_minor: line.amount_minor.map(|v| v.to_string()),
            currency: line.currency.clone(),
            note: line.note.clone(),
        }
    }
}

impl NewSnapshotTransactionDB {
    pub fn from_staged(snapshot_id: i64, line: NewSnapshotTransaction) -> Self {
        Self {
            snapshot_id,
            account_id: line.account_id,
            trade_datetime: line.trade_datetime.naive_utc(),
            settle_date: line.settle_date,
            txn_type: line.txn_type.as_str().to_string(),
            instrument_id: line.instrument_id,
            qty_nano: line.qty_nano.map(|v| v.to_string()),
            price_nano: line.price_nano.map(|v| v.to_string()),
            amount_minor: line.amount_minor.map(|v| v.to_string()),
            currency: line.currency,
            note: line.note,
        }
    }
}
