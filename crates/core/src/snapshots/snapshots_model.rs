//! Snapshot domain models.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Origin of the data contained in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotSource {
    Cli,
    Manual,
    Banksalad,
    Domino,
    Web,
}

impl SnapshotSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotSource::Cli => "cli",
            SnapshotSource::Manual => "manual",
            SnapshotSource::Banksalad => "banksalad",
            SnapshotSource::Domino => "domino",
            SnapshotSource::Web => "web",
        }
    }
}

impl FromStr for SnapshotSource {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "cli" => Ok(SnapshotSource::Cli),
            "manual" => Ok(SnapshotSource::Manual),
            "banksalad" => Ok(SnapshotSource::Banksalad),
            "domino" => Ok(SnapshotSource::Domino),
            "web" => Ok(SnapshotSource::Web),
            _ => Err(Error::invalid_input(format!("Unknown snapshot source: {}", s))),
        }
    }
}

impl fmt::Display for SnapshotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a snapshot header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl SnapshotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotStatus::Pending => "pending",
            SnapshotStatus::Processing => "processing",
            SnapshotStatus::Completed => "completed",
            SnapshotStatus::Failed => "failed",
        }
    }
}

impl FromStr for SnapshotStatus {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SnapshotStatus::Pending),
            "processing" => Ok(SnapshotStatus::Processing),
            "completed" => Ok(SnapshotStatus::Completed),
            "failed" => Ok(SnapshotStatus::Failed),
            _ => Err(Error::invalid_input(format!("Unknown snapshot status: {}", s))),
        }
    }
}

/// Enum representing the kinds of transaction lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Buy,
    Sell,
    Dividend,
    Fee,
    Transfer,
    Deposit,
    Withdraw,
    Interest,
    Other,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => "buy",
            TransactionType::Sell => "sell",
            TransactionType::Dividend => "dividend",
            TransactionType::Fee => "fee",
            TransactionType::Transfer => "transfer",
            TransactionType::Deposit => "deposit",
            TransactionType::Withdraw => "withdraw",
            TransactionType::Interest => "interest",
            TransactionType::Other => "other",
        }
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "buy" => Ok(TransactionType::Buy),
            "sell" => Ok(TransactionType::Sell),
            "dividend" => Ok(TransactionType::Dividend),
            "fee" => Ok(TransactionType::Fee),
            "transfer" => Ok(TransactionType::Transfer),
            "deposit" => Ok(TransactionType::Deposit),
            "withdraw" => Ok(TransactionType::Withdraw),
            "interest" => Ok(TransactionType::Interest),
            "other" => Ok(TransactionType::Other),
            _ => Err(Error::invalid_input(format!(
                "Unknown transaction type: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot header. At most one exists per (user, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: i64,
    pub user_id: String,
    pub snapshot_date: NaiveDate,
    pub source: SnapshotSource,
    pub status: SnapshotStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating a snapshot header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSnapshot {
    pub user_id: String,
    pub snapshot_date: NaiveDate,
    pub source: SnapshotSource,
    pub status: SnapshotStatus,
    pub notes: Option<String>,
}

/// Persisted cash balance line.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotCash {
    pub id: i64,
    pub snapshot_id: i64,
    pub account_id: i64,
    pub currency: String,
    #[serde_as(as = "DisplayFromStr")]
    pub amount_minor: i128,
}

/// Persisted holding line.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPosition {
    pub id: i64,
    pub snapshot_id: i64,
    pub account_id: i64,
    pub instrument_id: i64,
    #[serde_as(as = "DisplayFromStr")]
    pub qty_nano: i128,
    pub avg_cost: Option<Decimal>,
    pub currency: String,
}

/// Persisted transaction line.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotTransaction {
    pub id: i64,
    pub snapshot_id: i64,
    pub account_id: i64,
    pub trade_datetime: DateTime<Utc>,
    pub settle_date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub txn_type: TransactionType,
    pub instrument_id: Option<i64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub qty_nano: Option<i128>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub price_nano: Option<i128>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub amount_minor: Option<i128>,
    pub currency: String,
    pub note: Option<String>,
}

/// Cash line staged for insertion, before it has a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSnapshotCash {
    pub account_id: i64,
    pub currency: String,
    pub amount_minor: i128,
}

/// Position line staged for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSnapshotPosition {
    pub account_id: i64,
    pub instrument_id: i64,
    pub qty_nano: i128,
    pub avg_cost: Option<Decimal>,
    pub currency: String,
}

/// Transaction line staged for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSnapshotTransaction {
    pub account_id: i64,
    pub trade_datetime: DateTime<Utc>,
    pub settle_date: Option<NaiveDate>,
    pub txn_type: TransactionType,
    pub instrument_id: Option<i64>,
    pub qty_nano: Option<i128>,
    pub price_nano: Option<i128>,
    pub amount_minor: Option<i128>,
    pub currency: String,
    pub note: Option<String>,
}

/// All lines of one commit, ready for bulk insertion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedLines {
    pub cash: Vec<NewSnapshotCash>,
    pub positions: Vec<NewSnapshotPosition>,
    pub transactions: Vec<NewSnapshotTransaction>,
}

impl StagedLines {
    pub fn counts(&self) -> LineCounts {
        LineCounts {
            cash: self.cash.len(),
            positions: self.positions.len(),
            transactions: self.transactions.len(),
        }
    }
}

/// Number of lines per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineCounts {
    pub cash: usize,
    pub positions: usize,
    pub transactions: usize,
}

/// All persisted lines of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotLines {
    pub cash: Vec<SnapshotCash>,
    pub positions: Vec<SnapshotPosition>,
    pub transactions: Vec<SnapshotTransaction>,
}

/// Snapshot header with its line counts, as returned by listing and detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub id: i64,
    pub date: NaiveDate,
    pub source: SnapshotSource,
    pub status: SnapshotStatus,
    pub notes: Option<String>,
    pub line_counts: LineCounts,
}

impl SnapshotSummary {
    pub fn new(snapshot: Snapshot, line_counts: LineCounts) -> Self {
        Self {
            id: snapshot.id,
            date: snapshot.snapshot_date,
            source: snapshot.source,
            status: snapshot.status,
            notes: snapshot.notes,
            line_counts,
        }
    }
}

/// Position after the last item of a listing page.
///
/// Listings are ordered by `(snapshot_date, id)` descending, so the cursor
/// carries both keys. It travels as the opaque string `<date>_<id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotCursor {
    pub snapshot_date: NaiveDate,
    pub id: i64,
}

impl SnapshotCursor {
    pub fn after(snapshot: &Snapshot) -> Self {
        Self {
            snapshot_date: snapshot.snapshot_date,
            id: snapshot.id,
        }
    }

    /// Whether `snapshot` sorts strictly after this cursor.
    pub fn precedes(&self, snapshot: &Snapshot) -> bool {
        snapshot.snapshot_date < self.snapshot_date
            || (snapshot.snapshot_date == self.snapshot_date && snapshot.id < self.id)
    }
}

impl fmt::Display for SnapshotCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.snapshot_date.format("%Y-%m-%d"), self.id)
    }
}

impl FromStr for SnapshotCursor {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || Error::invalid_input(format!("Invalid snapshot cursor: {}", s));
        let (date, id) = s.split_once('_').ok_or_else(invalid)?;
        Ok(Self {
            snapshot_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| invalid())?,
            id: id.parse().map_err(|_| invalid())?,
        })
    }
}

/// Query parameters of a snapshot listing.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotListQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<u32>,
    /// `next_cursor` of the previous page.
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub cursor: Option<SnapshotCursor>,
}

/// Filter handed to the repository. `limit` is the number of rows to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotListFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub cursor: Option<SnapshotCursor>,
    pub limit: i64,
}

/// One page of a snapshot listing.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPage {
    pub items: Vec<SnapshotSummary>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub next_cursor: Option<SnapshotCursor>,
}

/// Atomic write of a snapshot header and its lines, optionally replacing an
/// existing snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotWrite {
    pub header: NewSnapshot,
    pub replaces: Option<i64>,
    pub lines: StagedLines,
}

/// Outcome of a [`SnapshotWrite`].
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenSnapshot {
    pub snapshot: Snapshot,
    pub counts: LineCounts,
}
