//! Inputs of the portfolio editing operations.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::{from_minor_units, to_minor_units, to_nano_units};
use crate::snapshots::{
    validate_currency, NewSnapshotTransaction, SnapshotCash, SnapshotPosition,
    SnapshotTransaction, TransactionType,
};
use crate::{Error, Result};

/// A dividend payment to append to the latest snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendInput {
    pub account_id: i64,
    pub instrument_id: i64,
    pub pay_date: NaiveDate,
    pub amount: Decimal,
    pub currency: String,
    #[serde(default)]
    pub note: Option<String>,
}

impl DividendInput {
    pub fn validate(&self) -> Result<()> {
        validate_currency(&self.currency, "dividend")
    }

    /// Builds the dividend transaction line. It trades at midnight UTC of the
    /// pay date and settles on the pay date.
    pub fn into_transaction(self) -> NewSnapshotTransaction {
        let trade_datetime = Utc.from_utc_datetime(&self.pay_date.and_time(NaiveTime::MIN));
        NewSnapshotTransaction {
            account_id: self.account_id,
            trade_datetime,
            settle_date: Some(trade_datetime.date_naive()),
            txn_type: TransactionType::Dividend,
            instrument_id: Some(self.instrument_id),
            qty_nano: None,
            price_nano: None,
            amount_minor: Some(to_minor_units(self.amount, &self.currency)),
            currency: self.currency,
            note: self.note,
        }
    }
}

/// Partial update of a cash line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashLineEdit {
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl CashLineEdit {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none() && self.currency.is_none()
    }

    /// Applies the edit. A currency change re-encodes the stored amount.
    pub fn apply(self, mut line: SnapshotCash) -> Result<SnapshotCash> {
        if self.is_empty() {
            return Err(Error::invalid_input("Cash line edit contains no changes"));
        }
        let (amount_minor, currency) = reencode_amount(
            Some(line.amount_minor),
            &line.currency,
            self.amount,
            self.currency,
        )?;
        line.amount_minor = amount_minor.unwrap_or(line.amount_minor);
        line.currency = currency;
        Ok(line)
    }
}

/// Partial update of a position line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionLineEdit {
    #[serde(default)]
    pub qty: Option<Decimal>,
    #[serde(default)]
    pub avg_cost: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl PositionLineEdit {
    pub fn is_empty(&self) -> bool {
        self.qty.is_none() && self.avg_cost.is_none() && self.currency.is_none()
    }

    pub fn apply(self, mut line: SnapshotPosition) -> Result<SnapshotPosition> {
        if self.is_empty() {
            return Err(Error::invalid_input(
                "Position line edit contains no changes",
            ));
        }
        if let Some(currency) = self.currency {
            validate_currency(&currency, "position")?;
            line.currency = currency;
        }
        if let Some(qty) = self.qty {
            line.qty_nano = to_nano_units(qty);
        }
        if let Some(avg_cost) = self.avg_cost {
            line.avg_cost = Some(avg_cost);
        }
        Ok(line)
    }
}

/// Partial update of a transaction line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionLineEdit {
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
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl TransactionLineEdit {
    pub fn is_empty(&self) -> bool {
        self.trade_datetime.is_none()
            && self.settle_date.is_none()
            && self.qty.is_none()
            && self.price.is_none()
            && self.amount.is_none()
            && self.currency.is_none()
            && self.note.is_none()
    }

    pub fn apply(self, mut line: SnapshotTransaction) -> Result<SnapshotTransaction> {
        if self.is_empty() {
            return Err(Error::invalid_input(
                "Transaction line edit contains no changes",
            ));
        }
        let (amount_minor, currency) =
            reencode_amount(line.amount_minor, &line.currency, self.amount, self.currency)?;
        line.amount_minor = amount_minor;
        line.currency = currency;

        if let Some(trade_datetime) = self.trade_datetime {
            line.trade_datetime = trade_datetime;
        }
        if let Some(settle_date) = self.settle_date {
            line.settle_date = Some(settle_date);
        }
        if let Some(qty) = self.qty {
            line.qty_nano = Some(to_nano_units(qty));
        }
        if let Some(price) = self.price {
            line.price_nano = Some(to_nano_units(price));
        }
        if let Some(note) = self.note {
            line.note = Some(note);
        }
        Ok(line)
    }
}

/// Computes the minor-unit amount and currency after an edit.
///
/// A new amount is encoded in the resulting currency. A currency change
/// without a new amount decodes the stored amount with the old currency and
/// encodes it with the new one.
fn reencode_amount(
    stored_minor: Option<i128>,
    stored_currency: &str,
    new_amount: Option<Decimal>,
    new_currency: Option<String>,
) -> Result<(Option<i128>, String)> {
    let currency = match new_currency {
        Some(currency) => {
            validate_currency(&currency, "edit")?;
            currency
        }
        None => stored_currency.to_string(),
    };

    let amount = match (new_amount, stored_minor) {
        (Some(amount), _) => Some(amount),
        (None, Some(minor)) if currency != stored_currency => {
            Some(from_minor_units(minor, stored_currency)?)
        }
        (None, _) => return Ok((stored_minor, currency)),
    };

    Ok((
        amount.map(|amount| to_minor_units(amount, &currency)),
        currency,
    ))
}
