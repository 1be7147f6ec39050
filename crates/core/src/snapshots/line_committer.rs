//! Transforms raw request lines into rows ready for bulk insertion.
//!
//! Lines whose references cannot be resolved are dropped with a warning; they
//! never abort the commit.

use chrono::{DateTime, Utc};

use super::entity_resolver::ResolvedEntities;
use super::snapshots_input::{CashInput, PositionInput, SnapshotCommitInput, TransactionInput};
use super::snapshots_model::{
    NewSnapshotCash, NewSnapshotPosition, NewSnapshotTransaction, StagedLines,
};
use crate::money::{to_minor_units, to_nano_units};

/// Stages every line of `input` against `resolved`.
///
/// `now` is used as the trade timestamp of transactions that omit one.
pub fn stage_lines(
    input: &SnapshotCommitInput,
    resolved: &ResolvedEntities,
    now: DateTime<Utc>,
    warnings: &mut Vec<String>,
) -> StagedLines {
    StagedLines {
        cash: input
            .cash
            .iter()
            .filter_map(|line| stage_cash(line, resolved, warnings))
            .collect(),
        positions: input
            .positions
            .iter()
            .filter_map(|line| stage_position(line, resolved, warnings))
            .collect(),
        transactions: input
            .transactions
            .iter()
            .filter_map(|line| stage_transaction(line, resolved, now, warnings))
            .collect(),
    }
}

fn stage_cash(
    line: &CashInput,
    resolved: &ResolvedEntities,
    warnings: &mut Vec<String>,
) -> Option<NewSnapshotCash> {
    let Some(account_id) = resolved.account_id(&line.account_external_id) else {
        warnings.push(format!("Account not found: {}", line.account_external_id));
        return None;
    };

    Some(NewSnapshotCash {
        account_id,
        currency: line.currency.clone(),
        amount_minor: to_minor_units(line.amount, &line.currency),
    })
}

fn stage_position(
    line: &PositionInput,
    resolved: &ResolvedEntities,
    warnings: &mut Vec<String>,
) -> Option<NewSnapshotPosition> {
    let Some(account_id) = resolved.account_id(&line.account_external_id) else {
        warnings.push(format!("Account not found: {}", line.account_external_id));
        return None;
    };
    let Some(instrument_id) = resolved.instrument_id(&line.symbol) else {
        warnings.push(format!("Instrument not found: {}", line.symbol));
        return None;
    };

    Some(NewSnapshotPosition {
        account_id,
        instrument_id,
        qty_nano: to_nano_units(line.qty),
        // Cost basis stays a plain decimal.
        avg_cost: line.avg_cost,
        currency: line.currency.clone(),
    })
}

fn stage_transaction(
    line: &TransactionInput,
    resolved: &ResolvedEntities,
    now: DateTime<Utc>,
    warnings: &mut Vec<String>,
) -> Option<NewSnapshotTransaction> {
    let Some(account_id) = resolved.account_id(&line.account_external_id) else {
        warnings.push(format!(
            "Account not found for transaction: {}",
            line.account_external_id
        ));
        return None;
    };

    // Instrument is optional; an unresolved symbol keeps the line as cash-only.
    let instrument_id = match line.symbol.as_deref() {
        Some(symbol) => {
            let id = resolved.instrument_id(symbol);
            if id.is_none() {
                warnings.push(format!("Instrument not found for transaction: {}", symbol));
            }
            id
        }
        None => None,
    };

    Some(NewSnapshotTransaction {
        account_id,
        trade_datetime: line.trade_datetime.unwrap_or(now),
        settle_date: line.settle_date,
        txn_type: line.txn_type,
        instrument_id,
        qty_nano: line.qty.map(to_nano_units),
        price_nano: line.price.map(to_nano_units),
        amount_minor: line
            .amount
            .map(|amount| to_minor_units(amount, &line.currency)),
        currency: line.currency.clone(),
        note: line.note.clone(),
    })
}
