use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;

use super::portfolio_model::{CashLineEdit, DividendInput, PositionLineEdit, TransactionLineEdit};
use super::portfolio_traits::{PortfolioServiceTrait, SnapshotLineRepositoryTrait};
use crate::accounts::{Account, AccountRepositoryTrait};
use crate::instruments::InstrumentRepositoryTrait;
use crate::snapshots::{
    SnapshotCash, SnapshotLines, SnapshotPosition, SnapshotRepositoryTrait, SnapshotTransaction,
};
use crate::{Error, Result};

/// Service for reading and manually editing portfolio data.
pub struct PortfolioService {
    account_repository: Arc<dyn AccountRepositoryTrait>,
    instrument_repository: Arc<dyn InstrumentRepositoryTrait>,
    snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
    line_repository: Arc<dyn SnapshotLineRepositoryTrait>,
}

impl PortfolioService {
    pub fn new(
        account_repository: Arc<dyn AccountRepositoryTrait>,
        instrument_repository: Arc<dyn InstrumentRepositoryTrait>,
        snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
        line_repository: Arc<dyn SnapshotLineRepositoryTrait>,
    ) -> Self {
        Self {
            account_repository,
            instrument_repository,
            snapshot_repository,
            line_repository,
        }
    }
}

fn line_not_found(kind: &str, line_id: i64) -> Error {
    Error::NotFound(format!("{} line {} not found", kind, line_id))
}

#[async_trait]
impl PortfolioServiceTrait for PortfolioService {
    fn list_accounts(&self, user_id: &str) -> Result<Vec<Account>> {
        self.account_repository.list(user_id)
    }

    fn get_snapshot_lines(&self, user_id: &str, snapshot_id: i64) -> Result<SnapshotLines> {
        let snapshot = self
            .snapshot_repository
            .get_by_id(user_id, snapshot_id)?
            .ok_or_else(|| Error::NotFound(format!("Snapshot {} not found", snapshot_id)))?;
        self.snapshot_repository.load_lines(snapshot.id)
    }

    async fn create_dividend(
        &self,
        user_id: &str,
        input: DividendInput,
    ) -> Result<SnapshotTransaction> {
        input.validate()?;

        // Both references must exist, and the account must belong to the caller.
        self.account_repository
            .get_by_id(user_id, input.account_id)?;
        self.instrument_repository.get_by_id(input.instrument_id)?;

        let latest = self
            .snapshot_repository
            .find_latest(user_id)?
            .ok_or_else(|| Error::NotFound("No snapshot found for user".to_string()))?;

        debug!(
            "Adding dividend for account {} to snapshot {}",
            input.account_id, latest.id
        );
        let created = self
            .line_repository
            .insert_transaction(latest.id, input.into_transaction())
            .await?;
        info!(
            "Created dividend transaction {} in snapshot {}",
            created.id, latest.id
        );
        Ok(created)
    }

    async fn update_cash_line(
        &self,
        user_id: &str,
        line_id: i64,
        edit: CashLineEdit,
    ) -> Result<SnapshotCash> {
        let line = self
            .line_repository
            .get_cash_line(user_id, line_id)?
            .ok_or_else(|| line_not_found("Cash", line_id))?;
        let updated = edit.apply(line)?;
        self.line_repository.update_cash_line(updated).await
    }

    async fn update_position_line(
        &self,
        user_id: &str,
        line_id: i64,
        edit: PositionLineEdit,
    ) -> Result<SnapshotPosition> {
        let line = self
            .line_repository
            .get_position_line(user_id, line_id)?
            .ok_or_else(|| line_not_found("Position", line_id))?;
        let updated = edit.apply(line)?;
        self.line_repository.update_position_line(updated).await
    }

    async fn update_transaction_line(
        &self,
        user_id: &str,
        line_id: i64,
        edit: TransactionLineEdit,
    ) -> Result<SnapshotTransaction> {
        let line = self
            .line_repository
            .get_transaction_line(user_id, line_id)?
            .ok_or_else(|| line_not_found("Transaction", line_id))?;
        let updated = edit.apply(line)?;
        self.line_repository.update_transaction_line(updated).await
    }
}
