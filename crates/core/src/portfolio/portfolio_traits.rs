use async_trait::async_trait;

use super::portfolio_model::{CashLineEdit, DividendInput, PositionLineEdit, TransactionLineEdit};
use crate::accounts::Account;
use crate::snapshots::{
    NewSnapshotTransaction, SnapshotCash, SnapshotLines, SnapshotPosition, SnapshotTransaction,
};
use crate::Result;

/// Line-level access to snapshots.
///
/// Getters only return lines of snapshots owned by `user_id`.
#[async_trait]
pub trait SnapshotLineRepositoryTrait: Send + Sync {
    fn get_cash_line(&self, user_id: &str, line_id: i64) -> Result<Option<SnapshotCash>>;

    fn get_position_line(&self, user_id: &str, line_id: i64) -> Result<Option<SnapshotPosition>>;

    fn get_transaction_line(
        &self,
        user_id: &str,
        line_id: i64,
    ) -> Result<Option<SnapshotTransaction>>;

    async fn update_cash_line(&self, line: SnapshotCash) -> Result<SnapshotCash>;

    async fn update_position_line(&self, line: SnapshotPosition) -> Result<SnapshotPosition>;

    async fn update_transaction_line(
        &self,
        line: SnapshotTransaction,
    ) -> Result<SnapshotTransaction>;

    async fn insert_transaction(
        &self,
        snapshot_id: i64,
        line: NewSnapshotTransaction,
    ) -> Result<SnapshotTransaction>;
}

/// Trait for the portfolio service.
#[async_trait]
pub trait PortfolioServiceTrait: Send + Sync {
    fn list_accounts(&self, user_id: &str) -> Result<Vec<Account>>;

    fn get_snapshot_lines(&self, user_id: &str, snapshot_id: i64) -> Result<SnapshotLines>;

    async fn create_dividend(
        &self,
        user_id: &str,
        input: DividendInput,
    ) -> Result<SnapshotTransaction>;

    async fn update_cash_line(
        &self,
        user_id: &str,
        line_id: i64,
        edit: CashLineEdit,
    ) -> Result<SnapshotCash>;

    async fn update_position_line(
        &self,
        user_id: &str,
        line_id: i64,
        edit: PositionLineEdit,
    ) -> Result<SnapshotPosition>;

    async fn update_transaction_line(
        &self,
        user_id: &str,
        line_id: i64,
        edit: TransactionLineEdit,
    ) -> Result<SnapshotTransaction>;
}
