#[cfg(test)]
mod tests {
    use crate::accounts::{Account, AccountExternalId, AccountRepositoryTrait, NewAccount};
    use crate::errors::{Error, Result};
    use crate::Creation;
    use crate::instruments::{Instrument, InstrumentRepositoryTrait, NewInstrument};
    use crate::portfolio::{
        CashLineEdit, DividendInput, PortfolioService, PortfolioServiceTrait, PositionLineEdit,
        SnapshotLineRepositoryTrait, TransactionLineEdit,
    };
    use crate::snapshots::*;
    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    // --- Mock repositories ---
    #[derive(Default)]
    struct PortfolioState {
        accounts: Vec<Account>,
        instruments: Vec<Instrument>,
        snapshots: Vec<Snapshot>,
        cash: Vec<SnapshotCash>,
        positions: Vec<SnapshotPosition>,
        transactions: Vec<SnapshotTransaction>,
    }

    #[derive(Clone, Default)]
    struct MockPortfolioStore {
        state: Arc<Mutex<PortfolioState>>,
    }

    impl MockPortfolioStore {
        fn owns_snapshot(state: &PortfolioState, user_id: &str, snapshot_id: i64) -> bool {
            state
                .snapshots
                .iter()
                .any(|s| s.id == snapshot_id && s.user_id == user_id)
        }
    }

    #[async_trait]
    impl AccountRepositoryTrait for MockPortfolioStore {
        async fn create_accounts(
            &self,
            _new_accounts: Vec<NewAccount>,
        ) -> Result<Vec<Creation<Account>>> {
            unimplemented!()
        }

        fn find_external_ids(
            &self,
            _user_id: &str,
            _external_ids: &[String],
        ) -> Result<Vec<AccountExternalId>> {
            unimplemented!()
        }

        fn get_by_id(&self, user_id: &str, account_id: i64) -> Result<Account> {
            let state = self.state.lock().unwrap();
            state
                .accounts
                .iter()
                .find(|a| a.id == account_id && a.user_id == user_id)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("Account {} not found", account_id)))
        }

        fn list(&self, user_id: &str) -> Result<Vec<Account>> {
            let state = self.state.lock().unwrap();
            Ok(state
                .accounts
                .iter()
                .filter(|a| a.user_id == user_id)
                .cloned()
                .collect())
        }
    }

    #[async_trait]
    impl InstrumentRepositoryTrait for MockPortfolioStore {
        fn find_by_symbols(&self, _symbols: &[String]) -> Result<Vec<Instrument>> {
            unimplemented!()
        }

        fn get_by_id(&self, instrument_id: i64) -> Result<Instrument> {
            let state = self.state.lock().unwrap();
            state
                .instruments
                .iter()
                .find(|i| i.id == instrument_id)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("Instrument {} not found", instrument_id)))
        }

        async fn create_instruments(
            &self,
            _new_instruments: Vec<NewInstrument>,
        ) -> Result<Vec<Creation<Instrument>>> {
            unimplemented!()
        }
    }

    #[async_trait]
    impl SnapshotRepositoryTrait for MockPortfolioStore {
        fn find_by_date(&self, _user_id: &str, _date: NaiveDate) -> Result<Option<Snapshot>> {
            unimplemented!()
        }

        fn get_by_id(&self, user_id: &str, snapshot_id: i64) -> Result<Option<Snapshot>> {
            let state = self.state.lock().unwrap();
            Ok(state
                .snapshots
                .iter()
                .find(|s| s.id == snapshot_id && s.user_id == user_id)
                .cloned())
        }

        fn find_latest(&self, user_id: &str) -> Result<Option<Snapshot>> {
            let state = self.state.lock().unwrap();
            Ok(state
                .snapshots
                .iter()
                .filter(|s| s.user_id == user_id)
                .max_by_key(|s| (s.snapshot_date, s.created_at))
                .cloned())
        }

        fn list(&self, _user_id: &str, _filter: &SnapshotListFilter) -> Result<Vec<Snapshot>> {
            unimplemented!()
        }

        fn count_lines(&self, _snapshot_ids: &[i64]) -> Result<HashMap<i64, LineCounts>> {
            unimplemented!()
        }

        fn load_lines(&self, snapshot_id: i64) -> Result<SnapshotLines> {
            let state = self.state.lock().unwrap();
            Ok(SnapshotLines {
                cash: state
                    .cash
                    .iter()
                    .filter(|l| l.snapshot_id == snapshot_id)
                    .cloned()
                    .collect(),
                positions: vec![],
                transactions: state
                    .transactions
                    .iter()
                    .filter(|l| l.snapshot_id == snapshot_id)
                    .cloned()
                    .collect(),
            })
        }

        async fn write_snapshot(&self, _write: SnapshotWrite) -> Result<WrittenSnapshot> {
            unimplemented!()
        }
    }

    #[async_trait]
    impl SnapshotLineRepositoryTrait for MockPortfolioStore {
        fn get_cash_line(&self, user_id: &str, line_id: i64) -> Result<Option<SnapshotCash>> {
            let state = self.state.lock().unwrap();
            Ok(state
                .cash
                .iter()
                .find(|l| l.id == line_id && Self::owns_snapshot(&state, user_id, l.snapshot_id))
                .cloned())
        }

        fn get_position_line(
            &self,
            user_id: &str,
            line_id: i64,
        ) -> Result<Option<SnapshotPosition>> {
            let state = self.state.lock().unwrap();
            Ok(state
                .positions
                .iter()
                .find(|l| l.id == line_id && Self::owns_snapshot(&state, user_id, l.snapshot_id))
                .cloned())
        }

        fn get_transaction_line(
            &self,
            user_id: &str,
            line_id: i64,
        ) -> Result<Option<SnapshotTransaction>> {
            let state = self.state.lock().unwrap();
            Ok(state
                .transactions
                .iter()
                .find(|l| l.id == line_id && Self::owns_snapshot(&state, user_id, l.snapshot_id))
                .cloned())
        }

        async fn update_cash_line(&self, line: SnapshotCash) -> Result<SnapshotCash> {
            let mut state = self.state.lock().unwrap();
            if let Some(existing) = state.cash.iter_mut().find(|l| l.id == line.id) {
                *existing = line.clone();
            }
            Ok(line)
        }

        async fn update_position_line(&self, line: SnapshotPosition) -> Result<SnapshotPosition> {
            let mut state = self.state.lock().unwrap();
            if let Some(existing) = state.positions.iter_mut().find(|l| l.id == line.id) {
                *existing = line.clone();
            }
            Ok(line)
        }

        async fn update_transaction_line(
            &self,
            line: SnapshotTransaction,
        ) -> Result<SnapshotTransaction> {
            let mut state = self.state.lock().unwrap();
            if let Some(existing) = state.transactions.iter_mut().find(|l| l.id == line.id) {
                *existing = line.clone();
            }
            Ok(line)
        }

        async fn insert_transaction(
            &self,
            snapshot_id: i64,
            line: NewSnapshotTransaction,
        ) -> Result<SnapshotTransaction> {
            let mut state = self.state.lock().unwrap();
            let created = SnapshotTransaction {
                id: 1000 + state.transactions.len() as i64,
                snapshot_id,
                account_id: line.account_id,
                trade_datetime: line.trade_datetime,
                settle_date: line.settle_date,
                txn_type: line.txn_type,
                instrument_id: line.instrument_id,
                qty_nano: line.qty_nano,
                price_nano: line.price_nano,
                amount_minor: line.amount_minor,
                currency: line.currency,
                note: line.note,
            };
            state.transactions.push(created.clone());
            Ok(created)
        }
    }

    // --- Fixtures ---

    const USER: &str = "user-1";

    fn seeded_store() -> MockPortfolioStore {
        let store = MockPortfolioStore::default();
        {
            let mut state = store.state.lock().unwrap();
            let now = Utc::now().naive_utc();
            state.accounts.push(Account {
                id: 1,
                user_id: USER.to_string(),
                name: "Brokerage".to_string(),
                account_type: "brokerage".to_string(),
                currency: "USD".to_string(),
                is_active: true,
                created_at: now,
                updated_at: now,
            });
            state.accounts.push(Account {
                id: 2,
                user_id: "someone-else".to_string(),
                name: "Theirs".to_string(),
                account_type: "bank".to_string(),
                currency: "KRW".to_string(),
                is_active: true,
                created_at: now,
                updated_at: now,
            });
            state.instruments.push(Instrument {
                id: 9,
                symbol: "AAPL".to_string(),
                name: "Apple".to_string(),
                asset_class: "equity".to_string(),
                currency: "USD".to_string(),
                created_at: now,
            });
            for (id, day) in [(10, 28), (11, 31)] {
                state.snapshots.push(Snapshot {
                    id,
                    user_id: USER.to_string(),
                    snapshot_date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
                    source: SnapshotSource::Manual,
                    status: SnapshotStatus::Completed,
                    notes: None,
                    created_at: now,
                    updated_at: now,
                });
            }
            state.cash.push(SnapshotCash {
                id: 100,
                snapshot_id: 11,
                account_id: 1,
                currency: "USD".to_string(),
                amount_minor: 1050,
            });
            state.positions.push(SnapshotPosition {
                id: 200,
                snapshot_id: 11,
                account_id: 1,
                instrument_id: 9,
                qty_nano: 5_000_000_000,
                avg_cost: None,
                currency: "USD".to_string(),
            });
        }
        store
    }

    fn service(store: &MockPortfolioStore) -> PortfolioService {
        let store = Arc::new(store.clone());
        PortfolioService::new(store.clone(), store.clone(), store.clone(), store)
    }

    fn dividend() -> DividendInput {
        DividendInput {
            account_id: 1,
            instrument_id: 9,
            pay_date: NaiveDate::from_ymd_opt(2024, 4, 15).unwrap(),
            amount: dec!(3.75),
            currency: "USD".to_string(),
            note: None,
        }
    }

    // --- Tests ---

    #[test]
    fn test_list_accounts_returns_only_owned_accounts() {
        let store = seeded_store();
        let accounts = service(&store).list_accounts(USER).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].name, "Brokerage");
    }

    #[test]
    fn test_snapshot_lines_require_ownership() {
        let store = seeded_store();
        let service = service(&store);

        let lines = service.get_snapshot_lines(USER, 11).unwrap();
        assert_eq!(lines.cash.len(), 1);

        let err = service.get_snapshot_lines("someone-else", 11).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_dividend_is_attached_to_latest_snapshot() {
        let store = seeded_store();
        let created = service(&store)
            .create_dividend(USER, dividend())
            .await
            .unwrap();

        assert_eq!(created.snapshot_id, 11);
        assert_eq!(created.txn_type, TransactionType::Dividend);
        assert_eq!(created.amount_minor, Some(375));
        assert_eq!(
            created.settle_date,
            Some(NaiveDate::from_ymd_opt(2024, 4, 15).unwrap())
        );
    }

    #[tokio::test]
    async fn test_dividend_without_snapshot_fails() {
        let store = seeded_store();
        store.state.lock().unwrap().snapshots.clear();

        let err = service(&store)
            .create_dividend(USER, dividend())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_dividend_rejects_foreign_account() {
        let store = seeded_store();
        let mut input = dividend();
        input.account_id = 2;

        let err = service(&store).create_dividend(USER, input).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(store.state.lock().unwrap().transactions.is_empty());
    }

    #[tokio::test]
    async fn test_cash_edit_reencodes_amount() {
        let store = seeded_store();
        let updated = service(&store)
            .update_cash_line(
                USER,
                100,
                CashLineEdit {
                    amount: Some(dec!(99.999)),
                    currency: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.amount_minor, 10000);
        assert_eq!(store.state.lock().unwrap().cash[0].amount_minor, 10000);
    }

    #[tokio::test]
    async fn test_position_edit_of_foreign_line_is_not_found() {
        let store = seeded_store();
        let err = service(&store)
            .update_position_line(
                "someone-else",
                200,
                PositionLineEdit {
                    qty: Some(dec!(1)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_transaction_edit_is_validation_error() {
        let store = seeded_store();
        let service = service(&store);
        let created = service.create_dividend(USER, dividend()).await.unwrap();

        let err = service
            .update_transaction_line(USER, created.id, TransactionLineEdit::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
