use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::{snapshot_cash, snapshot_positions, snapshot_transactions, snapshots};
use crate::utils::{chunk_for_sqlite, chunk_rows};

use super::model::{
    NewSnapshotCashDB, NewSnapshotDB, NewSnapshotPositionDB, NewSnapshotTransactionDB,
    SnapshotCashDB, SnapshotDB, SnapshotPositionDB, SnapshotTransactionDB,
};
use donmoa_core::portfolio::SnapshotLineRepositoryTrait;
use donmoa_core::snapshots::{
    LineCounts, NewSnapshotTransaction, Snapshot, SnapshotCash, SnapshotLines,
    SnapshotListFilter, SnapshotPosition, SnapshotRepositoryTrait, SnapshotTransaction,
    SnapshotWrite, WrittenSnapshot,
};
use donmoa_core::Result;

/// Repository for snapshot headers and their lines.
pub struct SnapshotRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SnapshotRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn to_domain<D, T>(rows: Vec<D>) -> Result<Vec<T>>
where
    T: TryFrom<D, Error = StorageError>,
{
    rows.into_iter()
        .map(|row| T::try_from(row).map_err(Into::into))
        .collect()
}

fn first_snapshot(
    conn: &mut SqliteConnection,
    query: snapshots::BoxedQuery<'_, diesel::sqlite::Sqlite>,
) -> Result<Option<Snapshot>> {
    query
        .select(SnapshotDB::as_select())
        .first::<SnapshotDB>(conn)
        .optional()
        .into_core()?
        .map(Snapshot::try_from)
        .transpose()
        .map_err(Into::into)
}

fn touch_snapshot(conn: &mut SqliteConnection, snapshot_id: i64) -> Result<()> {
    diesel::update(snapshots::table.find(snapshot_id))
        .set(snapshots::updated_at.eq(chrono::Utc::now().naive_utc()))
        .execute(conn)
        .into_core()?;
    Ok(())
}

/// Inserts rows in chunks and returns the number of rows written.
macro_rules! insert_chunked {
    ($conn:expr, $table:expr, $rows:expr) => {{
        let mut written = 0usize;
        for chunk in chunk_rows(&$rows) {
            written += diesel::insert_into($table)
                .values(chunk)
                .execute($conn)
                .into_core()?;
        }
        written
    }};
}

#[async_trait]
impl SnapshotRepositoryTrait for SnapshotRepository {
    fn find_by_date(&self, user_id: &str, snapshot_date: NaiveDate) -> Result<Option<Snapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let query = snapshots::table
            .filter(snapshots::user_id.eq(user_id))
            .filter(snapshots::snapshot_date.eq(snapshot_date))
            .into_boxed();
        first_snapshot(&mut conn, query)
    }

    fn get_by_id(&self, user_id: &str, snapshot_id: i64) -> Result<Option<Snapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let query = snapshots::table
            .filter(snapshots::id.eq(snapshot_id))
            .filter(snapshots::user_id.eq(user_id))
            .into_boxed();
        first_snapshot(&mut conn, query)
    }

    fn find_latest(&self, user_id: &str) -> Result<Option<Snapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let query = snapshots::table
            .filter(snapshots::user_id.eq(user_id))
            .order((
                snapshots::snapshot_date.desc(),
                snapshots::created_at.desc(),
                snapshots::id.desc(),
            ))
            .into_boxed();
        first_snapshot(&mut conn, query)
    }

    fn list(&self, user_id: &str, filter: &SnapshotListFilter) -> Result<Vec<Snapshot>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = snapshots::table
            .filter(snapshots::user_id.eq(user_id))
            .into_boxed();
        if let Some(from) = filter.from {
            query = query.filter(snapshots::snapshot_date.ge(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(snapshots::snapshot_date.le(to));
        }
        if let Some(cursor) = filter.cursor {
            // Rows strictly after the cursor in (snapshot_date, id) descending order.
            let same_date_before = snapshots::snapshot_date
                .eq(cursor.snapshot_date)
                .and(snapshots::id.lt(cursor.id));
            query = query.filter(
                snapshots::snapshot_date
                    .lt(cursor.snapshot_date)
                    .or(same_date_before),
            );
        }

        let rows = query
            .order((snapshots::snapshot_date.desc(), snapshots::id.desc()))
            .limit(filter.limit)
            .select(SnapshotDB::as_select())
            .load::<SnapshotDB>(&mut conn)
            .into_core()?;
        to_domain(rows)
    }

    fn count_lines(&self, snapshot_ids: &[i64]) -> Result<HashMap<i64, LineCounts>> {
        let mut counts: HashMap<i64, LineCounts> = HashMap::new();
        if snapshot_ids.is_empty() {
            return Ok(counts);
        }
        let mut conn = get_connection(&self.pool)?;

        for chunk in chunk_for_sqlite(snapshot_ids) {
            let cash: Vec<(i64, i64)> = snapshot_cash::table
                .filter(snapshot_cash::snapshot_id.eq_any(chunk))
                .group_by(snapshot_cash::snapshot_id)
                .select((snapshot_cash::snapshot_id, count_star()))
                .load(&mut conn)
                .into_core()?;
            for (snapshot_id, n) in cash {
                counts.entry(snapshot_id).or_default().cash = n as usize;
            }

            let positions: Vec<(i64, i64)> = snapshot_positions::table
                .filter(snapshot_positions::snapshot_id.eq_any(chunk))
                .group_by(snapshot_positions::snapshot_id)
                .select((snapshot_positions::snapshot_id, count_star()))
                .load(&mut conn)
                .into_core()?;
            for (snapshot_id, n) in positions {
                counts.entry(snapshot_id).or_default().positions = n as usize;
            }

            let transactions: Vec<(i64, i64)> = snapshot_transactions::table
                .filter(snapshot_transactions::snapshot_id.eq_any(chunk))
                .group_by(snapshot_transactions::snapshot_id)
                .select((snapshot_transactions::snapshot_id, count_star()))
                .load(&mut conn)
                .into_core()?;
            for (snapshot_id, n) in transactions {
                counts.entry(snapshot_id).or_default().transactions = n as usize;
            }
        }
        Ok(counts)
    }

    fn load_lines(&self, snapshot_id: i64) -> Result<SnapshotLines> {
        let mut conn = get_connection(&self.pool)?;

        let cash = snapshot_cash::table
            .filter(snapshot_cash::snapshot_id.eq(snapshot_id))
            .order(snapshot_cash::id.asc())
            .select(SnapshotCashDB::as_select())
            .load::<SnapshotCashDB>(&mut conn)
            .into_core()?;
        let positions = snapshot_positions::table
            .filter(snapshot_positions::snapshot_id.eq(snapshot_id))
            .order(snapshot_positions::id.asc())
            .select(SnapshotPositionDB::as_select())
            .load::<SnapshotPositionDB>(&mut conn)
            .into_core()?;
        let transactions = snapshot_transactions::table
            .filter(snapshot_transactions::snapshot_id.eq(snapshot_id))
            .order(snapshot_transactions::id.asc())
            .select(SnapshotTransactionDB::as_select())
            .load::<SnapshotTransactionDB>(&mut conn)
            .into_core()?;

        Ok(SnapshotLines {
            cash: to_domain(cash)?,
            positions: to_domain(positions)?,
            transactions: to_domain(transactions)?,
        })
    }

    /// Runs as a single writer job, so the replaced snapshot survives any
    /// failure of the new header or its lines.
    async fn write_snapshot(&self, write: SnapshotWrite) -> Result<WrittenSnapshot> {
        self.writer
            .exec(move |conn| {
                let SnapshotWrite {
                    header,
                    replaces,
                    lines,
                } = write;
                let now = chrono::Utc::now().naive_utc();

                if let Some(existing_id) = replaces {
                    // Lines and ingest logs go with it through ON DELETE CASCADE.
                    let deleted = diesel::delete(
                        snapshots::table
                            .filter(snapshots::id.eq(existing_id))
                            .filter(snapshots::user_id.eq(&header.user_id)),
                    )
                    .execute(conn)
                    .into_core()?;
                    debug!("Deleted {} snapshot row(s) for replacement", deleted);
                }

                let header_row = diesel::insert_into(snapshots::table)
                    .values(NewSnapshotDB::from_domain(header, now))
                    .returning(SnapshotDB::as_returning())
                    .get_result::<SnapshotDB>(conn)
                    .into_core()?;
                let snapshot_id = header_row.id;

                let cash_rows: Vec<NewSnapshotCashDB> = lines
                    .cash
                    .into_iter()
                    .map(|line| NewSnapshotCashDB::from_staged(snapshot_id, line))
                    .collect();
                let position_rows: Vec<NewSnapshotPositionDB> = lines
                    .positions
                    .into_iter()
                    .map(|line| NewSnapshotPositionDB::from_staged(snapshot_id, line))
                    .collect();
                let transaction_rows: Vec<NewSnapshotTransactionDB> = lines
                    .transactions
                    .into_iter()
                    .map(|line| NewSnapshotTransactionDB::from_staged(snapshot_id, line))
                    .collect();

                let counts = LineCounts {
                    cash: insert_chunked!(conn, snapshot_cash::table, cash_rows),
                    positions: insert_chunked!(conn, snapshot_positions::table, position_rows),
                    transactions: insert_chunked!(
                        conn,
                        snapshot_transactions::table,
                        transaction_rows
                    ),
                };

                Ok(WrittenSnapshot {
                    snapshot: Snapshot::try_from(header_row)?,
                    counts,
                })
            })
            .await
    }
}

#[async_trait]
impl SnapshotLineRepositoryTrait for SnapshotRepository {
    fn get_cash_line(&self, user_id: &str, line_id: i64) -> Result<Option<SnapshotCash>> {
        let mut conn = get_connection(&self.pool)?;
        snapshot_cash::table
            .inner_join(snapshots::table)
            .filter(snapshot_cash::id.eq(line_id))
            .filter(snapshots::user_id.eq(user_id))
            .select(SnapshotCashDB::as_select())
            .first::<SnapshotCashDB>(&mut conn)
            .optional()
            .into_core()?
            .map(SnapshotCash::try_from)
            .transpose()
            .map_err(Into::into)
    }

    fn get_position_line(&self, user_id: &str, line_id: i64) -> Result<Option<SnapshotPosition>> {
        let mut conn = get_connection(&self.pool)?;
        snapshot_positions::table
            .inner_join(snapshots::table)
            .filter(snapshot_positions::id.eq(line_id))
            .filter(snapshots::user_id.eq(user_id))
            .select(SnapshotPositionDB::as_select())
            .first::<SnapshotPositionDB>(&mut conn)
            .optional()
            .into_core()?
            .map(SnapshotPosition::try_from)
            .transpose()
            .map_err(Into::into)
    }

    fn get_transaction_line(
        &self,
        user_id: &str,
        line_id: i64,
    ) -> Result<Option<SnapshotTransaction>> {
        let mut conn = get_connection(&self.pool)?;
        snapshot_transactions::table
            .inner_join(snapshots::table)
            .filter(snapshot_transactions::id.eq(line_id))
            .filter(snapshots::user_id.eq(user_id))
            .select(SnapshotTransactionDB::as_select())
            .first::<SnapshotTransactionDB>(&mut conn)
            .optional()
            .into_core()?
            .map(SnapshotTransaction::try_from)
            .transpose()
            .map_err(Into::into)
    }

    async fn update_cash_line(&self, line: SnapshotCash) -> Result<SnapshotCash> {
        let row = SnapshotCashDB::from(&line);
        self.writer
            .exec(move |conn| {
                let updated = diesel::update(snapshot_cash::table.find(row.id))
                    .set(&row)
                    .returning(SnapshotCashDB::as_returning())
                    .get_result::<SnapshotCashDB>(conn)
                    .into_core()?;
                touch_snapshot(conn, updated.snapshot_id)?;
                Ok(SnapshotCash::try_from(updated)?)
            })
            .await
    }

    async fn update_position_line(&self, line: SnapshotPosition) -> Result<SnapshotPosition> {
        let row = SnapshotPositionDB::from(&line);
        self.writer
            .exec(move |conn| {
                let updated = diesel::update(snapshot_positions::table.find(row.id))
                    .set(&row)
                    .returning(SnapshotPositionDB::as_returning())
                    .get_result::<SnapshotPositionDB>(conn)
                    .into_core()?;
                touch_snapshot(conn, updated.snapshot_id)?;
                Ok(SnapshotPosition::try_from(updated)?)
            })
            .await
    }

    async fn update_transaction_line(
        &self,
        line: SnapshotTransaction,
    ) -> Result<SnapshotTransaction> {
        let row = SnapshotTransactionDB::from(&line);
        self.writer
            .exec(move |conn| {
                let updated = diesel::update(snapshot_transactions::table.find(row.id))
                    .set(&row)
                    .returning(SnapshotTransactionDB::as_returning())
                    .get_result::<SnapshotTransactionDB>(conn)
                    .into_core()?;
                touch_snapshot(conn, updated.snapshot_id)?;
                Ok(SnapshotTransaction::try_from(updated)?)
            })
            .await
    }

    async fn insert_transaction(
        &self,
        snapshot_id: i64,
        line: NewSnapshotTransaction,
    ) -> Result<SnapshotTransaction> {
        self.writer
            .exec(move |conn| {
                let inserted = diesel::insert_into(snapshot_transactions::table)
                    .values(NewSnapshotTransactionDB::from_staged(snapshot_id, line))
                    .returning(SnapshotTransactionDB::as_returning())
                    .get_result::<SnapshotTransactionDB>(conn)
                    .into_core()?;
                touch_snapshot(conn, snapshot_id)?;
                Ok(SnapshotTransaction::try_from(inserted)?)
            })
            .await
    }
}
