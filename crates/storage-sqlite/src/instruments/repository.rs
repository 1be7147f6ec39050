use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::instruments;
use crate::utils::chunk_for_sqlite;

use super::model::{InstrumentDB, NewInstrumentDB};
use donmoa_core::instruments::{Instrument, InstrumentRepositoryTrait, NewInstrument};
use donmoa_core::{Creation, Error, Result};

/// Repository for the global instrument catalogue.
pub struct InstrumentRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl InstrumentRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl InstrumentRepositoryTrait for InstrumentRepository {
    fn find_by_symbols(&self, symbols: &[String]) -> Result<Vec<Instrument>> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = get_connection(&self.pool)?;

        let mut found = Vec::new();
        for chunk in chunk_for_sqlite(symbols) {
            let rows = instruments::table
                .filter(instruments::symbol.eq_any(chunk))
                .select(InstrumentDB::as_select())
                .load::<InstrumentDB>(&mut conn)
                .into_core()?;
            found.extend(rows.into_iter().map(Instrument::from));
        }
        Ok(found)
    }

    fn get_by_id(&self, instrument_id: i64) -> Result<Instrument> {
        let mut conn = get_connection(&self.pool)?;

        instruments::table
            .find(instrument_id)
            .select(InstrumentDB::as_select())
            .first::<InstrumentDB>(&mut conn)
            .optional()
            .into_core()?
            .map(Instrument::from)
            .ok_or_else(|| Error::NotFound(format!("Instrument {} not found", instrument_id)))
    }

    /// Creates instruments in input order. A symbol registered since the
    /// caller's lookup resolves to the existing instrument.
    async fn create_instruments(
        &self,
        new_instruments: Vec<NewInstrument>,
    ) -> Result<Vec<Creation<Instrument>>> {
        self.writer
            .exec(move |conn| {
                let now = chrono::Utc::now().naive_utc();
                let mut created = Vec::with_capacity(new_instruments.len());

                for new_instrument in new_instruments {
                    let existing = instruments::table
                        .filter(instruments::symbol.eq(&new_instrument.symbol))
                        .select(InstrumentDB::as_select())
                        .first::<InstrumentDB>(conn)
                        .optional()
                        .into_core()?;

                    let instrument = match existing {
                        Some(instrument) => Creation::Existing(Instrument::from(instrument)),
                        None => {
                            let inserted = diesel::insert_into(instruments::table)
                                .values(NewInstrumentDB::from_domain(new_instrument, now))
                                .returning(InstrumentDB::as_returning())
                                .get_result::<InstrumentDB>(conn)
                                .into_core()?;
                            Creation::Created(Instrument::from(inserted))
                        }
                    };
                    created.push(instrument);
                }
                Ok(created)
            })
            .await
    }
}
