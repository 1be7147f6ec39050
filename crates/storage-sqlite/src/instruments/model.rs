use chrono::NaiveDateTime;
use diesel::prelude::*;

use donmoa_core::instruments::{Instrument, NewInstrument};

#[derive(Queryable, Identifiable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::instruments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct InstrumentDB {
    pub id: i64,
    pub symbol: String,
    pub name: String,
    pub asset_class: String,
    pub currency: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::instruments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NewInstrumentDB {
    pub symbol: String,
    pub name: String,
    pub asset_class: String,
    pub currency: String,
    pub created_at: NaiveDateTime,
}

impl From<InstrumentDB> for Instrument {
    fn from(db: InstrumentDB) -> Self {
        Self {
            id: db.id,
            symbol: db.symbol,
            name: db.name,
            asset_class: db.asset_class,
            currency: db.currency,
            created_at: db.created_at,
        }
    }
}

impl NewInstrumentDB {
    pub fn from_domain(domain: NewInstrument, now: NaiveDateTime) -> Self {
        Self {
            symbol: domain.symbol,
            name: domain.name,
            asset_class: domain.asset_class,
            currency: domain.currency,
            created_at: now,
        }
    }
}
