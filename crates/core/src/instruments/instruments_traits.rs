use async_trait::async_trait;

use super::instruments_model::{Instrument, NewInstrument};
use crate::{Creation, Result};

/// Trait defining the contract for Instrument repository operations.
#[async_trait]
pub trait InstrumentRepositoryTrait: Send + Sync {
    /// Returns the instruments whose symbol exactly matches one of `symbols`.
    fn find_by_symbols(&self, symbols: &[String]) -> Result<Vec<Instrument>>;

    fn get_by_id(&self, instrument_id: i64) -> Result<Instrument>;

    /// Creates instruments in a single write, returning them in input order.
    /// A symbol that is already stored comes back as [`Creation::Existing`].
    async fn create_instruments(
        &self,
        new_instruments: Vec<NewInstrument>,
    ) -> Result<Vec<Creation<Instrument>>>;
}
