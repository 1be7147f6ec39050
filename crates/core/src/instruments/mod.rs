//! Instruments module - securities referenced by position and transaction lines.
//!
//! Instruments live in a global namespace keyed by symbol; they are not owned
//! by any user.

mod instruments_model;
mod instruments_traits;

pub use instruments_model::{Instrument, NewInstrument};
pub use instruments_traits::InstrumentRepositoryTrait;
