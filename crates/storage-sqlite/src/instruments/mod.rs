//! SQLite storage implementation for instruments.

mod model;
mod repository;

pub use model::{InstrumentDB, NewInstrumentDB};
pub use repository::InstrumentRepository;
