//! SQLite storage implementation for accounts and their external ids.

mod model;
mod repository;

pub use model::{AccountDB, AccountExternalIdDB, NewAccountDB, NewAccountExternalIdDB};
pub use repository::AccountRepository;
