pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod idempotency;
mod main_lib;
pub mod scheduler;

pub use main_lib::{build_state, init_tracing, AppState};
