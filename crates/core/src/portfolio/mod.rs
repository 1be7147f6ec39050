//! Portfolio module - account listing, snapshot line reads and manual edits.

mod portfolio_model;
mod portfolio_service;
mod portfolio_traits;

#[cfg(test)]
mod portfolio_service_tests;

pub use portfolio_model::{CashLineEdit, DividendInput, PositionLineEdit, TransactionLineEdit};
pub use portfolio_service::PortfolioService;
pub use portfolio_traits::{PortfolioServiceTrait, SnapshotLineRepositoryTrait};
