//! Instrument domain models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ASSET_CLASS, DEFAULT_ENTITY_CURRENCY};

/// Domain model representing a tradable instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: i64,
    pub symbol: String,
    pub name: String,
    pub asset_class: String,
    pub currency: String,
    pub created_at: NaiveDateTime,
}

/// Input model for creating a new instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInstrument {
    pub symbol: String,
    pub name: String,
    pub asset_class: String,
    pub currency: String,
}

impl NewInstrument {
    /// Builds the placeholder instrument synthesized for an unknown symbol.
    pub fn synthesized(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            asset_class: DEFAULT_ASSET_CLASS.to_string(),
            currency: DEFAULT_ENTITY_CURRENCY.to_string(),
        }
    }
}
