use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::Error;

/// Severity of an ingest log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestLevel {
    Info,
    Warning,
    Error,
}

impl IngestLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestLevel::Info => "info",
            IngestLevel::Warning => "warning",
            IngestLevel::Error => "error",
        }
    }
}

impl FromStr for IngestLevel {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "info" => Ok(IngestLevel::Info),
            "warning" => Ok(IngestLevel::Warning),
            "error" => Ok(IngestLevel::Error),
            _ => Err(Error::invalid_input(format!("Unknown ingest level: {}", s))),
        }
    }
}

/// Persisted ingest log entry. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestLog {
    pub id: i64,
    pub snapshot_id: i64,
    pub level: IngestLevel,
    pub message: String,
    pub context: Option<serde_json::Value>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIngestLog {
    pub snapshot_id: i64,
    pub level: IngestLevel,
    pub message: String,
    pub context: Option<serde_json::Value>,
}
