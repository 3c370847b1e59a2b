//! Repository implementations for persisted entities
//!
//! Entities are stored with TEXT uuids and RFC 3339 timestamps. The agent
//! and ticket repositories additionally expose `*_tx` variants of their
//! hot-path operations that run against a caller-supplied connection, so the
//! services can re-validate and mutate inside a single transaction.

pub mod agent;
pub mod category;
pub mod priority;
pub mod ticket;

pub use agent::AgentRepository;
pub use category::CategoryRepository;
pub use priority::PriorityRepository;
pub use ticket::TicketRepository;

use crate::{Error, Result};
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub(crate) fn parse_uuid(value: &str, column: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::Internal(anyhow!("Invalid uuid in column {}: {}", column, e)))
}

pub(crate) fn parse_datetime(value: &str, column: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(anyhow!("Invalid timestamp in column {}: {}", column, e)))
}

pub(crate) fn parse_opt_uuid(value: Option<&str>, column: &str) -> Result<Option<Uuid>> {
    value.map(|v| parse_uuid(v, column)).transpose()
}

pub(crate) fn parse_opt_datetime(value: Option<&str>, column: &str) -> Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_datetime(v, column)).transpose()
}
