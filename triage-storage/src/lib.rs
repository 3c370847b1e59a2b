//! Persistence and scheduling layer for the triage ticket assignment engine
//!
//! This crate provides SQLite-backed repositories for the domain entities in
//! `triage-core`, plus the services that orchestrate them: the assignment
//! engine, the ticket lifecycle service, agent administration, the engine
//! event bus, and the periodic reconciliation scheduler.

pub mod error;
pub mod manager;
pub mod repositories;
pub mod services;

pub use error::{Error, Result};
pub use manager::{DatabaseConfig, StorageManager};

/// Re-export core types for convenience
pub use triage_core as core;
