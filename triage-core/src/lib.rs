//! Core domain models for the triage ticket assignment engine
//!
//! This crate contains the fundamental domain models and pure logic used
//! throughout the triage system: agent capacity arithmetic, the ticket
//! lifecycle state machine, priority/category configuration, and the
//! performance scoring formula. It performs no I/O; persistence and
//! scheduling live in `triage-storage`.

pub mod agent;
pub mod category;
pub mod error;
pub mod priority;
pub mod scoring;
pub mod ticket;

pub use error::{Error, Result};
