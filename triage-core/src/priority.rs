//! Priority configuration for tickets
//!
//! Priorities are created by administrators and referenced, never owned, by
//! tickets. The `weight` is the workload cost a ticket of this priority
//! imposes on an agent's capacity; `time_limit_hours` is the expected
//! time-to-complete used for deadlines and scoring.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ticket priority configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Priority {
    pub id: Uuid,
    pub name: String,
    pub weight: i32,
    pub time_limit_hours: i32,
    pub created_at: DateTime<Utc>,
}

impl Priority {
    /// Create a new priority with validation
    pub fn new<S: Into<String>>(name: S, weight: i32, time_limit_hours: i32) -> Result<Self> {
        let name = name.into();
        Self::validate_name(&name)?;
        if weight <= 0 {
            return Err(Error::validation("Priority weight must be positive"));
        }
        if time_limit_hours <= 0 {
            return Err(Error::validation("Priority time limit must be positive"));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            weight,
            time_limit_hours,
            created_at: Utc::now(),
        })
    }

    fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::validation("Priority name cannot be empty"));
        }
        if name.len() > 50 {
            return Err(Error::validation(
                "Priority name cannot exceed 50 characters",
            ));
        }
        Ok(())
    }
}
