//! Category configuration for tickets
//!
//! Categories carry a `points` multiplier used by the performance scorer.
//! Inactive categories do not accept new tickets.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ticket category configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub points: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Create a new category with validation
    pub fn new<S1: Into<String>, S2: Into<String>>(
        name: S1,
        description: S2,
        points: i32,
    ) -> Result<Self> {
        let name = name.into();
        let description = description.into();

        if name.trim().is_empty() {
            return Err(Error::validation("Category name cannot be empty"));
        }
        if name.len() > 50 {
            return Err(Error::validation(
                "Category name cannot exceed 50 characters",
            ));
        }
        if description.trim().is_empty() {
            return Err(Error::validation("Category description cannot be empty"));
        }
        if description.len() > 500 {
            return Err(Error::validation(
                "Category description cannot exceed 500 characters",
            ));
        }
        if points <= 0 {
            return Err(Error::validation("Category points must be positive"));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            description,
            points,
            is_active: true,
            created_at: Utc::now(),
        })
    }

    /// Deactivate the category so it stops accepting new tickets
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Reactivate the category
    pub fn activate(&mut self) {
        self.is_active = true;
    }
}
