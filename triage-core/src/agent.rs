//! Agent domain model and capacity arithmetic
//!
//! This module provides the agent model for staff members who work tickets.
//! An agent's capacity is derived from its level (plus any bonus capacity);
//! its current workload is the summed weight of all tickets currently
//! assigned to or being worked by the agent.
//!
//! Workload is mutated only through [`Agent::add_workload`] and
//! [`Agent::reduce_workload`]; the invariant `0 <= current_workload <=
//! total_capacity()` must hold after every assignment or completion
//! transaction. `add_workload` refuses to proceed rather than let the
//! invariant drift, so callers check [`Agent::has_capacity_for`] first,
//! inside the same transaction that performs the write.
//!
//! # Examples
//!
//! ```rust
//! use triage_core::agent::*;
//! use uuid::Uuid;
//!
//! let mut agent = Agent::builder()
//!     .user_id(Uuid::new_v4())
//!     .level(AgentLevel::Senior)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(agent.total_capacity(), 50);
//! assert!(agent.has_capacity_for(30));
//! agent.add_workload(30).unwrap();
//! assert_eq!(agent.current_workload, 30);
//! ```

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seniority level of an agent, determining base capacity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AgentLevel {
    Junior,
    Mid,
    Senior,
}

impl AgentLevel {
    /// Base workload capacity for this level
    pub fn base_capacity(&self) -> i32 {
        match self {
            AgentLevel::Junior => 10,
            AgentLevel::Mid => 20,
            AgentLevel::Senior => 50,
        }
    }

    /// Stable string form used for persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentLevel::Junior => "junior",
            AgentLevel::Mid => "mid",
            AgentLevel::Senior => "senior",
        }
    }

    /// Parse the persisted string form
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "junior" => Ok(AgentLevel::Junior),
            "mid" => Ok(AgentLevel::Mid),
            "senior" => Ok(AgentLevel::Senior),
            other => Err(Error::validation(format!("Unknown agent level: {}", other))),
        }
    }
}

/// Represents one staff member's capacity pool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub level: AgentLevel,
    pub bonus_capacity: i32,
    pub current_workload: i32,
    pub is_active: bool,
    pub completed_tickets: i64,
    pub total_performance_points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    /// Create a new agent for a user at the given level
    pub fn new(user_id: Uuid, level: AgentLevel) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            level,
            bonus_capacity: 0,
            current_workload: 0,
            is_active: true,
            completed_tickets: 0,
            total_performance_points: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a builder for constructing an Agent
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// Base capacity derived from the agent's level
    pub fn base_capacity(&self) -> i32 {
        self.level.base_capacity()
    }

    /// Total capacity: level-derived base plus any bonus
    pub fn total_capacity(&self) -> i32 {
        self.base_capacity() + self.bonus_capacity
    }

    /// True iff the agent is active and has room for `weight` more workload
    pub fn has_capacity_for(&self, weight: i32) -> bool {
        self.is_active && self.current_workload + weight <= self.total_capacity()
    }

    /// Relative utilization in `[0, 1]`, used for load-balanced selection
    pub fn utilization(&self) -> f64 {
        self.current_workload as f64 / self.total_capacity() as f64
    }

    /// Charge `weight` units of workload to this agent.
    ///
    /// Refuses with a constraint violation if the result would exceed
    /// capacity or the agent is inactive; callers must have verified
    /// `has_capacity_for` under the same transaction.
    pub fn add_workload(&mut self, weight: i32) -> Result<()> {
        if !self.is_active {
            return Err(Error::constraint_violation(
                "agent_active",
                format!("Agent {} is inactive and cannot take workload", self.id),
            ));
        }
        if self.current_workload + weight > self.total_capacity() {
            return Err(Error::constraint_violation(
                "capacity",
                format!(
                    "Workload {} + {} would exceed capacity {} for agent {}",
                    self.current_workload,
                    weight,
                    self.total_capacity(),
                    self.id
                ),
            ));
        }
        self.current_workload += weight;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Release `weight` units of workload, clamped at zero.
    ///
    /// Clamping guards against double-release; it never masks an
    /// over-assignment, which `add_workload` rejects outright.
    pub fn reduce_workload(&mut self, weight: i32) {
        self.current_workload = (self.current_workload - weight).max(0);
        self.updated_at = Utc::now();
    }

    /// Change the agent's level; capacity recomputes from the new level and
    /// bonus capacity is preserved
    pub fn set_level(&mut self, level: AgentLevel) {
        self.level = level;
        self.updated_at = Utc::now();
    }

    /// Grant additional capacity on top of the level-derived base
    pub fn grant_bonus_capacity(&mut self, amount: i32) -> Result<()> {
        if amount <= 0 {
            return Err(Error::validation("Bonus capacity grant must be positive"));
        }
        self.bonus_capacity += amount;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Activate or deactivate the agent
    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
        self.updated_at = Utc::now();
    }

    /// Record a completed ticket and the points it scored
    pub fn record_completion(&mut self, points: i64) {
        self.completed_tickets += 1;
        self.total_performance_points += points;
        self.updated_at = Utc::now();
    }
}

/// Builder for constructing Agent instances
#[derive(Debug, Clone)]
pub struct AgentBuilder {
    user_id: Option<Uuid>,
    level: Option<AgentLevel>,
    bonus_capacity: i32,
}

impl AgentBuilder {
    /// Create a new agent builder
    pub fn new() -> Self {
        Self {
            user_id: None,
            level: None,
            bonus_capacity: 0,
        }
    }

    /// Set the user this agent belongs to
    pub fn user_id(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Set the agent level
    pub fn level(mut self, level: AgentLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Set initial bonus capacity
    pub fn bonus_capacity(mut self, bonus_capacity: i32) -> Self {
        self.bonus_capacity = bonus_capacity;
        self
    }

    /// Build the Agent instance
    pub fn build(self) -> Result<Agent> {
        let user_id = self
            .user_id
            .ok_or_else(|| Error::validation("Agent user id is required"))?;
        let level = self
            .level
            .ok_or_else(|| Error::validation("Agent level is required"))?;
        if self.bonus_capacity < 0 {
            return Err(Error::validation("Bonus capacity cannot be negative"));
        }

        let mut agent = Agent::new(user_id, level);
        agent.bonus_capacity = self.bonus_capacity;
        Ok(agent)
    }
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
