//! Ticket domain model and lifecycle state machine
//!
//! A ticket moves through `NoAgentAvailable -> Assigned -> Ongoing ->
//! Completed`; the scheduler may regress an `Assigned` or `Ongoing` ticket
//! back to `NoAgentAvailable` when its agent becomes unavailable. No
//! transition may skip a state and `Completed` is terminal. Transition
//! methods reject illegal moves with [`Error::InvalidTransition`] and leave
//! the ticket unchanged.
//!
//! # Examples
//!
//! ```rust
//! use triage_core::priority::Priority;
//! use triage_core::ticket::*;
//! use uuid::Uuid;
//!
//! let priority = Priority::new("urgent", 30, 24).unwrap();
//! let mut ticket = Ticket::builder()
//!     .title("Printer on fire")
//!     .description("The office printer is actually on fire")
//!     .owner_id(Uuid::new_v4())
//!     .priority_id(priority.id)
//!     .category_id(Uuid::new_v4())
//!     .build()
//!     .unwrap();
//!
//! let agent_id = Uuid::new_v4();
//! ticket.assign_to(agent_id).unwrap();
//! ticket.start(agent_id, &priority).unwrap();
//! ticket.complete(agent_id).unwrap();
//! assert_eq!(ticket.status, TicketStatus::Completed);
//! ```

use crate::priority::Priority;
use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a ticket
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TicketStatus {
    NoAgentAvailable,
    Assigned,
    Ongoing,
    Completed,
}

impl TicketStatus {
    /// Stable string form used for persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::NoAgentAvailable => "no_agent_available",
            TicketStatus::Assigned => "assigned",
            TicketStatus::Ongoing => "ongoing",
            TicketStatus::Completed => "completed",
        }
    }

    /// Parse the persisted string form
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "no_agent_available" => Ok(TicketStatus::NoAgentAvailable),
            "assigned" => Ok(TicketStatus::Assigned),
            "ongoing" => Ok(TicketStatus::Ongoing),
            "completed" => Ok(TicketStatus::Completed),
            other => Err(Error::validation(format!(
                "Unknown ticket status: {}",
                other
            ))),
        }
    }
}

/// The unit of work routed to agents
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub owner_id: Uuid,
    pub assigned_agent_id: Option<Uuid>,
    pub priority_id: Uuid,
    pub category_id: Uuid,
    pub status: TicketStatus,
    pub points: Option<i64>,
    pub date_started: Option<DateTime<Utc>>,
    pub expected_completion_at: Option<DateTime<Utc>>,
    pub completion_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Create a new ticket with validation; starts unassigned in the backlog
    pub fn new(
        title: String,
        description: String,
        owner_id: Uuid,
        priority_id: Uuid,
        category_id: Uuid,
    ) -> Result<Self> {
        Self::validate_title(&title)?;
        Self::validate_description(&description)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            title,
            description,
            owner_id,
            assigned_agent_id: None,
            priority_id,
            category_id,
            status: TicketStatus::NoAgentAvailable,
            points: None,
            date_started: None,
            expected_completion_at: None,
            completion_date: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Create a builder for constructing a Ticket
    pub fn builder() -> TicketBuilder {
        TicketBuilder::new()
    }

    fn validate_title(title: &str) -> Result<()> {
        if title.trim().is_empty() {
            return Err(Error::validation("Ticket title cannot be empty"));
        }
        if title.len() > 200 {
            return Err(Error::validation(
                "Ticket title cannot exceed 200 characters",
            ));
        }
        Ok(())
    }

    fn validate_description(description: &str) -> Result<()> {
        if description.trim().is_empty() {
            return Err(Error::validation("Ticket description cannot be empty"));
        }
        if description.len() > 10000 {
            return Err(Error::validation(
                "Ticket description cannot exceed 10000 characters",
            ));
        }
        Ok(())
    }

    /// Bind the ticket to an agent. Legal only from the backlog, and only
    /// when no binding exists; the assignment engine is the sole caller.
    pub fn assign_to(&mut self, agent_id: Uuid) -> Result<()> {
        if self.status != TicketStatus::NoAgentAvailable {
            return Err(Error::invalid_transition(format!(
                "Ticket {} cannot be assigned from status {:?}",
                self.id, self.status
            )));
        }
        if self.assigned_agent_id.is_some() {
            return Err(Error::invalid_transition(format!(
                "Ticket {} is already bound to an agent",
                self.id
            )));
        }
        self.assigned_agent_id = Some(agent_id);
        self.status = TicketStatus::Assigned;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Begin work on the ticket. Requires status `Assigned` and a caller
    /// agent id matching the binding; freezes the completion deadline from
    /// the priority's time limit.
    pub fn start(&mut self, agent_id: Uuid, priority: &Priority) -> Result<()> {
        if self.status != TicketStatus::Assigned {
            return Err(Error::invalid_transition(format!(
                "Ticket {} cannot be started from status {:?}",
                self.id, self.status
            )));
        }
        if self.assigned_agent_id != Some(agent_id) {
            return Err(Error::invalid_transition(format!(
                "Agent {} is not assigned to ticket {}",
                agent_id, self.id
            )));
        }

        let now = Utc::now();
        self.date_started = Some(now);
        self.expected_completion_at = Some(now + Duration::hours(priority.time_limit_hours as i64));
        self.status = TicketStatus::Ongoing;
        self.updated_at = now;
        Ok(())
    }

    /// Finish work on the ticket. Requires status `Ongoing` and a matching
    /// agent id; scoring and workload release are the lifecycle service's
    /// responsibility.
    pub fn complete(&mut self, agent_id: Uuid) -> Result<()> {
        if self.status != TicketStatus::Ongoing {
            return Err(Error::invalid_transition(format!(
                "Ticket {} cannot be completed from status {:?}",
                self.id, self.status
            )));
        }
        if self.assigned_agent_id != Some(agent_id) {
            return Err(Error::invalid_transition(format!(
                "Agent {} is not assigned to ticket {}",
                agent_id, self.id
            )));
        }

        let now = Utc::now();
        self.completion_date = Some(now);
        self.status = TicketStatus::Completed;
        self.updated_at = now;
        Ok(())
    }

    /// Forced reassignment: clear the binding and regress to the backlog.
    /// Scheduler-driven, for tickets whose agent became unavailable. Start
    /// timestamps are cleared so the next `start` opens a fresh deadline
    /// window.
    pub fn return_to_backlog(&mut self) -> Result<()> {
        match self.status {
            TicketStatus::Assigned | TicketStatus::Ongoing => {
                self.assigned_agent_id = None;
                self.date_started = None;
                self.expected_completion_at = None;
                self.status = TicketStatus::NoAgentAvailable;
                self.updated_at = Utc::now();
                Ok(())
            }
            _ => Err(Error::invalid_transition(format!(
                "Ticket {} cannot be returned to backlog from status {:?}",
                self.id, self.status
            ))),
        }
    }

    /// Check if the ticket is in its terminal state
    pub fn is_terminal(&self) -> bool {
        self.status == TicketStatus::Completed
    }

    /// Check if the ticket is waiting in the backlog for an agent
    pub fn awaiting_assignment(&self) -> bool {
        self.status == TicketStatus::NoAgentAvailable
    }

    /// Fraction of the start-to-deadline interval elapsed at `now`.
    /// `None` unless the ticket has a started deadline window.
    pub fn deadline_progress(&self, now: DateTime<Utc>) -> Option<f64> {
        let started = self.date_started?;
        let deadline = self.expected_completion_at?;
        let window = (deadline - started).num_seconds();
        if window <= 0 {
            return None;
        }
        let elapsed = (now - started).num_seconds();
        Some(elapsed as f64 / window as f64)
    }

    /// True iff `now` is past `threshold` of the deadline window but the
    /// deadline itself has not yet passed
    pub fn in_warning_window(&self, now: DateTime<Utc>, threshold: f64) -> bool {
        match (self.deadline_progress(now), self.expected_completion_at) {
            (Some(progress), Some(deadline)) => progress >= threshold && now < deadline,
            _ => false,
        }
    }
}

/// Builder for constructing Ticket instances with validation
#[derive(Debug, Clone)]
pub struct TicketBuilder {
    title: Option<String>,
    description: Option<String>,
    owner_id: Option<Uuid>,
    priority_id: Option<Uuid>,
    category_id: Option<Uuid>,
}

impl TicketBuilder {
    /// Create a new ticket builder
    pub fn new() -> Self {
        Self {
            title: None,
            description: None,
            owner_id: None,
            priority_id: None,
            category_id: None,
        }
    }

    /// Set the ticket title
    pub fn title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the ticket description
    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the creating user
    pub fn owner_id(mut self, owner_id: Uuid) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    /// Set the referenced priority
    pub fn priority_id(mut self, priority_id: Uuid) -> Self {
        self.priority_id = Some(priority_id);
        self
    }

    /// Set the referenced category
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Build the Ticket instance
    pub fn build(self) -> Result<Ticket> {
        let title = self
            .title
            .ok_or_else(|| Error::validation("Ticket title is required"))?;
        let description = self
            .description
            .ok_or_else(|| Error::validation("Ticket description is required"))?;
        let owner_id = self
            .owner_id
            .ok_or_else(|| Error::validation("Ticket owner is required"))?;
        let priority_id = self
            .priority_id
            .ok_or_else(|| Error::validation("Ticket priority is required"))?;
        let category_id = self
            .category_id
            .ok_or_else(|| Error::validation("Ticket category is required"))?;

        Ticket::new(title, description, owner_id, priority_id, category_id)
    }
}

impl Default for TicketBuilder {
    fn default() -> Self {
        Self::new()
    }
}
