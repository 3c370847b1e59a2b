//! Ticket lifecycle service
//!
//! Entry points for the surrounding system: create a ticket (routed straight
//! through the assignment engine), start work, and complete work. Start and
//! complete run the state machine from `triage-core` against freshly loaded
//! rows inside a transaction; completion also scores the ticket, releases
//! the agent's workload, and bumps the agent's counters atomically.

use crate::repositories::{
    AgentRepository, CategoryRepository, PriorityRepository, TicketRepository,
};
use crate::services::assignment::AssignmentEngine;
use crate::services::event::{EngineEvent, EventBus};
use crate::{Error, Result};
use chrono::Utc;
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use tracing::{debug, info};
use triage_core::scoring::completion_points;
use triage_core::ticket::{Ticket, TicketStatus};
use uuid::Uuid;

/// Service for ticket creation and lifecycle transitions
pub struct TicketService {
    pool: Pool<Sqlite>,
    tickets: Arc<TicketRepository>,
    agents: Arc<AgentRepository>,
    priorities: Arc<PriorityRepository>,
    categories: Arc<CategoryRepository>,
    engine: Arc<AssignmentEngine>,
    events: EventBus,
}

/// Statistics about tickets in the system
#[derive(Debug, Clone)]
pub struct TicketStatistics {
    pub total_tickets: i64,
    pub backlog_tickets: i64,
    pub assigned_tickets: i64,
    pub ongoing_tickets: i64,
    pub completed_tickets: i64,
}

impl TicketService {
    /// Create a new ticket service
    pub fn new(
        pool: Pool<Sqlite>,
        tickets: Arc<TicketRepository>,
        agents: Arc<AgentRepository>,
        priorities: Arc<PriorityRepository>,
        categories: Arc<CategoryRepository>,
        engine: Arc<AssignmentEngine>,
        events: EventBus,
    ) -> Self {
        Self {
            pool,
            tickets,
            agents,
            priorities,
            categories,
            engine,
            events,
        }
    }

    /// Create a new ticket and immediately route it through the assignment
    /// engine. Returns the ticket as persisted: `Assigned` when an agent was
    /// found, `NoAgentAvailable` otherwise.
    pub async fn create_ticket<S1: Into<String>, S2: Into<String>>(
        &self,
        owner_id: Uuid,
        title: S1,
        description: S2,
        priority_id: Uuid,
        category_id: Uuid,
    ) -> Result<Ticket> {
        let priority = self
            .priorities
            .find_by_id(priority_id)
            .await?
            .ok_or_else(|| Error::not_found("Priority", priority_id))?;
        let category = self
            .categories
            .find_by_id(category_id)
            .await?
            .ok_or_else(|| Error::not_found("Category", category_id))?;

        if !category.is_active {
            return Err(Error::Conflict(format!(
                "Category '{}' is not accepting new tickets",
                category.name
            )));
        }

        let ticket = Ticket::builder()
            .title(title)
            .description(description)
            .owner_id(owner_id)
            .priority_id(priority.id)
            .category_id(category.id)
            .build()?;

        self.tickets.create(&ticket).await?;
        info!("Created ticket {} ({})", ticket.title, ticket.id);

        self.engine.assign(ticket).await
    }

    /// Get a ticket by ID
    pub async fn get_ticket(&self, ticket_id: Uuid) -> Result<Option<Ticket>> {
        debug!("Retrieving ticket {}", ticket_id);
        self.tickets.find_by_id(ticket_id).await
    }

    /// List all tickets
    pub async fn list_tickets(&self) -> Result<Vec<Ticket>> {
        self.tickets.list().await
    }

    /// The agent begins work on an assigned ticket. Requires the caller's
    /// agent id to match the binding; freezes the completion deadline.
    pub async fn start_ticket(&self, ticket_id: Uuid, agent_id: Uuid) -> Result<Ticket> {
        let current = self
            .tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or_else(|| Error::not_found("Ticket", ticket_id))?;
        let priority = self
            .priorities
            .find_by_id(current.priority_id)
            .await?
            .ok_or_else(|| Error::not_found("Priority", current.priority_id))?;

        let mut tx = self.pool.begin().await?;

        let mut ticket = self
            .tickets
            .find_by_id_tx(&mut *tx, ticket_id)
            .await?
            .ok_or_else(|| Error::not_found("Ticket", ticket_id))?;

        ticket.start(agent_id, &priority)?;
        self.tickets.update_tx(&mut *tx, &ticket).await?;
        tx.commit().await?;

        info!("Ticket {} started by agent {}", ticket.id, agent_id);
        Ok(ticket)
    }

    /// The agent completes an ongoing ticket: the state machine validates
    /// the transition, the scorer awards points, and the agent's workload
    /// and counters are updated in the same transaction. Emits
    /// `TicketCompleted`.
    pub async fn complete_ticket(&self, ticket_id: Uuid, agent_id: Uuid) -> Result<Ticket> {
        let current = self
            .tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or_else(|| Error::not_found("Ticket", ticket_id))?;
        let priority = self
            .priorities
            .find_by_id(current.priority_id)
            .await?
            .ok_or_else(|| Error::not_found("Priority", current.priority_id))?;
        let category = self
            .categories
            .find_by_id(current.category_id)
            .await?
            .ok_or_else(|| Error::not_found("Category", current.category_id))?;

        let mut tx = self.pool.begin().await?;

        let mut ticket = self
            .tickets
            .find_by_id_tx(&mut *tx, ticket_id)
            .await?
            .ok_or_else(|| Error::not_found("Ticket", ticket_id))?;

        ticket.complete(agent_id)?;
        let completed_at = ticket.completion_date.unwrap_or_else(Utc::now);
        let points = completion_points(&ticket, &priority, &category, completed_at);
        ticket.points = Some(points);

        let mut agent = self
            .agents
            .find_by_id_tx(&mut *tx, agent_id)
            .await?
            .ok_or_else(|| Error::not_found("Agent", agent_id))?;
        agent.reduce_workload(priority.weight);
        agent.record_completion(points);

        self.tickets.update_tx(&mut *tx, &ticket).await?;
        self.agents.update_tx(&mut *tx, &agent).await?;
        tx.commit().await?;

        info!(
            "Ticket {} completed by agent {} for {} points",
            ticket.id, agent_id, points
        );
        self.events.emit(EngineEvent::TicketCompleted {
            ticket_id: ticket.id,
            points,
        });

        Ok(ticket)
    }

    /// Get ticket statistics
    pub async fn statistics(&self) -> Result<TicketStatistics> {
        Ok(TicketStatistics {
            total_tickets: self.tickets.count().await?,
            backlog_tickets: self
                .tickets
                .count_by_status(TicketStatus::NoAgentAvailable)
                .await?,
            assigned_tickets: self.tickets.count_by_status(TicketStatus::Assigned).await?,
            ongoing_tickets: self.tickets.count_by_status(TicketStatus::Ongoing).await?,
            completed_tickets: self
                .tickets
                .count_by_status(TicketStatus::Completed)
                .await?,
        })
    }
}
