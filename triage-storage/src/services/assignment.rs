//! Assignment engine: capacity-aware agent selection and binding
//!
//! Candidate selection ranks active agents by relative utilization
//! (`current_workload / total_capacity`), spreading load proportionally to
//! capacity instead of favoring high-capacity agents by raw headroom.
//!
//! Selection and binding are not atomic across the candidate query, so the
//! capacity check is re-validated against a freshly loaded agent row inside
//! the same transaction that writes the agent and ticket. "No agent
//! available" is an expected outcome represented in ticket status, never an
//! error.

use crate::repositories::{AgentRepository, PriorityRepository, TicketRepository};
use crate::services::event::{EngineEvent, EventBus};
use crate::{Error, Result};
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use tracing::{debug, info, warn};
use triage_core::agent::Agent;
use triage_core::priority::Priority;
use triage_core::ticket::Ticket;
use uuid::Uuid;

/// Engine that binds tickets to agents and releases capacity on reclaim
pub struct AssignmentEngine {
    pool: Pool<Sqlite>,
    agents: Arc<AgentRepository>,
    tickets: Arc<TicketRepository>,
    priorities: Arc<PriorityRepository>,
    events: EventBus,
}

impl AssignmentEngine {
    /// Create a new assignment engine
    pub fn new(
        pool: Pool<Sqlite>,
        agents: Arc<AgentRepository>,
        tickets: Arc<TicketRepository>,
        priorities: Arc<PriorityRepository>,
        events: EventBus,
    ) -> Self {
        Self {
            pool,
            agents,
            tickets,
            priorities,
            events,
        }
    }

    /// Find the best available agent for a ticket of the given priority:
    /// the active agent with capacity for its weight and the lowest
    /// relative utilization
    pub async fn find_best_agent(&self, priority: &Priority) -> Result<Option<Agent>> {
        let candidates = self.agents.list_active().await?;
        Ok(candidates
            .into_iter()
            .filter(|agent| agent.has_capacity_for(priority.weight))
            .min_by(|a, b| a.utilization().total_cmp(&b.utilization())))
    }

    /// Attempt to bind the ticket to the best available agent.
    ///
    /// Idempotent: a ticket that is not awaiting assignment is returned
    /// unchanged. When no candidate qualifies the ticket stays in the
    /// backlog. On success the capacity check is re-validated and both rows
    /// are written inside one transaction, then `TicketAssigned` is emitted.
    pub async fn assign(&self, mut ticket: Ticket) -> Result<Ticket> {
        if !ticket.awaiting_assignment() || ticket.assigned_agent_id.is_some() {
            debug!(
                "Ticket {} is already routed (status {:?}), skipping assignment",
                ticket.id, ticket.status
            );
            return Ok(ticket);
        }

        let priority = self
            .priorities
            .find_by_id(ticket.priority_id)
            .await?
            .ok_or_else(|| Error::not_found("Priority", ticket.priority_id))?;

        let Some(candidate) = self.find_best_agent(&priority).await? else {
            debug!(
                "No agent available for ticket {} (weight {})",
                ticket.id, priority.weight
            );
            return Ok(ticket);
        };

        let mut tx = self.pool.begin().await?;

        let mut agent = self
            .agents
            .find_by_id_tx(&mut *tx, candidate.id)
            .await?
            .ok_or_else(|| Error::not_found("Agent", candidate.id))?;

        // The candidate was selected from a separate read; its capacity may
        // have been spent since. Re-check on the row this transaction owns.
        if !agent.has_capacity_for(priority.weight) {
            debug!(
                "Agent {} lost capacity before binding, ticket {} stays in backlog",
                agent.id, ticket.id
            );
            return Ok(ticket);
        }

        agent.add_workload(priority.weight)?;
        ticket.assign_to(agent.id)?;

        self.agents.update_tx(&mut *tx, &agent).await?;
        self.tickets.update_tx(&mut *tx, &ticket).await?;
        tx.commit().await?;

        info!(
            "Assigned ticket {} to agent {} (workload {}/{})",
            ticket.id,
            agent.id,
            agent.current_workload,
            agent.total_capacity()
        );
        self.events.emit(EngineEvent::TicketAssigned {
            ticket_id: ticket.id,
            agent_id: agent.id,
        });

        Ok(ticket)
    }

    /// Forcibly take the ticket away from its agent and put it back in the
    /// backlog, releasing the agent's workload, then immediately attempt a
    /// fresh assignment (best-effort; the ticket may again find no
    /// candidate).
    pub async fn reclaim(&self, mut ticket: Ticket) -> Result<Ticket> {
        if ticket.is_terminal() {
            return Ok(ticket);
        }
        let Some(agent_id) = ticket.assigned_agent_id else {
            return self.assign(ticket).await;
        };

        let priority = self
            .priorities
            .find_by_id(ticket.priority_id)
            .await?
            .ok_or_else(|| Error::not_found("Priority", ticket.priority_id))?;

        let mut tx = self.pool.begin().await?;

        // The agent row may be gone entirely; releasing workload only
        // applies when it still exists.
        if let Some(mut agent) = self.agents.find_by_id_tx(&mut *tx, agent_id).await? {
            agent.reduce_workload(priority.weight);
            self.agents.update_tx(&mut *tx, &agent).await?;
        }

        ticket.return_to_backlog()?;
        self.tickets.update_tx(&mut *tx, &ticket).await?;
        tx.commit().await?;

        info!("Reclaimed ticket {} from agent {}", ticket.id, agent_id);

        self.assign(ticket).await
    }

    /// Reclaim every non-completed ticket bound to the agent and attempt to
    /// re-assign each one. Per-ticket failures are logged and do not abort
    /// the rest.
    pub async fn reassign_from_agent(&self, agent_id: Uuid) -> Result<Vec<Ticket>> {
        let bound = self.tickets.find_by_assigned_agent(agent_id).await?;
        if bound.is_empty() {
            return Ok(Vec::new());
        }

        info!(
            "Reassigning {} tickets away from agent {}",
            bound.len(),
            agent_id
        );

        let mut reassigned = Vec::with_capacity(bound.len());
        for ticket in bound {
            let ticket_id = ticket.id;
            match self.reclaim(ticket).await {
                Ok(ticket) => reassigned.push(ticket),
                Err(e) => warn!("Failed to reclaim ticket {}: {}", ticket_id, e),
            }
        }
        Ok(reassigned)
    }
}
