//! Agent administration service
//!
//! Registration (promoting a user to agent), activation toggles, level
//! changes, and statistics. Deactivating an agent does not reclaim its
//! tickets synchronously; the scheduler's inactive-agent sweep picks them up
//! on its next pass.

use crate::repositories::{AgentRepository, TicketRepository};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info};
use triage_core::agent::{Agent, AgentLevel};
use uuid::Uuid;

/// Service for managing agents
pub struct AgentService {
    agents: Arc<AgentRepository>,
    tickets: Arc<TicketRepository>,
}

/// Agent system statistics
#[derive(Debug, Clone)]
pub struct AgentStatistics {
    pub total_agents: i64,
    pub active_agents: i64,
    pub inactive_agents: i64,
    pub total_capacity: i64,
    pub total_workload: i64,
    pub completed_tickets: i64,
    pub total_performance_points: i64,
}

impl AgentService {
    /// Create a new agent service
    pub fn new(agents: Arc<AgentRepository>, tickets: Arc<TicketRepository>) -> Self {
        Self { agents, tickets }
    }

    /// Promote a user to agent at the given level
    pub async fn register_agent(&self, user_id: Uuid, level: AgentLevel) -> Result<Agent> {
        info!(
            "Registering agent for user {} at level {}",
            user_id,
            level.as_str()
        );

        if self.agents.find_by_user_id(user_id).await?.is_some() {
            return Err(Error::Conflict(format!(
                "User {} is already an agent",
                user_id
            )));
        }

        let agent = Agent::new(user_id, level);
        self.agents.create(&agent).await?;
        Ok(agent)
    }

    /// Get an agent by ID
    pub async fn get_agent(&self, agent_id: Uuid) -> Result<Option<Agent>> {
        self.agents.find_by_id(agent_id).await
    }

    /// List all agents
    pub async fn list_agents(&self) -> Result<Vec<Agent>> {
        self.agents.list().await
    }

    /// Activate or deactivate an agent. Deactivated agents receive no new
    /// assignments; their existing tickets are reclaimed by the scheduler.
    pub async fn set_active(&self, agent_id: Uuid, active: bool) -> Result<Agent> {
        let mut agent = self
            .agents
            .find_by_id(agent_id)
            .await?
            .ok_or_else(|| Error::not_found("Agent", agent_id))?;

        agent.set_active(active);
        self.agents.update(&agent).await?;

        if active {
            info!("Agent {} activated", agent_id);
        } else {
            let open = self.tickets.find_by_assigned_agent(agent_id).await?.len();
            info!(
                "Agent {} deactivated with {} open tickets awaiting reclamation",
                agent_id, open
            );
        }
        Ok(agent)
    }

    /// Change an agent's level; total capacity recomputes from the new
    /// level, bonus capacity is preserved
    pub async fn set_level(&self, agent_id: Uuid, level: AgentLevel) -> Result<Agent> {
        let mut agent = self
            .agents
            .find_by_id(agent_id)
            .await?
            .ok_or_else(|| Error::not_found("Agent", agent_id))?;

        agent.set_level(level);
        self.agents.update(&agent).await?;

        info!(
            "Agent {} moved to level {} (capacity {})",
            agent_id,
            level.as_str(),
            agent.total_capacity()
        );
        Ok(agent)
    }

    /// Grant bonus capacity on top of the level-derived base
    pub async fn grant_bonus_capacity(&self, agent_id: Uuid, amount: i32) -> Result<Agent> {
        let mut agent = self
            .agents
            .find_by_id(agent_id)
            .await?
            .ok_or_else(|| Error::not_found("Agent", agent_id))?;

        agent.grant_bonus_capacity(amount)?;
        self.agents.update(&agent).await?;
        Ok(agent)
    }

    /// Get agent statistics
    pub async fn statistics(&self) -> Result<AgentStatistics> {
        debug!("Computing agent statistics");

        let agents = self.agents.list().await?;
        let active_agents = agents.iter().filter(|a| a.is_active).count() as i64;

        Ok(AgentStatistics {
            total_agents: agents.len() as i64,
            active_agents,
            inactive_agents: agents.len() as i64 - active_agents,
            total_capacity: agents.iter().map(|a| a.total_capacity() as i64).sum(),
            total_workload: agents.iter().map(|a| a.current_workload as i64).sum(),
            completed_tickets: agents.iter().map(|a| a.completed_tickets).sum(),
            total_performance_points: agents.iter().map(|a| a.total_performance_points).sum(),
        })
    }
}
