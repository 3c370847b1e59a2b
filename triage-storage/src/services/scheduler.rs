//! Periodic reconciliation scheduler
//!
//! Four independently-timed jobs recover from agent unavailability and
//! unassigned backlog. Each job is a full sweep over the matching entities,
//! idempotent by construction: every operation it drives is a no-op when its
//! preconditions no longer hold. Per-entity failures are logged and never
//! abort the remainder of a sweep.
//!
//! Each job runs in its own spawned task on a `tokio::time::interval`, so a
//! long-running tick delays the next tick of the same job instead of
//! overlapping it; distinct jobs still run concurrently with each other and
//! with API-triggered transitions.

use crate::repositories::{AgentRepository, TicketRepository};
use crate::services::assignment::AssignmentEngine;
use crate::services::event::{EngineEvent, EventBus};
use crate::Result;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use triage_core::ticket::{Ticket, TicketStatus};
use uuid::Uuid;

/// Sweep intervals and deadline-warning threshold
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub pending_sweep_interval: Duration,
    pub inactive_agent_sweep_interval: Duration,
    pub validation_sweep_interval: Duration,
    pub deadline_sweep_interval: Duration,
    /// Fraction of the deadline window after which a warning is emitted
    pub deadline_warning_threshold: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pending_sweep_interval: Duration::from_secs(60),
            inactive_agent_sweep_interval: Duration::from_secs(30),
            validation_sweep_interval: Duration::from_secs(300),
            deadline_sweep_interval: Duration::from_secs(900),
            deadline_warning_threshold: 0.75,
        }
    }
}

/// Runs the reconciliation sweeps on timers
pub struct Scheduler {
    config: SchedulerConfig,
    engine: Arc<AssignmentEngine>,
    agents: Arc<AgentRepository>,
    tickets: Arc<TicketRepository>,
    events: EventBus,
    /// Tickets already warned in their current deadline window
    warned: RwLock<HashSet<Uuid>>,
}

impl Scheduler {
    /// Create a new scheduler
    pub fn new(
        config: SchedulerConfig,
        engine: Arc<AssignmentEngine>,
        agents: Arc<AgentRepository>,
        tickets: Arc<TicketRepository>,
        events: EventBus,
    ) -> Self {
        Self {
            config,
            engine,
            agents,
            tickets,
            events,
            warned: RwLock::new(HashSet::new()),
        }
    }

    /// Spawn all four sweep jobs on their timers. The returned handles run
    /// until aborted.
    pub fn start(self: Arc<Self>) -> Vec<JoinHandle<()>> {
        info!(
            "Starting scheduler (pending {:?}, inactive {:?}, validation {:?}, deadline {:?})",
            self.config.pending_sweep_interval,
            self.config.inactive_agent_sweep_interval,
            self.config.validation_sweep_interval,
            self.config.deadline_sweep_interval
        );

        let pending = {
            let scheduler = Arc::clone(&self);
            tokio::spawn(async move {
                let mut interval = time::interval(scheduler.config.pending_sweep_interval);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    interval.tick().await;
                    if let Err(e) = scheduler.run_pending_sweep().await {
                        error!("Pending-assignment sweep failed: {}", e);
                    }
                }
            })
        };

        let inactive = {
            let scheduler = Arc::clone(&self);
            tokio::spawn(async move {
                let mut interval = time::interval(scheduler.config.inactive_agent_sweep_interval);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    interval.tick().await;
                    if let Err(e) = scheduler.run_inactive_agent_sweep().await {
                        error!("Inactive-agent sweep failed: {}", e);
                    }
                }
            })
        };

        let validation = {
            let scheduler = Arc::clone(&self);
            tokio::spawn(async move {
                let mut interval = time::interval(scheduler.config.validation_sweep_interval);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    interval.tick().await;
                    if let Err(e) = scheduler.run_validation_sweep().await {
                        error!("Validation sweep failed: {}", e);
                    }
                }
            })
        };

        let deadline = {
            let scheduler = Arc::clone(&self);
            tokio::spawn(async move {
                let mut interval = time::interval(scheduler.config.deadline_sweep_interval);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    interval.tick().await;
                    if let Err(e) = scheduler.run_deadline_sweep().await {
                        error!("Deadline sweep failed: {}", e);
                    }
                }
            })
        };

        vec![pending, inactive, validation, deadline]
    }

    /// Try to assign every ticket waiting in the backlog. Tickets that still
    /// find no agent stay unchanged; that is expected, not an error.
    pub async fn run_pending_sweep(&self) -> Result<usize> {
        let backlog = self
            .tickets
            .find_by_status(TicketStatus::NoAgentAvailable)
            .await?;
        if backlog.is_empty() {
            return Ok(0);
        }
        debug!("Pending-assignment sweep over {} tickets", backlog.len());

        let mut assigned = 0;
        for ticket in backlog {
            let ticket_id = ticket.id;
            match self.engine.assign(ticket).await {
                Ok(ticket) if ticket.status == TicketStatus::Assigned => assigned += 1,
                Ok(_) => {}
                Err(e) => warn!("Assignment failed for ticket {}: {}", ticket_id, e),
            }
        }

        if assigned > 0 {
            info!("Pending-assignment sweep assigned {} tickets", assigned);
        }
        Ok(assigned)
    }

    /// Reclaim the open tickets of every deactivated agent
    pub async fn run_inactive_agent_sweep(&self) -> Result<usize> {
        let inactive = self.agents.list_inactive().await?;

        let mut reclaimed = 0;
        for agent in inactive {
            match self.engine.reassign_from_agent(agent.id).await {
                Ok(tickets) => reclaimed += tickets.len(),
                Err(e) => warn!("Reassignment failed for agent {}: {}", agent.id, e),
            }
        }

        if reclaimed > 0 {
            info!("Inactive-agent sweep reclaimed {} tickets", reclaimed);
        }
        Ok(reclaimed)
    }

    /// Defends against sweep-ordering gaps: any non-completed ticket whose
    /// bound agent is missing or inactive is reclaimed and re-assigned.
    pub async fn run_validation_sweep(&self) -> Result<usize> {
        let bound = self.tickets.find_assigned_open().await?;

        let mut repaired = 0;
        for ticket in bound {
            let ticket_id = ticket.id;
            match self.validate_assignment(ticket).await {
                Ok(true) => repaired += 1,
                Ok(false) => {}
                Err(e) => warn!("Validation failed for ticket {}: {}", ticket_id, e),
            }
        }

        if repaired > 0 {
            info!("Validation sweep repaired {} assignments", repaired);
        }
        Ok(repaired)
    }

    async fn validate_assignment(&self, ticket: Ticket) -> Result<bool> {
        let Some(agent_id) = ticket.assigned_agent_id else {
            return Ok(false);
        };
        match self.agents.find_by_id(agent_id).await? {
            Some(agent) if agent.is_active => Ok(false),
            _ => {
                warn!(
                    "Ticket {} is bound to missing or inactive agent {}",
                    ticket.id, agent_id
                );
                self.engine.reclaim(ticket).await?;
                Ok(true)
            }
        }
    }

    /// Emit one `DeadlineApproaching` event per ongoing ticket per warning
    /// window: past the warning threshold but not yet past the deadline.
    pub async fn run_deadline_sweep(&self) -> Result<usize> {
        let ongoing = self.tickets.find_by_status(TicketStatus::Ongoing).await?;
        let now = Utc::now();
        let threshold = self.config.deadline_warning_threshold;

        let in_window: HashSet<Uuid> = ongoing
            .iter()
            .filter(|t| t.in_warning_window(now, threshold))
            .map(|t| t.id)
            .collect();

        let mut warned = self.warned.write().await;
        // Tickets that left their window (completed, reclaimed, or past the
        // deadline) become eligible again if a fresh window ever opens.
        warned.retain(|id| in_window.contains(id));

        let mut emitted = 0;
        for ticket in &ongoing {
            if !in_window.contains(&ticket.id) || warned.contains(&ticket.id) {
                continue;
            }
            let Some(agent_id) = ticket.assigned_agent_id else {
                continue;
            };
            self.events.emit(EngineEvent::DeadlineApproaching {
                ticket_id: ticket.id,
                agent_id,
            });
            warned.insert(ticket.id);
            emitted += 1;
        }

        if emitted > 0 {
            info!("Deadline sweep emitted {} warnings", emitted);
        }
        Ok(emitted)
    }
}
