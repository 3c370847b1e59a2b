/// Tests for the reconciliation scheduler
#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::repositories::{
        AgentRepository, CategoryRepository, PriorityRepository, TicketRepository,
    };
    use crate::services::assignment::AssignmentEngine;
    use crate::services::event::{EngineEvent, EventBus};
    use chrono::{Duration, Utc};
    use sqlx::SqlitePool;
    use std::sync::Arc;
    use tempfile::NamedTempFile;
    use triage_core::agent::{Agent, AgentLevel};
    use triage_core::category::Category;
    use triage_core::priority::Priority;
    use triage_core::ticket::{Ticket, TicketStatus};
    use uuid::Uuid;

    struct Harness {
        agents: Arc<AgentRepository>,
        tickets: Arc<TicketRepository>,
        priorities: Arc<PriorityRepository>,
        categories: Arc<CategoryRepository>,
        engine: Arc<AssignmentEngine>,
        scheduler: Arc<Scheduler>,
        events: EventBus,
        _temp: NamedTempFile,
    }

    async fn setup_harness() -> Harness {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let database_url = format!("sqlite://{}", temp_file.path().display());

        let pool = SqlitePool::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        let agents = Arc::new(AgentRepository::new(pool.clone()));
        let tickets = Arc::new(TicketRepository::new(pool.clone()));
        let priorities = Arc::new(PriorityRepository::new(pool.clone()));
        let categories = Arc::new(CategoryRepository::new(pool.clone()));
        let events = EventBus::default();
        let engine = Arc::new(AssignmentEngine::new(
            pool,
            agents.clone(),
            tickets.clone(),
            priorities.clone(),
            events.clone(),
        ));
        let scheduler = Arc::new(Scheduler::new(
            SchedulerConfig::default(),
            engine.clone(),
            agents.clone(),
            tickets.clone(),
            events.clone(),
        ));

        Harness {
            agents,
            tickets,
            priorities,
            categories,
            engine,
            scheduler,
            events,
            _temp: temp_file,
        }
    }

    async fn seed_config(harness: &Harness, weight: i32) -> (Priority, Category) {
        let priority = Priority::new("urgent", weight, 24).unwrap();
        harness.priorities.create(&priority).await.unwrap();
        let category = Category::new("billing", "Billing issues", 3).unwrap();
        harness.categories.create(&category).await.unwrap();
        (priority, category)
    }

    async fn seed_agent(harness: &Harness, level: AgentLevel) -> Agent {
        let agent = Agent::new(Uuid::new_v4(), level);
        harness.agents.create(&agent).await.unwrap();
        agent
    }

    async fn seed_backlog_ticket(
        harness: &Harness,
        priority: &Priority,
        category: &Category,
    ) -> Ticket {
        let ticket = Ticket::builder()
            .title("Swept ticket")
            .description("Waiting for reconciliation")
            .owner_id(Uuid::new_v4())
            .priority_id(priority.id)
            .category_id(category.id)
            .build()
            .unwrap();
        harness.tickets.create(&ticket).await.unwrap();
        ticket
    }

    async fn deactivate(harness: &Harness, agent_id: Uuid) {
        let mut agent = harness.agents.find_by_id(agent_id).await.unwrap().unwrap();
        agent.set_active(false);
        harness.agents.update(&agent).await.unwrap();
    }

    #[tokio::test]
    async fn test_pending_sweep_assigns_backlog() {
        let harness = setup_harness().await;
        let (priority, category) = seed_config(&harness, 10).await;

        let ticket = seed_backlog_ticket(&harness, &priority, &category).await;

        // Nothing to assign to yet
        let assigned = harness.scheduler.run_pending_sweep().await.unwrap();
        assert_eq!(assigned, 0);

        let agent = seed_agent(&harness, AgentLevel::Mid).await;
        let assigned = harness.scheduler.run_pending_sweep().await.unwrap();
        assert_eq!(assigned, 1);

        let stored = harness.tickets.find_by_id(ticket.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TicketStatus::Assigned);
        assert_eq!(stored.assigned_agent_id, Some(agent.id));
    }

    #[tokio::test]
    async fn test_pending_sweep_on_empty_backlog_is_noop() {
        let harness = setup_harness().await;
        let assigned = harness.scheduler.run_pending_sweep().await.unwrap();
        assert_eq!(assigned, 0);
    }

    #[tokio::test]
    async fn test_inactive_agent_sweep_reclaims_all_tickets() {
        let harness = setup_harness().await;
        let (priority, category) = seed_config(&harness, 10).await;
        let agent = seed_agent(&harness, AgentLevel::Senior).await;

        let first = seed_backlog_ticket(&harness, &priority, &category).await;
        let first = harness.engine.assign(first).await.unwrap();
        let second = seed_backlog_ticket(&harness, &priority, &category).await;
        let second = harness.engine.assign(second).await.unwrap();
        assert_eq!(first.status, TicketStatus::Assigned);
        assert_eq!(second.status, TicketStatus::Assigned);

        deactivate(&harness, agent.id).await;

        let reclaimed = harness.scheduler.run_inactive_agent_sweep().await.unwrap();
        assert_eq!(reclaimed, 2);

        // No other agent exists, so both land back in the backlog and the
        // deactivated agent carries no workload for them
        for ticket_id in [first.id, second.id] {
            let stored = harness.tickets.find_by_id(ticket_id).await.unwrap().unwrap();
            assert_eq!(stored.status, TicketStatus::NoAgentAvailable);
            assert!(stored.assigned_agent_id.is_none());
        }
        let drained = harness.agents.find_by_id(agent.id).await.unwrap().unwrap();
        assert_eq!(drained.current_workload, 0);
    }

    #[tokio::test]
    async fn test_inactive_agent_sweep_with_active_agents_is_noop() {
        let harness = setup_harness().await;
        let (priority, category) = seed_config(&harness, 10).await;
        let agent = seed_agent(&harness, AgentLevel::Mid).await;

        let ticket = seed_backlog_ticket(&harness, &priority, &category).await;
        harness.engine.assign(ticket).await.unwrap();

        let reclaimed = harness.scheduler.run_inactive_agent_sweep().await.unwrap();
        assert_eq!(reclaimed, 0);

        let loaded = harness.agents.find_by_id(agent.id).await.unwrap().unwrap();
        assert_eq!(loaded.current_workload, 10);
    }

    #[tokio::test]
    async fn test_validation_sweep_repairs_stale_binding() {
        let harness = setup_harness().await;
        let (priority, category) = seed_config(&harness, 10).await;
        let agent = seed_agent(&harness, AgentLevel::Mid).await;

        let ticket = seed_backlog_ticket(&harness, &priority, &category).await;
        let ticket = harness.engine.assign(ticket).await.unwrap();
        assert_eq!(ticket.assigned_agent_id, Some(agent.id));

        deactivate(&harness, agent.id).await;

        let repaired = harness.scheduler.run_validation_sweep().await.unwrap();
        assert_eq!(repaired, 1);

        let stored = harness.tickets.find_by_id(ticket.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TicketStatus::NoAgentAvailable);
        assert!(stored.assigned_agent_id.is_none());

        let drained = harness.agents.find_by_id(agent.id).await.unwrap().unwrap();
        assert_eq!(drained.current_workload, 0);
    }

    #[tokio::test]
    async fn test_validation_sweep_ignores_healthy_bindings() {
        let harness = setup_harness().await;
        let (priority, category) = seed_config(&harness, 10).await;
        seed_agent(&harness, AgentLevel::Mid).await;

        let ticket = seed_backlog_ticket(&harness, &priority, &category).await;
        harness.engine.assign(ticket).await.unwrap();

        let repaired = harness.scheduler.run_validation_sweep().await.unwrap();
        assert_eq!(repaired, 0);
    }

    #[tokio::test]
    async fn test_deadline_sweep_warns_once_per_window() {
        let harness = setup_harness().await;
        let (priority, category) = seed_config(&harness, 10).await;
        let agent = seed_agent(&harness, AgentLevel::Mid).await;

        let ticket = seed_backlog_ticket(&harness, &priority, &category).await;
        let mut ticket = harness.engine.assign(ticket).await.unwrap();
        ticket.start(agent.id, &priority).unwrap();

        // 20 hours into a 24 hour window: inside the 75% warning band
        let started = Utc::now() - Duration::hours(20);
        ticket.date_started = Some(started);
        ticket.expected_completion_at = Some(started + Duration::hours(24));
        harness.tickets.update(&ticket).await.unwrap();

        let mut rx = harness.events.subscribe();

        let emitted = harness.scheduler.run_deadline_sweep().await.unwrap();
        assert_eq!(emitted, 1);
        assert_eq!(
            rx.try_recv().unwrap(),
            EngineEvent::DeadlineApproaching {
                ticket_id: ticket.id,
                agent_id: agent.id,
            }
        );

        // The same window must not warn twice
        let emitted = harness.scheduler.run_deadline_sweep().await.unwrap();
        assert_eq!(emitted, 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_deadline_sweep_ignores_fresh_and_overdue_tickets() {
        let harness = setup_harness().await;
        let (priority, category) = seed_config(&harness, 10).await;
        let agent = seed_agent(&harness, AgentLevel::Senior).await;

        // Freshly started: far from the warning band
        let fresh = seed_backlog_ticket(&harness, &priority, &category).await;
        let mut fresh = harness.engine.assign(fresh).await.unwrap();
        fresh.start(agent.id, &priority).unwrap();
        harness.tickets.update(&fresh).await.unwrap();

        // Already past its deadline: the warning ship has sailed
        let overdue = seed_backlog_ticket(&harness, &priority, &category).await;
        let mut overdue = harness.engine.assign(overdue).await.unwrap();
        overdue.start(agent.id, &priority).unwrap();
        let started = Utc::now() - Duration::hours(30);
        overdue.date_started = Some(started);
        overdue.expected_completion_at = Some(started + Duration::hours(24));
        harness.tickets.update(&overdue).await.unwrap();

        let emitted = harness.scheduler.run_deadline_sweep().await.unwrap();
        assert_eq!(emitted, 0);
    }

    #[tokio::test]
    async fn test_start_spawns_all_jobs() {
        let harness = setup_harness().await;

        let handles = harness.scheduler.clone().start();
        assert_eq!(handles.len(), 4);

        // First ticks fire immediately against an empty database
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        for handle in &handles {
            assert!(!handle.is_finished());
        }
        for handle in handles {
            handle.abort();
        }
    }
}
