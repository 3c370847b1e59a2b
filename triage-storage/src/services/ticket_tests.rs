/// Tests for the ticket lifecycle service
#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::repositories::{
        AgentRepository, CategoryRepository, PriorityRepository, TicketRepository,
    };
    use crate::services::assignment::AssignmentEngine;
    use crate::services::event::{EngineEvent, EventBus};
    use crate::Error;
    use chrono::{Duration, Utc};
    use sqlx::SqlitePool;
    use std::sync::Arc;
    use tempfile::NamedTempFile;
    use triage_core::agent::{Agent, AgentLevel};
    use triage_core::category::Category;
    use triage_core::priority::Priority;
    use triage_core::ticket::TicketStatus;
    use uuid::Uuid;

    struct Harness {
        agents: Arc<AgentRepository>,
        tickets: Arc<TicketRepository>,
        priorities: Arc<PriorityRepository>,
        categories: Arc<CategoryRepository>,
        service: TicketService,
        events: EventBus,
        _temp: NamedTempFile,
    }

    async fn setup_harness() -> Harness {
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
            pool.clone(),
            agents.clone(),
            tickets.clone(),
            priorities.clone(),
            events.clone(),
        ));
        let service = TicketService::new(
            pool,
            tickets.clone(),
            agents.clone(),
            priorities.clone(),
            categories.clone(),
            engine,
            events.clone(),
        );

        Harness {
            agents,
            tickets,
            priorities,
            categories,
            service,
            events,
            _temp: temp_file,
        }
    }

    async fn seed_config(harness: &Harness) -> (Priority, Category) {
        // Weight 30 with a 24h limit, category multiplier 3: base 90 points
        let priority = Priority::new("urgent", 30, 24).unwrap();
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

    #[tokio::test]
    async fn test_create_ticket_routes_through_assignment() {
        let harness = setup_harness().await;
        let (priority, category) = seed_config(&harness).await;
        let agent = seed_agent(&harness, AgentLevel::Senior).await;

        let ticket = harness
            .service
            .create_ticket(
                Uuid::new_v4(),
                "Invoice is wrong",
                "Customer was billed twice",
                priority.id,
                category.id,
            )
            .await
            .unwrap();

        assert_eq!(ticket.status, TicketStatus::Assigned);
        assert_eq!(ticket.assigned_agent_id, Some(agent.id));

        let charged = harness.agents.find_by_id(agent.id).await.unwrap().unwrap();
        assert_eq!(charged.current_workload, 30);

        let stored = harness.service.get_ticket(ticket.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TicketStatus::Assigned);
    }

    #[tokio::test]
    async fn test_create_ticket_without_agents_enters_backlog() {
        let harness = setup_harness().await;
        let (priority, category) = seed_config(&harness).await;

        let ticket = harness
            .service
            .create_ticket(
                Uuid::new_v4(),
                "Invoice is wrong",
                "Customer was billed twice",
                priority.id,
                category.id,
            )
            .await
            .unwrap();

        assert_eq!(ticket.status, TicketStatus::NoAgentAvailable);
        assert!(ticket.assigned_agent_id.is_none());
    }

    #[tokio::test]
    async fn test_create_ticket_rejects_inactive_category() {
        let harness = setup_harness().await;
        let (priority, mut category) = seed_config(&harness).await;

        category.deactivate();
        harness.categories.update(&category).await.unwrap();

        let result = harness
            .service
            .create_ticket(
                Uuid::new_v4(),
                "Invoice is wrong",
                "Customer was billed twice",
                priority.id,
                category.id,
            )
            .await;
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_ticket_with_unknown_config_is_not_found() {
        let harness = setup_harness().await;
        let (priority, category) = seed_config(&harness).await;

        let result = harness
            .service
            .create_ticket(
                Uuid::new_v4(),
                "Invoice is wrong",
                "Customer was billed twice",
                Uuid::new_v4(),
                category.id,
            )
            .await;
        assert!(matches!(result, Err(ref e) if e.is_not_found()));

        let result = harness
            .service
            .create_ticket(
                Uuid::new_v4(),
                "Invoice is wrong",
                "Customer was billed twice",
                priority.id,
                Uuid::new_v4(),
            )
            .await;
        assert!(matches!(result, Err(ref e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn test_full_lifecycle_round_trip() {
        let harness = setup_harness().await;
        let (priority, category) = seed_config(&harness).await;
        let agent = seed_agent(&harness, AgentLevel::Senior).await;

        let ticket = harness
            .service
            .create_ticket(
                Uuid::new_v4(),
                "Invoice is wrong",
                "Customer was billed twice",
                priority.id,
                category.id,
            )
            .await
            .unwrap();
        assert_eq!(ticket.status, TicketStatus::Assigned);

        let ticket = harness
            .service
            .start_ticket(ticket.id, agent.id)
            .await
            .unwrap();
        assert_eq!(ticket.status, TicketStatus::Ongoing);
        assert!(ticket.date_started.is_some());
        assert!(ticket.expected_completion_at.is_some());

        let ticket = harness
            .service
            .complete_ticket(ticket.id, agent.id)
            .await
            .unwrap();
        assert_eq!(ticket.status, TicketStatus::Completed);
        assert!(ticket.completion_date.is_some());

        // Completed within the 0.5h floor of a 24h window: full +50% bonus
        // on base 90
        assert_eq!(ticket.points, Some(135));

        let agent = harness.agents.find_by_id(agent.id).await.unwrap().unwrap();
        assert_eq!(agent.current_workload, 0);
        assert_eq!(agent.completed_tickets, 1);
        assert_eq!(agent.total_performance_points, 135);
    }

    #[tokio::test]
    async fn test_start_rejects_mismatched_agent() {
        let harness = setup_harness().await;
        let (priority, category) = seed_config(&harness).await;
        seed_agent(&harness, AgentLevel::Senior).await;

        let ticket = harness
            .service
            .create_ticket(
                Uuid::new_v4(),
                "Invoice is wrong",
                "Customer was billed twice",
                priority.id,
                category.id,
            )
            .await
            .unwrap();
        assert_eq!(ticket.status, TicketStatus::Assigned);

        let result = harness.service.start_ticket(ticket.id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(ref e) if e.is_invalid_transition()));

        let stored = harness.service.get_ticket(ticket.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TicketStatus::Assigned);
        assert!(stored.date_started.is_none());
    }

    #[tokio::test]
    async fn test_start_requires_assigned_status() {
        let harness = setup_harness().await;
        let (priority, category) = seed_config(&harness).await;

        // No agents: the ticket stays in the backlog and cannot be started
        let ticket = harness
            .service
            .create_ticket(
                Uuid::new_v4(),
                "Invoice is wrong",
                "Customer was billed twice",
                priority.id,
                category.id,
            )
            .await
            .unwrap();

        let result = harness.service.start_ticket(ticket.id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(ref e) if e.is_invalid_transition()));
    }

    #[tokio::test]
    async fn test_complete_requires_ongoing_status() {
        let harness = setup_harness().await;
        let (priority, category) = seed_config(&harness).await;
        let agent = seed_agent(&harness, AgentLevel::Senior).await;

        let ticket = harness
            .service
            .create_ticket(
                Uuid::new_v4(),
                "Invoice is wrong",
                "Customer was billed twice",
                priority.id,
                category.id,
            )
            .await
            .unwrap();

        // Assigned but never started
        let result = harness.service.complete_ticket(ticket.id, agent.id).await;
        assert!(matches!(result, Err(ref e) if e.is_invalid_transition()));
    }

    #[tokio::test]
    async fn test_unknown_ticket_is_not_found() {
        let harness = setup_harness().await;
        seed_config(&harness).await;

        let result = harness
            .service
            .start_ticket(Uuid::new_v4(), Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(ref e) if e.is_not_found()));

        let result = harness
            .service
            .complete_ticket(Uuid::new_v4(), Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(ref e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn test_half_time_completion_scores_full_bonus() {
        let harness = setup_harness().await;
        let (priority, category) = seed_config(&harness).await;
        let agent = seed_agent(&harness, AgentLevel::Senior).await;

        let ticket = harness
            .service
            .create_ticket(
                Uuid::new_v4(),
                "Invoice is wrong",
                "Customer was billed twice",
                priority.id,
                category.id,
            )
            .await
            .unwrap();
        let ticket = harness
            .service
            .start_ticket(ticket.id, agent.id)
            .await
            .unwrap();

        // Rewind the window so completion lands at half the expected time
        let mut shifted = ticket;
        let started = Utc::now() - Duration::hours(12);
        shifted.date_started = Some(started);
        shifted.expected_completion_at = Some(started + Duration::hours(24));
        harness.tickets.update(&shifted).await.unwrap();

        let completed = harness
            .service
            .complete_ticket(shifted.id, agent.id)
            .await
            .unwrap();
        assert_eq!(completed.points, Some(135));
    }

    #[tokio::test]
    async fn test_late_completion_is_penalized() {
        let harness = setup_harness().await;
        let (priority, category) = seed_config(&harness).await;
        let agent = seed_agent(&harness, AgentLevel::Senior).await;

        let ticket = harness
            .service
            .create_ticket(
                Uuid::new_v4(),
                "Invoice is wrong",
                "Customer was billed twice",
                priority.id,
                category.id,
            )
            .await
            .unwrap();
        let ticket = harness
            .service
            .start_ticket(ticket.id, agent.id)
            .await
            .unwrap();

        // Six hours past a 24h window: efficiency 0.95, round(85.5) = 86
        let mut shifted = ticket;
        let started = Utc::now() - Duration::hours(30);
        shifted.date_started = Some(started);
        shifted.expected_completion_at = Some(started + Duration::hours(24));
        harness.tickets.update(&shifted).await.unwrap();

        let completed = harness
            .service
            .complete_ticket(shifted.id, agent.id)
            .await
            .unwrap();
        assert_eq!(completed.points, Some(86));
    }

    #[tokio::test]
    async fn test_completion_emits_event() {
        let harness = setup_harness().await;
        let (priority, category) = seed_config(&harness).await;
        let agent = seed_agent(&harness, AgentLevel::Senior).await;

        let mut rx = harness.events.subscribe();

        let ticket = harness
            .service
            .create_ticket(
                Uuid::new_v4(),
                "Invoice is wrong",
                "Customer was billed twice",
                priority.id,
                category.id,
            )
            .await
            .unwrap();
        let ticket = harness
            .service
            .start_ticket(ticket.id, agent.id)
            .await
            .unwrap();
        let ticket = harness
            .service
            .complete_ticket(ticket.id, agent.id)
            .await
            .unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            EngineEvent::TicketAssigned {
                ticket_id: ticket.id,
                agent_id: agent.id,
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            EngineEvent::TicketCompleted {
                ticket_id: ticket.id,
                points: 135,
            }
        );
    }

    #[tokio::test]
    async fn test_statistics() {
        let harness = setup_harness().await;
        let (priority, category) = seed_config(&harness).await;
        let agent = seed_agent(&harness, AgentLevel::Senior).await;

        let assigned = harness
            .service
            .create_ticket(
                Uuid::new_v4(),
                "First ticket",
                "Assigned and completed",
                priority.id,
                category.id,
            )
            .await
            .unwrap();
        harness
            .service
            .start_ticket(assigned.id, agent.id)
            .await
            .unwrap();
        harness
            .service
            .complete_ticket(assigned.id, agent.id)
            .await
            .unwrap();

        harness
            .service
            .create_ticket(
                Uuid::new_v4(),
                "Second ticket",
                "Stays assigned",
                priority.id,
                category.id,
            )
            .await
            .unwrap();

        let stats = harness.service.statistics().await.unwrap();
        assert_eq!(stats.total_tickets, 2);
        assert_eq!(stats.completed_tickets, 1);
        assert_eq!(stats.assigned_tickets, 1);
        assert_eq!(stats.backlog_tickets, 0);
        assert_eq!(stats.ongoing_tickets, 0);
    }
}
