//! Ticket repository implementation

use super::{parse_datetime, parse_opt_datetime, parse_opt_uuid, parse_uuid};
use crate::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite, SqliteConnection};
use tracing::{debug, info};
use triage_core::ticket::{Ticket, TicketStatus};
use uuid::Uuid;

const TICKET_COLUMNS: &str = "id, title, description, owner_id, assigned_agent_id, priority_id, \
                              category_id, status, points, date_started, expected_completion_at, \
                              completion_date, created_at, updated_at";

/// Repository for ticket entities
pub struct TicketRepository {
    pool: Pool<Sqlite>,
}

impl TicketRepository {
    /// Create a new ticket repository
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Create a new ticket
    pub async fn create(&self, ticket: &Ticket) -> Result<()> {
        debug!("Creating ticket {} ({})", ticket.title, ticket.id);

        sqlx::query(
            r#"
            INSERT INTO tickets (id, title, description, owner_id, assigned_agent_id, priority_id,
                                 category_id, status, points, date_started, expected_completion_at,
                                 completion_date, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(ticket.id.to_string())
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(ticket.owner_id.to_string())
        .bind(ticket.assigned_agent_id.map(|id| id.to_string()))
        .bind(ticket.priority_id.to_string())
        .bind(ticket.category_id.to_string())
        .bind(ticket.status.as_str())
        .bind(ticket.points)
        .bind(ticket.date_started.map(|dt| dt.to_rfc3339()))
        .bind(ticket.expected_completion_at.map(|dt| dt.to_rfc3339()))
        .bind(ticket.completion_date.map(|dt| dt.to_rfc3339()))
        .bind(ticket.created_at.to_rfc3339())
        .bind(ticket.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        info!("Created ticket {} ({})", ticket.title, ticket.id);
        Ok(())
    }

    /// Find a ticket by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>> {
        let mut conn = self.pool.acquire().await?;
        self.find_by_id_tx(&mut conn, id).await
    }

    /// Find a ticket by ID on a caller-supplied connection
    pub async fn find_by_id_tx(
        &self,
        conn: &mut SqliteConnection,
        id: Uuid,
    ) -> Result<Option<Ticket>> {
        debug!("Finding ticket by id {}", id);

        let row = sqlx::query(&format!(
            "SELECT {} FROM tickets WHERE id = ?1",
            TICKET_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

        row.map(|r| map_ticket_row(&r)).transpose()
    }

    /// Update a ticket
    pub async fn update(&self, ticket: &Ticket) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        self.update_tx(&mut conn, ticket).await
    }

    /// Update a ticket on a caller-supplied connection
    pub async fn update_tx(&self, conn: &mut SqliteConnection, ticket: &Ticket) -> Result<()> {
        debug!("Updating ticket {}", ticket.id);

        let rows_affected = sqlx::query(
            r#"
            UPDATE tickets
            SET title = ?2, description = ?3, assigned_agent_id = ?4, priority_id = ?5,
                category_id = ?6, status = ?7, points = ?8, date_started = ?9,
                expected_completion_at = ?10, completion_date = ?11, updated_at = ?12
            WHERE id = ?1
            "#,
        )
        .bind(ticket.id.to_string())
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(ticket.assigned_agent_id.map(|id| id.to_string()))
        .bind(ticket.priority_id.to_string())
        .bind(ticket.category_id.to_string())
        .bind(ticket.status.as_str())
        .bind(ticket.points)
        .bind(ticket.date_started.map(|dt| dt.to_rfc3339()))
        .bind(ticket.expected_completion_at.map(|dt| dt.to_rfc3339()))
        .bind(ticket.completion_date.map(|dt| dt.to_rfc3339()))
        .bind(ticket.updated_at.to_rfc3339())
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(Error::not_found("Ticket", ticket.id));
        }
        Ok(())
    }

    /// List all tickets
    pub async fn list(&self) -> Result<Vec<Ticket>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tickets ORDER BY created_at DESC",
            TICKET_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_ticket_row).collect()
    }

    /// Find tickets by status
    pub async fn find_by_status(&self, status: TicketStatus) -> Result<Vec<Ticket>> {
        debug!("Finding tickets with status {}", status.as_str());

        let rows = sqlx::query(&format!(
            "SELECT {} FROM tickets WHERE status = ?1 ORDER BY created_at",
            TICKET_COLUMNS
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_ticket_row).collect()
    }

    /// Find the non-completed tickets bound to an agent
    pub async fn find_by_assigned_agent(&self, agent_id: Uuid) -> Result<Vec<Ticket>> {
        debug!("Finding open tickets assigned to agent {}", agent_id);

        let rows = sqlx::query(&format!(
            "SELECT {} FROM tickets WHERE assigned_agent_id = ?1 AND status != ?2 \
             ORDER BY created_at",
            TICKET_COLUMNS
        ))
        .bind(agent_id.to_string())
        .bind(TicketStatus::Completed.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_ticket_row).collect()
    }

    /// Find every non-completed ticket that still carries an agent binding
    pub async fn find_assigned_open(&self) -> Result<Vec<Ticket>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tickets WHERE assigned_agent_id IS NOT NULL AND status != ?1 \
             ORDER BY created_at",
            TICKET_COLUMNS
        ))
        .bind(TicketStatus::Completed.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_ticket_row).collect()
    }

    /// Count all tickets
    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM tickets")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("count")?)
    }

    /// Count tickets by status
    pub async fn count_by_status(&self, status: TicketStatus) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM tickets WHERE status = ?1")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("count")?)
    }
}

fn map_ticket_row(row: &SqliteRow) -> Result<Ticket> {
    let id: String = row.try_get("id")?;
    let owner_id: String = row.try_get("owner_id")?;
    let assigned_agent_id: Option<String> = row.try_get("assigned_agent_id")?;
    let priority_id: String = row.try_get("priority_id")?;
    let category_id: String = row.try_get("category_id")?;
    let status: String = row.try_get("status")?;
    let date_started: Option<String> = row.try_get("date_started")?;
    let expected_completion_at: Option<String> = row.try_get("expected_completion_at")?;
    let completion_date: Option<String> = row.try_get("completion_date")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Ticket {
        id: parse_uuid(&id, "id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        owner_id: parse_uuid(&owner_id, "owner_id")?,
        assigned_agent_id: parse_opt_uuid(assigned_agent_id.as_deref(), "assigned_agent_id")?,
        priority_id: parse_uuid(&priority_id, "priority_id")?,
        category_id: parse_uuid(&category_id, "category_id")?,
        status: TicketStatus::parse(&status)?,
        points: row.try_get("points")?,
        date_started: parse_opt_datetime(date_started.as_deref(), "date_started")?,
        expected_completion_at: parse_opt_datetime(
            expected_completion_at.as_deref(),
            "expected_completion_at",
        )?,
        completion_date: parse_opt_datetime(completion_date.as_deref(), "completion_date")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}
