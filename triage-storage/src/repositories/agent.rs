//! Agent repository implementation

use super::{parse_datetime, parse_uuid};
use crate::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite, SqliteConnection};
use tracing::{debug, info};
use triage_core::agent::{Agent, AgentLevel};
use uuid::Uuid;

/// Repository for agent entities
pub struct AgentRepository {
    pool: Pool<Sqlite>,
}

impl AgentRepository {
    /// Create a new agent repository
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Create a new agent
    pub async fn create(&self, agent: &Agent) -> Result<()> {
        debug!("Creating agent {} for user {}", agent.id, agent.user_id);

        sqlx::query(
            r#"
            INSERT INTO agents (id, user_id, level, bonus_capacity, current_workload, is_active,
                                completed_tickets, total_performance_points, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(agent.id.to_string())
        .bind(agent.user_id.to_string())
        .bind(agent.level.as_str())
        .bind(agent.bonus_capacity)
        .bind(agent.current_workload)
        .bind(agent.is_active)
        .bind(agent.completed_tickets)
        .bind(agent.total_performance_points)
        .bind(agent.created_at.to_rfc3339())
        .bind(agent.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        info!("Created agent {} (level {})", agent.id, agent.level.as_str());
        Ok(())
    }

    /// Find an agent by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Agent>> {
        let mut conn = self.pool.acquire().await?;
        self.find_by_id_tx(&mut conn, id).await
    }

    /// Find an agent by ID on a caller-supplied connection
    pub async fn find_by_id_tx(
        &self,
        conn: &mut SqliteConnection,
        id: Uuid,
    ) -> Result<Option<Agent>> {
        debug!("Finding agent by id {}", id);

        let row = sqlx::query(
            "SELECT id, user_id, level, bonus_capacity, current_workload, is_active, \
             completed_tickets, total_performance_points, created_at, updated_at \
             FROM agents WHERE id = ?1",
        )
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

        row.map(|r| map_agent_row(&r)).transpose()
    }

    /// Find an agent by the user it belongs to
    pub async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Agent>> {
        let row = sqlx::query(
            "SELECT id, user_id, level, bonus_capacity, current_workload, is_active, \
             completed_tickets, total_performance_points, created_at, updated_at \
             FROM agents WHERE user_id = ?1",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_agent_row(&r)).transpose()
    }

    /// Update an agent
    pub async fn update(&self, agent: &Agent) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        self.update_tx(&mut conn, agent).await
    }

    /// Update an agent on a caller-supplied connection
    pub async fn update_tx(&self, conn: &mut SqliteConnection, agent: &Agent) -> Result<()> {
        debug!("Updating agent {}", agent.id);

        let rows_affected = sqlx::query(
            r#"
            UPDATE agents
            SET level = ?2, bonus_capacity = ?3, current_workload = ?4, is_active = ?5,
                completed_tickets = ?6, total_performance_points = ?7, updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(agent.id.to_string())
        .bind(agent.level.as_str())
        .bind(agent.bonus_capacity)
        .bind(agent.current_workload)
        .bind(agent.is_active)
        .bind(agent.completed_tickets)
        .bind(agent.total_performance_points)
        .bind(agent.updated_at.to_rfc3339())
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(Error::not_found("Agent", agent.id));
        }
        Ok(())
    }

    /// List all agents
    pub async fn list(&self) -> Result<Vec<Agent>> {
        let rows = sqlx::query(
            "SELECT id, user_id, level, bonus_capacity, current_workload, is_active, \
             completed_tickets, total_performance_points, created_at, updated_at \
             FROM agents ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_agent_row).collect()
    }

    /// List active agents (candidates for assignment)
    pub async fn list_active(&self) -> Result<Vec<Agent>> {
        let rows = sqlx::query(
            "SELECT id, user_id, level, bonus_capacity, current_workload, is_active, \
             completed_tickets, total_performance_points, created_at, updated_at \
             FROM agents WHERE is_active = 1 ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_agent_row).collect()
    }

    /// List deactivated agents (sweep targets for reclamation)
    pub async fn list_inactive(&self) -> Result<Vec<Agent>> {
        let rows = sqlx::query(
            "SELECT id, user_id, level, bonus_capacity, current_workload, is_active, \
             completed_tickets, total_performance_points, created_at, updated_at \
             FROM agents WHERE is_active = 0 ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_agent_row).collect()
    }

    /// Count agents
    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM agents")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("count")?)
    }
}

fn map_agent_row(row: &SqliteRow) -> Result<Agent> {
    let id: String = row.try_get("id")?;
    let user_id: String = row.try_get("user_id")?;
    let level: String = row.try_get("level")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Agent {
        id: parse_uuid(&id, "id")?,
        user_id: parse_uuid(&user_id, "user_id")?,
        level: AgentLevel::parse(&level)?,
        bonus_capacity: row.try_get("bonus_capacity")?,
        current_workload: row.try_get("current_workload")?,
        is_active: row.try_get("is_active")?,
        completed_tickets: row.try_get("completed_tickets")?,
        total_performance_points: row.try_get("total_performance_points")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}
