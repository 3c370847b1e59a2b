//! Priority repository implementation

use super::{parse_datetime, parse_uuid};
use crate::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use tracing::debug;
use triage_core::priority::Priority;
use uuid::Uuid;

/// Repository for priority configuration
pub struct PriorityRepository {
    pool: Pool<Sqlite>,
}

impl PriorityRepository {
    /// Create a new priority repository
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Create a new priority
    pub async fn create(&self, priority: &Priority) -> Result<()> {
        debug!("Creating priority {} ({})", priority.name, priority.id);

        sqlx::query(
            "INSERT INTO priorities (id, name, weight, time_limit_hours, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(priority.id.to_string())
        .bind(&priority.name)
        .bind(priority.weight)
        .bind(priority.time_limit_hours)
        .bind(priority.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Find a priority by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Priority>> {
        let row = sqlx::query(
            "SELECT id, name, weight, time_limit_hours, created_at FROM priorities WHERE id = ?1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_priority_row(&r)).transpose()
    }

    /// Find a priority by name
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Priority>> {
        let row = sqlx::query(
            "SELECT id, name, weight, time_limit_hours, created_at FROM priorities WHERE name = ?1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_priority_row(&r)).transpose()
    }

    /// List all priorities
    pub async fn list(&self) -> Result<Vec<Priority>> {
        let rows = sqlx::query(
            "SELECT id, name, weight, time_limit_hours, created_at FROM priorities ORDER BY weight",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_priority_row).collect()
    }
}

fn map_priority_row(row: &SqliteRow) -> Result<Priority> {
    let id: String = row.try_get("id")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(Priority {
        id: parse_uuid(&id, "id")?,
        name: row.try_get("name")?,
        weight: row.try_get("weight")?,
        time_limit_hours: row.try_get("time_limit_hours")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}
