//! Category repository implementation

use super::{parse_datetime, parse_uuid};
use crate::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use tracing::debug;
use triage_core::category::Category;
use uuid::Uuid;

/// Repository for category configuration
pub struct CategoryRepository {
    pool: Pool<Sqlite>,
}

impl CategoryRepository {
    /// Create a new category repository
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Create a new category
    pub async fn create(&self, category: &Category) -> Result<()> {
        debug!("Creating category {} ({})", category.name, category.id);

        sqlx::query(
            "INSERT INTO categories (id, name, description, points, is_active, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(category.id.to_string())
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.points)
        .bind(category.is_active)
        .bind(category.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Find a category by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>> {
        let row = sqlx::query(
            "SELECT id, name, description, points, is_active, created_at \
             FROM categories WHERE id = ?1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_category_row(&r)).transpose()
    }

    /// Update a category (activation toggles and description edits)
    pub async fn update(&self, category: &Category) -> Result<()> {
        let rows_affected = sqlx::query(
            "UPDATE categories SET name = ?2, description = ?3, points = ?4, is_active = ?5 \
             WHERE id = ?1",
        )
        .bind(category.id.to_string())
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.points)
        .bind(category.is_active)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(Error::not_found("Category", category.id));
        }
        Ok(())
    }

    /// List all categories
    pub async fn list(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            "SELECT id, name, description, points, is_active, created_at \
             FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_category_row).collect()
    }
}

fn map_category_row(row: &SqliteRow) -> Result<Category> {
    let id: String = row.try_get("id")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(Category {
        id: parse_uuid(&id, "id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        points: row.try_get("points")?,
        is_active: row.try_get("is_active")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}
