//! Storage manager for coordinating database operations

use crate::{repositories::*, Error, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use tracing::info;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
    pub migrate_on_startup: bool,
}

/// Main storage manager coordinating all repositories
pub struct StorageManager {
    pool: Pool<Sqlite>,
    agents: Arc<AgentRepository>,
    tickets: Arc<TicketRepository>,
    priorities: Arc<PriorityRepository>,
    categories: Arc<CategoryRepository>,
}

impl StorageManager {
    /// Create a new storage manager
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database: {}", config.url);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.unwrap_or(5))
            .connect(&config.url)
            .await?;

        info!("Database connection established");

        let agents = Arc::new(AgentRepository::new(pool.clone()));
        let tickets = Arc::new(TicketRepository::new(pool.clone()));
        let priorities = Arc::new(PriorityRepository::new(pool.clone()));
        let categories = Arc::new(CategoryRepository::new(pool.clone()));

        let manager = Self {
            pool,
            agents,
            tickets,
            priorities,
            categories,
        };

        if config.migrate_on_startup {
            manager.migrate().await?;
        }

        Ok(manager)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Migration(e.to_string()))?;

        info!("Database migrations completed");
        Ok(())
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> Pool<Sqlite> {
        self.pool.clone()
    }

    /// Get agent repository
    pub fn agents(&self) -> Arc<AgentRepository> {
        self.agents.clone()
    }

    /// Get ticket repository
    pub fn tickets(&self) -> Arc<TicketRepository> {
        self.tickets.clone()
    }

    /// Get priority repository
    pub fn priorities(&self) -> Arc<PriorityRepository> {
        self.priorities.clone()
    }

    /// Get category repository
    pub fn categories(&self) -> Arc<CategoryRepository> {
        self.categories.clone()
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Get database statistics
    pub async fn stats(&self) -> Result<DatabaseStats> {
        let agents_count = self.agents.count().await?;
        let tickets_count = self.tickets.count().await?;
        let priorities_count = self.priorities.list().await?.len() as i64;
        let categories_count = self.categories.list().await?.len() as i64;

        Ok(DatabaseStats {
            agents_count,
            tickets_count,
            priorities_count,
            categories_count,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub agents_count: i64,
    pub tickets_count: i64,
    pub priorities_count: i64,
    pub categories_count: i64,
}
