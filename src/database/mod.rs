use chrono::{DateTime, Utc};
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::models::UserSummary;
use crate::utils::error::AppError;

mod connections;
mod jobs;
mod posts;
mod profiles;
mod users;

/// Schema applied at startup and by the `migrate` binary.
pub const INITIAL_SCHEMA: &str = include_str!("../../migrations/V1__initial_schema.sql");

/// Database connection pool
pub type DbPool = Pool;

/// Database service
pub struct DatabaseService {
    pool: DbPool,
}

impl DatabaseService {
    /// Create a new database service and verify the connection
    pub async fn new(config: &DatabaseConfig) -> Result<Self, AppError> {
        let service = Self::connect_lazy(config)?;

        // Test connection
        let client = service.get_client().await?;
        client.execute("SELECT 1", &[]).await?;

        log::info!("Database connection established");

        Ok(service)
    }

    /// Build the pool without opening a connection; connections are made on first use.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, AppError> {
        let mut cfg = Config::new();
        cfg.url = Some(config.url.clone());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(PoolConfig::new(config.max_connections.max(1)));

        let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;
        Ok(Self { pool })
    }

    /// Get a database client from the pool
    pub async fn get_client(&self) -> Result<deadpool_postgres::Client, AppError> {
        Ok(self.pool.get().await?)
    }

    /// Initialize database schema
    pub async fn init_schema(&self) -> Result<(), AppError> {
        let client = self.get_client().await?;
        client.batch_execute(INITIAL_SCHEMA).await?;

        log::info!("Database schema initialized");
        Ok(())
    }

    /// Revoke a token by JTI until its natural expiry
    pub async fn revoke_token(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), AppError> {
        let client = self.get_client().await?;

        client.execute("
            INSERT INTO revoked_tokens (jti, expires_at) VALUES ($1, $2)
            ON CONFLICT (jti) DO UPDATE SET revoked_at = NOW(), expires_at = EXCLUDED.expires_at
        ", &[&jti, &expires_at]).await?;

        Ok(())
    }

    /// Check if a token JTI is revoked
    pub async fn is_token_revoked(&self, jti: &str) -> Result<bool, AppError> {
        let client = self.get_client().await?;

        let row = client
            .query_opt("SELECT jti FROM revoked_tokens WHERE jti = $1 LIMIT 1", &[&jti])
            .await?;
        Ok(row.is_some())
    }

    /// Drop revocation entries whose tokens have expired anyway
    pub async fn cleanup_revoked_tokens(&self) -> Result<u64, AppError> {
        let client = self.get_client().await?;

        let removed = client
            .execute("DELETE FROM revoked_tokens WHERE expires_at < NOW()", &[])
            .await?;
        log::debug!("cleanup_revoked_tokens removed {} rows", removed);
        Ok(removed)
    }

    /// Insert an error log record
    pub async fn insert_error_log(
        &self,
        severity: &str,
        category: &str,
        message: &str,
        details: Option<serde_json::Value>,
        request_id: Option<&str>,
        user_id: Option<Uuid>,
    ) -> Result<Uuid, AppError> {
        let client = self.get_client().await?;

        let id = Uuid::new_v4();
        client.execute("
            INSERT INTO error_logs (id, severity, category, message, details, request_id, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
        ", &[
            &id,
            &severity,
            &category,
            &message,
            &details,
            &request_id,
            &user_id,
        ]).await?;

        Ok(id)
    }

    /// Helper to read a joined user as `author_*` columns
    fn row_to_summary(row: &tokio_postgres::Row, id_column: &str) -> UserSummary {
        UserSummary {
            id: row.get(id_column),
            name: row.get("author_name"),
            headline: row.get("author_headline"),
            profile_picture: row.get("author_picture"),
        }
    }
}
