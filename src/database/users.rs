use uuid::Uuid;

use super::DatabaseService;
use crate::models::{User, UserSummary};
use crate::utils::error::AppError;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, headline, profile_picture, connections, created_at, updated_at";

impl DatabaseService {
    /// Create a new user
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        headline: Option<&str>,
    ) -> Result<User, AppError> {
        let client = self.get_client().await?;

        let query = format!(
            "INSERT INTO users (id, name, email, password_hash, headline)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            USER_COLUMNS
        );
        let row = client
            .query_one(query.as_str(), &[&Uuid::new_v4(), &name, &email, &password_hash, &headline])
            .await?;

        Ok(Self::row_to_user(&row))
    }

    /// Get user by ID
    pub async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        let client = self.get_client().await?;

        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = client.query_opt(query.as_str(), &[id]).await?;

        Ok(row.map(|r| Self::row_to_user(&r)))
    }

    /// Get user by email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let client = self.get_client().await?;

        let query = format!("SELECT {} FROM users WHERE lower(email) = lower($1)", USER_COLUMNS);
        let row = client.query_opt(query.as_str(), &[&email]).await?;

        Ok(row.map(|r| Self::row_to_user(&r)))
    }

    /// Public summaries for a set of users, ordered by name
    pub async fn get_user_summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let client = self.get_client().await?;
        let rows = client
            .query("
                SELECT id, name AS author_name, headline AS author_headline, profile_picture AS author_picture
                FROM users WHERE id = ANY($1) ORDER BY name
            ", &[&ids])
            .await?;

        Ok(rows.iter().map(|row| Self::row_to_summary(row, "id")).collect())
    }

    /// Helper to convert database row to User
    fn row_to_user(row: &tokio_postgres::Row) -> User {
        User {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            headline: row.get("headline"),
            profile_picture: row.get("profile_picture"),
            connections: row.get("connections"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}
