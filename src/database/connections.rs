use uuid::Uuid;

use super::DatabaseService;
use crate::models::{Connection, ConnectionStatus, PendingRequest};
use crate::utils::error::AppError;

const CONNECTION_COLUMNS: &str = "c.id, c.requester, c.recipient, c.status, c.created_at, c.updated_at";

impl DatabaseService {
    /// Find the connection between two users in either direction
    pub async fn find_connection_between(&self, a: &Uuid, b: &Uuid) -> Result<Option<Connection>, AppError> {
        let client = self.get_client().await?;

        let query = format!(
            "SELECT {} FROM connections c
             WHERE (c.requester = $1 AND c.recipient = $2) OR (c.requester = $2 AND c.recipient = $1)",
            CONNECTION_COLUMNS
        );
        let row = client.query_opt(query.as_str(), &[a, b]).await?;

        row.map(|r| Self::row_to_connection(&r)).transpose()
    }

    /// Create a pending connection request
    pub async fn create_connection(&self, requester: &Uuid, recipient: &Uuid) -> Result<Connection, AppError> {
        let client = self.get_client().await?;

        let query = format!(
            "INSERT INTO connections AS c (id, requester, recipient, status)
             VALUES ($1, $2, $3, 'pending')
             RETURNING {}",
            CONNECTION_COLUMNS
        );
        let row = client
            .query_one(query.as_str(), &[&Uuid::new_v4(), requester, recipient])
            .await?;

        Self::row_to_connection(&row)
    }

    /// Get connection by ID
    pub async fn get_connection(&self, id: &Uuid) -> Result<Option<Connection>, AppError> {
        let client = self.get_client().await?;

        let query = format!("SELECT {} FROM connections c WHERE c.id = $1", CONNECTION_COLUMNS);
        let row = client.query_opt(query.as_str(), &[id]).await?;

        row.map(|r| Self::row_to_connection(&r)).transpose()
    }

    /// Mark a pending connection declined
    pub async fn decline_connection(&self, connection: &Connection) -> Result<(), AppError> {
        let client = self.get_client().await?;

        // Same guard as accept: a request settled in the meantime stays as it is
        let updated = client.execute("
            UPDATE connections SET status = 'declined', updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
        ", &[&connection.id]).await?;

        if updated == 0 {
            return Err(AppError::bad_request("Request is not pending"));
        }

        Ok(())
    }

    /// Mark a connection accepted and link both users, atomically
    pub async fn accept_connection(&self, connection: &Connection) -> Result<(), AppError> {
        let mut client = self.get_client().await?;
        let tx = client.transaction().await?;

        // Guarded on status so two concurrent accepts cannot both succeed
        let updated = tx.execute("
            UPDATE connections SET status = 'accepted', updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
        ", &[&connection.id]).await?;

        if updated == 0 {
            tx.rollback().await?;
            return Err(AppError::bad_request("Request is not pending"));
        }

        let link = "
            UPDATE users SET connections = array_append(connections, $2), updated_at = NOW()
            WHERE id = $1 AND NOT ($2 = ANY(connections))
        ";
        tx.execute(link, &[&connection.requester, &connection.recipient]).await?;
        tx.execute(link, &[&connection.recipient, &connection.requester]).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Unlink two users and delete their accepted connection, atomically
    pub async fn remove_connection(&self, a: &Uuid, b: &Uuid) -> Result<u64, AppError> {
        let mut client = self.get_client().await?;
        let tx = client.transaction().await?;

        let unlink = "
            UPDATE users SET connections = array_remove(connections, $2), updated_at = NOW()
            WHERE id = $1
        ";
        tx.execute(unlink, &[a, b]).await?;
        tx.execute(unlink, &[b, a]).await?;

        let deleted = tx.execute("
            DELETE FROM connections
            WHERE status = 'accepted'
              AND ((requester = $1 AND recipient = $2) OR (requester = $2 AND recipient = $1))
        ", &[a, b]).await?;

        tx.commit().await?;
        Ok(deleted)
    }

    /// Pending requests addressed to a user, with requesters populated
    pub async fn get_pending_requests(&self, recipient: &Uuid) -> Result<Vec<PendingRequest>, AppError> {
        let client = self.get_client().await?;

        let query = format!(
            "SELECT {}, u.name AS author_name, u.headline AS author_headline, u.profile_picture AS author_picture
             FROM connections c JOIN users u ON u.id = c.requester
             WHERE c.recipient = $1 AND c.status = 'pending'
             ORDER BY c.created_at DESC",
            CONNECTION_COLUMNS
        );
        let rows = client.query(query.as_str(), &[recipient]).await?;

        rows.iter()
            .map(|row| {
                Ok(PendingRequest {
                    connection: Self::row_to_connection(row)?,
                    requester_user: Self::row_to_summary(row, "requester"),
                })
            })
            .collect()
    }

    fn row_to_connection(row: &tokio_postgres::Row) -> Result<Connection, AppError> {
        let status: &str = row.get("status");
        let status = ConnectionStatus::parse(status).ok_or_else(|| {
            AppError::internal_server_error(&format!("Unknown connection status '{}'", status))
        })?;

        Ok(Connection {
            id: row.get("id"),
            requester: row.get("requester"),
            recipient: row.get("recipient"),
            status,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}
