use std::sync::Arc;
use uuid::Uuid;

use crate::database::DatabaseService;
use crate::models::{ApiResponse, Connection, Empty, PendingRequest, User, UserSummary};
use crate::utils::error::AppError;

/// Connection workflow: request, accept or decline, remove
pub struct ConnectionService {
    pub db: Arc<DatabaseService>,
}

impl ConnectionService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn send_request(&self, requester: Uuid, recipient: Uuid) -> Result<ApiResponse<Connection>, AppError> {
        Connection::validate_pair(requester, recipient)?;

        if self.db.get_user_by_id(&recipient).await?.is_none() {
            return Err(AppError::not_found("User not found"));
        }

        // A pair has at most one connection document, whatever its status
        if let Some(existing) = self.db.find_connection_between(&requester, &recipient).await? {
            return Err(existing.duplicate_error());
        }

        let connection = self.db.create_connection(&requester, &recipient).await?;
        log::debug!("Connection request {} from {} to {}", connection.id, requester, recipient);

        Ok(ApiResponse::with_message(connection, "Connection request sent"))
    }

    pub async fn accept_request(&self, user_id: Uuid, request_id: Uuid) -> Result<ApiResponse<Connection>, AppError> {
        let mut connection = self
            .db
            .get_connection(&request_id)
            .await?
            .ok_or_else(|| AppError::not_found("Connection request not found"))?;

        connection.accept(user_id)?;
        self.db.accept_connection(&connection).await?;

        Ok(ApiResponse::with_message(connection, "Connection request accepted"))
    }

    pub async fn decline_request(&self, user_id: Uuid, request_id: Uuid) -> Result<ApiResponse<Empty>, AppError> {
        let mut connection = self
            .db
            .get_connection(&request_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Not authorized or request not found"))?;

        connection.decline(user_id)?;
        self.db.decline_connection(&connection).await?;

        Ok(ApiResponse::with_message(Empty::default(), "Connection request declined"))
    }

    pub async fn remove_connection(&self, user_id: Uuid, other: Uuid) -> Result<ApiResponse<Empty>, AppError> {
        let removed = self.db.remove_connection(&user_id, &other).await?;
        log::debug!("Removed {} connection(s) between {} and {}", removed, user_id, other);

        Ok(ApiResponse::with_message(Empty::default(), "Connection removed"))
    }

    pub async fn pending_requests(&self, user_id: Uuid) -> Result<ApiResponse<Vec<PendingRequest>>, AppError> {
        let requests = self.db.get_pending_requests(&user_id).await?;
        Ok(ApiResponse::success(requests))
    }

    pub async fn list_connections(&self, user: &User) -> Result<ApiResponse<Vec<UserSummary>>, AppError> {
        let connections = self.db.get_user_summaries(&user.connections).await?;
        Ok(ApiResponse::success(connections))
    }
}
