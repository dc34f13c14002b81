use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::UserSummary;
use crate::utils::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
    Declined,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Pending => "pending",
            ConnectionStatus::Accepted => "accepted",
            ConnectionStatus::Declined => "declined",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ConnectionStatus::Pending),
            "accepted" => Some(ConnectionStatus::Accepted),
            "declined" => Some(ConnectionStatus::Declined),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection request between two users
#[derive(Debug, Clone, Serialize)]
pub struct Connection {
    pub id: Uuid,
    pub requester: Uuid,
    pub recipient: Uuid,
    pub status: ConnectionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Connection {
    pub fn validate_pair(requester: Uuid, recipient: Uuid) -> Result<(), AppError> {
        if requester == recipient {
            return Err(AppError::bad_request("You cannot connect with yourself"));
        }
        Ok(())
    }

    /// Error returned when a pair already has a connection document.
    pub fn duplicate_error(&self) -> AppError {
        AppError::bad_request(&format!("Connection request already {}", self.status))
    }

    pub fn accept(&mut self, by: Uuid) -> Result<(), AppError> {
        if self.recipient != by {
            return Err(AppError::unauthorized("Not authorized to perform this action"));
        }
        self.ensure_pending()?;
        self.status = ConnectionStatus::Accepted;
        Ok(())
    }

    pub fn decline(&mut self, by: Uuid) -> Result<(), AppError> {
        if self.recipient != by {
            return Err(AppError::unauthorized("Not authorized or request not found"));
        }
        self.ensure_pending()?;
        self.status = ConnectionStatus::Declined;
        Ok(())
    }

    fn ensure_pending(&self) -> Result<(), AppError> {
        if self.status != ConnectionStatus::Pending {
            return Err(AppError::bad_request("Request is not pending"));
        }
        Ok(())
    }
}

/// Pending request with the requester populated
#[derive(Debug, Clone, Serialize)]
pub struct PendingRequest {
    #[serde(flatten)]
    pub connection: Connection,
    pub requester_user: UserSummary,
}
