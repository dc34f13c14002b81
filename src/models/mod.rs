use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub mod connection;
pub mod job;
pub mod post;
pub mod profile;
pub mod user;

pub use connection::{Connection, ConnectionStatus, PendingRequest};
pub use job::{Applicant, ApplyRequest, CreateJobRequest, Job, JobType, JobWithPoster, NewJob, UpdateJobRequest};
pub use post::{Comment, CommentRequest, CreatePostRequest, Like, Post, PostWithAuthor};
pub use profile::{
    Education, EducationRequest, Experience, ExperienceRequest, Profile, ProfileFields,
    ProfileRequest, ProfileWithUser, Social,
};
pub use user::{AuthResponse, LoginRequest, RegisterRequest, User, UserResponse, UserSummary};

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> ApiResponse<T> {
        ApiResponse {
            success: true,
            data: Some(data),
            message: None,
            timestamp: Utc::now(),
            request_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_message(data: T, message: &str) -> ApiResponse<T> {
        ApiResponse {
            message: Some(message.to_string()),
            ..ApiResponse::success(data)
        }
    }
}

/// Empty payload for responses that only carry a message
#[derive(Debug, Serialize, Default)]
pub struct Empty {}

/// Returns the trimmed value when present and non-blank.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_blank_filters_whitespace() {
        assert_eq!(non_blank(&Some("  ".to_string())), None);
        assert_eq!(non_blank(&None), None);
        assert_eq!(non_blank(&Some(" hi ".to_string())), Some("hi"));
    }

    #[test]
    fn with_message_keeps_data() {
        let response = ApiResponse::with_message(3, "done");
        assert!(response.success);
        assert_eq!(response.data, Some(3));
        assert_eq!(response.message.as_deref(), Some("done"));
    }
}
