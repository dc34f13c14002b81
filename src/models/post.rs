use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{non_blank, User, UserSummary};
use crate::utils::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Like {
    pub user: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: Uuid,
    pub user: Uuid,
    pub text: String,
    /// Author's name at the time of commenting
    pub name: Option<String>,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub likes: Vec<Like>,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn is_liked_by(&self, user_id: Uuid) -> bool {
        self.likes.iter().any(|like| like.user == user_id)
    }

    pub fn ensure_author(&self, user_id: Uuid) -> Result<(), AppError> {
        if self.user_id != user_id {
            return Err(AppError::unauthorized("User not authorized"));
        }
        Ok(())
    }

    pub fn like(&mut self, user_id: Uuid) -> Result<(), AppError> {
        if self.is_liked_by(user_id) {
            return Err(AppError::bad_request("Post already liked"));
        }
        self.likes.insert(0, Like { user: user_id });
        Ok(())
    }

    pub fn unlike(&mut self, user_id: Uuid) -> Result<(), AppError> {
        if !self.is_liked_by(user_id) {
            return Err(AppError::bad_request("Post has not yet been liked"));
        }
        self.likes.retain(|like| like.user != user_id);
        Ok(())
    }

    /// Prepends a comment snapshotting the author's name and picture.
    pub fn add_comment(&mut self, author: &User, text: &Option<String>) -> Result<(), AppError> {
        let text = non_blank(text).ok_or_else(|| AppError::bad_request("Text is required"))?;
        let now = Utc::now();
        self.comments.insert(
            0,
            Comment {
                id: Uuid::new_v4(),
                user: author.id,
                text: text.to_string(),
                name: Some(author.name.clone()),
                profile_picture: author.profile_picture.clone(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(())
    }

    pub fn remove_comment(&mut self, comment_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let comment = self
            .comments
            .iter()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| AppError::not_found("Comment does not exist"))?;

        if comment.user != user_id {
            return Err(AppError::unauthorized("User not authorized"));
        }

        self.comments.retain(|c| c.id != comment_id);
        Ok(())
    }
}

/// Post with its author populated
#[derive(Debug, Clone, Serialize)]
pub struct PostWithAuthor {
    #[serde(flatten)]
    pub post: Post,
    pub user: UserSummary,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePostRequest {
    pub text: Option<String>,
}

impl CreatePostRequest {
    pub fn text(&self) -> Result<&str, AppError> {
        non_blank(&self.text).ok_or_else(|| AppError::bad_request("Text is required"))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentRequest {
    pub text: Option<String>,
}
