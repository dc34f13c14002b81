use std::sync::Arc;
use uuid::Uuid;

use crate::database::DatabaseService;
use crate::models::{
    ApiResponse, Comment, CommentRequest, CreatePostRequest, Empty, Like, Post, PostWithAuthor, User,
};
use crate::utils::error::AppError;

pub struct PostService {
    pub db: Arc<DatabaseService>,
}

impl PostService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn create_post(&self, author: &User, req: CreatePostRequest) -> Result<ApiResponse<PostWithAuthor>, AppError> {
        let text = req.text()?;
        let post = self.db.create_post(&author.id, text).await?;

        Ok(ApiResponse::with_message(
            PostWithAuthor { post, user: author.summary() },
            "Post created",
        ))
    }

    pub async fn list_posts(&self) -> Result<ApiResponse<Vec<PostWithAuthor>>, AppError> {
        let posts = self.db.list_posts().await?;
        Ok(ApiResponse::success(posts))
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<ApiResponse<PostWithAuthor>, AppError> {
        match self.db.get_post_with_author(&post_id).await? {
            Some(post) => Ok(ApiResponse::success(post)),
            None => Err(AppError::not_found("Post not found")),
        }
    }

    pub async fn delete_post(&self, user_id: Uuid, post_id: Uuid) -> Result<ApiResponse<Empty>, AppError> {
        let post = self.load(post_id).await?;
        post.ensure_author(user_id)?;

        self.db.delete_post(&post.id).await?;
        Ok(ApiResponse::with_message(Empty::default(), "Post removed"))
    }

    pub async fn like_post(&self, user_id: Uuid, post_id: Uuid) -> Result<ApiResponse<Vec<Like>>, AppError> {
        let post = self.modify(post_id, |post| post.like(user_id)).await?;
        Ok(ApiResponse::success(post.likes))
    }

    pub async fn unlike_post(&self, user_id: Uuid, post_id: Uuid) -> Result<ApiResponse<Vec<Like>>, AppError> {
        let post = self.modify(post_id, |post| post.unlike(user_id)).await?;
        Ok(ApiResponse::success(post.likes))
    }

    pub async fn add_comment(&self, author: &User, post_id: Uuid, req: CommentRequest) -> Result<ApiResponse<Vec<Comment>>, AppError> {
        let post = self.modify(post_id, |post| post.add_comment(author, &req.text)).await?;
        Ok(ApiResponse::with_message(post.comments, "Comment added"))
    }

    pub async fn remove_comment(&self, user_id: Uuid, post_id: Uuid, comment_id: Uuid) -> Result<ApiResponse<Vec<Comment>>, AppError> {
        let post = self
            .modify(post_id, |post| post.remove_comment(comment_id, user_id))
            .await?;
        Ok(ApiResponse::with_message(post.comments, "Comment removed"))
    }

    async fn modify<F>(&self, post_id: Uuid, change: F) -> Result<Post, AppError>
    where
        F: FnOnce(&mut Post) -> Result<(), AppError>,
    {
        self.db
            .modify_post_reactions(&post_id, change)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))
    }

    async fn load(&self, post_id: Uuid) -> Result<Post, AppError> {
        self.db
            .get_post(&post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))
    }
}
