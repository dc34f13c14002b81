use tokio_postgres::types::Json;
use uuid::Uuid;

use super::DatabaseService;
use crate::models::{Comment, Like, Post, PostWithAuthor};
use crate::utils::error::AppError;

const POST_COLUMNS: &str = "p.id, p.user_id, p.text, p.likes, p.comments, p.created_at, p.updated_at";

impl DatabaseService {
    /// Create a new post
    pub async fn create_post(&self, user_id: &Uuid, text: &str) -> Result<Post, AppError> {
        let client = self.get_client().await?;

        let query = format!(
            "INSERT INTO posts AS p (id, user_id, text) VALUES ($1, $2, $3) RETURNING {}",
            POST_COLUMNS
        );
        let row = client.query_one(query.as_str(), &[&Uuid::new_v4(), user_id, &text]).await?;

        Ok(Self::row_to_post(&row))
    }

    /// Feed of all posts, newest first
    pub async fn list_posts(&self) -> Result<Vec<PostWithAuthor>, AppError> {
        let client = self.get_client().await?;

        let query = format!(
            "SELECT {}, u.name AS author_name, u.headline AS author_headline, u.profile_picture AS author_picture
             FROM posts p JOIN users u ON u.id = p.user_id
             ORDER BY p.created_at DESC",
            POST_COLUMNS
        );
        let rows = client.query(query.as_str(), &[]).await?;

        Ok(rows.iter().map(Self::row_to_post_with_author).collect())
    }

    /// Get post with its author populated
    pub async fn get_post_with_author(&self, id: &Uuid) -> Result<Option<PostWithAuthor>, AppError> {
        let client = self.get_client().await?;

        let query = format!(
            "SELECT {}, u.name AS author_name, u.headline AS author_headline, u.profile_picture AS author_picture
             FROM posts p JOIN users u ON u.id = p.user_id
             WHERE p.id = $1",
            POST_COLUMNS
        );
        let row = client.query_opt(query.as_str(), &[id]).await?;

        Ok(row.map(|r| Self::row_to_post_with_author(&r)))
    }

    /// Get post by ID
    pub async fn get_post(&self, id: &Uuid) -> Result<Option<Post>, AppError> {
        let client = self.get_client().await?;

        let query = format!("SELECT {} FROM posts p WHERE p.id = $1", POST_COLUMNS);
        let row = client.query_opt(query.as_str(), &[id]).await?;

        Ok(row.map(|r| Self::row_to_post(&r)))
    }

    /// Apply `change` to a post while holding its row lock, then store the
    /// likes and comments. `None` when the post does not exist.
    pub async fn modify_post_reactions<F>(&self, id: &Uuid, change: F) -> Result<Option<Post>, AppError>
    where
        F: FnOnce(&mut Post) -> Result<(), AppError>,
    {
        let mut client = self.get_client().await?;
        let tx = client.transaction().await?;

        let query = format!("SELECT {} FROM posts p WHERE p.id = $1 FOR UPDATE", POST_COLUMNS);
        let mut post = match tx.query_opt(query.as_str(), &[id]).await? {
            Some(row) => Self::row_to_post(&row),
            None => return Ok(None),
        };

        // Dropping the transaction on error rolls it back
        change(&mut post)?;

        tx.execute("
            UPDATE posts SET likes = $2, comments = $3, updated_at = NOW() WHERE id = $1
        ", &[&post.id, &Json(&post.likes), &Json(&post.comments)]).await?;

        tx.commit().await?;
        Ok(Some(post))
    }

    /// Delete a post
    pub async fn delete_post(&self, id: &Uuid) -> Result<(), AppError> {
        let client = self.get_client().await?;

        client.execute("DELETE FROM posts WHERE id = $1", &[id]).await?;

        Ok(())
    }

    fn row_to_post(row: &tokio_postgres::Row) -> Post {
        let likes: Json<Vec<Like>> = row.get("likes");
        let comments: Json<Vec<Comment>> = row.get("comments");

        Post {
            id: row.get("id"),
            user_id: row.get("user_id"),
            text: row.get("text"),
            likes: likes.0,
            comments: comments.0,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    fn row_to_post_with_author(row: &tokio_postgres::Row) -> PostWithAuthor {
        PostWithAuthor {
            post: Self::row_to_post(row),
            user: Self::row_to_summary(row, "user_id"),
        }
    }
}
