use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::auth::AuthenticatedUser;
use crate::models::{CommentRequest, CreatePostRequest};
use crate::services::PostService;
use crate::utils::error::AppError;
use crate::utils::parse_id;
use crate::utils::response::{created_response, success_response};

pub async fn create_post(
    current: AuthenticatedUser,
    req: web::Json<CreatePostRequest>,
    post_service: web::Data<Arc<PostService>>,
) -> Result<HttpResponse, AppError> {
    let response = post_service.create_post(&current.user, req.into_inner()).await?;
    Ok(created_response(response))
}

pub async fn list_posts(
    _current: AuthenticatedUser,
    post_service: web::Data<Arc<PostService>>,
) -> Result<HttpResponse, AppError> {
    Ok(success_response(post_service.list_posts().await?))
}

pub async fn get_post(
    _current: AuthenticatedUser,
    path: web::Path<String>,
    post_service: web::Data<Arc<PostService>>,
) -> Result<HttpResponse, AppError> {
    let post_id = parse_id(&path.into_inner(), "post")?;
    Ok(success_response(post_service.get_post(post_id).await?))
}

pub async fn delete_post(
    current: AuthenticatedUser,
    path: web::Path<String>,
    post_service: web::Data<Arc<PostService>>,
) -> Result<HttpResponse, AppError> {
    let post_id = parse_id(&path.into_inner(), "post")?;
    Ok(success_response(post_service.delete_post(current.id(), post_id).await?))
}

pub async fn like_post(
    current: AuthenticatedUser,
    path: web::Path<String>,
    post_service: web::Data<Arc<PostService>>,
) -> Result<HttpResponse, AppError> {
    let post_id = parse_id(&path.into_inner(), "post")?;
    Ok(success_response(post_service.like_post(current.id(), post_id).await?))
}

pub async fn unlike_post(
    current: AuthenticatedUser,
    path: web::Path<String>,
    post_service: web::Data<Arc<PostService>>,
) -> Result<HttpResponse, AppError> {
    let post_id = parse_id(&path.into_inner(), "post")?;
    Ok(success_response(post_service.unlike_post(current.id(), post_id).await?))
}

pub async fn add_comment(
    current: AuthenticatedUser,
    path: web::Path<String>,
    req: web::Json<CommentRequest>,
    post_service: web::Data<Arc<PostService>>,
) -> Result<HttpResponse, AppError> {
    let post_id = parse_id(&path.into_inner(), "post")?;
    let response = post_service.add_comment(&current.user, post_id, req.into_inner()).await?;
    Ok(created_response(response))
}

pub async fn remove_comment(
    current: AuthenticatedUser,
    path: web::Path<(String, String)>,
    post_service: web::Data<Arc<PostService>>,
) -> Result<HttpResponse, AppError> {
    let (post_id, comment_id) = path.into_inner();
    let post_id = parse_id(&post_id, "post")?;
    let comment_id = parse_id(&comment_id, "comment")?;

    let response = post_service.remove_comment(current.id(), post_id, comment_id).await?;
    Ok(success_response(response))
}
