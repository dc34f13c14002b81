use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::auth::AuthenticatedUser;
use crate::models::{LoginRequest, RegisterRequest};
use crate::services::UserService;
use crate::utils::error::AppError;
use crate::utils::response::{created_response, success_response};

/// Register user endpoint
pub async fn register_user(
    req: web::Json<RegisterRequest>,
    user_service: web::Data<Arc<UserService>>,
) -> Result<HttpResponse, AppError> {
    let response = user_service.register_user(req.into_inner()).await?;
    Ok(created_response(response))
}

/// Login user endpoint
pub async fn login_user(
    req: web::Json<LoginRequest>,
    user_service: web::Data<Arc<UserService>>,
) -> Result<HttpResponse, AppError> {
    let response = user_service.login_user(req.into_inner()).await?;
    Ok(success_response(response))
}

/// Current user endpoint
pub async fn get_me(
    current: AuthenticatedUser,
    user_service: web::Data<Arc<UserService>>,
) -> Result<HttpResponse, AppError> {
    Ok(success_response(user_service.current_user(&current.user)))
}

/// Logout endpoint; the token stays revoked until it expires
pub async fn logout_user(
    current: AuthenticatedUser,
    user_service: web::Data<Arc<UserService>>,
) -> Result<HttpResponse, AppError> {
    let response = user_service.logout_user(&current.claims).await?;
    Ok(success_response(response))
}
