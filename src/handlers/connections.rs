use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::auth::AuthenticatedUser;
use crate::services::ConnectionService;
use crate::utils::error::AppError;
use crate::utils::parse_id;
use crate::utils::response::{created_response, success_response};

pub async fn send_request(
    current: AuthenticatedUser,
    path: web::Path<String>,
    connection_service: web::Data<Arc<ConnectionService>>,
) -> Result<HttpResponse, AppError> {
    let recipient = parse_id(&path.into_inner(), "user")?;
    Ok(created_response(connection_service.send_request(current.id(), recipient).await?))
}

pub async fn accept_request(
    current: AuthenticatedUser,
    path: web::Path<String>,
    connection_service: web::Data<Arc<ConnectionService>>,
) -> Result<HttpResponse, AppError> {
    let request_id = parse_id(&path.into_inner(), "request")?;
    Ok(success_response(connection_service.accept_request(current.id(), request_id).await?))
}

pub async fn decline_request(
    current: AuthenticatedUser,
    path: web::Path<String>,
    connection_service: web::Data<Arc<ConnectionService>>,
) -> Result<HttpResponse, AppError> {
    let request_id = parse_id(&path.into_inner(), "request")?;
    Ok(success_response(connection_service.decline_request(current.id(), request_id).await?))
}

pub async fn remove_connection(
    current: AuthenticatedUser,
    path: web::Path<String>,
    connection_service: web::Data<Arc<ConnectionService>>,
) -> Result<HttpResponse, AppError> {
    let other = parse_id(&path.into_inner(), "user")?;
    Ok(success_response(connection_service.remove_connection(current.id(), other).await?))
}

pub async fn pending_requests(
    current: AuthenticatedUser,
    connection_service: web::Data<Arc<ConnectionService>>,
) -> Result<HttpResponse, AppError> {
    Ok(success_response(connection_service.pending_requests(current.id()).await?))
}

pub async fn list_connections(
    current: AuthenticatedUser,
    connection_service: web::Data<Arc<ConnectionService>>,
) -> Result<HttpResponse, AppError> {
    Ok(success_response(connection_service.list_connections(&current.user).await?))
}
