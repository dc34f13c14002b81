use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::auth::AuthenticatedUser;
use crate::models::{EducationRequest, ExperienceRequest, ProfileRequest};
use crate::services::ProfileService;
use crate::utils::error::AppError;
use crate::utils::parse_id;
use crate::utils::response::success_response;

pub async fn list_profiles(
    profile_service: web::Data<Arc<ProfileService>>,
) -> Result<HttpResponse, AppError> {
    Ok(success_response(profile_service.list_profiles().await?))
}

pub async fn get_my_profile(
    current: AuthenticatedUser,
    profile_service: web::Data<Arc<ProfileService>>,
) -> Result<HttpResponse, AppError> {
    Ok(success_response(profile_service.get_my_profile(current.id()).await?))
}

pub async fn upsert_my_profile(
    current: AuthenticatedUser,
    req: web::Json<ProfileRequest>,
    profile_service: web::Data<Arc<ProfileService>>,
) -> Result<HttpResponse, AppError> {
    let response = profile_service.upsert_profile(current.id(), req.into_inner()).await?;
    Ok(success_response(response))
}

pub async fn get_profile_by_user(
    path: web::Path<String>,
    profile_service: web::Data<Arc<ProfileService>>,
) -> Result<HttpResponse, AppError> {
    let user_id = parse_id(&path.into_inner(), "user")?;
    Ok(success_response(profile_service.get_profile_by_user(user_id).await?))
}

pub async fn add_experience(
    current: AuthenticatedUser,
    req: web::Json<ExperienceRequest>,
    profile_service: web::Data<Arc<ProfileService>>,
) -> Result<HttpResponse, AppError> {
    let response = profile_service.add_experience(current.id(), req.into_inner()).await?;
    Ok(success_response(response))
}

pub async fn remove_experience(
    current: AuthenticatedUser,
    path: web::Path<String>,
    profile_service: web::Data<Arc<ProfileService>>,
) -> Result<HttpResponse, AppError> {
    let exp_id = parse_id(&path.into_inner(), "experience")?;
    Ok(success_response(profile_service.remove_experience(current.id(), exp_id).await?))
}

pub async fn add_education(
    current: AuthenticatedUser,
    req: web::Json<EducationRequest>,
    profile_service: web::Data<Arc<ProfileService>>,
) -> Result<HttpResponse, AppError> {
    let response = profile_service.add_education(current.id(), req.into_inner()).await?;
    Ok(success_response(response))
}

pub async fn remove_education(
    current: AuthenticatedUser,
    path: web::Path<String>,
    profile_service: web::Data<Arc<ProfileService>>,
) -> Result<HttpResponse, AppError> {
    let edu_id = parse_id(&path.into_inner(), "education")?;
    Ok(success_response(profile_service.remove_education(current.id(), edu_id).await?))
}
