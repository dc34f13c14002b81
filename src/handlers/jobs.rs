use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::auth::AuthenticatedUser;
use crate::models::{ApplyRequest, CreateJobRequest, UpdateJobRequest};
use crate::services::JobService;
use crate::utils::error::AppError;
use crate::utils::parse_id;
use crate::utils::response::{created_response, success_response};

pub async fn create_job(
    current: AuthenticatedUser,
    req: web::Json<CreateJobRequest>,
    job_service: web::Data<Arc<JobService>>,
) -> Result<HttpResponse, AppError> {
    let response = job_service.create_job(current.id(), req.into_inner()).await?;
    Ok(created_response(response))
}

pub async fn list_jobs(job_service: web::Data<Arc<JobService>>) -> Result<HttpResponse, AppError> {
    Ok(success_response(job_service.list_jobs().await?))
}

pub async fn get_job(
    path: web::Path<String>,
    job_service: web::Data<Arc<JobService>>,
) -> Result<HttpResponse, AppError> {
    let job_id = parse_id(&path.into_inner(), "job")?;
    Ok(success_response(job_service.get_job(job_id).await?))
}

pub async fn update_job(
    current: AuthenticatedUser,
    path: web::Path<String>,
    req: web::Json<UpdateJobRequest>,
    job_service: web::Data<Arc<JobService>>,
) -> Result<HttpResponse, AppError> {
    let job_id = parse_id(&path.into_inner(), "job")?;
    let response = job_service.update_job(current.id(), job_id, req.into_inner()).await?;
    Ok(success_response(response))
}

pub async fn delete_job(
    current: AuthenticatedUser,
    path: web::Path<String>,
    job_service: web::Data<Arc<JobService>>,
) -> Result<HttpResponse, AppError> {
    let job_id = parse_id(&path.into_inner(), "job")?;
    Ok(success_response(job_service.delete_job(current.id(), job_id).await?))
}

pub async fn apply_for_job(
    current: AuthenticatedUser,
    path: web::Path<String>,
    req: Option<web::Json<ApplyRequest>>,
    job_service: web::Data<Arc<JobService>>,
) -> Result<HttpResponse, AppError> {
    let job_id = parse_id(&path.into_inner(), "job")?;
    let req = req.map(|r| r.into_inner()).unwrap_or_default();

    let response = job_service.apply_for_job(current.id(), job_id, req).await?;
    Ok(success_response(response))
}
