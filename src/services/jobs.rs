use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::database::DatabaseService;
use crate::models::{
    Applicant, ApiResponse, ApplyRequest, CreateJobRequest, Empty, Job, JobWithPoster, NewJob,
    UpdateJobRequest,
};
use crate::utils::error::AppError;

pub struct JobService {
    pub db: Arc<DatabaseService>,
}

impl JobService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn create_job(&self, user_id: Uuid, req: CreateJobRequest) -> Result<ApiResponse<Job>, AppError> {
        req.validate()?;
        let new_job = NewJob::try_from(req)?;
        let job = self.db.create_job(&user_id, &new_job).await?;

        Ok(ApiResponse::with_message(job, "Job created successfully"))
    }

    pub async fn list_jobs(&self) -> Result<ApiResponse<Vec<JobWithPoster>>, AppError> {
        let jobs = self.db.list_jobs().await?;
        Ok(ApiResponse::success(jobs))
    }

    pub async fn get_job(&self, job_id: Uuid) -> Result<ApiResponse<JobWithPoster>, AppError> {
        match self.db.get_job_with_poster(&job_id).await? {
            Some(job) => Ok(ApiResponse::success(job)),
            None => Err(AppError::not_found("Job not found")),
        }
    }

    pub async fn update_job(&self, user_id: Uuid, job_id: Uuid, req: UpdateJobRequest) -> Result<ApiResponse<Job>, AppError> {
        req.validate()?;
        let job = self
            .modify(job_id, |job| {
                job.ensure_poster(user_id, "update")?;
                job.apply_update(req)
            })
            .await?;

        Ok(ApiResponse::with_message(job, "Job updated successfully"))
    }

    pub async fn delete_job(&self, user_id: Uuid, job_id: Uuid) -> Result<ApiResponse<Empty>, AppError> {
        let job = self.load(job_id).await?;
        job.ensure_poster(user_id, "delete")?;

        self.db.delete_job(&job.id).await?;
        Ok(ApiResponse::with_message(Empty::default(), "Job deleted successfully"))
    }

    pub async fn apply_for_job(&self, user_id: Uuid, job_id: Uuid, req: ApplyRequest) -> Result<ApiResponse<Vec<Applicant>>, AppError> {
        let job = self.modify(job_id, |job| job.apply(user_id, req.resume_url)).await?;
        Ok(ApiResponse::with_message(job.applicants, "Successfully applied to job"))
    }

    async fn modify<F>(&self, job_id: Uuid, change: F) -> Result<Job, AppError>
    where
        F: FnOnce(&mut Job) -> Result<(), AppError>,
    {
        self.db
            .modify_job(&job_id, change)
            .await?
            .ok_or_else(|| AppError::not_found("Job not found"))
    }

    async fn load(&self, job_id: Uuid) -> Result<Job, AppError> {
        self.db
            .get_job(&job_id)
            .await?
            .ok_or_else(|| AppError::not_found("Job not found"))
    }
}
