use tokio_postgres::types::Json;
use uuid::Uuid;

use super::DatabaseService;
use crate::models::{Applicant, Job, JobType, JobWithPoster, NewJob};
use crate::utils::error::AppError;

const JOB_COLUMNS: &str = "j.id, j.posted_by, j.company, j.title, j.description, j.location, \
                           j.job_type, j.applicants, j.created_at, j.updated_at";

impl DatabaseService {
    /// Create a new job posting
    pub async fn create_job(&self, posted_by: &Uuid, job: &NewJob) -> Result<Job, AppError> {
        let client = self.get_client().await?;

        let query = format!(
            "INSERT INTO jobs AS j (id, posted_by, company, title, description, location, job_type)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            JOB_COLUMNS
        );
        let row = client.query_one(query.as_str(), &[
            &Uuid::new_v4(),
            posted_by,
            &job.company,
            &job.title,
            &job.description,
            &job.location,
            &job.job_type.as_str(),
        ]).await?;

        Self::row_to_job(&row)
    }

    /// All job postings, newest first
    pub async fn list_jobs(&self) -> Result<Vec<JobWithPoster>, AppError> {
        let client = self.get_client().await?;

        let query = format!(
            "SELECT {}, u.name AS author_name, u.headline AS author_headline, u.profile_picture AS author_picture
             FROM jobs j JOIN users u ON u.id = j.posted_by
             ORDER BY j.created_at DESC",
            JOB_COLUMNS
        );
        let rows = client.query(query.as_str(), &[]).await?;

        rows.iter().map(Self::row_to_job_with_poster).collect()
    }

    /// Get job with its poster populated
    pub async fn get_job_with_poster(&self, id: &Uuid) -> Result<Option<JobWithPoster>, AppError> {
        let client = self.get_client().await?;

        let query = format!(
            "SELECT {}, u.name AS author_name, u.headline AS author_headline, u.profile_picture AS author_picture
             FROM jobs j JOIN users u ON u.id = j.posted_by
             WHERE j.id = $1",
            JOB_COLUMNS
        );
        let row = client.query_opt(query.as_str(), &[id]).await?;

        row.map(|r| Self::row_to_job_with_poster(&r)).transpose()
    }

    /// Get job by ID
    pub async fn get_job(&self, id: &Uuid) -> Result<Option<Job>, AppError> {
        let client = self.get_client().await?;

        let query = format!("SELECT {} FROM jobs j WHERE j.id = $1", JOB_COLUMNS);
        let row = client.query_opt(query.as_str(), &[id]).await?;

        row.map(|r| Self::row_to_job(&r)).transpose()
    }

    /// Apply `change` to a job while holding its row lock, then store the
    /// editable fields and applicants. `None` when the job does not exist.
    pub async fn modify_job<F>(&self, id: &Uuid, change: F) -> Result<Option<Job>, AppError>
    where
        F: FnOnce(&mut Job) -> Result<(), AppError>,
    {
        let mut client = self.get_client().await?;
        let tx = client.transaction().await?;

        let query = format!("SELECT {} FROM jobs j WHERE j.id = $1 FOR UPDATE", JOB_COLUMNS);
        let mut job = match tx.query_opt(query.as_str(), &[id]).await? {
            Some(row) => Self::row_to_job(&row)?,
            None => return Ok(None),
        };

        change(&mut job)?;

        tx.execute("
            UPDATE jobs
            SET company = $2, title = $3, description = $4, location = $5, job_type = $6,
                applicants = $7, updated_at = NOW()
            WHERE id = $1
        ", &[
            &job.id,
            &job.company,
            &job.title,
            &job.description,
            &job.location,
            &job.job_type.as_str(),
            &Json(&job.applicants),
        ]).await?;

        tx.commit().await?;
        Ok(Some(job))
    }

    /// Delete a job posting
    pub async fn delete_job(&self, id: &Uuid) -> Result<(), AppError> {
        let client = self.get_client().await?;

        client.execute("DELETE FROM jobs WHERE id = $1", &[id]).await?;

        Ok(())
    }

    fn row_to_job(row: &tokio_postgres::Row) -> Result<Job, AppError> {
        let job_type: &str = row.get("job_type");
        let job_type = JobType::parse(job_type).ok_or_else(|| {
            AppError::internal_server_error(&format!("Unknown job type '{}'", job_type))
        })?;
        let applicants: Json<Vec<Applicant>> = row.get("applicants");

        Ok(Job {
            id: row.get("id"),
            posted_by: row.get("posted_by"),
            company: row.get("company"),
            title: row.get("title"),
            description: row.get("description"),
            location: row.get("location"),
            job_type,
            applicants: applicants.0,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn row_to_job_with_poster(row: &tokio_postgres::Row) -> Result<JobWithPoster, AppError> {
        Ok(JobWithPoster {
            job: Self::row_to_job(row)?,
            poster: Self::row_to_summary(row, "posted_by"),
        })
    }
}
