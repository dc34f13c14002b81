use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{non_blank, UserSummary};
use crate::utils::error::AppError;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobType {
    #[default]
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    Contract,
    Internship,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::PartTime => "Part-time",
            JobType::Contract => "Contract",
            JobType::Internship => "Internship",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Full-time" => Some(JobType::FullTime),
            "Part-time" => Some(JobType::PartTime),
            "Contract" => Some(JobType::Contract),
            "Internship" => Some(JobType::Internship),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Applicant {
    pub user: Uuid,
    pub resume_url: Option<String>,
    pub applied_at: DateTime<Utc>,
}

/// Job posting
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: Uuid,
    pub posted_by: Uuid,
    pub company: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub job_type: JobType,
    pub applicants: Vec<Applicant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn ensure_poster(&self, user_id: Uuid, action: &str) -> Result<(), AppError> {
        if self.posted_by != user_id {
            return Err(AppError::unauthorized(&format!("Not authorized to {} this job", action)));
        }
        Ok(())
    }

    pub fn has_applied(&self, user_id: Uuid) -> bool {
        self.applicants.iter().any(|a| a.user == user_id)
    }

    pub fn apply(&mut self, user_id: Uuid, resume_url: Option<String>) -> Result<(), AppError> {
        if self.has_applied(user_id) {
            return Err(AppError::bad_request("You have already applied for this job"));
        }
        self.applicants.push(Applicant {
            user: user_id,
            resume_url: resume_url.filter(|url| !url.trim().is_empty()),
            applied_at: Utc::now(),
        });
        Ok(())
    }

    /// Applies a partial update. Provided text fields must not be blank.
    pub fn apply_update(&mut self, req: UpdateJobRequest) -> Result<(), AppError> {
        fn set(target: &mut String, value: &Option<String>, field: &str) -> Result<(), AppError> {
            if value.is_some() {
                let v = non_blank(value)
                    .ok_or_else(|| AppError::bad_request(&format!("{} cannot be empty", field)))?;
                *target = v.to_string();
            }
            Ok(())
        }

        set(&mut self.company, &req.company, "Company")?;
        set(&mut self.title, &req.title, "Title")?;
        set(&mut self.description, &req.description, "Description")?;
        set(&mut self.location, &req.location, "Location")?;
        if let Some(job_type) = req.job_type {
            self.job_type = job_type;
        }
        Ok(())
    }
}

/// Job with its poster populated
#[derive(Debug, Clone, Serialize)]
pub struct JobWithPoster {
    #[serde(flatten)]
    pub job: Job,
    pub poster: UserSummary,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateJobRequest {
    #[validate(length(max = 255, message = "Company must be at most 255 characters"))]
    pub company: Option<String>,
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,
    pub job_type: Option<JobType>,
}

/// Validated job fields ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub company: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub job_type: JobType,
}

impl TryFrom<CreateJobRequest> for NewJob {
    type Error = AppError;

    fn try_from(req: CreateJobRequest) -> Result<Self, Self::Error> {
        match (
            non_blank(&req.company),
            non_blank(&req.title),
            non_blank(&req.description),
            non_blank(&req.location),
        ) {
            (Some(company), Some(title), Some(description), Some(location)) => Ok(NewJob {
                company: company.to_string(),
                title: title.to_string(),
                description: description.to_string(),
                location: location.to_string(),
                job_type: req.job_type.unwrap_or_default(),
            }),
            _ => Err(AppError::bad_request("Please provide all required fields")),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateJobRequest {
    #[validate(length(max = 255, message = "Company must be at most 255 characters"))]
    pub company: Option<String>,
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,
    pub job_type: Option<JobType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplyRequest {
    pub resume_url: Option<String>,
}
