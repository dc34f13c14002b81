use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{non_blank, UserSummary};
use crate::utils::error::AppError;

/// Work history entry embedded in a profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Experience {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
    pub current: bool,
    pub description: Option<String>,
}

/// Schooling entry embedded in a profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Education {
    pub id: Uuid,
    pub school: String,
    pub degree: String,
    pub field_of_study: String,
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
    pub current: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Social {
    pub youtube: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
}

impl Social {
    fn is_empty(&self) -> bool {
        [&self.youtube, &self.twitter, &self.facebook, &self.linkedin, &self.instagram]
            .iter()
            .all(|v| non_blank(v).is_none())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub skills: Vec<String>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub social: Social,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Newest entries come first.
    pub fn add_experience(&mut self, entry: Experience) {
        self.experience.insert(0, entry);
    }

    pub fn remove_experience(&mut self, id: Uuid) {
        self.experience.retain(|e| e.id != id);
    }

    pub fn add_education(&mut self, entry: Education) {
        self.education.insert(0, entry);
    }

    pub fn remove_education(&mut self, id: Uuid) {
        self.education.retain(|e| e.id != id);
    }
}

/// Profile with its owner populated
#[derive(Debug, Clone, Serialize)]
pub struct ProfileWithUser {
    #[serde(flatten)]
    pub profile: Profile,
    pub user: UserSummary,
}

/// Create-or-update payload for the caller's own profile
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileRequest {
    pub summary: Option<String>,
    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,
    #[validate(length(max = 500, message = "Website must be at most 500 characters"))]
    pub website: Option<String>,
    /// Comma separated list, e.g. "rust, sql, go"
    pub skills: Option<String>,
    pub social: Option<Social>,
}

/// Normalized profile fields; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileFields {
    pub summary: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub skills: Option<Vec<String>>,
    pub social: Option<Social>,
}

impl From<ProfileRequest> for ProfileFields {
    fn from(req: ProfileRequest) -> Self {
        Self {
            summary: non_blank(&req.summary).map(str::to_string),
            location: non_blank(&req.location).map(str::to_string),
            website: non_blank(&req.website).map(str::to_string),
            skills: non_blank(&req.skills).map(parse_skills),
            social: req.social.filter(|s| !s.is_empty()),
        }
    }
}

/// Split a comma separated skills string into trimmed entries.
pub fn parse_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|skill| skill.trim())
        .filter(|skill| !skill.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `2020-01-01` or an RFC 3339 timestamp such as `2020-01-01T00:00:00Z`,
/// keeping the calendar date as written.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

fn date_or_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.filter(|value| !value.trim().is_empty())
        .map(|value| {
            parse_date(&value).ok_or_else(|| {
                de::Error::custom(format!(
                    "invalid date '{}', expected YYYY-MM-DD or an RFC 3339 timestamp",
                    value
                ))
            })
        })
        .transpose()
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, AppError> {
    non_blank(value).ok_or_else(|| AppError::bad_request(&format!("{} is required", field)))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExperienceRequest {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    #[serde(default, deserialize_with = "date_or_timestamp")]
    pub from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "date_or_timestamp")]
    pub to: Option<NaiveDate>,
    pub current: Option<bool>,
    pub description: Option<String>,
}

impl TryFrom<ExperienceRequest> for Experience {
    type Error = AppError;

    fn try_from(req: ExperienceRequest) -> Result<Self, Self::Error> {
        let title = required(&req.title, "Title")?.to_string();
        let company = required(&req.company, "Company")?.to_string();
        let from = req.from.ok_or_else(|| AppError::bad_request("From date is required"))?;
        check_range(from, req.to)?;

        Ok(Experience {
            id: Uuid::new_v4(),
            title,
            company,
            location: non_blank(&req.location).map(str::to_string),
            from,
            to: req.to,
            current: req.current.unwrap_or(false),
            description: non_blank(&req.description).map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EducationRequest {
    pub school: Option<String>,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    #[serde(default, deserialize_with = "date_or_timestamp")]
    pub from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "date_or_timestamp")]
    pub to: Option<NaiveDate>,
    pub current: Option<bool>,
    pub description: Option<String>,
}

impl TryFrom<EducationRequest> for Education {
    type Error = AppError;

    fn try_from(req: EducationRequest) -> Result<Self, Self::Error> {
        let school = required(&req.school, "School")?.to_string();
        let degree = required(&req.degree, "Degree")?.to_string();
        let field_of_study = required(&req.field_of_study, "Field of study")?.to_string();
        let from = req.from.ok_or_else(|| AppError::bad_request("From date is required"))?;
        check_range(from, req.to)?;

        Ok(Education {
            id: Uuid::new_v4(),
            school,
            degree,
            field_of_study,
            from,
            to: req.to,
            current: req.current.unwrap_or(false),
            description: non_blank(&req.description).map(str::to_string),
        })
    }
}

fn check_range(from: NaiveDate, to: Option<NaiveDate>) -> Result<(), AppError> {
    match to {
        Some(to) if to < from => Err(AppError::bad_request("End date must not precede start date")),
        _ => Ok(()),
    }
}
