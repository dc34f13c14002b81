use tokio_postgres::types::Json;
use uuid::Uuid;

use super::DatabaseService;
use crate::models::{Education, Experience, Profile, ProfileFields, ProfileWithUser, Social};
use crate::utils::error::AppError;

const PROFILE_SELECT: &str = "
    SELECT p.id, p.user_id, p.summary, p.location, p.website, p.skills, p.experience,
           p.education, p.social, p.created_at, p.updated_at,
           u.name AS author_name, u.headline AS author_headline, u.profile_picture AS author_picture
    FROM profiles p JOIN users u ON u.id = p.user_id";

impl DatabaseService {
    /// Get profile for a user, with the owner populated
    pub async fn get_profile_by_user(&self, user_id: &Uuid) -> Result<Option<ProfileWithUser>, AppError> {
        let client = self.get_client().await?;

        let query = format!("{} WHERE p.user_id = $1", PROFILE_SELECT);
        let row = client.query_opt(query.as_str(), &[user_id]).await?;

        Ok(row.map(|r| Self::row_to_profile(&r)))
    }

    /// All profiles, most recently updated first
    pub async fn list_profiles(&self) -> Result<Vec<ProfileWithUser>, AppError> {
        let client = self.get_client().await?;

        let query = format!("{} ORDER BY p.updated_at DESC", PROFILE_SELECT);
        let rows = client.query(query.as_str(), &[]).await?;

        Ok(rows.iter().map(Self::row_to_profile).collect())
    }

    /// Create the profile or overwrite only the provided fields
    pub async fn upsert_profile(&self, user_id: &Uuid, fields: &ProfileFields) -> Result<(), AppError> {
        let client = self.get_client().await?;

        let social = fields.social.as_ref().map(Json);
        client.execute("
            INSERT INTO profiles (id, user_id, summary, location, website, skills, social)
            VALUES ($1, $2, $3, $4, $5, COALESCE($6, '{}'::text[]), COALESCE($7, '{}'::jsonb))
            ON CONFLICT (user_id) DO UPDATE SET
                summary = COALESCE($3, profiles.summary),
                location = COALESCE($4, profiles.location),
                website = COALESCE($5, profiles.website),
                skills = COALESCE($6, profiles.skills),
                social = COALESCE($7, profiles.social),
                updated_at = NOW()
        ", &[
            &Uuid::new_v4(),
            user_id,
            &fields.summary,
            &fields.location,
            &fields.website,
            &fields.skills,
            &social,
        ]).await?;

        Ok(())
    }

    /// Apply `change` to a user's profile while holding its row lock, then
    /// store the experience and education lists. `None` when there is no profile.
    pub async fn modify_profile_entries<F>(&self, user_id: &Uuid, change: F) -> Result<Option<ProfileWithUser>, AppError>
    where
        F: FnOnce(&mut Profile),
    {
        let mut client = self.get_client().await?;
        let tx = client.transaction().await?;

        let query = format!("{} WHERE p.user_id = $1 FOR UPDATE OF p", PROFILE_SELECT);
        let mut profile = match tx.query_opt(query.as_str(), &[user_id]).await? {
            Some(row) => Self::row_to_profile(&row),
            None => return Ok(None),
        };

        change(&mut profile.profile);

        tx.execute("
            UPDATE profiles SET experience = $2, education = $3, updated_at = NOW()
            WHERE id = $1
        ", &[&profile.profile.id, &Json(&profile.profile.experience), &Json(&profile.profile.education)]).await?;

        tx.commit().await?;
        Ok(Some(profile))
    }

    fn row_to_profile(row: &tokio_postgres::Row) -> ProfileWithUser {
        let experience: Json<Vec<Experience>> = row.get("experience");
        let education: Json<Vec<Education>> = row.get("education");
        let social: Json<Social> = row.get("social");

        ProfileWithUser {
            user: Self::row_to_summary(row, "user_id"),
            profile: Profile {
                id: row.get("id"),
                user_id: row.get("user_id"),
                summary: row.get("summary"),
                location: row.get("location"),
                website: row.get("website"),
                skills: row.get("skills"),
                experience: experience.0,
                education: education.0,
                social: social.0,
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            },
        }
    }
}
