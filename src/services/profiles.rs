use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::database::DatabaseService;
use crate::models::{
    ApiResponse, Education, EducationRequest, Experience, ExperienceRequest, Profile, ProfileFields,
    ProfileRequest, ProfileWithUser,
};
use crate::utils::error::AppError;

pub struct ProfileService {
    pub db: Arc<DatabaseService>,
}

impl ProfileService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn get_my_profile(&self, user_id: Uuid) -> Result<ApiResponse<ProfileWithUser>, AppError> {
        let profile = self.load_own(user_id).await?;
        Ok(ApiResponse::success(profile))
    }

    /// Create the caller's profile or update the fields that were provided
    pub async fn upsert_profile(&self, user_id: Uuid, req: ProfileRequest) -> Result<ApiResponse<ProfileWithUser>, AppError> {
        req.validate()?;
        let fields = ProfileFields::from(req);
        self.db.upsert_profile(&user_id, &fields).await?;

        let profile = self
            .db
            .get_profile_by_user(&user_id)
            .await?
            .ok_or_else(|| AppError::internal_server_error("Profile missing after upsert"))?;

        Ok(ApiResponse::with_message(profile, "Profile updated successfully"))
    }

    pub async fn list_profiles(&self) -> Result<ApiResponse<Vec<ProfileWithUser>>, AppError> {
        let profiles = self.db.list_profiles().await?;
        Ok(ApiResponse::success(profiles))
    }

    pub async fn get_profile_by_user(&self, user_id: Uuid) -> Result<ApiResponse<ProfileWithUser>, AppError> {
        match self.db.get_profile_by_user(&user_id).await? {
            Some(profile) => Ok(ApiResponse::success(profile)),
            None => Err(AppError::not_found("Profile not found")),
        }
    }

    pub async fn add_experience(&self, user_id: Uuid, req: ExperienceRequest) -> Result<ApiResponse<ProfileWithUser>, AppError> {
        let entry = Experience::try_from(req)?;
        let profile = self.modify_own(user_id, |p| p.add_experience(entry)).await?;

        Ok(ApiResponse::with_message(profile, "Experience added"))
    }

    pub async fn remove_experience(&self, user_id: Uuid, exp_id: Uuid) -> Result<ApiResponse<ProfileWithUser>, AppError> {
        let profile = self.modify_own(user_id, |p| p.remove_experience(exp_id)).await?;
        Ok(ApiResponse::with_message(profile, "Experience removed"))
    }

    pub async fn add_education(&self, user_id: Uuid, req: EducationRequest) -> Result<ApiResponse<ProfileWithUser>, AppError> {
        let entry = Education::try_from(req)?;
        let profile = self.modify_own(user_id, |p| p.add_education(entry)).await?;

        Ok(ApiResponse::with_message(profile, "Education added"))
    }

    pub async fn remove_education(&self, user_id: Uuid, edu_id: Uuid) -> Result<ApiResponse<ProfileWithUser>, AppError> {
        let profile = self.modify_own(user_id, |p| p.remove_education(edu_id)).await?;
        Ok(ApiResponse::with_message(profile, "Education removed"))
    }

    async fn modify_own<F>(&self, user_id: Uuid, change: F) -> Result<ProfileWithUser, AppError>
    where
        F: FnOnce(&mut Profile),
    {
        self.db
            .modify_profile_entries(&user_id, change)
            .await?
            .ok_or_else(|| AppError::not_found("There is no profile for this user"))
    }

    async fn load_own(&self, user_id: Uuid) -> Result<ProfileWithUser, AppError> {
        self.db
            .get_profile_by_user(&user_id)
            .await?
            .ok_or_else(|| AppError::not_found("There is no profile for this user"))
    }
}
