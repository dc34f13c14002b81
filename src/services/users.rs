use std::sync::Arc;
use validator::Validate;

use crate::auth::{AuthService, Claims};
use crate::database::DatabaseService;
use crate::models::{non_blank, ApiResponse, AuthResponse, Empty, LoginRequest, RegisterRequest, User, UserResponse};
use crate::utils::error::AppError;

/// User service for registration, login and logout
pub struct UserService {
    pub db: Arc<DatabaseService>,
    pub auth: Arc<AuthService>,
}

impl UserService {
    pub fn new(db: Arc<DatabaseService>, auth: Arc<AuthService>) -> Self {
        Self { db, auth }
    }

    /// Register a new user and issue a token
    pub async fn register_user(&self, req: RegisterRequest) -> Result<ApiResponse<AuthResponse>, AppError> {
        let (name, email, password) = match (non_blank(&req.name), non_blank(&req.email), req.password.as_deref()) {
            (Some(name), Some(email), Some(password)) if !password.is_empty() => {
                (name.to_string(), email.to_lowercase(), password.to_string())
            }
            _ => return Err(AppError::bad_request("Please provide name, email, and password")),
        };

        // Validate what will be stored, not the raw input
        let normalized = RegisterRequest {
            name: Some(name.clone()),
            email: Some(email.clone()),
            password: Some(password.clone()),
            headline: non_blank(&req.headline).map(str::to_string),
        };
        normalized.validate()?;

        if self.db.get_user_by_email(&email).await?.is_some() {
            return Err(AppError::bad_request("User already exists"));
        }

        let password_hash = self.auth.hash_password(&password)?;
        let user = self
            .db
            .create_user(&name, &email, &password_hash, normalized.headline.as_deref())
            .await?;

        log::info!("Registered user {}", user.id);

        let tokens = self.auth.generate_token(&user)?;
        Ok(ApiResponse::with_message(tokens, "User registered successfully"))
    }

    /// Authenticate a user by email and password
    pub async fn login_user(&self, req: LoginRequest) -> Result<ApiResponse<AuthResponse>, AppError> {
        let (email, password) = match (non_blank(&req.email), req.password.as_deref()) {
            (Some(email), Some(password)) if !password.is_empty() => (email, password),
            _ => return Err(AppError::bad_request("Please provide an email and password")),
        };

        let user = match self.db.get_user_by_email(email).await? {
            Some(u) => u,
            None => return Err(AppError::unauthorized("Invalid credentials")),
        };

        if !self.auth.verify_password(password, &user.password_hash)? {
            return Err(AppError::unauthorized("Invalid credentials"));
        }

        let tokens = self.auth.generate_token(&user)?;
        Ok(ApiResponse::with_message(tokens, "User logged in successfully"))
    }

    /// The current user, as loaded by the auth middleware
    pub fn current_user(&self, user: &User) -> ApiResponse<UserResponse> {
        ApiResponse::success(UserResponse::from(user))
    }

    /// Revoke the presented token until it would have expired anyway
    pub async fn logout_user(&self, claims: &Claims) -> Result<ApiResponse<Empty>, AppError> {
        self.db.revoke_token(&claims.jti, claims.expires_at()).await?;
        Ok(ApiResponse::with_message(Empty::default(), "Logged out successfully"))
    }
}
