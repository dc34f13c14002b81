use actix_web::dev::Payload;
use actix_web::http::Method;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::models::{AuthResponse, User, UserResponse};
use crate::utils::error::AppError;

const ISSUER: &str = "pronet-api";

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // User ID
    pub name: String,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub jti: String,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_else(Utc::now)
    }
}

/// Authentication service
pub struct AuthService {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Hash a password using bcrypt
    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        Ok(bcrypt::hash(password, self.config.bcrypt_cost)?)
    }

    /// Verify a password against its hash
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        Ok(bcrypt::verify(password, hash)?)
    }

    /// Issue an access token for a user and return the AuthResponse
    pub fn generate_token(&self, user: &User) -> Result<AuthResponse, AppError> {
        let now = Utc::now();

        let claims = Claims {
            sub: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            exp: (now + Duration::hours(self.config.jwt_expiration_hours)).timestamp(),
            iat: now.timestamp(),
            iss: ISSUER.to_string(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(AuthResponse {
            user: UserResponse::from(user),
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.jwt_expiration_hours * 3600, // Convert to seconds
        })
    }

    /// Validate and decode an access token
    pub fn validate_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "sub", "iat"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(token_data.claims)
    }
}

/// The user attached to a request by the authentication middleware
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub claims: Claims,
}

impl AuthenticatedUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthenticatedUser>()
                .cloned()
                .ok_or_else(|| AppError::unauthorized("Not authorized, no token")),
        )
    }
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    let mut parts = auth_header.trim().splitn(2, ' ');
    match (parts.next(), parts.next()) {
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Some(token.trim())
        }
        _ => None,
    }
}

/// Extract token from request headers
pub fn extract_token_from_request(req: &impl HttpMessage) -> Option<String> {
    req.headers()
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(extract_bearer_token)
        .map(|token| token.to_string())
}

/// Routes reachable without a token. Everything else goes through `protect`.
pub fn is_public_route(method: &Method, path: &str) -> bool {
    let path = if path.len() > 1 { path.trim_end_matches('/') } else { path };

    if *method == Method::OPTIONS {
        return true;
    }

    if *method == Method::POST {
        return matches!(path, "/api/v1/auth/register" | "/api/v1/auth/login");
    }

    if *method != Method::GET {
        return false;
    }

    if matches!(path, "/" | "/health" | "/api/v1/status" | "/api/v1/profiles" | "/api/v1/jobs") {
        return true;
    }

    let single_segment = |prefix: &str| {
        path.strip_prefix(prefix)
            .map(|rest| !rest.is_empty() && !rest.contains('/'))
            .unwrap_or(false)
    };

    single_segment("/api/v1/profiles/user/") || single_segment("/api/v1/jobs/")
}

/// Rate limiting store (in-memory, per process)
pub struct RateLimitStore {
    requests: HashMap<String, Vec<i64>>,
}

impl Default for RateLimitStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimitStore {
    pub fn new() -> Self {
        Self {
            requests: HashMap::new(),
        }
    }

    pub fn is_allowed(&mut self, key: &str, max_requests: u32, window_seconds: u64) -> bool {
        self.is_allowed_at(key, max_requests, window_seconds, Utc::now().timestamp())
    }

    fn is_allowed_at(&mut self, key: &str, max_requests: u32, window_seconds: u64, now: i64) -> bool {
        let window_start = now - window_seconds as i64;

        let user_requests = self.requests.entry(key.to_string()).or_default();

        // Remove old requests outside the window
        user_requests.retain(|&timestamp| timestamp > window_start);

        if user_requests.len() >= max_requests as usize {
            return false;
        }

        user_requests.push(now);
        true
    }

    /// Forget keys with no requests in the last hour
    pub fn cleanup(&mut self) -> usize {
        let one_hour_ago = Utc::now().timestamp() - 3600;
        let before = self.requests.len();

        self.requests.retain(|_, timestamps| {
            timestamps.retain(|&timestamp| timestamp > one_hour_ago);
            !timestamps.is_empty()
        });

        before - self.requests.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn service() -> AuthService {
        AuthService::new(AuthConfig {
            jwt_secret: "test-secret-that-is-long-enough".to_string(),
            jwt_expiration_hours: 1,
            bcrypt_cost: 4,
        })
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: String::new(),
            headline: None,
            profile_picture: None,
            connections: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_validates_and_carries_user() {
        let auth = service();
        let u = user();
        let response = auth.generate_token(&u).unwrap();
        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 3600);

        let claims = auth.validate_token(&response.token).unwrap();
        assert_eq!(claims.sub, u.id.to_string());
        assert_eq!(claims.iss, ISSUER);
        assert!(claims.expires_at() > Utc::now());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = AuthService::new(AuthConfig {
            jwt_secret: "a-completely-different-secret".to_string(),
            jwt_expiration_hours: 1,
            bcrypt_cost: 4,
        });
        let token = other.generate_token(&user()).unwrap().token;
        assert!(service().validate_token(&token).is_err());
        assert!(service().validate_token("garbage").is_err());
    }

    #[test]
    fn password_hash_round_trip() {
        let auth = service();
        let hash = auth.hash_password("CorrectHorse1").unwrap();
        assert!(auth.verify_password("CorrectHorse1", &hash).unwrap());
        assert!(!auth.verify_password("WrongHorse1", &hash).unwrap());
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);

        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer tok"))
            .to_http_request();
        assert_eq!(extract_token_from_request(&req).as_deref(), Some("tok"));
        assert_eq!(extract_token_from_request(&TestRequest::default().to_http_request()), None);
    }

    #[test]
    fn public_route_classification() {
        let id = Uuid::new_v4();
        assert!(is_public_route(&Method::GET, "/"));
        assert!(is_public_route(&Method::GET, "/health"));
        assert!(is_public_route(&Method::POST, "/api/v1/auth/register"));
        assert!(is_public_route(&Method::POST, "/api/v1/auth/login/"));
        assert!(is_public_route(&Method::GET, "/api/v1/profiles"));
        assert!(is_public_route(&Method::GET, &format!("/api/v1/profiles/user/{}", id)));
        assert!(is_public_route(&Method::GET, "/api/v1/jobs"));
        assert!(is_public_route(&Method::GET, &format!("/api/v1/jobs/{}", id)));
        assert!(is_public_route(&Method::OPTIONS, "/api/v1/posts"));

        assert!(!is_public_route(&Method::GET, "/api/v1/auth/me"));
        assert!(!is_public_route(&Method::GET, "/api/v1/profiles/me"));
        assert!(!is_public_route(&Method::POST, "/api/v1/jobs"));
        assert!(!is_public_route(&Method::PUT, &format!("/api/v1/jobs/{}", id)));
        assert!(!is_public_route(&Method::POST, &format!("/api/v1/jobs/{}/apply", id)));
        assert!(!is_public_route(&Method::GET, "/api/v1/posts"));
        assert!(!is_public_route(&Method::GET, "/api/v1/connections"));
    }

    #[test]
    fn rate_limit_window() {
        let mut store = RateLimitStore::new();
        assert!(store.is_allowed_at("k", 2, 60, 1_000));
        assert!(store.is_allowed_at("k", 2, 60, 1_001));
        assert!(!store.is_allowed_at("k", 2, 60, 1_002));
        assert!(store.is_allowed_at("other", 2, 60, 1_002));
        // first two fall out of the window
        assert!(store.is_allowed_at("k", 2, 60, 1_062));
    }
}
