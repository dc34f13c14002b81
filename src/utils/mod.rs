use std::sync::Arc;
use uuid::Uuid;

use crate::database::DatabaseService;
use error::AppError;

/// Mask sensitive values partially (e.g., tokens, emails, passwords)
pub fn mask_sensitive(value: &str) -> String {
    if value.is_empty() {
        return "".to_string();
    }

    // If it looks like an email, mask local part
    if let Some(idx) = value.find('@') {
        let (local, domain) = value.split_at(idx);
        let domain = &domain[1..];
        let visible = if local.chars().count() <= 2 { 1 } else { 2 };
        let mut out: String = local.chars().take(visible).collect();
        out.push_str("***@");
        out.push_str(domain);
        return out;
    }

    let chars: Vec<char> = value.chars().collect();

    // For short strings, show only first character
    if chars.len() <= 8 {
        return format!("{}***", chars[0]);
    }

    // Otherwise show first 4 and last 4 characters
    let start: String = chars[..4].iter().collect();
    let end: String = chars[chars.len() - 4..].iter().collect();
    format!("{}***{}", start, end)
}

/// Truncate string to maximum length (in characters)
pub fn truncate_string(input: &str, max_len: usize) -> String {
    if input.chars().count() <= max_len {
        input.to_string()
    } else {
        let kept: String = input.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Hash string using SHA-256
pub fn hash_string(input: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Parse a path identifier, naming the resource in the error message
pub fn parse_id(raw: &str, resource: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::bad_request(&format!("Invalid {} ID", resource)))
}

/// Logging helpers
pub mod logging {
    use log::{Level, LevelFilter};

    pub fn level_from_string(level: &str) -> LevelFilter {
        match level.to_lowercase().as_str() {
            "error" => LevelFilter::Error,
            "warn" => LevelFilter::Warn,
            "info" => LevelFilter::Info,
            "debug" => LevelFilter::Debug,
            "trace" => LevelFilter::Trace,
            _ => LevelFilter::Info,
        }
    }

    pub fn level_for_status(status: u16) -> Level {
        match status {
            400..=499 => Level::Warn,
            500..=599 => Level::Error,
            _ => Level::Info,
        }
    }

    pub fn log_request(
        method: &str,
        path: &str,
        status: u16,
        duration_ms: u128,
        remote_addr: &str,
    ) {
        log::log!(
            level_for_status(status),
            "{} {} {} {}ms from {}",
            method,
            path,
            status,
            duration_ms,
            remote_addr
        );
    }
}

/// Error handling utilities
pub mod error {
    use actix_web::{http::StatusCode, HttpResponse, ResponseError};
    use std::fmt;
    use tokio_postgres::error::SqlState;

    /// Flat (status, message) error raised by handlers, services and middleware.
    #[derive(Debug, Clone, PartialEq)]
    pub struct AppError {
        pub message: String,
        pub status_code: u16,
        pub errors: Vec<String>,
    }

    impl AppError {
        pub fn new(message: &str, status_code: u16) -> Self {
            Self {
                message: message.to_string(),
                status_code,
                errors: Vec::new(),
            }
        }

        pub fn bad_request(message: &str) -> Self {
            Self::new(message, 400)
        }

        pub fn unauthorized(message: &str) -> Self {
            Self::new(message, 401)
        }

        pub fn not_found(message: &str) -> Self {
            Self::new(message, 404)
        }

        pub fn payload_too_large(message: &str) -> Self {
            Self::new(message, 413)
        }

        pub fn too_many_requests(message: &str) -> Self {
            Self::new(message, 429)
        }

        pub fn internal_server_error(message: &str) -> Self {
            Self::new(message, 500)
        }

        pub fn with_errors(mut self, errors: Vec<String>) -> Self {
            self.errors = errors;
            self
        }

        pub fn is_internal(&self) -> bool {
            self.status_code >= 500
        }
    }

    impl fmt::Display for AppError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.message)
        }
    }

    impl std::error::Error for AppError {}

    impl ResponseError for AppError {
        fn status_code(&self) -> StatusCode {
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        }

        fn error_response(&self) -> HttpResponse {
            // Internal details stay in the logs
            let message = if self.is_internal() {
                "An internal error occurred"
            } else {
                self.message.as_str()
            };
            super::response::error_response(message, &self.errors, self.status_code().as_u16())
        }
    }

    impl From<tokio_postgres::Error> for AppError {
        fn from(err: tokio_postgres::Error) -> Self {
            if let Some(db_err) = err.as_db_error() {
                if *db_err.code() == SqlState::UNIQUE_VIOLATION {
                    return AppError::bad_request("Resource already exists");
                }
                if *db_err.code() == SqlState::STRING_DATA_RIGHT_TRUNCATION {
                    return AppError::bad_request("Value too long for field");
                }
                if *db_err.code() == SqlState::CHECK_VIOLATION {
                    return AppError::bad_request(&format!("Invalid data: {}", db_err.message()));
                }
            }
            AppError::internal_server_error(&format!("Database error: {}", err))
        }
    }

    impl From<deadpool_postgres::PoolError> for AppError {
        fn from(err: deadpool_postgres::PoolError) -> Self {
            AppError::internal_server_error(&format!("Database pool error: {}", err))
        }
    }

    impl From<deadpool_postgres::CreatePoolError> for AppError {
        fn from(err: deadpool_postgres::CreatePoolError) -> Self {
            AppError::internal_server_error(&format!("Database pool configuration error: {}", err))
        }
    }

    impl From<bcrypt::BcryptError> for AppError {
        fn from(err: bcrypt::BcryptError) -> Self {
            AppError::internal_server_error(&format!("Password hashing error: {}", err))
        }
    }

    impl From<jsonwebtoken::errors::Error> for AppError {
        fn from(err: jsonwebtoken::errors::Error) -> Self {
            AppError::internal_server_error(&format!("Token error: {}", err))
        }
    }

    impl From<validator::ValidationErrors> for AppError {
        fn from(err: validator::ValidationErrors) -> Self {
            let messages = flatten_validation_errors(&err);
            let message = messages.first().cloned().unwrap_or_else(|| "Validation failed".to_string());
            AppError::bad_request(&message).with_errors(messages)
        }
    }

    pub fn flatten_validation_errors(err: &validator::ValidationErrors) -> Vec<String> {
        let mut msgs = Vec::new();
        for (field, errors) in err.field_errors().iter() {
            for e in errors.iter() {
                let message = if let Some(m) = &e.message {
                    m.to_string()
                } else {
                    format!("{} {}", field, e.code)
                };
                msgs.push(message);
            }
        }
        msgs.sort();
        msgs
    }
}

/// Response helpers
pub mod response {
    use actix_web::HttpResponse;
    use serde::Serialize;

    pub fn json_response<T: Serialize>(data: T, status: u16) -> HttpResponse {
        match actix_web::http::StatusCode::from_u16(status) {
            Ok(code) => HttpResponse::build(code)
                .content_type("application/json")
                .json(data),
            Err(_) => HttpResponse::build(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR)
                .content_type("application/json")
                .json(serde_json::json!({"success": false, "error": "Invalid status code"})),
        }
    }

    pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
        json_response(data, 200)
    }

    pub fn created_response<T: Serialize>(data: T) -> HttpResponse {
        json_response(data, 201)
    }

    pub fn error_response(message: &str, errors: &[String], status: u16) -> HttpResponse {
        json_response(
            serde_json::json!({"success": false, "error": message, "errors": errors}),
            status,
        )
    }
}

const SENSITIVE_KEYS: [&str; 6] = [
    "password",
    "token",
    "access_token",
    "authorization",
    "auth",
    "email",
];

/// Mask commonly sensitive fields of a JSON detail payload.
pub fn sanitize_details(details: serde_json::Value) -> serde_json::Value {
    match details {
        serde_json::Value::Object(mut map) => {
            for key in SENSITIVE_KEYS.iter() {
                if let Some(v) = map.get_mut(*key) {
                    if let Some(s) = v.as_str() {
                        *v = serde_json::Value::String(mask_sensitive(s));
                    }
                }
            }
            serde_json::Value::Object(map)
        }
        other => serde_json::Value::String(truncate_string(&other.to_string(), 1024)),
    }
}

/// Log internal error details to database and to logger, return the inserted error ID.
pub async fn log_internal_error(
    db: Arc<DatabaseService>,
    severity: &str,
    category: &str,
    message: &str,
    details: Option<serde_json::Value>,
    request_id: Option<&str>,
    user_id: Option<Uuid>,
) -> Result<Uuid, AppError> {
    let sanitized_details = details.map(sanitize_details);

    log::error!(
        "[{}] {}: {} - details: {:?} request_id: {:?} user_id: {:?}",
        severity,
        category,
        message,
        sanitized_details,
        request_id,
        user_id
    );

    db.insert_error_log(severity, category, message, sanitized_details, request_id, user_id)
        .await
}
