use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub max_connections: usize,
    // Keep-alive duration in seconds
    pub keep_alive_seconds: u64,
    // Client timeout for reading payload/body in seconds
    pub client_timeout_seconds: u64,
    // Client shutdown timeout in seconds
    pub client_shutdown_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: usize,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_allowed_origins: Vec<String>,
    pub rate_limit_requests: u32,
    pub rate_limit_window_seconds: u64,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
}

/// Read `key` from the environment, falling back to `default`, and parse it.
fn parse_var<T: FromStr>(key: &str, default: &str) -> Result<T, String> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|_| format!("{} must be a valid number, got '{}'", key, raw))
}

fn required_var(key: &str) -> Result<String, String> {
    env::var(key).map_err(|_| format!("{} must be set", key))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: parse_var("PORT", "5000")?,
                workers: parse_var("WORKERS", "4")?,
                max_connections: parse_var("MAX_CONNECTIONS", "1000")?,
                keep_alive_seconds: parse_var("KEEP_ALIVE_SECONDS", "75")?,
                client_timeout_seconds: parse_var("CLIENT_TIMEOUT_SECONDS", "30")?,
                client_shutdown_seconds: parse_var("CLIENT_SHUTDOWN_SECONDS", "5")?,
            },
            database: DatabaseConfig {
                url: required_var("DATABASE_URL")?,
                max_connections: parse_var("DB_MAX_CONNECTIONS", "10")?,
                run_migrations: env::var("DB_RUN_MIGRATIONS")
                    .map(|v| v.to_lowercase() != "false")
                    .unwrap_or(true),
            },
            auth: AuthConfig {
                jwt_secret: required_var("JWT_SECRET")?,
                jwt_expiration_hours: parse_var("JWT_EXPIRATION_HOURS", "720")?,
                bcrypt_cost: parse_var("BCRYPT_COST", "10")?,
            },
            security: SecurityConfig {
                cors_allowed_origins: split_list(
                    &env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()),
                ),
                rate_limit_requests: parse_var("RATE_LIMIT_REQUESTS", "100")?,
                rate_limit_window_seconds: parse_var("RATE_LIMIT_WINDOW_SECONDS", "60")?,
                max_request_size_bytes: parse_var("MAX_REQUEST_SIZE_BYTES", "16384")?, // 16KB
            },
            logging: LoggingConfig {
                level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                directory: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            },
        })
    }
}
