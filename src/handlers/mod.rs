use actix_web::error::JsonPayloadError;
use actix_web::{web, HttpRequest, HttpResponse};

use crate::models::ApiResponse;
use crate::utils;
use crate::utils::error::AppError;

pub mod auth;
pub mod connections;
pub mod jobs;
pub mod posts;
pub mod profiles;

/// Root endpoint
pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("API is running...")
}

/// Health check endpoint
pub async fn health_check() -> HttpResponse {
    utils::response::success_response(ApiResponse::success("Server is healthy"))
}

/// Server status endpoint
pub async fn server_status() -> HttpResponse {
    let status = serde_json::json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    });
    utils::response::success_response(ApiResponse::success(status))
}

/// Fallback for unknown routes
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, AppError> {
    Err(AppError::not_found(&format!("Not Found - {}", req.path())))
}

/// JSON extractor settings: body limit and malformed payloads as 400s
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            let app_err = match &err {
                JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
                    AppError::payload_too_large("Request body is too large")
                }
                JsonPayloadError::ContentType => {
                    AppError::bad_request("Content-Type must be application/json")
                }
                _ => AppError::bad_request(&format!("Invalid JSON payload: {}", err)),
            };
            app_err.into()
        })
}

/// Register the full route table
pub fn configure_app(cfg: &mut web::ServiceConfig, max_body_bytes: usize) {
    cfg.app_data(json_config(max_body_bytes))
        .route("/", web::get().to(index))
        .route("/health", web::get().to(health_check))
        .service(
            web::scope("/api/v1")
                .route("/status", web::get().to(server_status))
                .service(
                    web::scope("/auth")
                        .route("/register", web::post().to(auth::register_user))
                        .route("/login", web::post().to(auth::login_user))
                        .route("/me", web::get().to(auth::get_me))
                        .route("/logout", web::post().to(auth::logout_user)),
                )
                .service(
                    web::scope("/profiles")
                        .route("", web::get().to(profiles::list_profiles))
                        .route("/me", web::get().to(profiles::get_my_profile))
                        .route("/me", web::post().to(profiles::upsert_my_profile))
                        .route("/user/{user_id}", web::get().to(profiles::get_profile_by_user))
                        .route("/experience", web::put().to(profiles::add_experience))
                        .route("/experience/{exp_id}", web::delete().to(profiles::remove_experience))
                        .route("/education", web::put().to(profiles::add_education))
                        .route("/education/{edu_id}", web::delete().to(profiles::remove_education)),
                )
                .service(
                    web::scope("/posts")
                        .route("", web::post().to(posts::create_post))
                        .route("", web::get().to(posts::list_posts))
                        .route("/like/{id}", web::put().to(posts::like_post))
                        .route("/unlike/{id}", web::put().to(posts::unlike_post))
                        .route("/comment/{id}", web::post().to(posts::add_comment))
                        .route("/comment/{id}/{comment_id}", web::delete().to(posts::remove_comment))
                        .route("/{id}", web::get().to(posts::get_post))
                        .route("/{id}", web::delete().to(posts::delete_post)),
                )
                .service(
                    web::scope("/connections")
                        .route("", web::get().to(connections::list_connections))
                        .route("/pending", web::get().to(connections::pending_requests))
                        .route("/request/{recipient_id}", web::post().to(connections::send_request))
                        .route("/accept/{request_id}", web::put().to(connections::accept_request))
                        .route("/decline/{request_id}", web::put().to(connections::decline_request))
                        .route("/remove/{user_id}", web::delete().to(connections::remove_connection)),
                )
                .service(
                    web::scope("/jobs")
                        .route("", web::post().to(jobs::create_job))
                        .route("", web::get().to(jobs::list_jobs))
                        .route("/{id}", web::get().to(jobs::get_job))
                        .route("/{id}", web::put().to(jobs::update_job))
                        .route("/{id}", web::delete().to(jobs::delete_job))
                        .route("/{id}/apply", web::post().to(jobs::apply_for_job)),
                ),
        )
        .default_service(web::to(not_found));
}
