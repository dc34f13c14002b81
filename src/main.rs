use actix_web::{middleware as actix_middleware, web, App, HttpServer};
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{interval, Duration};

use pronet_api::auth::{AuthService, RateLimitStore};
use pronet_api::config::{AppConfig, LoggingConfig};
use pronet_api::database::DatabaseService;
use pronet_api::handlers::configure_app;
use pronet_api::middleware::*;
use pronet_api::services::{ConnectionService, JobService, PostService, ProfileService, UserService};
use pronet_api::utils;

/// File + stdout logging through flexi_logger; env_logger if that fails.
fn init_logging(config: &LoggingConfig) -> Option<flexi_logger::LoggerHandle> {
    let handle = flexi_logger::Logger::try_with_str(&config.level).and_then(|logger| {
        let file_spec = flexi_logger::FileSpec::default()
            .directory(&config.directory)
            .suppress_timestamp();
        logger
            .log_to_file(file_spec)
            .duplicate_to_stdout(flexi_logger::Duplicate::Info)
            .start()
    });

    match handle {
        Ok(handle) => Some(handle),
        Err(e) => {
            env_logger::builder()
                .filter_level(utils::logging::level_from_string(&config.level))
                .format_timestamp_secs()
                .init();
            log::warn!("File logging unavailable ({}), logging to stderr", e);
            None
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment from .env (if present)
    let _ = dotenv();

    let config = AppConfig::from_env().map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("Failed to load configuration: {}", e))
    })?;

    // Keep the handle alive for the lifetime of the server
    let _logger = init_logging(&config.logging);

    log::info!("Starting ProNet API v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Server: {}:{}", config.server.host, config.server.port);
    log::info!("Workers: {}", config.server.workers);

    let db_service = Arc::new(
        DatabaseService::new(&config.database)
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, format!("Failed to initialize database: {}", e)))?,
    );

    if config.database.run_migrations {
        if let Err(e) = db_service.init_schema().await {
            log::error!("Failed to initialize DB schema: {}", e);
        } else {
            log::info!("DB schema ensured");
        }
    }

    let auth_service = Arc::new(AuthService::new(config.auth.clone()));
    let rate_limit_store = Arc::new(Mutex::new(RateLimitStore::new()));

    let user_service = Arc::new(UserService::new(Arc::clone(&db_service), Arc::clone(&auth_service)));
    let profile_service = Arc::new(ProfileService::new(Arc::clone(&db_service)));
    let post_service = Arc::new(PostService::new(Arc::clone(&db_service)));
    let connection_service = Arc::new(ConnectionService::new(Arc::clone(&db_service)));
    let job_service = Arc::new(JobService::new(Arc::clone(&db_service)));

    // Hourly purge of expired revocations and idle rate-limit buckets
    let db_for_bg = Arc::clone(&db_service);
    let store_for_bg = Arc::clone(&rate_limit_store);
    tokio::spawn(async move {
        let mut interval = interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;

            match db_for_bg.cleanup_revoked_tokens().await {
                Ok(removed) => log::info!("Cleaned up {} expired revoked tokens", removed),
                Err(e) => {
                    log::error!("Failed to cleanup revoked tokens: {}", e);
                    let db_clone = Arc::clone(&db_for_bg);
                    let err_str = e.to_string();
                    tokio::spawn(async move {
                        let _ = utils::log_internal_error(
                            db_clone,
                            "ERROR",
                            "cleanup_revoked_tokens",
                            "Failed to cleanup revoked tokens",
                            Some(serde_json::json!({"error": err_str})),
                            None,
                            None,
                        )
                        .await;
                    });
                }
            }

            let dropped = store_for_bg.lock().await.cleanup();
            log::debug!("Dropped {} idle rate limit keys", dropped);
        }
    });

    let bind = (config.server.host.clone(), config.server.port);
    log::info!("Listening on http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        let max_body = config.security.max_request_size_bytes;

        App::new()
            // Shared data
            .app_data(web::Data::new(Arc::clone(&db_service)))
            .app_data(web::Data::new(Arc::clone(&auth_service)))
            .app_data(web::Data::new(Arc::clone(&user_service)))
            .app_data(web::Data::new(Arc::clone(&profile_service)))
            .app_data(web::Data::new(Arc::clone(&post_service)))
            .app_data(web::Data::new(Arc::clone(&connection_service)))
            .app_data(web::Data::new(Arc::clone(&job_service)))

            // Custom middleware; the last wrap runs first
            .wrap(AuthMiddleware {
                auth_service: Arc::clone(&auth_service),
                db_service: Arc::clone(&db_service),
            })
            .wrap(RateLimitMiddleware {
                store: Arc::clone(&rate_limit_store),
                max_requests: config.security.rate_limit_requests,
                window_seconds: config.security.rate_limit_window_seconds,
                auth_service: Some(Arc::clone(&auth_service)),
            })
            .wrap(RequestSizeLimitMiddleware { max_size: max_body })
            .wrap(CorsMiddleware {
                allowed_origins: config.security.cors_allowed_origins.clone(),
            })
            .wrap(SecurityHeadersMiddleware)
            .wrap(LoggingMiddleware)

            // Actix built-in middleware (outermost to avoid body type conflicts)
            .wrap(actix_middleware::Compress::default())

            .configure(|cfg| configure_app(cfg, max_body))
    })
    .bind(bind)?
    .workers(config.server.workers)
    .keep_alive(std::time::Duration::from_secs(config.server.keep_alive_seconds))
    .client_request_timeout(std::time::Duration::from_secs(config.server.client_timeout_seconds))
    .client_disconnect_timeout(std::time::Duration::from_secs(config.server.client_shutdown_seconds))
    .max_connections(config.server.max_connections)
    .run()
    .await
}
