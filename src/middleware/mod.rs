use actix_web::{
    body::BoxBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, Method},
    web, Error, HttpMessage, HttpResponse,
};

use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::auth::{extract_token_from_request, is_public_route, AuthService, AuthenticatedUser, RateLimitStore};
use crate::database::DatabaseService;
use crate::utils;
use crate::utils::error::AppError;

fn reject(req: ServiceRequest, err: AppError) -> ServiceResponse<BoxBody> {
    // from_error keeps the AppError attached for the logging middleware
    req.into_response(HttpResponse::from_error(err))
}

/// Authentication middleware (`protect`)
pub struct AuthMiddleware {
    pub auth_service: Arc<AuthService>,
    pub db_service: Arc<DatabaseService>,
}

impl<S> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error>,
    S: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Arc::new(service),
            auth_service: Arc::clone(&self.auth_service),
            db_service: Arc::clone(&self.db_service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Arc<S>,
    auth_service: Arc<AuthService>,
    db_service: Arc<DatabaseService>,
}

impl<S> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error>,
    S: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Arc::clone(&self.service);
        let auth_service = Arc::clone(&self.auth_service);
        let db_service = Arc::clone(&self.db_service);

        Box::pin(async move {
            // Unrouted paths fall through to the JSON 404 handler
            if is_public_route(req.method(), req.path()) || req.match_pattern().is_none() {
                return service.call(req).await;
            }

            let token = match extract_token_from_request(&req) {
                Some(token) => token,
                None => return Ok(reject(req, AppError::unauthorized("Not authorized, no token"))),
            };

            let claims = match auth_service.validate_token(&token) {
                Ok(claims) => claims,
                Err(e) => {
                    log::debug!("Token rejected: {}", e);
                    return Ok(reject(req, AppError::unauthorized("Not authorized, token failed")));
                }
            };

            // Check revocation list by JTI
            match db_service.is_token_revoked(&claims.jti).await {
                Ok(false) => {}
                Ok(true) => return Ok(reject(req, AppError::unauthorized("Not authorized, token failed"))),
                Err(e) => return Ok(reject(req, e)),
            }

            let user_id = match Uuid::parse_str(&claims.sub) {
                Ok(id) => id,
                Err(_) => return Ok(reject(req, AppError::unauthorized("Not authorized, token failed"))),
            };

            let user = match db_service.get_user_by_id(&user_id).await {
                Ok(Some(user)) => user,
                Ok(None) => return Ok(reject(req, AppError::unauthorized("Not authorized, user not found"))),
                Err(e) => return Ok(reject(req, e)),
            };

            req.extensions_mut().insert(AuthenticatedUser { user, claims });
            service.call(req).await
        })
    }
}

/// CORS middleware
pub struct CorsMiddleware {
    pub allowed_origins: Vec<String>,
}

impl<S> Transform<S, ServiceRequest> for CorsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error>,
    S: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = CorsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CorsMiddlewareService {
            service: Arc::new(service),
            allowed_origins: self.allowed_origins.clone(),
        }))
    }
}

pub struct CorsMiddlewareService<S> {
    service: Arc<S>,
    allowed_origins: Vec<String>,
}

fn apply_cors_headers(res: &mut ServiceResponse<BoxBody>, allowed_origins: &[String]) {
    let origin_header = res.request().headers().get(header::ORIGIN).cloned();
    let headers = res.headers_mut();

    if let Some(origin) = origin_header {
        if let Ok(origin_str) = origin.to_str() {
            if allowed_origins.iter().any(|o| o == "*" || o == origin_str) {
                headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
                headers.insert(header::VARY, header::HeaderValue::from_static("Origin"));
            }
        }
    }

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        header::HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        header::HeaderValue::from_static("Content-Type, Authorization, X-Requested-With"),
    );

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        header::HeaderValue::from_static("true"),
    );
}

impl<S> Service<ServiceRequest> for CorsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error>,
    S: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Arc::clone(&self.service);
        let allowed_origins = self.allowed_origins.clone();

        Box::pin(async move {
            // Preflight is answered here and never reaches the routes
            if *req.method() == Method::OPTIONS {
                let mut res = req.into_response(
                    HttpResponse::NoContent()
                        .insert_header((header::ACCESS_CONTROL_MAX_AGE, "86400"))
                        .finish(),
                );
                apply_cors_headers(&mut res, &allowed_origins);
                return Ok(res);
            }

            let mut res = service.call(req).await?;
            apply_cors_headers(&mut res, &allowed_origins);
            Ok(res)
        })
    }
}

/// Rate limiting middleware
pub struct RateLimitMiddleware {
    pub store: Arc<Mutex<RateLimitStore>>,
    pub max_requests: u32,
    pub window_seconds: u64,
    pub auth_service: Option<Arc<AuthService>>,
}

impl<S> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error>,
    S: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Arc::new(service),
            store: Arc::clone(&self.store),
            max_requests: self.max_requests,
            window_seconds: self.window_seconds,
            auth_service: self.auth_service.clone(),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Arc<S>,
    store: Arc<Mutex<RateLimitStore>>,
    max_requests: u32,
    window_seconds: u64,
    auth_service: Option<Arc<AuthService>>,
}

impl<S> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error>,
    S: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Arc::clone(&self.service);
        let store = Arc::clone(&self.store);
        let max_requests = self.max_requests;
        let window_seconds = self.window_seconds;
        let auth_service = self.auth_service.clone();

        Box::pin(async move {
            let ip = req.connection_info().peer_addr()
                .unwrap_or("unknown")
                .to_string();

            // Prefer the user id from a valid token; otherwise a digest of the token
            let key = match extract_token_from_request(&req) {
                Some(token) => {
                    let subject = auth_service
                        .as_ref()
                        .and_then(|auth| auth.validate_token(&token).ok())
                        .map(|claims| format!("user:{}", claims.sub));
                    match subject {
                        Some(subject) => format!("{}|ip:{}", subject, ip),
                        None => format!("token:{}|ip:{}", &utils::hash_string(&token)[..16], ip),
                    }
                }
                None => ip,
            };

            let allowed = store.lock().await.is_allowed(&key, max_requests, window_seconds);
            if !allowed {
                log::warn!("Rate limit exceeded for {}", utils::mask_sensitive(&key));
                return Ok(reject(req, AppError::too_many_requests("Too many requests, please try again later")));
            }

            service.call(req).await
        })
    }
}

/// Request size limiting middleware
pub struct RequestSizeLimitMiddleware {
    pub max_size: usize,
}

impl<S> Transform<S, ServiceRequest> for RequestSizeLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error>,
    S: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestSizeLimitMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestSizeLimitMiddlewareService {
            service: Arc::new(service),
            max_size: self.max_size,
        }))
    }
}

pub struct RequestSizeLimitMiddlewareService<S> {
    service: Arc<S>,
    max_size: usize,
}

impl<S> Service<ServiceRequest> for RequestSizeLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error>,
    S: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Arc::clone(&self.service);
        let max_size = self.max_size;

        Box::pin(async move {
            // Bodies without Content-Length are capped by JsonConfig
            let declared = req
                .headers()
                .get(header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<usize>().ok());

            if let Some(length) = declared {
                if length > max_size {
                    let message = format!("Request size {} exceeds maximum allowed size {}", length, max_size);
                    return Ok(reject(req, AppError::payload_too_large(&message)));
                }
            }

            service.call(req).await
        })
    }
}

/// Security headers middleware
pub struct SecurityHeadersMiddleware;

impl<S> Transform<S, ServiceRequest> for SecurityHeadersMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error>,
    S: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = SecurityHeadersMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SecurityHeadersMiddlewareService {
            service: Arc::new(service),
        }))
    }
}

pub struct SecurityHeadersMiddlewareService<S> {
    service: Arc<S>,
}

impl<S> Service<ServiceRequest> for SecurityHeadersMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error>,
    S: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Arc::clone(&self.service);

        Box::pin(async move {
            let mut res = service.call(req).await?;

            let headers = res.headers_mut();
            let pairs = [
                (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
                (header::X_FRAME_OPTIONS, "DENY"),
                (header::X_XSS_PROTECTION, "0"),
                (header::STRICT_TRANSPORT_SECURITY, "max-age=31536000; includeSubDomains"),
                (header::REFERRER_POLICY, "no-referrer"),
                (header::X_DNS_PREFETCH_CONTROL, "off"),
                (header::CONTENT_SECURITY_POLICY, "default-src 'none'; frame-ancestors 'none'"),
            ];
            for (name, value) in pairs {
                headers.insert(name, header::HeaderValue::from_static(value));
            }
            headers.insert(
                header::HeaderName::from_static("cross-origin-resource-policy"),
                header::HeaderValue::from_static("same-origin"),
            );

            Ok(res)
        })
    }
}

/// Logging middleware; 5xx responses are also persisted to `error_logs`
pub struct LoggingMiddleware;

impl<S> Transform<S, ServiceRequest> for LoggingMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error>,
    S: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = LoggingMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoggingMiddlewareService {
            service: Arc::new(service),
        }))
    }
}

pub struct LoggingMiddlewareService<S> {
    service: Arc<S>,
}

impl<S> Service<ServiceRequest> for LoggingMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error>,
    S: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Arc::clone(&self.service);
        let start_time = std::time::Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let remote_addr = req.connection_info().peer_addr().unwrap_or("unknown").to_string();
        let request_id = Uuid::new_v4().to_string();
        let db = req
            .app_data::<web::Data<Arc<DatabaseService>>>()
            .map(|data| Arc::clone(data.get_ref()));

        Box::pin(async move {
            let result = service.call(req).await;
            let duration = start_time.elapsed().as_millis();

            let mut res = match result {
                Ok(res) => res,
                Err(err) => {
                    log::error!("Request failed: {} {} {} {}ms from {}", method, path, err, duration, remote_addr);
                    return Err(err);
                }
            };

            let status = res.status().as_u16();
            utils::logging::log_request(&method, &path, status, duration, &remote_addr);

            if status >= 500 {
                let cause = res
                    .response()
                    .error()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "Unhandled server error".to_string());
                let user_id = res.request().extensions().get::<AuthenticatedUser>().map(|u| u.id());

                if let Some(db) = db {
                    let request_id = request_id.clone();
                    tokio::spawn(async move {
                        let details = serde_json::json!({"method": method, "path": path, "status": status});
                        if let Err(e) = utils::log_internal_error(
                            db,
                            "ERROR",
                            "http_request",
                            &cause,
                            Some(details),
                            Some(&request_id),
                            user_id,
                        )
                        .await
                        {
                            log::error!("Failed to persist error log: {}", e);
                        }
                    });
                } else {
                    log::error!("[{}] {}", request_id, cause);
                }
            }

            if let Ok(value) = header::HeaderValue::from_str(&request_id) {
                res.headers_mut().insert(header::HeaderName::from_static("x-request-id"), value);
            }

            Ok(res)
        })
    }
}
