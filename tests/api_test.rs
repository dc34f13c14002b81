#[macro_use]
mod common;

#[cfg(test)]
mod tests {
    use actix_web::http::{header, StatusCode};
    use actix_web::test;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    use pronet_api::models::User;

    use crate::common::{call_json, unreachable_db, TestState};

    fn state() -> TestState {
        TestState::new(unreachable_db(), 1_000)
    }

    #[actix_rt::test]
    async fn root_and_health_are_public() {
        let state = state();
        let app = init_app!(state);

        let req = test::TestRequest::get().uri("/").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "API is running...");

        let req = test::TestRequest::get().uri("/health").to_request();
        let (status, body) = call_json(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let req = test::TestRequest::get().uri("/api/v1/status").to_request();
        let (status, body) = call_json(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_rt::test]
    async fn responses_carry_security_headers() {
        let state = state();
        let app = init_app!(state);

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        let headers = resp.headers();
        assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
        assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
        assert!(headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
        assert!(headers.contains_key("x-request-id"));
    }

    #[actix_rt::test]
    async fn protected_route_without_token_is_401() {
        let state = state();
        let app = init_app!(state);

        let req = test::TestRequest::get().uri("/api/v1/auth/me").to_request();
        let (status, body) = call_json(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Not authorized, no token");

        let req = test::TestRequest::post()
            .uri("/api/v1/jobs")
            .set_json(json!({"company": "Initech"}))
            .to_request();
        let (status, _) = call_json(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn garbage_token_is_401() {
        let state = state();
        let app = init_app!(state);

        let req = test::TestRequest::get()
            .uri("/api/v1/posts")
            .insert_header((header::AUTHORIZATION, "Bearer not.a.jwt"))
            .to_request();
        let (status, body) = call_json(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Not authorized, token failed");
    }

    #[actix_rt::test]
    async fn register_requires_name_email_and_password() {
        let state = state();
        let app = init_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({"name": "Ada", "email": "ada@example.com"}))
            .to_request();
        let (status, body) = call_json(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Please provide name, email, and password");
    }

    #[actix_rt::test]
    async fn register_rejects_malformed_email() {
        let state = state();
        let app = init_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({"name": "Ada", "email": "not-an-email", "password": "CorrectHorse1"}))
            .to_request();
        let (status, body) = call_json(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid email format");
        assert!(body["errors"].as_array().map(|e| !e.is_empty()).unwrap_or(false));
    }

    #[actix_rt::test]
    async fn register_validates_the_trimmed_email() {
        let state = state();
        let app = init_app!(state);

        // Padded email is fine once trimmed; only the short password is reported
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({"name": "Ada", "email": "  Ada@Example.com ", "password": "short"}))
            .to_request();
        let (status, body) = call_json(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Password must be 8-128 characters");
        assert_eq!(body["errors"], json!(["Password must be 8-128 characters"]));
    }

    #[actix_rt::test]
    async fn login_requires_email_and_password() {
        let state = state();
        let app = init_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({"email": "ada@example.com"}))
            .to_request();
        let (status, body) = call_json(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Please provide an email and password");
    }

    #[actix_rt::test]
    async fn malformed_json_is_400() {
        let state = state();
        let app = init_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request();
        let (status, body) = call_json(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[actix_rt::test]
    async fn malformed_ids_are_400() {
        let state = state();
        let app = init_app!(state);

        let req = test::TestRequest::get().uri("/api/v1/jobs/not-a-uuid").to_request();
        let (status, body) = call_json(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid job ID");

        let req = test::TestRequest::get().uri("/api/v1/profiles/user/42").to_request();
        let (status, body) = call_json(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid user ID");
    }

    #[actix_rt::test]
    async fn unknown_path_is_404_without_token() {
        let state = state();
        let app = init_app!(state);

        let req = test::TestRequest::get().uri("/api/v1/nope").to_request();
        let (status, body) = call_json(&app, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not Found - /api/v1/nope");

        // Known protected routes still demand a token
        let req = test::TestRequest::get().uri("/api/v1/connections/pending").to_request();
        let (status, _) = call_json(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn preflight_is_answered_by_cors() {
        let state = state();
        let app = init_app!(state);

        let req = test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/api/v1/posts")
            .insert_header((header::ORIGIN, "https://app.example.com"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://app.example.com"
        );
    }

    #[actix_rt::test]
    async fn oversized_body_is_413() {
        let state = state();
        let app = init_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload(vec![b'a'; crate::common::MAX_BODY + 1])
            .to_request();
        let (status, body) = call_json(&app, req).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["success"], false);
    }

    #[actix_rt::test]
    async fn rate_limit_yields_429() {
        let state = TestState::new(unreachable_db(), 2);
        let app = init_app!(state);

        for _ in 0..2 {
            let req = test::TestRequest::get().uri("/health").to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get().uri("/health").to_request();
        let (status, body) = call_json(&app, req).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["success"], false);
    }

    #[actix_rt::test]
    async fn internal_errors_are_masked() {
        let state = state();
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: String::new(),
            headline: None,
            profile_picture: None,
            connections: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let token = state.auth.generate_token(&user).unwrap().token;
        let app = init_app!(state);

        // Valid token, but the database is unreachable
        let req = test::TestRequest::get()
            .uri("/api/v1/auth/me")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let (status, body) = call_json(&app, req).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "An internal error occurred");
    }
}
