//! Route definitions and router setup
//!
//! Configures all API routes and middleware. Literal paths are registered
//! before the single-segment test-fetch wildcard; axum additionally ranks
//! exact segments above parameters at match time, so `/tests`, `/heatmap`,
//! and friends can never be shadowed by `/{testId}`.

mod analytics;
mod auth;

use crate::auth::auth_middleware;
use crate::config::Settings;
use crate::state::SharedState;
use axum::{
    http::{header, Method},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::MakeRequestUuid,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::Level;

/// Create the application router with all routes and middleware
pub fn create_router(state: SharedState, settings: &Settings) -> Router {
    // Build CORS layer
    let cors = build_cors_layer(settings);

    // Build tracing/logging layer
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Build middleware stack
    let middleware = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .layer(trace_layer)
        .layer(CompressionLayer::new())
        .layer(cors)
        .propagate_x_request_id();

    // Routes behind the bearer-token gate
    let protected = Router::new()
        .route("/create-test", post(tests::create_test))
        .route("/student-tests", get(auth::get_student_tests))
        .route("/teacher-tests", get(auth::get_teacher_tests))
        .route("/submit/{testId}", post(tests::submit_test))
        .route_layer(from_fn(auth_middleware));

    // Build the router
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Account routes
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))

        // Public test routes
        .route("/get-languages", get(tests::get_supported_languages))
        .route("/tests", get(tests::get_tests))
        .route("/heatmap", get(analytics::get_heatmap_data))
        .merge(protected)

        // Single-segment wildcard fetch: registered after every literal
        // route under the same method
        .route("/{testId}", get(tests::get_test_by_id))

        // Apply middleware and state
        .layer(middleware)
        .with_state(state)
}

/// Build CORS layer from settings
fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<_> = settings
        .cors
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .max_age(Duration::from_secs(3600))
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .max_age(Duration::from_secs(3600))
    }
}

/// Health check endpoint
async fn health_check(
    axum::extract::State(state): axum::extract::State<SharedState>,
) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "success": true,
        "message": "Server is running fine.",
        "database": state.db.name(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[cfg(test)]
mod router_tests {
    use super::*;
    use crate::auth::{create_tokens, Role};
    use crate::config::{CorsConfig, DatabaseConfig, GradingConfig, ServerConfig, Settings};
    use crate::state::AppState;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use mongodb::bson::oid::ObjectId;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Points at nothing. The driver connects lazily, so the router builds
    /// fine; any handler that actually queries fails fast with a server
    /// selection error, which makes handler identity observable without a
    /// live database.
    const UNREACHABLE_URI: &str =
        "mongodb://127.0.0.1:9/?serverSelectionTimeoutMS=100&connectTimeoutMS=100";

    async fn app() -> Router {
        let client = mongodb::Client::with_uri_str(UNREACHABLE_URI).await.unwrap();
        let state = Arc::new(AppState::new(
            client.database("testforge_test"),
            &GradingConfig::default(),
        ));
        let settings = Settings {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                uri: UNREACHABLE_URI.to_string(),
                database: "testforge_test".to_string(),
            },
            cors: CorsConfig::default(),
            grading: GradingConfig::default(),
        };
        create_router(state, &settings)
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().await.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn bearer(role: Role) -> String {
        let tokens = create_tokens(ObjectId::new(), "router-test@example.com", role).unwrap();
        format!("Bearer {}", tokens.access_token)
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, body) = send(get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_get_languages_is_not_captured_by_the_wildcard() {
        // "get-languages" is a syntactically valid single segment; had the
        // wildcard fetch captured it, the response would be the 400
        // invalid-id error instead of the registry listing
        let (status, body) = send(get_request("/get-languages")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!(["python3", "javascript"]));
    }

    #[tokio::test]
    async fn test_tests_listing_reaches_its_own_handler() {
        let (status, body) = send(get_request("/tests")).await;
        // the listing handler queries the (unreachable) store; the wildcard
        // handler would instead have rejected "tests" as a malformed id
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "DATABASE_ERROR");
    }

    #[tokio::test]
    async fn test_heatmap_reaches_its_own_handler() {
        let (status, body) = send(get_request("/heatmap")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "DATABASE_ERROR");
    }

    #[tokio::test]
    async fn test_wildcard_fetch_rejects_a_malformed_id() {
        let (status, body) = send(get_request("/definitely-not-an-object-id")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["message"].as_str().unwrap().contains("Invalid test id"));
    }

    #[tokio::test]
    async fn test_wildcard_fetch_accepts_a_well_formed_id() {
        let id = ObjectId::new().to_hex();
        let (status, body) = send(get_request(&format!("/{}", id))).await;
        // reaches the fetch handler, which goes on to query the store
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "DATABASE_ERROR");
    }

    #[tokio::test]
    async fn test_protected_routes_require_a_token() {
        for (method, uri) in [
            ("POST", "/create-test"),
            ("GET", "/student-tests"),
            ("GET", "/teacher-tests"),
            ("POST", "/submit/abc123"),
        ] {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let (status, body) = send(request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
            assert_eq!(body["code"], "UNAUTHORIZED");
        }
    }

    #[tokio::test]
    async fn test_submit_extracts_the_test_id_parameter() {
        let request = Request::builder()
            .method("POST")
            .uri("/submit/abc123")
            .header(header::AUTHORIZATION, bearer(Role::Student))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({
                    "answers": [{ "source_code": "def solution(x):\n    return x" }]
                })
                .to_string(),
            ))
            .unwrap();
        let (status, body) = send(request).await;
        // the handler saw the raw path parameter and rejected it as an id
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("abc123"));
    }

    #[tokio::test]
    async fn test_submit_requires_the_student_role() {
        let request = Request::builder()
            .method("POST")
            .uri(format!("/submit/{}", ObjectId::new().to_hex()))
            .header(header::AUTHORIZATION, bearer(Role::Teacher))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({ "answers": [{ "source_code": "x" }] }).to_string(),
            ))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_create_test_validates_before_touching_the_store() {
        let request = Request::builder()
            .method("POST")
            .uri("/create-test")
            .header(header::AUTHORIZATION, bearer(Role::Teacher))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({
                    "title": "Sorting basics",
                    "language": "cobol",
                    "questions": [{
                        "prompt": "Sort the list ascending",
                        "test_cases": [{ "input": "[2, 1]", "expected_output": "[1, 2]" }]
                    }]
                })
                .to_string(),
            ))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("Unsupported language"));
    }

    #[tokio::test]
    async fn test_unmatched_requests_fall_through_to_framework_defaults() {
        // path exists under GET only
        let request = Request::builder()
            .method("POST")
            .uri("/tests")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        // multi-segment paths match nothing, wildcard included
        let (status, _) = send(get_request("/foo/bar/baz")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
