//! API Routes
//!
//! Configures the Axum router with the upload and download endpoints.

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    download_handler, missing_id_handler, not_found_handler, upload_handler, AppState,
};

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /upload` - Store a JSON payload
/// - `GET /download/*path` - Fetch a payload by id (last path segment)
/// - `GET /download/` - Always 404, there is no id to look up
/// - `OPTIONS *` - CORS preflight, always 204
/// - anything else - 404 with the repository URL
///
/// # Middleware
/// - CORS: Allows any origin
/// - Body limit: The upload limit; the upload handler turns overruns into 413
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/upload", post(upload_handler).fallback(not_found_handler))
        .route(
            "/download/",
            get(missing_id_handler).fallback(not_found_handler),
        )
        .route(
            "/download/*path",
            get(download_handler).fallback(not_found_handler),
        )
        .fallback(not_found_handler)
        .layer(cors)
        .layer(middleware::from_fn(preflight))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Answers every OPTIONS request with 204 and permissive CORS headers.
async fn preflight(request: Request, next: Next) -> Response {
    if request.method() != Method::OPTIONS {
        return next.run(request).await;
    }

    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOWED_HEADERS),
        ],
    )
        .into_response()
}
