//! Router assembly and service-wide middleware.

use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::ApiState;

/// Build the full service router.
///
/// Production serves the API as-is; any other environment adds a CORS
/// layer for the local frontend.
pub fn router(state: ApiState) -> Router {
    let api = Router::new()
        .route(
            "/tree",
            get(handlers::tree::get_tree).post(handlers::tree::create_tree),
        )
        .route("/proof", get(handlers::proof::get_proof))
        .route("/root", get(handlers::root::get_root))
        .route("/roots", get(handlers::root::get_roots));

    let mut router = Router::new()
        .nest("/api/v1", api)
        .route("/health", get(health))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            server_version,
        ))
        .layer(TraceLayer::new_for_http());

    if !state.settings.is_production() {
        router = router.layer(dev_cors());
    }

    router.with_state(state)
}

/// GET /health: the build identifier, plain text.
async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    state.settings.git_sha.clone()
}

/// Stamp every response with the running build's identifier.
async fn server_version(State(state): State<ApiState>, request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&state.settings.git_sha) {
        response
            .headers_mut()
            .insert(HeaderName::from_static("server-version"), value);
    }
    response
}

/// CORS for the local frontend during development.
fn dev_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(HeaderValue::from_static("http://localhost:3000"))
        .allow_credentials(true)
}
