//! # HTTP API Module
//!
//! Axum-based REST API over the event log.
//!
//! ## Endpoints
//!
//! - `GET /health` - liveness probe (never authenticated)
//! - `POST /events` - append an event
//! - `GET /event/{event_id}` - fetch one event
//! - `GET /sessions` - list session summaries
//! - `GET /session/{session_id}/state` - derived state (journey/learned/artifacts)
//! - `GET /session/{session_id}/events` - filtered event listing
//!
//! ## Environment
//!
//! - `WAYFARER_API_KEY` - enable Bearer auth when set
//! - `WAYFARER_RATE_LIMIT` - requests per second (default 100, 0 disables)
//! - `WAYFARER_CORS_ORIGINS` - comma-separated origins, or `*` (default: localhost)
//! - `WAYFARER_MAX_PAYLOAD_SIZE` - request body cap in bytes (default 1 MiB)

mod auth;
mod handlers;
mod middleware;
mod types;

// Re-exported for integration tests
#[allow(unused_imports)]
pub use handlers::{
    create_event, get_event, get_session_events, get_session_state, health_handler, list_sessions,
};
#[allow(unused_imports)]
pub use types::{
    is_valid_session_id, ApiError, ErrorResponse, EventRequest, EventResponse, EventsQuery,
    HealthResponse, SessionListItem,
};

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use wayfarer_core::{EventStore, WayfarerError};

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// Shared state for all API handlers.
///
/// The store's write transactions serialize appends internally, so the
/// state is plain `Clone` with no outer lock.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<EventStore>,
}

impl AppState {
    #[must_use]
    pub fn new(store: EventStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

// =============================================================================
// ROUTER CONSTRUCTION
// =============================================================================

/// Default maximum request body size: 1 MiB.
const DEFAULT_MAX_PAYLOAD_SIZE: usize = 1024 * 1024;

fn get_max_payload_size_from_env() -> usize {
    std::env::var("WAYFARER_MAX_PAYLOAD_SIZE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_PAYLOAD_SIZE)
}

/// Build the CORS layer from `WAYFARER_CORS_ORIGINS`.
///
/// - `*` allows any origin (logged as a warning, not for production)
/// - a comma-separated list allows exactly those origins
/// - unset falls back to localhost development origins
fn build_cors_layer() -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    let headers = [header::CONTENT_TYPE, header::AUTHORIZATION];

    match std::env::var("WAYFARER_CORS_ORIGINS") {
        Ok(origins) if origins.trim() == "*" => {
            tracing::warn!(
                event = "cors_wildcard",
                "CORS configured to allow any origin"
            );
            CorsLayer::permissive()
        }
        Ok(origins) => {
            let parsed: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            if parsed.is_empty() {
                default_cors_layer(methods, headers)
            } else {
                CorsLayer::new()
                    .allow_origin(parsed)
                    .allow_methods(methods)
                    .allow_headers(headers)
            }
        }
        Err(_) => default_cors_layer(methods, headers),
    }
}

fn default_cors_layer(methods: [Method; 3], headers: [header::HeaderName; 2]) -> CorsLayer {
    let localhost: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .iter()
    .filter_map(|o| o.parse().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(localhost)
        .allow_methods(methods)
        .allow_headers(headers)
}

/// Create the API router with all routes and middleware layers.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/events", post(handlers::create_event))
        .route("/event/{event_id}", get(handlers::get_event))
        .route("/sessions", get(handlers::list_sessions))
        .route(
            "/session/{session_id}/state",
            get(handlers::get_session_state),
        )
        .route(
            "/session/{session_id}/events",
            get(handlers::get_session_events),
        );

    // Auth sits innermost so rate limiting counts rejected requests too
    if auth::get_api_key_from_env().is_some() {
        tracing::info!(event = "auth_enabled", "API key authentication enabled");
        router = router.layer(axum::middleware::from_fn(auth::api_key_auth_middleware));
    }

    let rate_limit = middleware::get_rate_limit_from_env();
    if rate_limit > 0 {
        let limiter = middleware::create_rate_limiter(rate_limit);
        router = router.layer(axum::middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    } else {
        tracing::warn!(event = "rate_limit_disabled", "Rate limiting disabled");
    }

    router
        .layer(DefaultBodyLimit::max(get_max_payload_size_from_env()))
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER ENTRY POINT
// =============================================================================

/// Bind and serve the API until the process exits.
pub async fn run_server(addr: SocketAddr, store: EventStore) -> Result<(), WayfarerError> {
    let state = AppState::new(store);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| WayfarerError::Storage(format!("failed to bind {addr}: {e}")))?;

    tracing::info!(event = "server_started", address = %addr, "Wayfarer API listening");

    axum::serve(listener, router)
        .await
        .map_err(|e| WayfarerError::Storage(format!("server error: {e}")))
}
