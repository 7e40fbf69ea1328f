//! Top-level axum router.
//!
//! ```text
//! /health         liveness, no auth
//! /ws             websocket upgrade, token checked before upgrade
//! /api/messages   history, bearer auth
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{http::HeaderValue, middleware, routing::get, Router};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::adapters::websocket::{websocket_router, WebSocketState};

use super::health::health_check;
use super::history::history_routes;
use super::middleware::auth_middleware;

/// HTTP concerns that wrap every route.
#[derive(Debug, Clone, Default)]
pub struct HttpOptions {
    /// Allowed CORS origins. Empty allows any origin.
    pub cors_origins: Vec<String>,

    /// Upper bound on handling one HTTP request.
    pub request_timeout: Option<Duration>,
}

/// Build the full application router.
pub fn app_router(state: WebSocketState, options: &HttpOptions) -> Router {
    let api = history_routes()
        .with_state(Arc::clone(&state.relay))
        .layer(middleware::from_fn_with_state(
            state.validator.clone(),
            auth_middleware,
        ));

    let health = Router::new()
        .route("/health", get(health_check))
        .with_state(Arc::clone(&state.hub));

    let mut app = Router::new()
        .nest("/api", api)
        .merge(health)
        .merge(websocket_router().with_state(state));

    if let Some(timeout) = options.request_timeout {
        app = app.layer(TimeoutLayer::new(timeout));
    }

    app.layer(cors_layer(&options.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
