//! Liveness endpoint.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::adapters::websocket::ConnectionHub;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub connections: usize,
}

/// GET /health
pub async fn health_check(State(hub): State<Arc<ConnectionHub>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connections: hub.connection_count().await,
    })
}
