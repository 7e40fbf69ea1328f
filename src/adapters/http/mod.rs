//! HTTP adapters - REST endpoints and cross-cutting middleware.

mod app;
mod health;
pub mod history;
pub mod middleware;

pub use app::{app_router, HttpOptions};
pub use health::{health_check, HealthResponse};
pub use history::history_routes;
