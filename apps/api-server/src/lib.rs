//! # Restgate API Server
//!
//! Actix-web application: authentication endpoints, generated resource
//! routes and the error rendering pipeline.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod resources;
pub mod state;
pub mod telemetry;

use actix_web::web;

pub use config::AppConfig;
pub use state::AppState;

/// Register app data, every route and the no-route handler.
///
/// The app must be wrapped with `ApiErrorHandler` inside `RequestIdMiddleware`.
pub fn configure_app(cfg: &mut web::ServiceConfig, state: &AppState) {
    handlers::configure_routes(cfg, state);
}
