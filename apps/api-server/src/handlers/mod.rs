//! HTTP handlers and route configuration.

mod auth;
mod health;
mod log;

use actix_web::web;

use crate::middleware::auth::RequiresLogin;
use crate::middleware::error::no_route_mapped;
use crate::state::AppState;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.app_data(web::Data::new(state.clone()))
        .service(
            web::scope("/api")
                // Public routes
                .route("/health", web::get().to(health::health_check))
                .route("/log/{level}", web::post().to(log::client_log))
                .route("/login", web::post().to(auth::login))
                // Authenticated routes
                .route(
                    "/logout",
                    web::get()
                        .to(auth::logout)
                        .wrap(RequiresLogin::new(state.auth.clone())),
                )
                .route(
                    "/refresh",
                    web::get()
                        .to(auth::refresh)
                        .wrap(RequiresLogin::new(state.auth.clone())),
                )
                // Generated resources
                .configure(|cfg| state.resources.configure(cfg, &state.auth)),
        )
        .default_service(web::to(no_route_mapped));
}
