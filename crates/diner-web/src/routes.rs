//! Route definitions for the web interface

use crate::{
    handlers::{actions, health, pages},
    middleware::require_session,
    state::AppState,
};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

/// Pages that need a session
fn protected_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboard", get(pages::dashboard))
        .route(
            "/settings",
            get(pages::settings_page).post(actions::update_settings),
        )
        .route(
            "/reservations/:id/confirm",
            post(actions::confirm_reservation),
        )
        .route("/reservations/:id/cancel", post(actions::cancel_reservation))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(state),
            require_session,
        ))
}

/// Build the complete web application router
pub fn build_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(pages::landing))
        .route("/login", get(pages::login_page).post(actions::login))
        .route("/logout", post(actions::logout))
        .route("/health", get(health::health_check))
        .merge(protected_routes(state))
}
