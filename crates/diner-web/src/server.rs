//! Web server setup and configuration

use crate::{routes::build_routes, state::AppState};
use axum::Router;
use diner_backend::Backend;
use diner_core::Config;
use std::sync::Arc;

/// Build the state and the complete web application
pub fn build_app(config: Config, backend: Arc<dyn Backend>) -> (Arc<AppState>, Router) {
    let state = Arc::new(AppState::new(config, backend));
    let router = build_routes(&state).with_state(Arc::clone(&state));
    (state, router)
}
