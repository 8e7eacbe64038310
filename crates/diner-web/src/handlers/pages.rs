//! Page handlers for serving HTML templates
//!
//! A page GET is the mount of its view-model: the reservation list is
//! fetched on every visit, the settings form is seeded from whatever the
//! settings view-model holds at that moment.

use crate::middleware::session_token;
use crate::reservations::ReservationListState;
use crate::session::Route;
use crate::shell::Shell;
use crate::state::AppState;
use crate::views::{ReservationView, SettingsForm};
use askama::Template;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use diner_core::DEFAULT_RESTAURANT_NAME;
use std::sync::Arc;
use tracing::error;

/// Render a template, answering 500 if rendering fails
pub(crate) fn render<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            error!(error = %err, "template rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

#[derive(Template)]
#[template(path = "login.html")]
pub(crate) struct LoginTemplate {
    title: &'static str,
    has_error: bool,
    error_message: String,
}

impl LoginTemplate {
    pub(crate) fn new(error: Option<String>) -> Self {
        Self {
            title: DEFAULT_RESTAURANT_NAME,
            has_error: error.is_some(),
            error_message: error.unwrap_or_default(),
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub(crate) struct DashboardTemplate {
    shell: Shell,
    has_error: bool,
    error_message: String,
    reservations: Vec<ReservationView>,
}

impl DashboardTemplate {
    /// Render the outcome of this request's own list call or status change
    pub(crate) async fn new(state: &AppState, outcome: ReservationListState) -> Self {
        Self {
            shell: Shell::new(&state.settings, Route::Reservations).await,
            has_error: outcome.error.is_some(),
            error_message: outcome.error.unwrap_or_default(),
            reservations: outcome
                .reservations
                .iter()
                .map(ReservationView::from)
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "settings.html")]
pub(crate) struct SettingsTemplate {
    shell: Shell,
    form: SettingsForm,
}

impl SettingsTemplate {
    pub(crate) async fn new(state: &AppState, form: SettingsForm) -> Self {
        Self {
            shell: Shell::new(&state.settings, Route::Settings).await,
            form,
        }
    }
}

/// `/`: reservation list with a session, login view without
pub async fn landing(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Redirect {
    Redirect::to(state.session.landing(session_token(&headers)).path())
}

/// Login view
pub async fn login_page() -> Response {
    render(&LoginTemplate::new(None))
}

/// Reservation list page
pub async fn dashboard(State(state): State<Arc<AppState>>) -> Response {
    let outcome = state.reservations.list().await;
    render(&DashboardTemplate::new(&state, outcome).await)
}

/// Settings form page
pub async fn settings_page(State(state): State<Arc<AppState>>) -> Response {
    let form = SettingsForm::seeded(state.settings.snapshot().await.settings.as_ref());
    render(&SettingsTemplate::new(&state, form).await)
}
