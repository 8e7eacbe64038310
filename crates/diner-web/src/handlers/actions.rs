//! Form handlers that perform mutations
//!
//! Session actions answer with a redirect. Reservation and settings
//! mutations re-render their page from the view-model, so a failure stays
//! visible on the page that caused it.

use crate::handlers::pages::{DashboardTemplate, LoginTemplate, SettingsTemplate, render};
use crate::middleware::{clear_session_cookie, session_token, set_session_cookie};
use crate::session::{Navigation, Route};
use crate::state::AppState;
use crate::views::SettingsForm;
use axum::{
    extract::{Form, Path, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Redirect, Response},
};
use diner_core::{ReservationId, ReservationStatus};
use std::sync::Arc;

fn follow(navigation: Navigation) -> Response {
    match navigation {
        Navigation::SignedIn(token) => (
            [(header::SET_COOKIE, set_session_cookie(token))],
            Redirect::to(Route::Reservations.path()),
        )
            .into_response(),
        Navigation::SignedOut => (
            [(header::SET_COOKIE, clear_session_cookie())],
            Redirect::to(Route::Login.path()),
        )
            .into_response(),
        Navigation::Stay { error } => render(&LoginTemplate::new(Some(error))),
    }
}

/// Submit the administrator credential
pub async fn login(State(state): State<Arc<AppState>>) -> Response {
    follow(state.session.login().await)
}

/// End this browser's session
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    follow(state.session.logout(session_token(&headers)).await)
}

async fn change_status(
    state: &AppState,
    id: ReservationId,
    status: ReservationStatus,
) -> Response {
    let outcome = state.reservations.set_status(id, status).await;
    render(&DashboardTemplate::new(state, outcome).await)
}

/// Confirm a pending reservation
pub async fn confirm_reservation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ReservationId>,
) -> Response {
    change_status(&state, id, ReservationStatus::Confirmed).await
}

/// Cancel a pending reservation
pub async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ReservationId>,
) -> Response {
    change_status(&state, id, ReservationStatus::Cancelled).await
}

/// Save the settings form.
///
/// The form keeps the submitted values; a failed save is not reported here.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SettingsForm>,
) -> Response {
    state.settings.update(form.to_patch()).await;
    render(&SettingsTemplate::new(&state, form).await)
}
