//! Session cookie and the guard for the logged-in pages

use crate::{
    session::{Route, SessionToken},
    state::AppState,
};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::debug;

/// Cookie carrying the browser's session token
pub const SESSION_COOKIE: &str = "diner_session";

/// Token from the request's `Cookie` headers, if present and well formed
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<SessionToken> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| SessionToken::parse(value))
}

/// `Set-Cookie` value handing `token` to the browser
#[must_use]
pub fn set_session_cookie(token: SessionToken) -> HeaderValue {
    cookie_header(&format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax"
    ))
}

/// `Set-Cookie` value removing the session cookie
#[must_use]
pub fn clear_session_cookie() -> HeaderValue {
    cookie_header(&format!(
        "{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
    ))
}

// Cookie values are built from a hex token and ASCII literals only.
fn cookie_header(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Send requests without a session to the login view
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    if state.session.has_session(session_token(&headers)) {
        return next.run(request).await;
    }

    debug!(path = %request.uri().path(), "no session, redirecting to login");
    Redirect::to(Route::Login.path()).into_response()
}
