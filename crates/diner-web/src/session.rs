//! Session Gate: login, logout and the landing redirect

use crate::settings::SettingsStore;
use diner_backend::Backend;
use diner_core::Credentials;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Pages of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Login view
    Login,
    /// Reservation list
    Reservations,
    /// Restaurant settings form
    Settings,
}

impl Route {
    /// URL path of the page
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Reservations => "/dashboard",
            Self::Settings => "/settings",
        }
    }
}

/// Opaque identifier of one browser's session, carried in a cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(Uuid);

impl SessionToken {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a token as written by [`Display`](fmt::Display)
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(Self)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Outcome of a session action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The browser now holds `token`; continue to the reservation list
    SignedIn(SessionToken),
    /// The browser's session is gone; continue to the login view
    SignedOut,
    /// Remain on the login view and show `error`
    Stay {
        /// Message reported by the identity provider
        error: String,
    },
}

impl Navigation {
    /// Page the client moves to, `None` when it stays
    #[must_use]
    pub const fn route(&self) -> Option<Route> {
        match self {
            Self::SignedIn(_) => Some(Route::Reservations),
            Self::SignedOut => Some(Route::Login),
            Self::Stay { .. } => None,
        }
    }
}

/// Authenticates the administrator against the identity provider.
///
/// The provider session is shared by the process; each browser that logged
/// in holds its own token, and only those browsers count as signed in. The
/// provider session ends when the last browser logs out.
pub struct SessionGate {
    backend: Arc<dyn Backend>,
    credentials: Credentials,
    settings: Arc<SettingsStore>,
    browsers: Mutex<HashSet<SessionToken>>,
}

impl fmt::Debug for SessionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionGate")
            .field("backend", &self.backend.name())
            .field("credentials", &self.credentials)
            .field("browsers", &self.browsers.lock().len())
            .finish()
    }
}

impl SessionGate {
    /// Create a gate that submits `credentials` on every login
    #[must_use]
    pub fn new(
        backend: Arc<dyn Backend>,
        credentials: Credentials,
        settings: Arc<SettingsStore>,
    ) -> Self {
        Self {
            backend,
            credentials,
            settings,
            browsers: Mutex::new(HashSet::new()),
        }
    }

    /// Submit the administrator credential.
    ///
    /// On success the settings are fetched again for the new session and the
    /// browser gets a fresh token.
    pub async fn login(&self) -> Navigation {
        match self.backend.sign_in(&self.credentials).await {
            Ok(()) => {
                let token = SessionToken::generate();
                let browsers = {
                    let mut browsers = self.browsers.lock();
                    browsers.insert(token);
                    browsers.len()
                };
                info!(email = %self.credentials.email, browsers, "administrator logged in");
                self.settings.fetch().await;
                Navigation::SignedIn(token)
            }
            Err(err) => {
                warn!(error = %err, "login rejected");
                Navigation::Stay {
                    error: err.to_string(),
                }
            }
        }
    }

    /// End the session of the browser holding `token`.
    ///
    /// Always lands on the login view. The provider is signed out once no
    /// browser holds a token any more.
    pub async fn logout(&self, token: Option<SessionToken>) -> Navigation {
        let last = {
            let mut browsers = self.browsers.lock();
            if let Some(token) = token {
                browsers.remove(&token);
            }
            browsers.is_empty()
        };

        if !last {
            debug!("other browsers still signed in, keeping provider session");
            return Navigation::SignedOut;
        }

        match self.backend.sign_out().await {
            Ok(()) => info!("administrator logged out"),
            Err(err) => warn!(error = %err, "sign-out failed, session dropped locally"),
        }
        Navigation::SignedOut
    }

    /// Whether the browser holding `token` is signed in
    #[must_use]
    pub fn has_session(&self, token: Option<SessionToken>) -> bool {
        token.is_some_and(|token| self.browsers.lock().contains(&token))
            && self.backend.has_session()
    }

    /// Where `/` leads for the browser holding `token`
    #[must_use]
    pub fn landing(&self, token: Option<SessionToken>) -> Route {
        if self.has_session(token) {
            Route::Reservations
        } else {
            Route::Login
        }
    }
}
