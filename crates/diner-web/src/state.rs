//! Application state management

use crate::{reservations::ReservationList, session::SessionGate, settings::SettingsStore};
use diner_backend::Backend;
use diner_core::Config;
use std::fmt;
use std::sync::Arc;

/// Application state holding configuration and the view-models
pub struct AppState {
    /// Application configuration
    pub config: Config,
    /// External store client shared by every view-model
    pub backend: Arc<dyn Backend>,
    /// Login and logout
    pub session: SessionGate,
    /// Reservation list view-model
    pub reservations: ReservationList,
    /// Settings view-model, also read by the shell
    pub settings: Arc<SettingsStore>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("backend", &self.backend.name())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create the state, wiring every view-model to `backend`
    #[must_use]
    pub fn new(config: Config, backend: Arc<dyn Backend>) -> Self {
        let settings = Arc::new(SettingsStore::new(Arc::clone(&backend)));
        let session = SessionGate::new(
            Arc::clone(&backend),
            config.admin.credentials(),
            Arc::clone(&settings),
        );
        let reservations = ReservationList::new(Arc::clone(&backend));

        Self {
            config,
            backend,
            session,
            reservations,
            settings,
        }
    }
}
