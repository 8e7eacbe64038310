//! Settings view-model: cached copy of the singleton settings row

use diner_backend::Backend;
use diner_core::{DEFAULT_RESTAURANT_NAME, SETTINGS_ROW_ID, Settings, SettingsPatch};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Snapshot of the settings view-model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsState {
    /// Cached row; `None` until a row has been fetched
    pub settings: Option<Settings>,
    /// A fetch or update is in flight
    pub loading: bool,
    /// Message of the last failed call
    pub error: Option<String>,
}

/// Fetches and patches the settings row, keeping a local copy
pub struct SettingsStore {
    backend: Arc<dyn Backend>,
    state: RwLock<SettingsState>,
}

impl fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsStore")
            .field("backend", &self.backend.name())
            .finish_non_exhaustive()
    }
}

impl SettingsStore {
    /// Create an empty store
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            state: RwLock::new(SettingsState::default()),
        }
    }

    /// Load the settings row.
    ///
    /// A missing row leaves the cache as it was.
    pub async fn fetch(&self) {
        self.begin().await;

        let result = self.backend.fetch_settings().await;

        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(Some(settings)) => state.settings = Some(settings),
            Ok(None) => debug!("no settings row, keeping defaults"),
            Err(err) => {
                warn!(error = %err, "failed to fetch settings");
                state.error = Some(err.to_string());
            }
        }
    }

    /// Patch the settings row, then merge the patch into the cache.
    ///
    /// Returns whether the update was applied. The cache is only touched
    /// after the store confirmed the update, and stays unset if it was unset.
    pub async fn update(&self, patch: SettingsPatch) -> bool {
        if let Err(err) = patch.check() {
            warn!(error = %err, "rejected settings update");
            self.state.write().await.error = Some(err.to_string());
            return false;
        }

        self.begin().await;

        let result = self.backend.update_settings(SETTINGS_ROW_ID, &patch).await;

        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(()) => {
                if let Some(settings) = state.settings.as_mut() {
                    patch.apply_to(settings);
                }
                debug!("settings saved");
                true
            }
            Err(err) => {
                warn!(error = %err, "failed to update settings");
                state.error = Some(err.to_string());
                false
            }
        }
    }

    /// Name shown by the shell
    pub async fn restaurant_name(&self) -> String {
        self.state
            .read()
            .await
            .settings
            .as_ref()
            .map(|s| s.restaurant_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_RESTAURANT_NAME)
            .to_string()
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> SettingsState {
        self.state.read().await.clone()
    }

    async fn begin(&self) {
        let mut state = self.state.write().await;
        state.loading = true;
        state.error = None;
    }
}
