//! Navigation Shell: chrome around every logged-in page

use crate::session::Route;
use crate::settings::SettingsStore;

/// A navigation target in the top bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    /// Link text
    pub label: &'static str,
    /// Target path
    pub href: &'static str,
    /// The page currently shown
    pub active: bool,
}

/// Data rendered by the base template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    /// Restaurant name, or the default one when no settings are loaded
    pub restaurant_name: String,
    /// Reservation list and settings links
    pub links: Vec<NavLink>,
    /// Target of the logout form
    pub logout_href: &'static str,
}

impl Shell {
    /// Build the shell for the page at `current`
    pub async fn new(settings: &SettingsStore, current: Route) -> Self {
        let links = [
            ("Reservas", Route::Reservations),
            ("Configuración", Route::Settings),
        ]
        .into_iter()
        .map(|(label, route)| NavLink {
            label,
            href: route.path(),
            active: route == current,
        })
        .collect();

        Self {
            restaurant_name: settings.restaurant_name().await,
            links,
            logout_href: "/logout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diner_backend::{Backend, MemoryBackend};
    use diner_core::{DEFAULT_RESTAURANT_NAME, Settings};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_shell_falls_back_to_default_name() {
        let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::new());
        let settings = SettingsStore::new(backend);

        let shell = Shell::new(&settings, Route::Reservations).await;

        assert_eq!(shell.restaurant_name, DEFAULT_RESTAURANT_NAME);
        assert_eq!(
            shell.links,
            vec![
                NavLink {
                    label: "Reservas",
                    href: "/dashboard",
                    active: true,
                },
                NavLink {
                    label: "Configuración",
                    href: "/settings",
                    active: false,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_shell_shows_loaded_name() {
        let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::new().with_settings(Settings {
            restaurant_name: "Casa Pepe".to_string(),
            contact_email: None,
            contact_phone: None,
            address: None,
        }));
        let settings = SettingsStore::new(backend);
        settings.fetch().await;

        let shell = Shell::new(&settings, Route::Settings).await;

        assert_eq!(shell.restaurant_name, "Casa Pepe");
        assert!(shell.links.iter().any(|l| l.href == "/settings" && l.active));
    }
}
