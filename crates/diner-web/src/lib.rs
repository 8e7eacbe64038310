//! Foodie's Diner admin dashboard
//!
//! Server-rendered pages for logging in, reviewing reservations and editing
//! the restaurant's contact settings. Every page is a thin view-model over
//! one resource of the external store.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod handlers;
pub mod middleware;
pub mod reservations;
pub mod routes;
pub mod server;
pub mod session;
pub mod settings;
pub mod shell;
pub mod state;
pub mod views;

// Re-export the main functions
pub use reservations::{ReservationList, ReservationListState};
pub use server::build_app;
pub use session::{Navigation, Route, SessionGate, SessionToken};
pub use settings::{SettingsState, SettingsStore};
pub use state::AppState;
