//! External store access for the Foodie's Diner admin dashboard
//!
//! The [`Backend`] trait is the seam between the dashboard and the hosted
//! store. [`SupabaseClient`] talks to the hosted project over HTTP;
//! [`MemoryBackend`] keeps everything in process.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod backend;
pub mod error;
pub mod memory;
pub mod supabase;

pub use backend::Backend;
pub use error::{BackendError, BackendResult};
pub use memory::{MemoryBackend, Operation};
pub use supabase::SupabaseClient;

use diner_core::{BackendProvider, Config};
use std::sync::Arc;
use tracing::info;

/// Build the backend selected by `backend.provider`
///
/// # Errors
///
/// Returns an error if the hosted client cannot be constructed.
pub fn from_config(config: &Config) -> BackendResult<Arc<dyn Backend>> {
    let backend: Arc<dyn Backend> = match config.backend.provider {
        BackendProvider::Supabase => Arc::new(SupabaseClient::new(&config.backend)?),
        BackendProvider::Memory => Arc::new(
            MemoryBackend::demo().with_credentials(config.admin.credentials()),
        ),
    };

    info!(backend = backend.name(), "backend initialized");
    Ok(backend)
}
