//! The external store seam

use crate::error::BackendResult;
use async_trait::async_trait;
use diner_core::{
    Credentials, Reservation, ReservationId, ReservationStatus, Settings, SettingsPatch, SortKey,
};
use uuid::Uuid;

/// Operations the dashboard needs from the external store.
///
/// Every method is a single request/response round trip. Implementations
/// own the session token; callers only ask whether one exists.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Establish a staff session
    async fn sign_in(&self, credentials: &Credentials) -> BackendResult<()>;

    /// End the staff session. The local session is gone even when this fails.
    async fn sign_out(&self) -> BackendResult<()>;

    /// Whether a session is currently held
    fn has_session(&self) -> bool;

    /// Fetch every reservation in the requested order
    async fn list_reservations(&self, order: &[SortKey]) -> BackendResult<Vec<Reservation>>;

    /// Patch the `status` column of the row with `id`
    async fn update_reservation_status(
        &self,
        id: ReservationId,
        status: ReservationStatus,
    ) -> BackendResult<()>;

    /// Fetch the settings row, if one exists
    async fn fetch_settings(&self) -> BackendResult<Option<Settings>>;

    /// Patch the settings row identified by `id` with the present fields
    async fn update_settings(&self, id: Uuid, patch: &SettingsPatch) -> BackendResult<()>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}
