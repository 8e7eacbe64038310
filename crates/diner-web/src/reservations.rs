//! Reservation List view-model
//!
//! Holds the last fetched reservation list. Mutations are two-phase: the
//! store is patched first and the cached row changes only once the store
//! has confirmed. Concurrent status changes are not arbitrated; whichever
//! response arrives last decides the cached status.

use diner_backend::Backend;
use diner_core::{RESERVATION_ORDER, Reservation, ReservationId, ReservationStatus};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Message recorded when a status change is not allowed
pub const INVALID_TRANSITION: &str = "Solo se pueden confirmar o cancelar reservas pendientes";

/// Snapshot of the reservation list view-model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationListState {
    /// Rows in fetch order
    pub reservations: Vec<Reservation>,
    /// A fetch is in flight
    pub loading: bool,
    /// Message of the last failed call
    pub error: Option<String>,
}

/// Cached reservation list with confirm/cancel actions
pub struct ReservationList {
    backend: Arc<dyn Backend>,
    state: RwLock<ReservationListState>,
}

impl fmt::Debug for ReservationList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReservationList")
            .field("backend", &self.backend.name())
            .finish_non_exhaustive()
    }
}

impl ReservationList {
    /// Create an empty list
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            state: RwLock::new(ReservationListState::default()),
        }
    }

    /// Fetch every reservation ordered by date, then time.
    ///
    /// A failed fetch leaves no rows behind, only the error. Returns the
    /// outcome of this fetch, unaffected by calls running alongside it.
    pub async fn list(&self) -> ReservationListState {
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let result = self.backend.list_reservations(&RESERVATION_ORDER).await;

        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(rows) => {
                debug!(count = rows.len(), "reservations loaded");
                state.reservations.clone_from(&rows);
                ReservationListState {
                    reservations: rows,
                    ..ReservationListState::default()
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to load reservations");
                state.reservations.clear();
                state.error = Some(err.to_string());
                ReservationListState {
                    error: state.error.clone(),
                    ..ReservationListState::default()
                }
            }
        }
    }

    /// Move a pending reservation to `status`.
    ///
    /// Only `confirmed` and `cancelled` are accepted, and only for rows
    /// cached as pending; a row not in the cache is still sent to the store.
    /// Returns the cached rows after the change, with `error` set only when
    /// this change failed.
    pub async fn set_status(
        &self,
        id: ReservationId,
        status: ReservationStatus,
    ) -> ReservationListState {
        let allowed = {
            let state = self.state.read().await;
            let current = state
                .reservations
                .iter()
                .find(|r| r.id == id)
                .map_or(ReservationStatus::Pending, |r| r.status);
            current.can_transition_to(status)
        };
        if !allowed {
            warn!(%id, %status, "status change not allowed");
            let mut state = self.state.write().await;
            state.error = Some(INVALID_TRANSITION.to_string());
            return ReservationListState {
                reservations: state.reservations.clone(),
                loading: false,
                error: state.error.clone(),
            };
        }

        let result = self.backend.update_reservation_status(id, status).await;

        let mut state = self.state.write().await;
        let error = match result {
            Ok(()) => {
                if let Some(row) = state.reservations.iter_mut().find(|r| r.id == id) {
                    row.status = status;
                }
                debug!(%id, %status, "reservation updated");
                None
            }
            Err(err) => {
                warn!(%id, %status, error = %err, "failed to update reservation");
                state.error = Some(err.to_string());
                state.error.clone()
            }
        };

        ReservationListState {
            reservations: state.reservations.clone(),
            loading: false,
            error,
        }
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> ReservationListState {
        self.state.read().await.clone()
    }
}
