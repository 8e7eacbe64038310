//! In-process backend
//!
//! Holds reservations and settings in memory. Used by the `memory` provider
//! for local runs without a hosted project, and by tests to script failures
//! and inspect which operations reached the store.

use crate::backend::Backend;
use crate::error::{BackendError, BackendResult};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveTime, Utc};
use diner_core::{
    Credentials, Reservation, ReservationId, ReservationStatus, SETTINGS_ROW_ID, Settings,
    SettingsPatch, SortKey,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Backend operations, as counted by [`MemoryBackend::call_count`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// [`Backend::sign_in`]
    SignIn,
    /// [`Backend::sign_out`]
    SignOut,
    /// [`Backend::list_reservations`]
    ListReservations,
    /// [`Backend::update_reservation_status`]
    UpdateReservationStatus,
    /// [`Backend::fetch_settings`]
    FetchSettings,
    /// [`Backend::update_settings`]
    UpdateSettings,
}

#[derive(Debug, Default)]
struct MemoryState {
    reservations: Vec<Reservation>,
    settings: Option<Settings>,
    credentials: Option<Credentials>,
    signed_in: bool,
    failures: HashMap<Operation, String>,
    calls: HashMap<Operation, usize>,
}

impl MemoryState {
    /// Record the call and return the scripted failure for it, if any.
    fn enter(&mut self, op: Operation) -> BackendResult<()> {
        *self.calls.entry(op).or_default() += 1;
        match self.failures.get(&op) {
            Some(message) => Err(BackendError::api(500, message.clone())),
            None => Ok(()),
        }
    }
}

/// Backend keeping all rows in process memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    delay: Option<Duration>,
}

impl MemoryBackend {
    /// Empty store: no reservations, no settings row, any credential accepted
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the reservation rows
    #[must_use]
    pub fn with_reservations(self, reservations: Vec<Reservation>) -> Self {
        self.state.lock().reservations = reservations;
        self
    }

    /// Seed the settings row
    #[must_use]
    pub fn with_settings(self, settings: Settings) -> Self {
        self.state.lock().settings = Some(settings);
        self
    }

    /// Only accept this credential at sign-in
    #[must_use]
    pub fn with_credentials(self, credentials: Credentials) -> Self {
        self.state.lock().credentials = Some(credentials);
        self
    }

    /// Wait this long inside every operation
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make every call to `op` fail with `message` until cleared
    pub fn fail(&self, op: Operation, message: impl Into<String>) {
        self.state.lock().failures.insert(op, message.into());
    }

    /// Stop failing `op`
    pub fn clear_failure(&self, op: Operation) {
        self.state.lock().failures.remove(&op);
    }

    /// Number of times `op` was received
    #[must_use]
    pub fn call_count(&self, op: Operation) -> usize {
        self.state.lock().calls.get(&op).copied().unwrap_or_default()
    }

    /// Number of operations received, of any kind
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.state.lock().calls.values().sum()
    }

    /// Current reservation rows, in insertion order
    #[must_use]
    pub fn reservations(&self) -> Vec<Reservation> {
        self.state.lock().reservations.clone()
    }

    /// Current settings row
    #[must_use]
    pub fn settings(&self) -> Option<Settings> {
        self.state.lock().settings.clone()
    }

    /// Store seeded with a handful of upcoming reservations
    #[must_use]
    pub fn demo() -> Self {
        let today = Utc::now().date_naive();
        let reservations = DEMO_ROWS
            .iter()
            .filter_map(|row| row.reservation(today))
            .collect();

        Self::new()
            .with_reservations(reservations)
            .with_settings(Settings {
                restaurant_name: diner_core::DEFAULT_RESTAURANT_NAME.to_string(),
                contact_email: Some("reservas@foodiesdiner.example".to_string()),
                contact_phone: Some("+34 910 000 000".to_string()),
                address: Some("Calle Mayor 1, Madrid".to_string()),
            })
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Seed row for [`MemoryBackend::demo`], dated relative to today
struct DemoRow {
    name: &'static str,
    email: &'static str,
    phone: Option<&'static str>,
    days_ahead: i64,
    hour: u32,
    minute: u32,
    guests: u32,
    status: ReservationStatus,
    notes: Option<&'static str>,
}

impl DemoRow {
    fn reservation(&self, today: NaiveDate) -> Option<Reservation> {
        Some(Reservation {
            id: Uuid::new_v4(),
            customer_name: self.name.to_string(),
            customer_email: self.email.to_string(),
            customer_phone: self.phone.map(str::to_string),
            date: today.checked_add_signed(ChronoDuration::days(self.days_ahead))?,
            time: NaiveTime::from_hms_opt(self.hour, self.minute, 0)?,
            guests: self.guests,
            status: self.status,
            notes: self.notes.map(str::to_string),
            created_at: Utc::now(),
        })
    }
}

const DEMO_ROWS: [DemoRow; 5] = [
    DemoRow {
        name: "María García",
        email: "maria@example.com",
        phone: Some("+34 611 222 333"),
        days_ahead: 0,
        hour: 13,
        minute: 30,
        guests: 2,
        status: ReservationStatus::Pending,
        notes: None,
    },
    DemoRow {
        name: "Jorge Ruiz",
        email: "jorge@example.com",
        phone: None,
        days_ahead: 0,
        hour: 21,
        minute: 0,
        guests: 6,
        status: ReservationStatus::Confirmed,
        notes: Some("Cumpleaños"),
    },
    DemoRow {
        name: "Lucía Pérez",
        email: "lucia@example.com",
        phone: Some("+34 622 444 555"),
        days_ahead: 1,
        hour: 20,
        minute: 15,
        guests: 4,
        status: ReservationStatus::Pending,
        notes: Some("Mesa junto a la ventana"),
    },
    DemoRow {
        name: "Andrés Molina",
        email: "andres@example.com",
        phone: None,
        days_ahead: 2,
        hour: 14,
        minute: 0,
        guests: 3,
        status: ReservationStatus::Cancelled,
        notes: None,
    },
    DemoRow {
        name: "Carmen Vidal",
        email: "carmen@example.com",
        phone: Some("+34 633 666 777"),
        days_ahead: 3,
        hour: 21,
        minute: 30,
        guests: 8,
        status: ReservationStatus::Pending,
        notes: None,
    },
];

#[async_trait]
impl Backend for MemoryBackend {
    async fn sign_in(&self, credentials: &Credentials) -> BackendResult<()> {
        self.pause().await;
        let mut state = self.state.lock();
        state.enter(Operation::SignIn)?;

        if state
            .credentials
            .as_ref()
            .is_some_and(|expected| expected != credentials)
        {
            return Err(BackendError::api(400, "Invalid login credentials"));
        }

        state.signed_in = true;
        Ok(())
    }

    async fn sign_out(&self) -> BackendResult<()> {
        self.pause().await;
        let mut state = self.state.lock();
        state.signed_in = false;
        state.enter(Operation::SignOut)
    }

    fn has_session(&self) -> bool {
        self.state.lock().signed_in
    }

    async fn list_reservations(&self, order: &[SortKey]) -> BackendResult<Vec<Reservation>> {
        self.pause().await;
        let mut state = self.state.lock();
        state.enter(Operation::ListReservations)?;

        let mut rows = state.reservations.clone();
        rows.sort_by(|a, b| SortKey::compare_all(order, a, b));
        Ok(rows)
    }

    async fn update_reservation_status(
        &self,
        id: ReservationId,
        status: ReservationStatus,
    ) -> BackendResult<()> {
        self.pause().await;
        let mut state = self.state.lock();
        state.enter(Operation::UpdateReservationStatus)?;

        // A filter matching no row is not an error for the REST API either.
        if let Some(row) = state.reservations.iter_mut().find(|r| r.id == id) {
            row.status = status;
        } else {
            debug!(%id, "status update matched no reservation");
        }
        Ok(())
    }

    async fn fetch_settings(&self) -> BackendResult<Option<Settings>> {
        self.pause().await;
        let mut state = self.state.lock();
        state.enter(Operation::FetchSettings)?;
        Ok(state.settings.clone())
    }

    async fn update_settings(&self, id: Uuid, patch: &SettingsPatch) -> BackendResult<()> {
        self.pause().await;
        let mut state = self.state.lock();
        state.enter(Operation::UpdateSettings)?;

        if id != SETTINGS_ROW_ID {
            debug!(%id, "settings update matched no row");
            return Ok(());
        }
        if let Some(settings) = state.settings.as_mut() {
            patch.apply_to(settings);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use diner_core::RESERVATION_ORDER;
    use pretty_assertions::assert_eq;

    fn reservation(date: &str, time: &str, status: ReservationStatus) -> Reservation {
        Reservation {
            id: Uuid::new_v4(),
            customer_name: "Ana".to_string(),
            customer_email: "ana@example.com".to_string(),
            customer_phone: None,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time: NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
            guests: 2,
            status,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_sign_in_checks_configured_credentials() {
        let backend =
            MemoryBackend::new().with_credentials(Credentials::new("administrador", "clave"));

        let err = backend
            .sign_in(&Credentials::new("administrador", "otra"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
        assert!(!backend.has_session());

        backend
            .sign_in(&Credentials::new("administrador", "clave"))
            .await
            .unwrap();
        assert!(backend.has_session());
    }

    #[tokio::test]
    async fn test_sign_out_clears_session_even_on_failure() {
        let backend = MemoryBackend::new();
        backend
            .sign_in(&Credentials::new("administrador", "clave"))
            .await
            .unwrap();
        backend.fail(Operation::SignOut, "network down");

        assert!(backend.sign_out().await.is_err());
        assert!(!backend.has_session());
    }

    #[tokio::test]
    async fn test_list_applies_order() {
        let backend = MemoryBackend::new().with_reservations(vec![
            reservation("2024-03-16", "12:00", ReservationStatus::Pending),
            reservation("2024-03-15", "21:00", ReservationStatus::Pending),
            reservation("2024-03-15", "13:00", ReservationStatus::Confirmed),
        ]);

        let rows = backend.list_reservations(&RESERVATION_ORDER).await.unwrap();
        let keys: Vec<String> = rows
            .iter()
            .map(|r| format!("{} {}", r.date, r.time.format("%H:%M")))
            .collect();

        assert_eq!(
            keys,
            vec!["2024-03-15 13:00", "2024-03-15 21:00", "2024-03-16 12:00"]
        );
    }

    #[tokio::test]
    async fn test_scripted_failure_is_recorded_and_cleared() {
        let backend = MemoryBackend::new();
        backend.fail(Operation::ListReservations, "boom");

        let err = backend.list_reservations(&[]).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");

        backend.clear_failure(Operation::ListReservations);
        assert!(backend.list_reservations(&[]).await.is_ok());
        assert_eq!(backend.call_count(Operation::ListReservations), 2);
    }

    #[tokio::test]
    async fn test_call_log_stays_bounded() {
        let backend = MemoryBackend::demo();
        for _ in 0..1000 {
            backend.list_reservations(&RESERVATION_ORDER).await.unwrap();
        }
        backend.fetch_settings().await.unwrap();

        assert_eq!(backend.call_count(Operation::ListReservations), 1000);
        assert_eq!(backend.call_count(Operation::FetchSettings), 1);
        assert_eq!(backend.total_calls(), 1001);
        assert_eq!(backend.state.lock().calls.len(), 2);
    }

    #[tokio::test]
    async fn test_update_status_unknown_id_is_not_an_error() {
        let row = reservation("2024-03-15", "13:00", ReservationStatus::Pending);
        let backend = MemoryBackend::new().with_reservations(vec![row.clone()]);

        backend
            .update_reservation_status(Uuid::new_v4(), ReservationStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(backend.reservations()[0].status, ReservationStatus::Pending);

        backend
            .update_reservation_status(row.id, ReservationStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(
            backend.reservations()[0].status,
            ReservationStatus::Confirmed
        );
    }

    #[tokio::test]
    async fn test_update_settings_targets_singleton_row() {
        let backend = MemoryBackend::demo();
        let patch = SettingsPatch {
            restaurant_name: Some("Casa Pepe".to_string()),
            ..SettingsPatch::default()
        };

        backend.update_settings(Uuid::new_v4(), &patch).await.unwrap();
        assert_eq!(
            backend.settings().unwrap().restaurant_name,
            diner_core::DEFAULT_RESTAURANT_NAME
        );

        backend.update_settings(SETTINGS_ROW_ID, &patch).await.unwrap();
        assert_eq!(backend.settings().unwrap().restaurant_name, "Casa Pepe");
    }

    #[tokio::test]
    async fn test_fetch_settings_without_row() {
        let backend = MemoryBackend::new();
        assert!(backend.fetch_settings().await.unwrap().is_none());
    }

    #[test]
    fn test_demo_has_pending_rows() {
        let backend = MemoryBackend::demo();
        let rows = backend.reservations();

        assert_eq!(rows.len(), 5);
        assert!(rows.iter().any(|r| r.status.is_pending()));
        assert!(backend.settings().is_some());
    }
}
