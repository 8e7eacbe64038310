//! Display types handed to the templates

use chrono::{Datelike, NaiveDate};
use diner_core::{Reservation, ReservationStatus, Settings};
use serde::Deserialize;

const WEEKDAYS: [&str; 7] = [
    "lunes",
    "martes",
    "miércoles",
    "jueves",
    "viernes",
    "sábado",
    "domingo",
];

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Spanish long date, e.g. `lunes, 15 de enero de 2024`
#[must_use]
pub fn long_date(date: NaiveDate) -> String {
    let weekday = usize::try_from(date.weekday().num_days_from_monday())
        .ok()
        .and_then(|i| WEEKDAYS.get(i))
        .copied()
        .unwrap_or_default();
    let month = usize::try_from(date.month0())
        .ok()
        .and_then(|i| MONTHS.get(i))
        .copied()
        .unwrap_or_default();

    format!("{weekday}, {} de {month} de {}", date.day(), date.year())
}

/// One row of the reservation list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationView {
    /// Row identifier, used in the action URLs
    pub id: String,
    /// Customer name
    pub customer_name: String,
    /// Display label of the status
    pub status_label: &'static str,
    /// CSS class of the status badge
    pub status_class: &'static str,
    /// Long date
    pub date: String,
    /// `HH:MM`
    pub time: String,
    /// Party size
    pub guests: String,
    /// Confirm and cancel are offered
    pub actionable: bool,
}

impl From<&Reservation> for ReservationView {
    fn from(reservation: &Reservation) -> Self {
        let status_class = match reservation.status {
            ReservationStatus::Pending => "status-pending",
            ReservationStatus::Confirmed => "status-confirmed",
            ReservationStatus::Cancelled => "status-cancelled",
        };

        Self {
            id: reservation.id.to_string(),
            customer_name: reservation.customer_name.clone(),
            status_label: reservation.status.label(),
            status_class,
            date: long_date(reservation.date),
            time: reservation.time.format("%H:%M").to_string(),
            guests: format!("{} personas", reservation.guests),
            actionable: reservation.status.is_pending(),
        }
    }
}

/// Values of the settings form, as posted by the browser
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SettingsForm {
    /// Restaurant name
    #[serde(default)]
    pub restaurant_name: String,
    /// Contact email
    #[serde(default)]
    pub contact_email: String,
    /// Contact phone
    #[serde(default)]
    pub contact_phone: String,
    /// Street address
    #[serde(default)]
    pub address: String,
}

impl SettingsForm {
    /// Seed the form from the cached settings, blank when none are cached
    #[must_use]
    pub fn seeded(settings: Option<&Settings>) -> Self {
        settings.map_or_else(Self::default, |s| Self {
            restaurant_name: s.restaurant_name.clone(),
            contact_email: s.contact_email.clone().unwrap_or_default(),
            contact_phone: s.contact_phone.clone().unwrap_or_default(),
            address: s.address.clone().unwrap_or_default(),
        })
    }

    /// The form always submits all four fields
    #[must_use]
    pub fn to_patch(&self) -> diner_core::SettingsPatch {
        diner_core::SettingsPatch {
            restaurant_name: Some(self.restaurant_name.clone()),
            contact_email: Some(self.contact_email.clone()),
            contact_phone: Some(self.contact_phone.clone()),
            address: Some(self.address.clone()),
        }
    }
}
