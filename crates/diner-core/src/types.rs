//! Core data types for the reservation dashboard
//!
//! Both entities are owned by the external store; the types here are the
//! wire shape of its rows plus the few rules this system enforces on them.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Reservation identifier type
pub type ReservationId = Uuid;

/// Identifier of the singleton settings row
pub const SETTINGS_ROW_ID: Uuid = Uuid::nil();

/// Restaurant name shown when no settings row has been loaded
pub const DEFAULT_RESTAURANT_NAME: &str = "Foodie's Diner";

/// Reservation status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Awaiting a decision from staff
    #[default]
    Pending,
    /// Accepted by staff
    Confirmed,
    /// Rejected by staff
    Cancelled,
}

impl ReservationStatus {
    /// Whether staff can still act on the reservation
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Only `pending -> confirmed` and `pending -> cancelled` are allowed.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Confirmed | Self::Cancelled)
        )
    }

    /// Display label shown in the dashboard
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pendiente",
            Self::Confirmed => "Confirmada",
            Self::Cancelled => "Cancelada",
        }
    }

    /// Wire name stored in the `status` column
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reservation row as stored by the external store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reservation {
    /// Unique identifier
    pub id: ReservationId,

    /// Customer name
    pub customer_name: String,

    /// Customer email
    pub customer_email: String,

    /// Customer phone
    #[serde(default)]
    pub customer_phone: Option<String>,

    /// Reservation date
    pub date: NaiveDate,

    /// Reservation time of day
    #[serde(with = "wire_time")]
    pub time: NaiveTime,

    /// Number of guests
    pub guests: u32,

    /// Current status
    #[serde(default)]
    pub status: ReservationStatus,

    /// Free-text notes
    #[serde(default)]
    pub notes: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Postgres `time` columns come back as `HH:MM:SS`, hand-entered rows sometimes as `HH:MM`.
mod wire_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub(super) fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&time.format("%H:%M:%S"))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, "%H:%M:%S%.f")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M"))
            .map_err(|e| D::Error::custom(format!("invalid time '{raw}': {e}")))
    }
}

/// Restaurant contact settings (the singleton settings row)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Restaurant name
    pub restaurant_name: String,

    /// Contact email
    #[serde(default)]
    pub contact_email: Option<String>,

    /// Contact phone
    #[serde(default)]
    pub contact_phone: Option<String>,

    /// Street address
    #[serde(default)]
    pub address: Option<String>,
}

/// Partial update of the settings row. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct SettingsPatch {
    /// New restaurant name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "restaurant name must not be empty"))]
    pub restaurant_name: Option<String>,

    /// New contact email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,

    /// New contact phone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,

    /// New address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl SettingsPatch {
    /// Merge the present fields into `settings`.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(name) = &self.restaurant_name {
            settings.restaurant_name.clone_from(name);
        }
        if let Some(email) = &self.contact_email {
            settings.contact_email = Some(email.clone());
        }
        if let Some(phone) = &self.contact_phone {
            settings.contact_phone = Some(phone.clone());
        }
        if let Some(address) = &self.address {
            settings.address = Some(address.clone());
        }
    }

    /// Validate the patch before it is sent
    ///
    /// # Errors
    ///
    /// Returns a validation error when a present restaurant name is empty.
    pub fn check(&self) -> crate::Result<()> {
        self.validate().map_err(crate::Error::from)
    }
}

/// Administrator credential submitted by the login action
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login identifier
    pub email: String,
    /// Password
    pub password: String,
}

impl Credentials {
    /// Create a credential pair
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Reservation columns the list can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservationColumn {
    /// `date`
    Date,
    /// `time`
    Time,
}

impl ReservationColumn {
    /// Column name in the external store
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Time => "time",
        }
    }

    fn compare(self, a: &Reservation, b: &Reservation) -> Ordering {
        match self {
            Self::Date => a.date.cmp(&b.date),
            Self::Time => a.time.cmp(&b.time),
        }
    }
}

/// One ordering term of a list request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    /// Column to order by
    pub column: ReservationColumn,
    /// Ascending when true
    pub ascending: bool,
}

impl SortKey {
    /// Ascending order on `column`
    #[must_use]
    pub const fn asc(column: ReservationColumn) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    /// Render as a PostgREST `order` term, e.g. `date.asc`
    #[must_use]
    pub fn to_query_term(self) -> String {
        let direction = if self.ascending { "asc" } else { "desc" };
        format!("{}.{direction}", self.column.as_str())
    }

    /// Compare two reservations on a list of keys, first key first.
    #[must_use]
    pub fn compare_all(keys: &[Self], a: &Reservation, b: &Reservation) -> Ordering {
        keys.iter()
            .map(|key| {
                let ord = key.column.compare(a, b);
                if key.ascending { ord } else { ord.reverse() }
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

/// Order of the reservation list: date, then time within a date
pub const RESERVATION_ORDER: [SortKey; 2] = [
    SortKey::asc(ReservationColumn::Date),
    SortKey::asc(ReservationColumn::Time),
];
