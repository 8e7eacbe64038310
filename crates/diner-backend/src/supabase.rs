//! Client for the hosted Postgres REST and auth endpoints
//!
//! Speaks the PostgREST dialect under `/rest/v1` and the GoTrue password
//! grant under `/auth/v1`. The client owns the session: it stores the tokens
//! returned at sign-in, refreshes them once expired and attaches them to
//! every data request.

use crate::backend::Backend;
use crate::error::{BackendError, BackendResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diner_core::{
    BackendConfig, Credentials, Reservation, ReservationId, ReservationStatus, Settings,
    SettingsPatch, SortKey,
};
use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

const RESERVATIONS_TABLE: &str = "reservations";
const SETTINGS_TABLE: &str = "settings";

/// Keys tried, in order, for a human-readable message in an error body.
/// GoTrue uses `msg`/`error_description`, PostgREST uses `message`.
const ERROR_MESSAGE_KEYS: [&str; 4] = ["msg", "message", "error_description", "error"];

/// Tokens of a signed-in session
#[derive(Clone)]
pub struct Session {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .or_else(|| {
                self.expires_in
                    .map(|secs| now + chrono::Duration::seconds(secs))
            });

        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    max_retries: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// Linear backoff before retry number `attempt`, saturating at `Duration::MAX`
    const fn delay(self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

/// Client for the hosted reservation store
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    base_url: String,
    anon_key: String,
    session: Arc<RwLock<Option<Session>>>,
    retry: RetryPolicy,
}

impl fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url)
            .field("signed_in", &self.session.read().is_some())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    /// Build a client from the `backend` configuration section
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a valid URL or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &BackendConfig) -> BackendResult<Self> {
        let base_url = config.url.trim().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url).map_err(|e| {
            BackendError::configuration(format!("invalid backend url '{base_url}': {e}"))
        })?;

        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build()?,
            base_url,
            anon_key: config.anon_key.clone(),
            session: Arc::new(RwLock::new(None)),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                backoff: Duration::from_millis(config.retry_backoff_ms),
            },
        })
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{endpoint}", self.base_url)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    /// Session token when signed in, the public key otherwise
    fn bearer(&self) -> String {
        self.session
            .read()
            .as_ref()
            .map_or_else(|| self.anon_key.clone(), |s| s.access_token.clone())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
    }

    /// Send a request, retrying transport failures per the retry policy.
    ///
    /// Responses with an error status are never retried.
    async fn send<F>(&self, operation: &'static str, build: F) -> BackendResult<Response>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut attempt = 0u32;
        loop {
            match build().send().await {
                Ok(response) => return check(operation, response).await,
                Err(err) if attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.delay(attempt);
                    warn!(operation, attempt, error = %err, ?delay, "backend request failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    warn!(operation, error = %err, "backend request failed");
                    return Err(err.into());
                }
            }
        }
    }

    /// Refresh the session if its access token has expired.
    async fn ensure_fresh_session(&self) -> BackendResult<()> {
        let refresh_token = {
            let guard = self.session.read();
            match guard.as_ref() {
                Some(session) if session.is_expired(Utc::now()) => session.refresh_token.clone(),
                _ => return Ok(()),
            }
        };

        let Some(refresh_token) = refresh_token else {
            *self.session.write() = None;
            return Err(BackendError::api(
                StatusCode::UNAUTHORIZED.as_u16(),
                "Session expired",
            ));
        };

        debug!("refreshing expired session");
        let url = self.auth_url("token");
        let body = serde_json::json!({ "refresh_token": refresh_token });
        let refreshed = match self
            .send("refresh_session", || {
                self.http
                    .post(&url)
                    .query(&[("grant_type", "refresh_token")])
                    .header("apikey", &self.anon_key)
                    .json(&body)
            })
            .await
        {
            Ok(response) => decode::<TokenResponse>(response).await,
            Err(err) => Err(err),
        };

        match refreshed {
            Ok(token) => {
                *self.session.write() = Some(token.into_session(Utc::now()));
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "session refresh failed, dropping session");
                *self.session.write() = None;
                Err(err)
            }
        }
    }
}

#[async_trait]
impl Backend for SupabaseClient {
    async fn sign_in(&self, credentials: &Credentials) -> BackendResult<()> {
        let url = self.auth_url("token");
        let response = self
            .send("sign_in", || {
                self.http
                    .post(&url)
                    .query(&[("grant_type", "password")])
                    .header("apikey", &self.anon_key)
                    .json(credentials)
            })
            .await?;

        let token: TokenResponse = decode(response).await?;
        *self.session.write() = Some(token.into_session(Utc::now()));
        info!("staff session established");
        Ok(())
    }

    async fn sign_out(&self) -> BackendResult<()> {
        let session = self.session.write().take();
        let Some(session) = session else {
            return Ok(());
        };

        let url = self.auth_url("logout");
        self.send("sign_out", || {
            self.http
                .post(&url)
                .header("apikey", &self.anon_key)
                .bearer_auth(&session.access_token)
        })
        .await?;

        info!("staff session terminated");
        Ok(())
    }

    fn has_session(&self) -> bool {
        self.session.read().is_some()
    }

    async fn list_reservations(&self, order: &[SortKey]) -> BackendResult<Vec<Reservation>> {
        self.ensure_fresh_session().await?;

        let url = self.rest_url(RESERVATIONS_TABLE);
        let mut query = vec![("select", "*".to_string())];
        if let Some(terms) = order_param(order) {
            query.push(("order", terms));
        }

        let response = self
            .send("list_reservations", || {
                self.authorized(self.http.get(&url)).query(&query)
            })
            .await?;

        let rows: Vec<Reservation> = decode(response).await?;
        debug!(count = rows.len(), "fetched reservations");
        Ok(rows)
    }

    async fn update_reservation_status(
        &self,
        id: ReservationId,
        status: ReservationStatus,
    ) -> BackendResult<()> {
        self.ensure_fresh_session().await?;

        let url = self.rest_url(RESERVATIONS_TABLE);
        let filter = format!("eq.{id}");
        let body = serde_json::json!({ "status": status });

        self.send("update_reservation_status", || {
            self.authorized(self.http.patch(&url))
                .query(&[("id", filter.as_str())])
                .header("Prefer", "return=minimal")
                .json(&body)
        })
        .await?;

        debug!(%id, %status, "reservation status updated");
        Ok(())
    }

    async fn fetch_settings(&self) -> BackendResult<Option<Settings>> {
        self.ensure_fresh_session().await?;

        let url = self.rest_url(SETTINGS_TABLE);
        let response = self
            .send("fetch_settings", || {
                self.authorized(self.http.get(&url))
                    .query(&[("select", "*"), ("limit", "1")])
            })
            .await?;

        let rows: Vec<Settings> = decode(response).await?;
        Ok(rows.into_iter().next())
    }

    async fn update_settings(&self, id: Uuid, patch: &SettingsPatch) -> BackendResult<()> {
        self.ensure_fresh_session().await?;

        let url = self.rest_url(SETTINGS_TABLE);
        let filter = format!("eq.{id}");

        self.send("update_settings", || {
            self.authorized(self.http.patch(&url))
                .query(&[("id", filter.as_str())])
                .header("Prefer", "return=minimal")
                .json(patch)
        })
        .await?;

        debug!("settings updated");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}

/// Turn an error status into [`BackendError::Api`] carrying the service's message.
async fn check(operation: &'static str, response: Response) -> BackendResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await?;
    let message = error_message(status, &body);
    warn!(operation, status = status.as_u16(), %message, "backend rejected request");
    Err(BackendError::api(status.as_u16(), message))
}

async fn decode<T: DeserializeOwned>(response: Response) -> BackendResult<T> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

fn error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ERROR_MESSAGE_KEYS.iter().find_map(|key| {
                value
                    .get(*key)
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| status.to_string())
}

fn order_param(keys: &[SortKey]) -> Option<String> {
    if keys.is_empty() {
        return None;
    }
    Some(
        keys.iter()
            .map(|key| key.to_query_term())
            .collect::<Vec<_>>()
            .join(","),
    )
}
