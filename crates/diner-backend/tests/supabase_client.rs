//! Integration tests for the hosted store client against a mock server

#![allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]

use diner_backend::{Backend, BackendError, SupabaseClient};
use diner_core::{
    BackendConfig, Credentials, RESERVATION_ORDER, ReservationStatus, SETTINGS_ROW_ID,
    SettingsPatch,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ANON_KEY: &str = "anon-key";

fn client_for(server: &MockServer) -> SupabaseClient {
    let config = BackendConfig {
        url: server.uri(),
        anon_key: ANON_KEY.to_string(),
        ..BackendConfig::default()
    };
    SupabaseClient::new(&config).unwrap()
}

fn admin() -> Credentials {
    Credentials::new("administrador", "09061994")
}

fn token_body(access: &str, refresh: &str, expires_in: i64) -> serde_json::Value {
    json!({
        "access_token": access,
        "token_type": "bearer",
        "expires_in": expires_in,
        "refresh_token": refresh,
        "user": { "id": "3f1c0d4e-8d4b-4e39-9a55-0d2f6b1c7e11" }
    })
}

fn reservation_row(id: &str, date: &str, time: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "customer_name": "Lucía Pérez",
        "customer_email": "lucia@example.com",
        "customer_phone": "+34 600 111 222",
        "date": date,
        "time": time,
        "guests": 4,
        "status": status,
        "notes": null,
        "created_at": "2024-01-10T09:00:00+00:00"
    })
}

async fn mount_sign_in(server: &MockServer, access: &str, expires_in: i64) {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(
            access,
            "refresh-1",
            expires_in,
        )))
        .mount(server)
        .await;
}

/// Password sign-in posts the credential and stores the session
#[tokio::test]
async fn test_sign_in_establishes_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", ANON_KEY))
        .and(body_json(json!({ "email": "administrador", "password": "09061994" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(
            "access-1",
            "refresh-1",
            3600,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(!client.has_session());

    client.sign_in(&admin()).await.unwrap();
    assert!(client.has_session());
}

/// A rejected sign-in surfaces the provider's message unchanged
#[tokio::test]
async fn test_sign_in_failure_message_is_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 400,
            "error_code": "invalid_credentials",
            "msg": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.sign_in(&admin()).await.unwrap_err();

    assert_eq!(err.to_string(), "Invalid login credentials");
    assert!(matches!(err, BackendError::Api { status: 400, .. }));
    assert!(!client.has_session());
}

/// Reservations are requested with every column and the date/time order
#[tokio::test]
async fn test_list_reservations_query() {
    let server = MockServer::start().await;
    mount_sign_in(&server, "access-1", 3600).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/reservations"))
        .and(query_param("select", "*"))
        .and(query_param("order", "date.asc,time.asc"))
        .and(header("authorization", "Bearer access-1"))
        .and(header("apikey", ANON_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            reservation_row("0b9f3a52-5f0e-4a8e-9a51-6a3c2d1e0f01", "2024-01-15", "19:30:00", "pending"),
            reservation_row("0b9f3a52-5f0e-4a8e-9a51-6a3c2d1e0f02", "2024-01-15", "21:00:00", "confirmed"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.sign_in(&admin()).await.unwrap();

    let rows = client.list_reservations(&RESERVATION_ORDER).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].status, ReservationStatus::Pending);
    assert_eq!(rows[1].status, ReservationStatus::Confirmed);
}

/// Without a session the public key doubles as the bearer token
#[tokio::test]
async fn test_anonymous_request_uses_public_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/settings"))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.fetch_settings().await.unwrap().is_none());
}

/// The status patch filters on the id and only carries the new status
#[tokio::test]
async fn test_update_reservation_status_request() {
    let server = MockServer::start().await;
    let id = Uuid::parse_str("0b9f3a52-5f0e-4a8e-9a51-6a3c2d1e0f01").unwrap();
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/reservations"))
        .and(query_param("id", format!("eq.{id}")))
        .and(body_json(json!({ "status": "confirmed" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .update_reservation_status(id, ReservationStatus::Confirmed)
        .await
        .unwrap();
}

/// Store errors keep the store's message
#[tokio::test]
async fn test_update_reservation_status_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/reservations"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": "42501",
            "details": null,
            "hint": null,
            "message": "permission denied for table reservations"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .update_reservation_status(Uuid::new_v4(), ReservationStatus::Cancelled)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "permission denied for table reservations");
}

/// The settings read asks for at most one row
#[tokio::test]
async fn test_fetch_settings_single_row() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/settings"))
        .and(query_param("select", "*"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": SETTINGS_ROW_ID,
            "restaurant_name": "Casa Pepe",
            "contact_email": "hola@casapepe.es",
            "contact_phone": null,
            "address": "Calle Mayor 1"
        }])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let settings = client.fetch_settings().await.unwrap().unwrap();

    assert_eq!(settings.restaurant_name, "Casa Pepe");
    assert_eq!(settings.contact_email.as_deref(), Some("hola@casapepe.es"));
    assert!(settings.contact_phone.is_none());
}

/// The settings patch targets the singleton row and omits absent fields
#[tokio::test]
async fn test_update_settings_request() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/settings"))
        .and(query_param("id", "eq.00000000-0000-0000-0000-000000000000"))
        .and(body_json(json!({ "contact_email": "a@b.com" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let patch = SettingsPatch {
        contact_email: Some("a@b.com".to_string()),
        ..SettingsPatch::default()
    };
    client.update_settings(SETTINGS_ROW_ID, &patch).await.unwrap();
}

/// Sign-out drops the local session even when the service call fails
#[tokio::test]
async fn test_sign_out_clears_session_on_failure() {
    let server = MockServer::start().await;
    mount_sign_in(&server, "access-1", 3600).await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "msg": "boom" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.sign_in(&admin()).await.unwrap();

    let err = client.sign_out().await.unwrap_err();
    assert_eq!(err.to_string(), "boom");
    assert!(!client.has_session());
}

/// An expired access token is refreshed before the next data request
#[tokio::test]
async fn test_expired_session_is_refreshed() {
    let server = MockServer::start().await;
    mount_sign_in(&server, "access-1", 0).await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_json(json!({ "refresh_token": "refresh-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(
            "access-2",
            "refresh-2",
            3600,
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/reservations"))
        .and(header("authorization", "Bearer access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.sign_in(&admin()).await.unwrap();

    let rows = client.list_reservations(&RESERVATION_ORDER).await.unwrap();
    assert!(rows.is_empty());
    assert!(client.has_session());
}

/// Error responses are never retried
#[tokio::test]
async fn test_error_status_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/reservations"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let config = BackendConfig {
        url: server.uri(),
        anon_key: ANON_KEY.to_string(),
        max_retries: 3,
        retry_backoff_ms: 1,
        ..BackendConfig::default()
    };
    let client = SupabaseClient::new(&config).unwrap();

    let err = client.list_reservations(&[]).await.unwrap_err();
    assert_eq!(err.to_string(), "503 Service Unavailable");
}

/// Unreachable endpoints fail with a transport error after the retries
#[tokio::test]
async fn test_unreachable_endpoint() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = BackendConfig {
        url: format!("http://127.0.0.1:{port}"),
        anon_key: ANON_KEY.to_string(),
        max_retries: 2,
        retry_backoff_ms: 1,
        ..BackendConfig::default()
    };
    let client = SupabaseClient::new(&config).unwrap();

    let err = client.sign_in(&admin()).await.unwrap_err();
    assert!(matches!(err, BackendError::Http(_)));
    assert!(!client.has_session());
}

/// A configured timeout bounds each request
#[tokio::test]
async fn test_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/settings"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_millis(1500)),
        )
        .mount(&server)
        .await;

    let config = BackendConfig {
        url: server.uri(),
        anon_key: ANON_KEY.to_string(),
        request_timeout_secs: Some(1),
        ..BackendConfig::default()
    };
    let client = SupabaseClient::new(&config).unwrap();

    match client.fetch_settings().await {
        Err(BackendError::Http(err)) => assert!(err.is_timeout()),
        other => panic!("expected timeout, got {other:?}"),
    }
}
