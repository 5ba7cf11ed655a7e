#![allow(clippy::unwrap_used)]
// Integration tests for the cloud client using wiremock.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use getair_api::{ApiClient, CloudSession, Credentials, CredentialStore, Error};

// ── Helpers ─────────────────────────────────────────────────────────

fn credentials_for(server: &MockServer) -> Credentials {
    Credentials {
        auth_url: Url::parse(&format!("{}/oauth/token", server.uri())).unwrap(),
        api_url: Url::parse(&server.uri()).unwrap(),
        client_id: "smartcontrol-app".into(),
        username: "user@example.com".into(),
        password: SecretString::from("hunter2".to_owned()),
    }
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

fn device_document() -> serde_json::Value {
    json!({
        "system": {
            "system_type": "SC100",
            "air_quality": 420.0,
            "indoor_humidity": 48.0,
            "num_zones": 3
        },
        "zones": {
            "1": { "name": "Living room", "speed": 1.5, "mode": "ventilate",
                   "active_time_profile": 2 },
            "2": { "name": "Bedroom", "speed": 0.5, "mode": "night" },
            "3": { "name": "Office", "speed": 2.0, "mode": "auto" }
        }
    })
}

// ── Connect / reconnect ─────────────────────────────────────────────

#[tokio::test]
async fn connect_writes_credentials_and_stores_token() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let client = ApiClient::new(credentials_for(&server), CredentialStore::new(dir.path()));

    assert!(!client.is_connected().await);
    assert!(client.connect().await);
    assert!(client.is_connected().await);
    assert!(client.credential_store().exists());
}

#[tokio::test]
async fn connect_fails_when_grant_returns_no_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "",
            "expires_in": 0
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = ApiClient::new(credentials_for(&server), CredentialStore::new(dir.path()));

    assert!(!client.connect().await);
    assert!(!client.is_connected().await);
}

#[tokio::test]
async fn connect_fails_on_rejected_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(403).set_body_string("invalid credentials"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = ApiClient::new(credentials_for(&server), CredentialStore::new(dir.path()));

    assert!(!client.connect().await);
}

#[tokio::test]
async fn reconnect_recreates_missing_credentials_file() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let client = ApiClient::new(credentials_for(&server), CredentialStore::new(dir.path()));

    assert!(client.connect().await);
    std::fs::remove_file(client.credential_store().path()).unwrap();
    assert!(!client.credential_store().exists());

    // Second connect reuses the session and must restore the file first.
    assert!(client.connect().await);
    assert!(client.credential_store().exists());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(client.credential_store().path())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

// ── Device fetch ────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_populates_document() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/devices/AABBCC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_document()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = ApiClient::new(credentials_for(&server), CredentialStore::new(dir.path()));
    assert!(client.connect().await);

    let device = client.get_device("AABBCC", true).await.unwrap();
    device.fetch().await.unwrap();

    assert_eq!(device.system_values()["system_type"], "SC100");
    device.select_zone(2).unwrap();
    let zone = device.zone_values().unwrap();
    assert_eq!(zone["name"], "Bedroom");
    assert_eq!(zone["mode"], "night");
}

#[tokio::test]
async fn fetch_maps_unauthorized_to_auth_error() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/devices/AABBCC"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = ApiClient::new(credentials_for(&server), CredentialStore::new(dir.path()));
    assert!(client.connect().await);

    let device = client.get_device("AABBCC", true).await.unwrap();
    let result = device.fetch().await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert!(device.last_error().is_some());
}

#[tokio::test]
async fn session_internal_reconnect_recovers_one_unauthorized_fetch() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    // First fetch hits an expired token, the retry succeeds.
    Mock::given(method("GET"))
        .and(path("/v1/devices/AABBCC"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/devices/AABBCC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_document()))
        .mount(&server)
        .await;

    let session = CloudSession::new(credentials_for(&server)).unwrap();
    session.connect().await.unwrap();
    // auto_reconnect stays at its default here (enabled).

    let device = session.get_device("AABBCC", true).await.unwrap();
    device.fetch().await.unwrap();
    assert_eq!(device.system_values()["system_type"], "SC100");
}

// ── Property writes ─────────────────────────────────────────────────

#[tokio::test]
async fn push_sends_staged_zone_writes_in_one_patch() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/devices/AABBCC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_document()))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/v1/devices/AABBCC"))
        .and(body_json(json!({ "zones": { "2": { "speed": 2.5 } } })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = ApiClient::new(credentials_for(&server), CredentialStore::new(dir.path()));
    assert!(client.connect().await);

    let device = client.get_device("AABBCC", true).await.unwrap();
    device.fetch().await.unwrap();
    device.set_autoset(false);
    device.select_zone(2).unwrap();
    device
        .set_zone_property("speed", json!(2.5))
        .await
        .unwrap();
    assert!(device.has_staged_writes());

    device.push().await.unwrap();
    assert!(!device.has_staged_writes());

    // Accepted writes are visible locally before the next fetch.
    let zone = device.zone_values().unwrap();
    assert_eq!(zone["speed"], 2.5);
}

#[tokio::test]
async fn zone_write_uses_active_prefixed_fallback_field() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/devices/AABBCC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_document()))
        .mount(&server)
        .await;
    // Zone 1 exposes only `active_time_profile`, so the write must
    // target the fallback wire name.
    Mock::given(method("PATCH"))
        .and(path("/v1/devices/AABBCC"))
        .and(body_json(json!({ "zones": { "1": { "active_time_profile": 4 } } })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = ApiClient::new(credentials_for(&server), CredentialStore::new(dir.path()));
    assert!(client.connect().await);

    let device = client.get_device("AABBCC", true).await.unwrap();
    device.fetch().await.unwrap();
    device.set_autoset(false);
    device.select_zone(1).unwrap();
    device
        .set_zone_property("time_profile", json!(4))
        .await
        .unwrap();
    device.push().await.unwrap();
}

#[tokio::test]
async fn unknown_property_is_rejected_without_request() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let client = ApiClient::new(credentials_for(&server), CredentialStore::new(dir.path()));
    assert!(client.connect().await);

    let device = client.get_device("AABBCC", true).await.unwrap();
    device.select_zone(1).unwrap();
    let result = device.set_zone_property("warp_factor", json!(9)).await;

    assert!(matches!(result, Err(Error::UnknownProperty { .. })));
}

// ── Device listing ──────────────────────────────────────────────────

#[tokio::test]
async fn list_devices_returns_summaries() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "device_id": "AABBCC", "system_type": "SC100", "alias": "Home" },
            { "device_id": "DDEEFF" }
        ])))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = ApiClient::new(credentials_for(&server), CredentialStore::new(dir.path()));
    assert!(client.connect().await);

    let devices = client.list_devices().await.unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].device_id, "AABBCC");
    assert_eq!(devices[0].alias.as_deref(), Some("Home"));
    assert!(devices[1].system_type.is_none());
}
