#![allow(clippy::unwrap_used)]
// Integration tests for the polling coordinator against a wiremock
// double of the getAir cloud.

use std::sync::Arc;

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use getair_api::{ApiClient, Credentials, CredentialStore};
use getair_core::entity::{self, EnabledZones, EntityContext};
use getair_core::{Coordinator, CoordinatorConfig, CoreError, ZoneIndex};

const DEVICE_ID: &str = "AABBCC";

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

fn harness(server: &MockServer) -> (Arc<ApiClient>, Arc<Coordinator>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(ApiClient::new(
        credentials_for(server),
        CredentialStore::new(dir.path()),
    ));
    let coordinator = Arc::new(Coordinator::new(
        Arc::clone(&client),
        CoordinatorConfig::new(DEVICE_ID),
    ));
    (client, coordinator, dir)
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
            "fw_app_version_str": "2.4.1",
            "air_quality": 512.0,
            "indoor_humidity": 48.0,
            "indoor_temperature": 21.5,
            "boot_time": 1_700_000_000,
            "num_zones": 3,
            "time_profiles": [
                { "name": "Workday", "data": [1, 2] },
                { "name": "Weekend" }
            ]
        },
        "zones": {
            "1": { "name": "Living room", "speed": 1.5, "mode": "ventilate",
                   "temperature": 21.0, "humidity": 45.0, "mode_deadline": 0,
                   "active_time_profile": 1 },
            "2": { "name": "Bedroom", "speed": 0.5, "mode": "night" },
            "3": { "name": "Office", "speed": 2.0, "mode": "auto" }
        }
    })
}

async fn mount_device(server: &MockServer, document: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/devices/{DEVICE_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(document))
        .mount(server)
        .await;
}

async fn count_device_fetches(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|req| {
            req.method.to_string().eq_ignore_ascii_case("GET")
                && req.url.path().starts_with("/v1/devices/")
        })
        .count()
}

async fn count_token_grants(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|req| req.url.path() == "/oauth/token")
        .count()
}

// ── Snapshot shape ──────────────────────────────────────────────────

#[tokio::test]
async fn refresh_publishes_system_and_all_three_zones() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_device(&server, device_document()).await;

    let (client, coordinator, _dir) = harness(&server);
    assert!(client.connect().await);

    let snapshot = coordinator.refresh().await.unwrap();

    assert_eq!(snapshot.system.system_id, DEVICE_ID);
    assert_eq!(snapshot.system.fw_version.as_deref(), Some("2.4.1"));
    let indices: Vec<u8> = snapshot.zones.keys().map(|z| z.get()).collect();
    assert_eq!(indices, vec![1, 2, 3]);
    assert_eq!(snapshot.zone(ZoneIndex::new(2).unwrap()).unwrap().name, "Bedroom");

    // The published snapshot matches the returned one.
    assert_eq!(
        coordinator.snapshot().unwrap().system.system_id,
        snapshot.system.system_id
    );
}

#[tokio::test]
async fn missing_zone_degrades_to_stub_and_cycle_succeeds() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    let mut document = device_document();
    document["zones"].as_object_mut().unwrap().remove("2");
    mount_device(&server, document).await;

    let (client, coordinator, _dir) = harness(&server);
    assert!(client.connect().await);

    let snapshot = coordinator.refresh().await.unwrap();

    let indices: Vec<u8> = snapshot.zones.keys().map(|z| z.get()).collect();
    assert_eq!(indices, vec![1, 2, 3]);

    let stub = snapshot.zone(ZoneIndex::new(2).unwrap()).unwrap();
    assert!(stub.is_stub());
    assert_eq!(stub.name, "Zone 2");
    assert!(!snapshot.zone(ZoneIndex::new(1).unwrap()).unwrap().is_stub());
}

// ── Reconnect behavior ──────────────────────────────────────────────

#[tokio::test]
async fn refresh_reconnects_once_when_disconnected() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_device(&server, device_document()).await;

    // No explicit connect() — the refresh must establish the session.
    let (_client, coordinator, _dir) = harness(&server);

    coordinator.refresh().await.unwrap();

    assert_eq!(count_token_grants(&server).await, 1);
}

#[tokio::test]
async fn failed_reconnect_is_an_auth_error_and_issues_no_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(403).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    let (_client, coordinator, _dir) = harness(&server);

    let result = coordinator.refresh().await;

    assert!(
        matches!(result, Err(CoreError::AuthenticationFailed { .. })),
        "expected auth error, got: {result:?}"
    );
    // Exactly one reconnect attempt, no device fetch.
    assert_eq!(count_token_grants(&server).await, 1);
    assert_eq!(count_device_fetches(&server).await, 0);
    // No snapshot was published.
    assert!(coordinator.snapshot().is_none());
}

// ── Fetch retry ─────────────────────────────────────────────────────

#[tokio::test]
async fn transient_fetch_failure_recovers_after_reconnect() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/devices/{DEVICE_ID}")))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_device(&server, device_document()).await;

    let (client, coordinator, _dir) = harness(&server);
    assert!(client.connect().await);

    let snapshot = coordinator.refresh().await.unwrap();
    assert_eq!(snapshot.zones.len(), 3);

    // Initial grant plus the one recovery reconnect.
    assert_eq!(count_token_grants(&server).await, 2);
}

#[tokio::test]
async fn exhausted_retries_fail_with_diagnostic_context() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/devices/{DEVICE_ID}")))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
        .mount(&server)
        .await;

    let (client, coordinator, _dir) = harness(&server);
    assert!(client.connect().await);

    let result = coordinator.refresh().await;

    match result {
        Err(CoreError::UpdateFailed { ref context }) => {
            assert!(
                context.contains("token present: true"),
                "missing token diagnostic in: {context}"
            );
        }
        other => panic!("expected UpdateFailed, got: {other:?}"),
    }

    // 1 initial fetch + 3 bounded retries.
    assert_eq!(count_device_fetches(&server).await, 4);
    // 1 initial grant + exactly one recovery reconnect.
    assert_eq!(count_token_grants(&server).await, 2);
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn set_zone_mode_round_trips_through_the_next_snapshot() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    // First refresh sees "ventilate", the post-write refresh sees "auto".
    Mock::given(method("GET"))
        .and(path(format!("/v1/devices/{DEVICE_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_document()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    let mut updated = device_document();
    updated["zones"]["1"]["mode"] = json!("auto");
    mount_device(&server, updated).await;

    Mock::given(method("PATCH"))
        .and(path(format!("/v1/devices/{DEVICE_ID}")))
        .and(body_json(json!({ "zones": { "1": { "mode": "auto" } } })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (client, coordinator, _dir) = harness(&server);
    assert!(client.connect().await);
    coordinator.refresh().await.unwrap();

    let zone = ZoneIndex::new(1).unwrap();
    assert!(coordinator.set_zone_mode(zone, "auto").await);

    let snapshot = coordinator.snapshot().unwrap();
    assert_eq!(snapshot.zone(zone).unwrap().mode.as_deref(), Some("auto"));
}

#[tokio::test]
async fn failed_write_reports_false_and_skips_refresh() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_device(&server, device_document()).await;
    Mock::given(method("PATCH"))
        .and(path(format!("/v1/devices/{DEVICE_ID}")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (client, coordinator, _dir) = harness(&server);
    assert!(client.connect().await);
    coordinator.refresh().await.unwrap();
    let fetches_before = count_device_fetches(&server).await;

    let zone = ZoneIndex::new(1).unwrap();
    assert!(!coordinator.set_zone_mode(zone, "auto").await);

    // No post-write refresh after a failed write.
    assert_eq!(count_device_fetches(&server).await, fetches_before);
}

#[tokio::test]
async fn fan_speed_write_snaps_percentage_and_skips_refresh() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_device(&server, device_document()).await;

    // 46 % snaps to the 45 % bucket, i.e. device speed 1.5.
    Mock::given(method("PATCH"))
        .and(path(format!("/v1/devices/{DEVICE_ID}")))
        .and(body_json(json!({ "zones": { "1": { "speed": 1.5 } } })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (client, coordinator, _dir) = harness(&server);
    assert!(client.connect().await);
    coordinator.refresh().await.unwrap();
    let fetches_before = count_device_fetches(&server).await;

    let ctx = EntityContext::new(Arc::clone(&coordinator), EnabledZones::ALL);
    let fan = entity::fan::ZoneFan::new(&ctx, ZoneIndex::new(1).unwrap());
    assert!(fan.set_percentage(&coordinator, 46).await);

    // Speed writes report optimistically; no immediate refresh.
    assert_eq!(count_device_fetches(&server).await, fetches_before);
}

// ── Credentials file lifecycle ──────────────────────────────────────

#[tokio::test]
async fn poll_cycle_restores_a_deleted_credentials_file() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_device(&server, device_document()).await;

    let (client, coordinator, _dir) = harness(&server);
    assert!(client.connect().await);

    std::fs::remove_file(client.credential_store().path()).unwrap();
    coordinator.refresh().await.unwrap();

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

// ── Entity catalog ──────────────────────────────────────────────────

#[tokio::test]
async fn catalog_skips_disabled_zones_and_names_dynamic_profiles() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_device(&server, device_document()).await;

    let (client, coordinator, _dir) = harness(&server);
    assert!(client.connect().await);
    let snapshot = coordinator.refresh().await.unwrap();

    let enabled = EnabledZones {
        zone_1: true,
        zone_2: false,
        zone_3: true,
    };
    let ctx = EntityContext::new(Arc::clone(&coordinator), enabled);
    let catalog = entity::build_catalog(&ctx, &snapshot);

    let ids: Vec<&str> = catalog.iter().map(|e| e.unique_id()).collect();

    assert!(ids.contains(&"getair_AABBCC_system_air_quality_iaq"));
    assert!(ids.contains(&"getair_AABBCC_zone_1_fan"));
    assert!(ids.contains(&"getair_AABBCC_zone_3_operating_mode"));
    // Two named profile slots -> two dynamic name sensors.
    assert!(ids.contains(&"getair_AABBCC_time_profile_1_name"));
    assert!(ids.contains(&"getair_AABBCC_time_profile_2_name"));
    // Disabled zone contributes nothing.
    assert!(ids.iter().all(|id| !id.contains("_zone_2_")));

    // Every entity can render a name and most report a state.
    for e in &catalog {
        assert!(!e.name(&snapshot).is_empty());
    }
}
