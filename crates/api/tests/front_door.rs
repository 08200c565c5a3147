//! Front-door tests: redirect listener, TLS serving, and hot
//! reconfiguration.
//!
//! Self-signed localhost certificates live in `testdata/`; the client
//! skips verification since the point here is the server's behavior, not
//! the trust chain.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Duration as ChronoDuration;
use crumble_api::app::{AppServices, build_app};
use crumble_api::config::{FrontDoorConfig, TlsMaterial};
use crumble_api::server::{FrontDoor, FrontDoorError, FrontDoorState};
use crumble_auth::PasswordHasher;
use crumble_store::InMemoryUserStore;
use serde_json::{Value, json};

const CERT_A: &[u8] = include_bytes!("testdata/cert_a.pem");
const KEY_A: &[u8] = include_bytes!("testdata/key_a.pem");
const CERT_B: &[u8] = include_bytes!("testdata/cert_b.pem");
const KEY_B: &[u8] = include_bytes!("testdata/key_b.pem");

fn ephemeral() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

fn app_router() -> axum::Router {
    let store = Arc::new(InMemoryUserStore::new());
    let hasher = Arc::new(PasswordHasher::with_params(4096, 1, 1).unwrap());
    let services = Arc::new(AppServices::with_hasher(
        store,
        hasher,
        b"front-door-test-secret",
        ChronoDuration::minutes(15),
    ));
    build_app(services)
}

fn config(http_addr: SocketAddr, https_addr: SocketAddr, tls: TlsMaterial) -> FrontDoorConfig {
    FrontDoorConfig {
        http_addr,
        https_addr,
        tls,
        routes: app_router(),
    }
}

fn tls_client() -> reqwest::Client {
    reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn plaintext_requests_redirect_to_https() {
    let front_door = FrontDoor::new();
    let (http_addr, https_addr) = front_door
        .start(config(ephemeral(), ephemeral(), TlsMaterial::new(CERT_A, KEY_A)))
        .await
        .unwrap();

    let client = tls_client();
    let response = client
        .get(format!("http://{http_addr}/feed?page=2"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 308);
    let location = response.headers().get("location").unwrap().to_str().unwrap();
    assert_eq!(
        location,
        format!("https://127.0.0.1:{}/feed?page=2", https_addr.port())
    );

    front_door.stop().await.unwrap();
}

#[tokio::test]
async fn https_serves_the_application() {
    let front_door = FrontDoor::new();
    let (_, https_addr) = front_door
        .start(config(ephemeral(), ephemeral(), TlsMaterial::new(CERT_A, KEY_A)))
        .await
        .unwrap();

    let client = tls_client();
    let response = client
        .get(format!("https://127.0.0.1:{}/health", https_addr.port()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    front_door.stop().await.unwrap();
}

#[tokio::test]
async fn invalid_material_fails_reconfigure_and_keeps_serving() {
    let front_door = FrontDoor::new();
    let (http_addr, https_addr) = front_door
        .start(config(ephemeral(), ephemeral(), TlsMaterial::new(CERT_A, KEY_A)))
        .await
        .unwrap();

    let err = front_door
        .reconfigure(config(
            http_addr,
            https_addr,
            TlsMaterial::new(b"garbage".to_vec(), b"garbage".to_vec()),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, FrontDoorError::Config(_)));

    // The old configuration is still live.
    let client = tls_client();
    let response = client
        .get(format!("https://127.0.0.1:{}/health", https_addr.port()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    front_door.stop().await.unwrap();
}

#[tokio::test]
async fn reconfigure_swaps_certificates_without_dropping_service() {
    let front_door = FrontDoor::new();
    let (http_addr, https_addr) = front_door
        .start(config(ephemeral(), ephemeral(), TlsMaterial::new(CERT_A, KEY_A)))
        .await
        .unwrap();

    let client = tls_client();
    let base = format!("https://127.0.0.1:{}", https_addr.port());

    // Register under the first configuration.
    let response = client
        .post(format!("{base}/api/register"))
        .json(&json!({ "username": "alice_x", "password": "abcd1234" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Rebind the same ports with the second certificate.
    front_door
        .reconfigure(config(http_addr, https_addr, TlsMaterial::new(CERT_B, KEY_B)))
        .await
        .unwrap();

    // Same ports, new certificate, service still answering. The new
    // listener set has its own router over a fresh store, so only the
    // endpoints themselves are asserted here.
    let response = client
        .post(format!("{base}/api/register"))
        .json(&json!({ "username": "alice_x", "password": "abcd1234" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    front_door.stop().await.unwrap();
}

#[tokio::test]
async fn reconfigure_keeps_the_shared_store() {
    // One AppServices shared across both configurations: accounts made
    // before the swap survive it.
    let store = Arc::new(InMemoryUserStore::new());
    let hasher = Arc::new(PasswordHasher::with_params(4096, 1, 1).unwrap());
    let services = Arc::new(AppServices::with_hasher(
        store,
        hasher,
        b"front-door-test-secret",
        ChronoDuration::minutes(15),
    ));

    let front_door = FrontDoor::new();
    let (http_addr, https_addr) = front_door
        .start(FrontDoorConfig {
            http_addr: ephemeral(),
            https_addr: ephemeral(),
            tls: TlsMaterial::new(CERT_A, KEY_A),
            routes: build_app(services.clone()),
        })
        .await
        .unwrap();

    let client = tls_client();
    let base = format!("https://127.0.0.1:{}", https_addr.port());

    let response = client
        .post(format!("{base}/api/register"))
        .json(&json!({ "username": "bob_jones", "password": "abcd1234" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    front_door
        .reconfigure(FrontDoorConfig {
            http_addr,
            https_addr,
            tls: TlsMaterial::new(CERT_B, KEY_B),
            routes: build_app(services),
        })
        .await
        .unwrap();

    let response = client
        .post(format!("{base}/api/login"))
        .json(&json!({ "username": "bob_jones", "password": "abcd1234" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    front_door.stop().await.unwrap();
}

#[tokio::test]
async fn control_surface_answers_while_a_reconfigure_drains() {
    let front_door = Arc::new(FrontDoor::new());
    let (http_addr, https_addr) = front_door
        .start(config(ephemeral(), ephemeral(), TlsMaterial::new(CERT_A, KEY_A)))
        .await
        .unwrap();
    assert_eq!(front_door.state().await, FrontDoorState::Running);

    let handle = {
        let front_door = front_door.clone();
        tokio::spawn(async move {
            front_door
                .reconfigure(config(http_addr, https_addr, TlsMaterial::new(CERT_B, KEY_B)))
                .await
        })
    };

    // state() must not block on the old set's drain grace.
    let observed = tokio::time::timeout(std::time::Duration::from_secs(1), front_door.state())
        .await
        .expect("state() blocked behind the drain");
    assert!(matches!(
        observed,
        FrontDoorState::Running | FrontDoorState::Draining
    ));

    handle.await.unwrap().unwrap();
    assert_eq!(front_door.state().await, FrontDoorState::Running);

    front_door.stop().await.unwrap();
    assert_eq!(front_door.state().await, FrontDoorState::Stopped);
}

#[tokio::test]
async fn lifecycle_errors_are_reported() {
    let front_door = FrontDoor::new();

    // Not running yet.
    assert!(matches!(
        front_door.stop().await.unwrap_err(),
        FrontDoorError::NotRunning
    ));
    assert!(matches!(
        front_door
            .reconfigure(config(ephemeral(), ephemeral(), TlsMaterial::new(CERT_A, KEY_A)))
            .await
            .unwrap_err(),
        FrontDoorError::NotRunning
    ));

    front_door
        .start(config(ephemeral(), ephemeral(), TlsMaterial::new(CERT_A, KEY_A)))
        .await
        .unwrap();

    // Already running.
    assert!(matches!(
        front_door
            .start(config(ephemeral(), ephemeral(), TlsMaterial::new(CERT_A, KEY_A)))
            .await
            .unwrap_err(),
        FrontDoorError::AlreadyRunning
    ));

    front_door.stop().await.unwrap();
}
