//! TLS integration tests.
//!
//! Tests verify:
//! - Legacy protocol handshakes (SSLv3, TLS 1.0, TLS 1.1) are refused
//! - TLS 1.2 and TLS 1.3 clients can connect
//! - A full authenticated upload works over HTTPS

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use reqwest::tls::Version;

use dropafile::{
    build_server_config, create_router, load_or_provision, Application, CertificateParams,
    RcgenProvider, RouterConfig,
};

use super::test_utils::TEST_SECRET;

// =============================================================================
// Helpers
// =============================================================================

async fn provision(cert_dir: &Path) -> (Arc<rustls::ServerConfig>, RustlsConfig) {
    let (material, tls) = load_or_provision(
        None,
        &RcgenProvider::new(),
        &CertificateParams::default(),
        cert_dir,
    )
    .await
    .unwrap();

    (build_server_config(&material).unwrap(), tls)
}

/// Start an HTTPS server on an ephemeral port.
async fn spawn_server(upload_dir: &Path, cert_dir: &Path) -> (SocketAddr, Handle) {
    let (_, tls) = provision(cert_dir).await;

    let app = Application::new(TEST_SECRET, upload_dir);
    let router = create_router(app, RouterConfig::new().with_tracing(false));

    let handle = Handle::new();
    let server = axum_server::bind_rustls(SocketAddr::from(([127, 0, 0, 1], 0)), tls)
        .handle(handle.clone())
        .serve(router.into_make_service());
    tokio::spawn(server);

    let addr = handle.listening().await.expect("server failed to start");
    (addr, handle)
}

fn client(min: Option<Version>, max: Option<Version>) -> reqwest::Client {
    let mut builder = reqwest::Client::builder()
        .use_rustls_tls()
        .danger_accept_invalid_certs(true);
    if let Some(min) = min {
        builder = builder.min_tls_version(min);
    }
    if let Some(max) = max {
        builder = builder.max_tls_version(max);
    }
    builder.build().unwrap()
}

/// A bare ClientHello record offering only `version`, without extensions.
fn legacy_client_hello(version: [u8; 2]) -> Vec<u8> {
    let mut hello = Vec::new();
    hello.extend_from_slice(&version);
    hello.extend_from_slice(&[0x42; 32]); // random
    hello.push(0); // empty session id
    hello.extend_from_slice(&[0x00, 0x04, 0x00, 0x2f, 0x00, 0x0a]); // AES128-SHA, DES-CBC3-SHA
    hello.extend_from_slice(&[0x01, 0x00]); // null compression only

    let mut handshake = vec![0x01];
    handshake.extend_from_slice(&(hello.len() as u32).to_be_bytes()[1..]);
    handshake.extend_from_slice(&hello);

    let mut record = vec![0x16, version[0], version[1]];
    record.extend_from_slice(&(handshake.len() as u16).to_be_bytes());
    record.extend_from_slice(&handshake);
    record
}

// =============================================================================
// Protocol Versions
// =============================================================================

#[tokio::test]
async fn test_legacy_protocols_refused() {
    let cert_dir = tempfile::tempdir().unwrap();
    let (config, _) = provision(cert_dir.path()).await;

    for (label, version) in [
        ("SSLv3", [0x03, 0x00]),
        ("TLS 1.0", [0x03, 0x01]),
        ("TLS 1.1", [0x03, 0x02]),
    ] {
        let mut conn = rustls::ServerConnection::new(config.clone()).unwrap();
        let record = legacy_client_hello(version);

        // Reading may already fail on the record layer; either way no
        // handshake may come out of it.
        let refused = match conn.read_tls(&mut &record[..]) {
            Ok(_) => conn.process_new_packets().is_err(),
            Err(_) => true,
        };
        assert!(refused, "{} handshake was accepted", label);
        assert!(conn.is_handshaking(), "{} handshake completed", label);
    }
}

#[tokio::test]
async fn test_tls12_client_connects() {
    let upload = tempfile::tempdir().unwrap();
    let certs = tempfile::tempdir().unwrap();
    let (addr, handle) = spawn_server(upload.path(), certs.path()).await;

    let response = client(None, Some(Version::TLS_1_2))
        .get(format!("https://{}/", addr))
        .basic_auth("anyone", Some(TEST_SECRET))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    handle.shutdown();
}

#[tokio::test]
async fn test_tls13_client_connects() {
    let upload = tempfile::tempdir().unwrap();
    let certs = tempfile::tempdir().unwrap();
    let (addr, handle) = spawn_server(upload.path(), certs.path()).await;

    let response = client(Some(Version::TLS_1_3), None)
        .get(format!("https://{}/style.css", addr))
        .basic_auth("anyone", Some(TEST_SECRET))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers().get(reqwest::header::CONTENT_TYPE).unwrap(),
        "text/css"
    );

    handle.shutdown();
}

// =============================================================================
// Over The Wire
// =============================================================================

#[tokio::test]
async fn test_https_requires_auth() {
    let upload = tempfile::tempdir().unwrap();
    let certs = tempfile::tempdir().unwrap();
    let (addr, handle) = spawn_server(upload.path(), certs.path()).await;

    let response = client(None, None)
        .get(format!("https://{}/", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
    assert!(response
        .headers()
        .get(reqwest::header::WWW_AUTHENTICATE)
        .is_some());

    handle.shutdown();
}

#[tokio::test]
async fn test_https_upload_end_to_end() {
    let upload = tempfile::tempdir().unwrap();
    let certs = tempfile::tempdir().unwrap();
    let (addr, handle) = spawn_server(upload.path(), certs.path()).await;

    let part = reqwest::multipart::Part::bytes(b"hi".to_vec()).file_name("hello.txt");
    let form = reqwest::multipart::Form::new().part("file", part);

    let response = client(None, None)
        .post(format!("https://{}/", addr))
        .basic_auth("someone", Some(TEST_SECRET))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let stored = std::fs::read(upload.path().join("hello.txt")).unwrap();
    assert_eq!(stored, b"hi");

    handle.shutdown();
}
