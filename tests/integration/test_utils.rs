//! Test utilities for integration tests.
//!
//! Helpers for building routers over temporary upload directories and for
//! hand-crafting authenticated and multipart requests.

use std::path::Path;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine};
use http_body_util::BodyExt;

use dropafile::{create_router, Application, Route, RouterConfig};

/// Shared secret used throughout the tests.
pub const TEST_SECRET: &str = "s3cr3t-Pwd12345";

/// Multipart boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "----dropafile-test-boundary";

// =============================================================================
// Router Builders
// =============================================================================

/// A router storing uploads in `upload_dir`, serving the bundled assets.
pub fn test_router(upload_dir: &Path) -> Router {
    test_router_with(upload_dir, RouterConfig::new().with_tracing(false))
}

pub fn test_router_with(upload_dir: &Path, config: RouterConfig) -> Router {
    let app = Application::new(TEST_SECRET, upload_dir);
    create_router(app, config)
}

// =============================================================================
// Request Builders
// =============================================================================

/// `Authorization` header value for HTTP Basic.
pub fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

/// An authenticated request without body.
pub fn authed(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, basic_auth("anyone", TEST_SECRET))
        .body(Body::empty())
        .unwrap()
}

/// A request without any credentials.
pub fn anonymous(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// One part of a hand-built multipart body.
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub content: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn file(filename: &'a str, content: &'a [u8]) -> Self {
        Self {
            name: "file",
            filename: Some(filename),
            content,
        }
    }

    pub fn text(name: &'a str, content: &'a [u8]) -> Self {
        Self {
            name,
            filename: None,
            content,
        }
    }
}

/// Encode parts as `multipart/form-data` using [`BOUNDARY`].
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.filename {
            Some(filename) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        part.name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n");
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// A multipart POST to `/`, optionally authenticated.
pub fn upload_request(parts: &[Part<'_>], authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::from(multipart_body(parts))).unwrap()
}

// =============================================================================
// Response Helpers
// =============================================================================

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub fn content_type(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Names of all entries in a directory, sorted.
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Contents of a bundled asset, by file name.
pub fn bundled_asset(name: &str) -> Vec<u8> {
    [Route::DropzoneJs, Route::DropzoneCss, Route::StyleCss, Route::Index]
        .into_iter()
        .find(|route| route.asset_name() == name)
        .map(|route| route.bundled().to_vec())
        .unwrap()
}
