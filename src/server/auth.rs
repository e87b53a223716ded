//! HTTP Basic authentication against the shared secret.
//!
//! Any username is accepted; only the password is checked, in constant time.
//! There is no lockout and no rate limiting.
//!
//! # Example
//!
//! ```rust
//! use dropafile::server::auth::{AuthGate, Credentials};
//! use dropafile::server::handlers::IncomingRequest;
//! use http::Method;
//!
//! let gate = AuthGate::new("s3cr3t");
//!
//! let request = IncomingRequest::new(Method::GET, "/")
//!     .with_credentials(Credentials::new("anyone", "s3cr3t"));
//! assert!(gate.check(&request));
//!
//! let anonymous = IncomingRequest::new(Method::GET, "/");
//! assert!(!gate.check(&anonymous));
//! ```

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use super::handlers::IncomingRequest;

/// Realm announced in the `WWW-Authenticate` challenge.
pub const AUTH_REALM: &str = "Login required";

const UNAUTHORIZED_PAGE: &str = "<!DOCTYPE HTML PUBLIC \"-//W3C//DTD HTML 3.2 Final//EN\">\n\
<title>401 Unauthorized</title>\n\
<h1>Unauthorized</h1>\
<p>You are not authorized to use this service.</p>";

// =============================================================================
// Credentials
// =============================================================================

/// Username and password sent with a request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parse Basic credentials out of the `Authorization` header.
    ///
    /// Returns `None` when the header is missing, uses another scheme, is not
    /// valid base64 or UTF-8, or has no `:` separator.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        Self::parse_basic(value)
    }

    /// Parse the value of an `Authorization: Basic ...` header.
    pub fn parse_basic(value: &str) -> Option<Self> {
        let (scheme, encoded) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }

        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;

        Some(Self::new(username, password))
    }
}

// Keep the password out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// =============================================================================
// Auth Gate
// =============================================================================

/// Checks requests against the process-wide shared secret.
#[derive(Clone)]
pub struct AuthGate {
    secret: String,
}

impl AuthGate {
    /// Create a gate that accepts exactly `secret` as password.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// The secret this gate accepts.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Return whether the request carries the right password.
    pub fn check(&self, request: &IncomingRequest) -> bool {
        match request.credentials() {
            None => {
                debug!(path = request.path(), "No credentials supplied");
                false
            }
            Some(credentials) if !self.matches(&credentials.password) => {
                warn!(
                    method = %request.method(),
                    path = request.path(),
                    username = credentials.username.as_str(),
                    "Authentication failed: wrong password"
                );
                false
            }
            Some(_) => true,
        }
    }

    fn matches(&self, password: &str) -> bool {
        password.as_bytes().ct_eq(self.secret.as_bytes()).into()
    }

    /// Build the 401 response asking the client for Basic credentials.
    pub fn challenge(&self) -> Response {
        let challenge = format!("Basic realm=\"{}\"", AUTH_REALM);
        let mut response = (StatusCode::UNAUTHORIZED, UNAUTHORIZED_PAGE).into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html"),
        );
        if let Ok(value) = HeaderValue::from_str(&challenge) {
            headers.insert(header::WWW_AUTHENTICATE, value);
        }
        response
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate").finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
