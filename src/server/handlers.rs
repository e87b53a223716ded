//! Request handling pipeline.
//!
//! Every request, whatever its path or method, goes through the same
//! [`Application`]:
//!
//! ```text
//! IncomingRequest ──▶ AuthGate ──▶ UploadHandler ──▶ StaticRouter ──▶ Response
//!                        │
//!                        └─ 401 challenge
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use crate::error::AppError;

use super::assets::StaticRouter;
use super::auth::{AuthGate, Credentials};
use super::upload::UploadHandler;

// =============================================================================
// Incoming Request
// =============================================================================

/// The multipart body of a request, if it has one.
///
/// The body is read lazily, so nothing is consumed before the request has
/// been authenticated.
pub enum RequestForm {
    /// Not a `multipart/form-data` request
    Absent,
    /// A multipart body waiting to be read
    Multipart(Multipart),
    /// Declared as multipart but unusable (e.g. missing boundary)
    Invalid(String),
}

/// What the application needs to know about a request.
pub struct IncomingRequest {
    method: Method,
    path: String,
    credentials: Option<Credentials>,
    form: RequestForm,
}

impl IncomingRequest {
    /// Create a request without credentials or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            credentials: None,
            form: RequestForm::Absent,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_form(mut self, form: RequestForm) -> Self {
        self.form = form;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn form_mut(&mut self) -> &mut RequestForm {
        &mut self.form
    }
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("multipart/form-data")
        })
        .unwrap_or(false)
}

impl<S> FromRequest<S> for IncomingRequest
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let credentials = Credentials::from_headers(request.headers());

        let form = if is_multipart(&request) {
            match Multipart::from_request(request, state).await {
                Ok(multipart) => RequestForm::Multipart(multipart),
                Err(rejection) => RequestForm::Invalid(rejection.body_text()),
            }
        } else {
            RequestForm::Absent
        };

        Ok(Self {
            method,
            path,
            credentials,
            form,
        })
    }
}

// =============================================================================
// Request Handler
// =============================================================================

/// Something that turns a request into a response.
///
/// Implementations must always produce a response; failures are rendered as
/// error pages rather than propagated.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, request: IncomingRequest) -> Response;
}

/// The upload service: authentication, upload persistence, static pages.
///
/// Holds the shared secret and upload directory for the life of the process.
/// All fields are read-only, so one instance can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct Application {
    auth: AuthGate,
    uploads: UploadHandler,
    assets: StaticRouter,
}

impl Application {
    /// Create the application serving the bundled assets.
    ///
    /// `upload_dir` must already exist.
    pub fn new(secret: impl Into<String>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            auth: AuthGate::new(secret),
            uploads: UploadHandler::new(upload_dir),
            assets: StaticRouter::bundled(),
        }
    }

    /// Serve the page and its assets from `static_dir` instead.
    pub fn with_static_dir(mut self, static_dir: impl Into<PathBuf>) -> Self {
        self.assets = StaticRouter::from_dir(static_dir);
        self
    }

    pub fn secret(&self) -> &str {
        self.auth.secret()
    }

    pub fn upload_dir(&self) -> &Path {
        self.uploads.upload_dir()
    }

    pub fn static_dir(&self) -> Option<&Path> {
        self.assets.static_dir()
    }
}

#[async_trait]
impl RequestHandler for Application {
    async fn handle(&self, mut request: IncomingRequest) -> Response {
        if !self.auth.check(&request) {
            return self.auth.challenge();
        }

        if let Err(e) = self.uploads.process(&mut request).await {
            return e.into_response();
        }

        match self.assets.resolve(request.path()).await {
            Ok(asset) => asset.into_response(),
            Err(e) => e.into_response(),
        }
    }
}

/// Axum handler forwarding every request to the shared [`RequestHandler`].
pub async fn dispatch<H>(State(handler): State<Arc<H>>, request: IncomingRequest) -> Response
where
    H: RequestHandler + 'static,
{
    handler.handle(request).await
}

// =============================================================================
// Error Mapping
// =============================================================================

fn error_page(status: StatusCode, title: &str, message: &str) -> Response {
    let body = format!(
        "<!DOCTYPE HTML PUBLIC \"-//W3C//DTD HTML 3.2 Final//EN\">\n\
         <title>{code} {title}</title>\n\
         <h1>{title}</h1><p>{message}</p>",
        code = status.as_u16(),
        title = title,
        message = message,
    );

    let mut response = (status, body).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
    response
}

/// Convert AppError to an HTML error page.
///
/// The page never includes paths or OS error text; those go to the log.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Filesystem { path, source } => {
                error!(
                    error_type = "filesystem",
                    status = 500u16,
                    path = %path.display(),
                    "Server error: {}",
                    source
                );
                error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    "The server could not complete your request.",
                )
            }
            AppError::MalformedUpload(reason) => {
                warn!(
                    error_type = "malformed_upload",
                    status = 400u16,
                    "Client error: {}",
                    reason
                );
                error_page(
                    StatusCode::BAD_REQUEST,
                    "Bad Request",
                    "The uploaded form could not be read.",
                )
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
