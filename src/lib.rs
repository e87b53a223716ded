//! # dropafile
//!
//! Drop me a file on a webpage.
//!
//! A small HTTPS service that serves an upload page protected by HTTP Basic
//! authentication. Files sent to it are stored in a local directory.
//!
//! ## Features
//!
//! - **One shared password**: any username, one secret (generated if not given)
//! - **TLS out of the box**: self-signed certificate via `openssl` or in-process
//! - **Streaming uploads**: multipart bodies are written to disk chunk by chunk
//! - **Safe filenames**: client supplied names are reduced to a single component
//!
//! ## Architecture
//!
//! - [`server`] - Axum-based HTTP layer: auth gate, upload handler, static routes
//! - [`tls`] - Certificate provisioning and rustls configuration
//! - [`password`] - Random shared secret generation
//! - [`scratch`] - Temporary directories for uploads and certificates
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use dropafile::{create_router, Application, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Application::new("s3cr3t", "/tmp/uploads");
//!     let router = create_router(app, RouterConfig::default());
//!
//!     // Serve the router with axum_server::bind_rustls...
//! #   let _ = router;
//! }
//! ```

pub mod config;
pub mod error;
pub mod password;
pub mod scratch;
pub mod server;
pub mod tls;

// Re-export commonly used types
pub use config::{Config, ProviderKind};
pub use error::{AppError, ProvisionError, TlsError};
pub use password::{generate_password, PASSWORD_ALPHABET, PASSWORD_LENGTH};
pub use scratch::{create_scratch_dir, prepare_dir};
pub use server::{
    create_router, dispatch, Application, AuthGate, Credentials, IncomingRequest, RequestHandler,
    Route, RouterConfig, StaticRouter, UploadHandler, FALLBACK_FILENAME, UPLOAD_FIELD,
};
pub use tls::{
    build_server_config, load_or_provision, CertificateMaterial, CertificateParams,
    CertificateProvider, OpensslProvider, RcgenProvider,
};
