//! HTTP server layer for dropafile.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │                  any method, any path ─▶ dispatch               │
//! │                                                                 │
//! │  ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌────────────────┐   │
//! │  │   auth   │  │  upload  │  │  assets  │  │     routes     │   │
//! │  │ (basic)  │  │(multipart│  │ (static) │  │(router config) │   │
//! │  └──────────┘  └──────────┘  └──────────┘  └────────────────┘   │
//! │                    composed by handlers::Application            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod assets;
pub mod auth;
pub mod handlers;
pub mod routes;
pub mod upload;

pub use assets::{Asset, Route, StaticRouter};
pub use auth::{AuthGate, Credentials, AUTH_REALM};
pub use handlers::{dispatch, Application, IncomingRequest, RequestForm, RequestHandler};
pub use routes::{create_router, RouterConfig};
pub use upload::{sanitize_filename, UploadHandler, FALLBACK_FILENAME, UPLOAD_FIELD};
