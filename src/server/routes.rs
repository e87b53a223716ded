//! Router configuration for dropafile.
//!
//! There is no path-based routing at the axum level: a single fallback hands
//! every request, whatever its method or path, to the [`RequestHandler`]. Path
//! resolution happens afterwards in the static router.
//!
//! # Example
//!
//! ```ignore
//! use dropafile::server::{create_router, Application, RouterConfig};
//!
//! let app = Application::new(secret, upload_dir);
//! let router = create_router(app, RouterConfig::new());
//!
//! axum_server::bind_rustls(addr, tls_config)
//!     .serve(router.into_make_service())
//!     .await?;
//! ```

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{dispatch, RequestHandler};

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Largest accepted request body in bytes (None = unlimited)
    pub max_body_bytes: Option<usize>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration with defaults.
    ///
    /// By default:
    /// - Request bodies are unlimited, uploads can be any size
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            max_body_bytes: None,
            enable_tracing: true,
        }
    }

    /// Limit the request body size.
    pub fn with_max_body_bytes(mut self, limit: Option<usize>) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// Every request is dispatched to `handler`. axum's default 2MB body limit is
/// replaced by the configured one.
pub fn create_router<H>(handler: H, config: RouterConfig) -> Router
where
    H: RequestHandler + 'static,
{
    let body_limit = match config.max_body_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    let router = Router::new()
        .fallback(dispatch::<H>)
        .with_state(Arc::new(handler))
        .layer(body_limit);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

// =============================================================================
// Tests
// =============================================================================
