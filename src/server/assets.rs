//! Static asset routing.
//!
//! The server only knows four assets. Every other path, including the upload
//! POST target, renders the upload page.
//!
//! The assets are compiled into the binary. A directory on disk can replace
//! them (`--static-dir`).

use std::path::{Path, PathBuf};

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::debug;

use crate::error::AppError;

// =============================================================================
// Routes
// =============================================================================

/// A known request path, or the default page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `/dropzone.js`
    DropzoneJs,
    /// `/dropzone.css`
    DropzoneCss,
    /// `/style.css`
    StyleCss,
    /// `/index.html` and every unknown path
    Index,
}

impl Route {
    /// Resolve a request path. Unknown paths map to [`Route::Index`].
    pub fn from_path(path: &str) -> Self {
        match path {
            "/dropzone.js" => Route::DropzoneJs,
            "/dropzone.css" => Route::DropzoneCss,
            "/style.css" => Route::StyleCss,
            _ => Route::Index,
        }
    }

    /// File name of the asset inside the static directory.
    pub fn asset_name(self) -> &'static str {
        match self {
            Route::DropzoneJs => "dropzone.js",
            Route::DropzoneCss => "dropzone.css",
            Route::StyleCss => "style.css",
            Route::Index => "page.html",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Route::DropzoneJs => "text/javascript",
            Route::DropzoneCss | Route::StyleCss => "text/css",
            Route::Index => "text/html",
        }
    }

    /// The copy of the asset compiled into the binary.
    pub fn bundled(self) -> &'static [u8] {
        match self {
            Route::DropzoneJs => include_bytes!("../../static/dropzone.js"),
            Route::DropzoneCss => include_bytes!("../../static/dropzone.css"),
            Route::StyleCss => include_bytes!("../../static/style.css"),
            Route::Index => include_bytes!("../../static/page.html"),
        }
    }
}

// =============================================================================
// Static Router
// =============================================================================

/// A loaded asset ready to be sent.
#[derive(Debug, Clone)]
pub struct Asset {
    pub route: Route,
    pub content: Bytes,
}

impl Asset {
    pub fn content_type(&self) -> &'static str {
        self.route.content_type()
    }
}

impl IntoResponse for Asset {
    fn into_response(self) -> Response {
        let content_type = self.content_type();
        let mut response = (StatusCode::OK, self.content).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(content_type),
        );
        response
    }
}

/// Serves the asset for a route, either bundled or from a directory.
#[derive(Debug, Clone, Default)]
pub struct StaticRouter {
    static_dir: Option<PathBuf>,
}

impl StaticRouter {
    /// Serve the assets compiled into the binary.
    pub fn bundled() -> Self {
        Self { static_dir: None }
    }

    /// Serve the assets from `static_dir` instead.
    pub fn from_dir(static_dir: impl Into<PathBuf>) -> Self {
        Self {
            static_dir: Some(static_dir.into()),
        }
    }

    /// The override directory, if any.
    pub fn static_dir(&self) -> Option<&Path> {
        self.static_dir.as_deref()
    }

    /// Load the asset for `path`.
    ///
    /// With an override directory, a missing or unreadable asset file is a
    /// server error; it is never turned into a 404.
    pub async fn resolve(&self, path: &str) -> Result<Asset, AppError> {
        let route = Route::from_path(path);

        let Some(dir) = &self.static_dir else {
            return Ok(Asset {
                route,
                content: Bytes::from_static(route.bundled()),
            });
        };

        let file = dir.join(route.asset_name());
        debug!(path, file = %file.display(), "Serving static asset from disk");

        let content = tokio::fs::read(&file)
            .await
            .map_err(|e| AppError::filesystem(&file, e))?;

        Ok(Asset {
            route,
            content: Bytes::from(content),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
