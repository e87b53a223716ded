//! Persisting uploaded files.
//!
//! The upload page posts a multipart form with a single `file` field. The
//! client-supplied filename is reduced to a safe basename before it touches
//! the filesystem, and the content is streamed to a hidden partial file that
//! is renamed into place once complete. Concurrent uploads with the same name
//! therefore never interleave: the last one to finish wins.

use std::path::{Path, PathBuf};

use axum::extract::multipart::{Field, MultipartError};
use rand::{rngs::OsRng, Rng};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::AppError;

use super::handlers::{IncomingRequest, RequestForm};

/// Name of the multipart field carrying the file.
pub const UPLOAD_FIELD: &str = "file";

/// Stored name used when sanitization leaves nothing of the original.
pub const FALLBACK_FILENAME: &str = "upload";

/// Longest stored filename in bytes.
const MAX_FILENAME_LEN: usize = 255;

/// Prefix of the hidden file an upload is streamed to before the rename.
const PARTIAL_PREFIX: &str = ".upload.";

/// Reduce a client-supplied filename to a safe basename.
///
/// Directory components (`/` and `\` separated) are dropped, whitespace runs
/// become `_`, everything outside `[A-Za-z0-9._-]` is removed and leading or
/// trailing `.`/`_` are stripped. The result never contains a path separator
/// and is never `.` or `..`.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(raw);

    let joined = base.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        return FALLBACK_FILENAME.to_string();
    }

    // ASCII only at this point, so any byte index is a char boundary
    let mut name = trimmed.to_string();
    name.truncate(MAX_FILENAME_LEN);
    name
}

/// Writes the `file` field of a request into the upload directory.
#[derive(Debug, Clone)]
pub struct UploadHandler {
    upload_dir: PathBuf,
}

impl UploadHandler {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Store the uploaded file, if the request carries one.
    ///
    /// Returns the destination path, or `None` when there is no form or no
    /// `file` field with a filename. Fields other than `file` are skipped. A
    /// form that cannot be read is a [`AppError::MalformedUpload`].
    pub async fn process(&self, request: &mut IncomingRequest) -> Result<Option<PathBuf>, AppError> {
        let form = match request.form_mut() {
            RequestForm::Absent => return Ok(None),
            RequestForm::Invalid(reason) => return Err(AppError::MalformedUpload(reason.clone())),
            RequestForm::Multipart(form) => form,
        };

        while let Some(field) = form.next_field().await.map_err(malformed)? {
            if field.name() != Some(UPLOAD_FIELD) {
                continue;
            }
            let Some(filename) = field.file_name().map(str::to_owned) else {
                debug!("`file` field has no filename, ignoring");
                continue;
            };

            let dest = self.store(&filename, field).await?;
            return Ok(Some(dest));
        }

        Ok(None)
    }

    async fn store(&self, filename: &str, mut field: Field<'_>) -> Result<PathBuf, AppError> {
        let name = sanitize_filename(filename);
        let dest = self.upload_dir.join(&name);
        let partial = self.upload_dir.join(partial_name(OsRng.gen()));

        if let Err(e) = write_partial(&partial, &mut field).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }

        if let Err(e) = tokio::fs::rename(&partial, &dest).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(AppError::filesystem(&dest, e));
        }

        info!(path = %dest.display(), original = filename, "Received upload");
        Ok(dest)
    }
}

/// Name of a partial file. Independent of the stored name, so it stays short
/// however long that is.
fn partial_name(token: u64) -> String {
    format!("{}{:016x}.part", PARTIAL_PREFIX, token)
}

async fn write_partial(partial: &Path, field: &mut Field<'_>) -> Result<(), AppError> {
    let mut file = tokio::fs::File::create(partial)
        .await
        .map_err(|e| AppError::filesystem(partial, e))?;

    while let Some(chunk) = field.chunk().await.map_err(malformed)? {
        file.write_all(&chunk)
            .await
            .map_err(|e| AppError::filesystem(partial, e))?;
    }

    file.flush()
        .await
        .map_err(|e| AppError::filesystem(partial, e))
}

fn malformed(err: MultipartError) -> AppError {
    AppError::MalformedUpload(err.body_text())
}

// =============================================================================
// Tests
// =============================================================================
