use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while handling a single request.
///
/// Authentication failures are not represented here: the auth gate answers
/// those directly with a challenge.
#[derive(Debug, Error)]
pub enum AppError {
    /// Reading a static asset or writing an upload failed
    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The multipart body could not be read
    #[error("Malformed upload: {0}")]
    MalformedUpload(String),
}

impl AppError {
    /// Wrap an I/O error together with the path it occurred on.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while provisioning a self-signed certificate.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The external tool could not be started (usually not installed)
    #[error("Certificate tool `{tool}` is not available: {source}")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The external tool ran but reported failure
    #[error("Certificate tool `{tool}` failed ({status}): {stderr}")]
    ToolFailed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    /// The external tool did not finish in time and was killed
    #[error("Certificate tool `{tool}` did not finish within {timeout:?}")]
    TimedOut { tool: String, timeout: Duration },

    /// The tool claimed success but an output file is missing
    #[error("Expected certificate output is missing: {}", .0.display())]
    MissingOutput(PathBuf),

    /// Writing or preparing output files failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// In-process certificate generation failed
    #[error("Certificate generation failed: {0}")]
    Certificate(#[from] rcgen::Error),
}

/// Errors raised while building the TLS server configuration.
#[derive(Debug, Error)]
pub enum TlsError {
    /// Certificate or key file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Certificate or key file is not valid PEM
    #[error("Invalid PEM in {}: {message}", path.display())]
    Pem { path: PathBuf, message: String },

    /// Certificate file contained no certificates
    #[error("No certificates found in {}", .0.display())]
    NoCertificates(PathBuf),

    /// rustls rejected the configuration (e.g. key does not match certificate)
    #[error("TLS configuration error: {0}")]
    Rustls(#[from] rustls::Error),

    /// Certificate material had to be provisioned first and that failed
    #[error(transparent)]
    Provision(#[from] ProvisionError),
}
