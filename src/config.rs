//! Configuration management for dropafile.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `DROPAFILE_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Environment Variables
//!
//! - `DROPAFILE_HOST` - Host to bind to (default: localhost)
//! - `DROPAFILE_PORT` - Port to listen on (default: 8443)
//! - `DROPAFILE_PASSWORD` - Shared secret (default: generated at startup)
//! - `DROPAFILE_UPLOAD_DIR` - Where uploads are stored (default: fresh temp dir)
//! - `DROPAFILE_STATIC_DIR` - Directory replacing the bundled page and assets
//! - `DROPAFILE_CERT` / `DROPAFILE_KEY` - Existing certificate and key (PEM)
//! - `DROPAFILE_CERT_DIR` - Where generated certificates go (default: fresh temp dir)
//! - `DROPAFILE_CERT_PROVIDER` - `openssl` or `rcgen` (default: openssl)
//! - `DROPAFILE_CERT_BITS`, `DROPAFILE_CERT_DAYS`, `DROPAFILE_CERT_CN`,
//!   `DROPAFILE_CERT_COUNTRY`, `DROPAFILE_CERT_STATE`, `DROPAFILE_CERT_LOCALITY`
//! - `DROPAFILE_CERT_TIMEOUT` - Seconds allowed for `openssl` (default: 120)
//! - `DROPAFILE_MAX_UPLOAD_BYTES` - Request body limit (default: unlimited)

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::tls::{
    CertificateMaterial, CertificateParams, CertificateProvider, OpensslProvider, RcgenProvider,
    DEFAULT_COMMON_NAME, DEFAULT_COUNTRY, DEFAULT_KEY_BITS, DEFAULT_VALIDITY_DAYS,
};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8443;

/// Default seconds allowed for the certificate tool.
pub const DEFAULT_CERT_TIMEOUT_SECS: u64 = 120;

/// Smallest RSA key size accepted.
pub const MIN_KEY_BITS: u32 = 2048;

// =============================================================================
// CLI Arguments
// =============================================================================

/// How to create a certificate when none is supplied.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Run the `openssl` command line tool (RSA key)
    Openssl,
    /// Generate in-process (ECDSA P-256 key)
    Rcgen,
}

/// dropafile - drop me a file on a webpage.
///
/// Serves a password-protected HTTPS upload page. Files dropped on the page
/// are stored in a local directory.
#[derive(Parser, Debug, Clone)]
#[command(name = "dropafile")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host we bind to. An IP address or DNS name.
    #[arg(long, default_value = DEFAULT_HOST, env = "DROPAFILE_HOST")]
    pub host: String,

    /// Port we listen at.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "DROPAFILE_PORT")]
    pub port: u16,

    /// Password required to use the service.
    ///
    /// If not given, a random one is generated and printed at startup.
    #[arg(long, env = "DROPAFILE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Directory uploaded files are stored in (created if missing).
    ///
    /// If not given, a new temporary directory is used.
    #[arg(long, env = "DROPAFILE_UPLOAD_DIR")]
    pub upload_dir: Option<PathBuf>,

    /// Directory with `page.html`, `dropzone.js`, `dropzone.css` and
    /// `style.css` to serve instead of the bundled ones.
    #[arg(long, env = "DROPAFILE_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Largest accepted request body in bytes. Unlimited if not given.
    #[arg(long, env = "DROPAFILE_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: Option<usize>,

    // =========================================================================
    // TLS Configuration
    // =========================================================================
    /// Existing PEM certificate. Requires --key.
    #[arg(long, env = "DROPAFILE_CERT")]
    pub cert: Option<PathBuf>,

    /// Existing PEM private key. Requires --cert.
    #[arg(long, env = "DROPAFILE_KEY")]
    pub key: Option<PathBuf>,

    /// Directory generated certificates are written to.
    ///
    /// If not given, a new temporary directory is used.
    #[arg(long, env = "DROPAFILE_CERT_DIR")]
    pub cert_dir: Option<PathBuf>,

    /// How to generate a self-signed certificate.
    #[arg(long, value_enum, default_value_t = ProviderKind::Openssl, env = "DROPAFILE_CERT_PROVIDER")]
    pub cert_provider: ProviderKind,

    /// RSA key size for generated certificates.
    #[arg(long, default_value_t = DEFAULT_KEY_BITS, env = "DROPAFILE_CERT_BITS")]
    pub cert_bits: u32,

    /// Validity of generated certificates in days.
    #[arg(long, default_value_t = DEFAULT_VALIDITY_DAYS, env = "DROPAFILE_CERT_DAYS")]
    pub cert_days: u32,

    /// Common name of generated certificates.
    #[arg(long, default_value = DEFAULT_COMMON_NAME, env = "DROPAFILE_CERT_CN")]
    pub cert_cn: String,

    /// Two-letter country code of generated certificates.
    #[arg(long, default_value = DEFAULT_COUNTRY, env = "DROPAFILE_CERT_COUNTRY")]
    pub cert_country: String,

    /// State or province of generated certificates.
    #[arg(long, default_value = "", env = "DROPAFILE_CERT_STATE")]
    pub cert_state: String,

    /// Locality of generated certificates.
    #[arg(long, default_value = "", env = "DROPAFILE_CERT_LOCALITY")]
    pub cert_locality: String,

    /// Seconds the `openssl` tool may run before it is killed.
    #[arg(long, default_value_t = DEFAULT_CERT_TIMEOUT_SECS, env = "DROPAFILE_CERT_TIMEOUT")]
    pub cert_timeout: u64,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("port must be greater than 0".to_string());
        }

        if self.host.trim().is_empty() {
            return Err("host must not be empty. Set --host or DROPAFILE_HOST".to_string());
        }

        if matches!(self.password.as_deref(), Some("")) {
            return Err("password must not be empty".to_string());
        }

        match (&self.cert, &self.key) {
            (Some(_), None) => return Err("--cert requires --key".to_string()),
            (None, Some(_)) => return Err("--key requires --cert".to_string()),
            _ => {}
        }

        if self.cert_bits < MIN_KEY_BITS {
            return Err(format!("cert_bits must be at least {}", MIN_KEY_BITS));
        }

        if self.cert_days == 0 {
            return Err("cert_days must be greater than 0".to_string());
        }

        if self.cert_cn.is_empty() {
            return Err("cert_cn must not be empty".to_string());
        }

        if !self.cert_country.is_empty()
            && (self.cert_country.len() != 2
                || !self.cert_country.chars().all(|c| c.is_ascii_alphabetic()))
        {
            return Err("cert_country must be a two-letter country code".to_string());
        }

        if self.cert_timeout == 0 {
            return Err("cert_timeout must be greater than 0".to_string());
        }

        if self.max_upload_bytes == Some(0) {
            return Err("max_upload_bytes must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Certificate and key supplied on the command line, if both are set.
    pub fn certificate_material(&self) -> Option<CertificateMaterial> {
        match (&self.cert, &self.key) {
            (Some(cert), Some(key)) => Some(CertificateMaterial::new(cert, key)),
            _ => None,
        }
    }

    /// Parameters for generating a self-signed certificate.
    pub fn certificate_params(&self) -> CertificateParams {
        CertificateParams {
            key_bits: self.cert_bits,
            validity_days: self.cert_days,
            common_name: self.cert_cn.clone(),
            country: self.cert_country.clone(),
            state: self.cert_state.clone(),
            locality: self.cert_locality.clone(),
        }
    }

    /// The configured certificate provider.
    pub fn certificate_provider(&self) -> Box<dyn CertificateProvider> {
        match self.cert_provider {
            ProviderKind::Openssl => Box::new(
                OpensslProvider::new().with_timeout(Duration::from_secs(self.cert_timeout)),
            ),
            ProviderKind::Rcgen => Box::new(RcgenProvider::new()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
