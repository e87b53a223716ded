//! Self-signed certificate provisioning.
//!
//! Two providers are available:
//!
//! - [`OpensslProvider`] runs `openssl req -x509 ...` and waits for it, with a
//!   timeout. Its exit status is checked.
//! - [`RcgenProvider`] generates the certificate in-process with `rcgen`.
//!
//! Both write `cert.pem` and `cert.key` into the output directory.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use rcgen::{CertificateParams as RcgenParams, DistinguishedName, DnType, KeyPair};
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::ProvisionError;

/// File name of the generated certificate.
pub const CERT_FILE_NAME: &str = "cert.pem";

/// File name of the generated private key.
pub const KEY_FILE_NAME: &str = "cert.key";

/// Default RSA key size in bits.
pub const DEFAULT_KEY_BITS: u32 = 4096;

/// Default validity in days.
pub const DEFAULT_VALIDITY_DAYS: u32 = 2;

/// Default common name.
pub const DEFAULT_COMMON_NAME: &str = "localhost";

/// Default country code.
pub const DEFAULT_COUNTRY: &str = "US";

/// Default time allowed for the external tool.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(120);

// =============================================================================
// Types
// =============================================================================

/// Paths of a certificate and its private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateMaterial {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl CertificateMaterial {
    pub fn new(cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            cert_path: cert_path.into(),
            key_path: key_path.into(),
        }
    }

    /// The standard file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(CERT_FILE_NAME), dir.join(KEY_FILE_NAME))
    }
}

/// Subject and key parameters for a self-signed certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateParams {
    /// RSA key size (only used by the openssl provider)
    pub key_bits: u32,
    pub validity_days: u32,
    pub common_name: String,
    pub country: String,
    pub state: String,
    pub locality: String,
}

impl Default for CertificateParams {
    fn default() -> Self {
        Self {
            key_bits: DEFAULT_KEY_BITS,
            validity_days: DEFAULT_VALIDITY_DAYS,
            common_name: DEFAULT_COMMON_NAME.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            state: String::new(),
            locality: String::new(),
        }
    }
}

impl CertificateParams {
    /// The subject in openssl's `-subj` syntax, e.g. `/C=US/CN=localhost`.
    ///
    /// Empty fields are left out.
    pub fn openssl_subject(&self) -> String {
        [
            ("C", &self.country),
            ("ST", &self.state),
            ("L", &self.locality),
            ("CN", &self.common_name),
        ]
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("/{}={}", key, escape_subject_value(value)))
        .collect()
    }
}

fn escape_subject_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('/', "\\/")
}

// =============================================================================
// Provider Trait
// =============================================================================

/// Something that can create a self-signed certificate/key pair on disk.
#[async_trait]
pub trait CertificateProvider: Send + Sync {
    /// Create `cert.pem` and `cert.key` in `output_dir`.
    async fn provision(
        &self,
        output_dir: &Path,
        params: &CertificateParams,
    ) -> Result<CertificateMaterial, ProvisionError>;
}

// =============================================================================
// OpenSSL
// =============================================================================

/// Shells out to the `openssl` command line tool.
#[derive(Debug, Clone)]
pub struct OpensslProvider {
    program: String,
    timeout: Duration,
}

impl OpensslProvider {
    pub fn new() -> Self {
        Self {
            program: "openssl".to_string(),
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Use a different executable (name or path).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Kill the tool if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Arguments passed to the tool.
    pub fn args(&self, material: &CertificateMaterial, params: &CertificateParams) -> Vec<String> {
        vec![
            "req".to_string(),
            "-x509".to_string(),
            "-newkey".to_string(),
            format!("rsa:{}", params.key_bits),
            "-nodes".to_string(),
            "-out".to_string(),
            material.cert_path.display().to_string(),
            "-keyout".to_string(),
            material.key_path.display().to_string(),
            "-days".to_string(),
            params.validity_days.to_string(),
            "-sha256".to_string(),
            "-batch".to_string(),
            "-subj".to_string(),
            params.openssl_subject(),
        ]
    }
}

impl Default for OpensslProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CertificateProvider for OpensslProvider {
    async fn provision(
        &self,
        output_dir: &Path,
        params: &CertificateParams,
    ) -> Result<CertificateMaterial, ProvisionError> {
        let material = CertificateMaterial::in_dir(output_dir);

        info!(
            tool = self.program.as_str(),
            bits = params.key_bits,
            days = params.validity_days,
            "Creating self-signed certificate"
        );

        let child = Command::new(&self.program)
            .args(self.args(&material, params))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProvisionError::ToolUnavailable {
                tool: self.program.clone(),
                source,
            })?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ProvisionError::TimedOut {
                tool: self.program.clone(),
                timeout: self.timeout,
            })??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!(stdout = %stdout.trim(), stderr = %stderr.trim(), "Certificate tool output");

        if !output.status.success() {
            return Err(ProvisionError::ToolFailed {
                tool: self.program.clone(),
                status: output.status,
                stderr: stderr.trim().to_string(),
            });
        }

        for path in [&material.cert_path, &material.key_path] {
            if !tokio::fs::try_exists(path).await? {
                return Err(ProvisionError::MissingOutput(path.clone()));
            }
        }

        Ok(material)
    }
}

// =============================================================================
// rcgen
// =============================================================================

/// Generates the certificate in-process.
///
/// Uses an ECDSA P-256 key, so [`CertificateParams::key_bits`] is ignored.
/// The common name is also added as a DNS subject alternative name.
#[derive(Debug, Clone, Default)]
pub struct RcgenProvider;

impl RcgenProvider {
    pub fn new() -> Self {
        Self
    }

    /// Generate the PEM encoded certificate and private key.
    pub fn generate_pem(params: &CertificateParams) -> Result<(String, String), ProvisionError> {
        let mut cert_params = RcgenParams::new(vec![params.common_name.clone()])?;

        let mut dn = DistinguishedName::new();
        if !params.country.is_empty() {
            dn.push(DnType::CountryName, params.country.as_str());
        }
        if !params.state.is_empty() {
            dn.push(DnType::StateOrProvinceName, params.state.as_str());
        }
        if !params.locality.is_empty() {
            dn.push(DnType::LocalityName, params.locality.as_str());
        }
        dn.push(DnType::CommonName, params.common_name.as_str());
        cert_params.distinguished_name = dn;

        let now = time::OffsetDateTime::now_utc();
        cert_params.not_before = now;
        cert_params.not_after = now + time::Duration::days(i64::from(params.validity_days));

        let key_pair = KeyPair::generate()?;
        let cert = cert_params.self_signed(&key_pair)?;

        Ok((cert.pem(), key_pair.serialize_pem()))
    }
}

#[async_trait]
impl CertificateProvider for RcgenProvider {
    async fn provision(
        &self,
        output_dir: &Path,
        params: &CertificateParams,
    ) -> Result<CertificateMaterial, ProvisionError> {
        let material = CertificateMaterial::in_dir(output_dir);

        info!(
            days = params.validity_days,
            "Creating self-signed certificate in-process"
        );

        let (cert_pem, key_pem) = Self::generate_pem(params)?;
        tokio::fs::write(&material.cert_path, cert_pem).await?;
        tokio::fs::write(&material.key_path, key_pem).await?;

        Ok(material)
    }
}

// =============================================================================
// Tests
// =============================================================================
