//! Building the rustls server configuration.
//!
//! Only TLS 1.3 and TLS 1.2 are enabled. rustls has no implementation of SSL
//! 2/3 or TLS 1.0/1.1, and pinning the version list keeps it that way should
//! the library defaults ever change.

use std::path::Path;
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{ServerConfig, SupportedProtocolVersion};
use tracing::info;

use crate::error::TlsError;

use super::provision::{CertificateMaterial, CertificateParams, CertificateProvider};

/// Protocol versions the server negotiates, newest first.
pub static SUPPORTED_VERSIONS: &[&SupportedProtocolVersion] =
    &[&rustls::version::TLS13, &rustls::version::TLS12];

/// ALPN protocols advertised to clients.
pub const ALPN_PROTOCOLS: &[&[u8]] = &[b"h2", b"http/1.1"];

fn read_file(path: &Path) -> Result<Vec<u8>, TlsError> {
    std::fs::read(path).map_err(|source| TlsError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Load every certificate from a PEM file.
pub fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let pem = read_file(path)?;

    let certs = CertificateDer::pem_slice_iter(&pem)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TlsError::Pem {
            path: path.to_path_buf(),
            message: format!("{:?}", e),
        })?;

    if certs.is_empty() {
        return Err(TlsError::NoCertificates(path.to_path_buf()));
    }
    Ok(certs)
}

/// Load the first private key (PKCS#8, PKCS#1 or SEC1) from a PEM file.
pub fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let pem = read_file(path)?;

    PrivateKeyDer::from_pem_slice(&pem).map_err(|e| TlsError::Pem {
        path: path.to_path_buf(),
        message: format!("{:?}", e),
    })
}

/// Build a server configuration from a certificate/key pair.
pub fn build_server_config(material: &CertificateMaterial) -> Result<Arc<ServerConfig>, TlsError> {
    let certs = load_certs(&material.cert_path)?;
    let key = load_private_key(&material.key_path)?;

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let mut config = ServerConfig::builder_with_provider(provider)
        .with_protocol_versions(SUPPORTED_VERSIONS)?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;

    config.alpn_protocols = ALPN_PROTOCOLS.iter().map(|p| p.to_vec()).collect();

    Ok(Arc::new(config))
}

/// Use the supplied certificate material, or provision new material first.
///
/// Returns the material actually used and the configuration for
/// `axum_server::bind_rustls`.
pub async fn load_or_provision(
    supplied: Option<CertificateMaterial>,
    provider: &dyn CertificateProvider,
    params: &CertificateParams,
    output_dir: &Path,
) -> Result<(CertificateMaterial, RustlsConfig), TlsError> {
    let material = match supplied {
        Some(material) => material,
        None => {
            let material = provider.provision(output_dir, params).await?;
            info!(
                cert = %material.cert_path.display(),
                key = %material.key_path.display(),
                "Generated self-signed certificate"
            );
            material
        }
    };

    let config = build_server_config(&material)?;
    Ok((material, RustlsConfig::from_config(config)))
}

// =============================================================================
// Tests
// =============================================================================
