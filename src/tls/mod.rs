//! TLS bootstrap: certificate provisioning and server configuration.
//!
//! ```text
//! --cert/--key given? ──yes──▶ build_server_config ──▶ RustlsConfig
//!        │                            ▲
//!        no                           │
//!        ▼                            │
//! CertificateProvider::provision ─────┘
//!   (OpensslProvider | RcgenProvider)
//! ```

pub mod context;
pub mod provision;

pub use context::{
    build_server_config, load_certs, load_or_provision, load_private_key, ALPN_PROTOCOLS,
    SUPPORTED_VERSIONS,
};
pub use provision::{
    CertificateMaterial, CertificateParams, CertificateProvider, OpensslProvider, RcgenProvider,
    CERT_FILE_NAME, DEFAULT_COMMON_NAME, DEFAULT_COUNTRY, DEFAULT_KEY_BITS, DEFAULT_TOOL_TIMEOUT,
    DEFAULT_VALIDITY_DAYS, KEY_FILE_NAME,
};
