//! dropafile - drop me a file on a webpage.
//!
//! This binary prepares secret, directories and certificate, then starts the
//! HTTPS server.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dropafile::{
    config::Config,
    generate_password, load_or_provision, prepare_dir,
    server::{create_router, Application, RouterConfig},
};

/// Time in-flight requests get to finish after Ctrl-C.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    run(config).await
}

async fn run(config: Config) -> ExitCode {
    let secret = match config.password.clone() {
        Some(password) => password,
        None => generate_password(),
    };

    let upload_dir = match prepare_directory("upload", config.upload_dir.as_deref()) {
        Some(dir) => dir,
        None => return ExitCode::FAILURE,
    };

    // Certificate
    let supplied = config.certificate_material();
    let cert_dir = if supplied.is_some() {
        // Never written to when the certificate is supplied.
        PathBuf::new()
    } else {
        match prepare_directory("certificate", config.cert_dir.as_deref()) {
            Some(dir) => dir,
            None => return ExitCode::FAILURE,
        }
    };

    let provider = config.certificate_provider();
    let params = config.certificate_params();
    let (material, tls_config) =
        match load_or_provision(supplied, provider.as_ref(), &params, &cert_dir).await {
            Ok(result) => result,
            Err(e) => {
                error!("TLS setup failed: {}", e);
                return ExitCode::FAILURE;
            }
        };

    // Resolve bind address
    let addr = match resolve_address(&config.bind_address()).await {
        Some(addr) => addr,
        None => return ExitCode::FAILURE,
    };

    // Create router
    let mut app = Application::new(secret.clone(), upload_dir.clone());
    if let Some(ref static_dir) = config.static_dir {
        app = app.with_static_dir(static_dir);
    }
    let router_config = RouterConfig::new()
        .with_max_body_bytes(config.max_upload_bytes)
        .with_tracing(!config.no_tracing);
    let router = create_router(app, router_config);

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Upload files at: https://{}:{}/", config.host, config.port);
    info!("  Password: {}", secret);
    info!("  (any username will do)");
    info!("");
    info!("  Uploads go to: {}", upload_dir.display());
    info!("  Certificate:   {}", material.cert_path.display());
    info!("  Private key:   {}", material.key_path.display());
    if let Some(ref static_dir) = config.static_dir {
        info!("  Page assets:   {}", static_dir.display());
    }
    if config.max_upload_bytes.is_none() {
        warn!("  Request body size is unlimited");
    }
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let handle = axum_server::Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down");
            shutdown.graceful_shutdown(Some(SHUTDOWN_GRACE));
        }
    });

    if let Err(e) = axum_server::bind_rustls(addr, tls_config)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        error!("Server error on {}: {}", addr, e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Create (or reuse) a directory, logging failures.
fn prepare_directory(purpose: &str, supplied: Option<&std::path::Path>) -> Option<PathBuf> {
    match prepare_dir(supplied) {
        Ok(dir) => Some(dir),
        Err(e) => {
            match supplied {
                Some(path) => error!(
                    "Failed to prepare {} directory {}: {}",
                    purpose,
                    path.display(),
                    e
                ),
                None => error!("Failed to create temporary {} directory: {}", purpose, e),
            }
            None
        }
    }
}

/// Resolve "host:port" to the first socket address.
async fn resolve_address(bind: &str) -> Option<SocketAddr> {
    match tokio::net::lookup_host(bind).await {
        Ok(mut addrs) => {
            let addr = addrs.next();
            if addr.is_none() {
                error!("Host {} resolved to no address", bind);
            }
            addr
        }
        Err(e) => {
            error!("Failed to resolve {}: {}", bind, e);
            None
        }
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "dropafile=debug,tower_http=debug"
    } else {
        "dropafile=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
