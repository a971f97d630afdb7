//! snowguard-dash - RBAC metadata dashboard
//!
//! Loads the permission metadata and audit log from Snowflake once at
//! startup (falling back to the embedded sample data when the warehouse is
//! not configured or unreachable) and serves the dashboard UI and API.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use snowguard_common::config::{resolve_config_path, TomlConfig};
use snowguard_common::source::{load_session, SourceAdapter};
use snowguard_common::time::now;
use snowguard_dash::{build_router, AppState};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for snowguard-dash
#[derive(Parser, Debug)]
#[command(name = "snowguard-dash")]
#[command(about = "RBAC metadata dashboard for Snowflake")]
#[command(version)]
struct Args {
    /// Configuration file (overrides SNOWGUARD_CONFIG and default locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides [server] port)
    #[arg(short, long, env = "SNOWGUARD_PORT")]
    port: Option<u16>,

    /// Snowflake access token (overrides [warehouse] token)
    #[arg(long, env = "SNOWFLAKE_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Read the config before tracing starts so that its log level applies;
    // the outcome is logged once the subscriber is up
    let config_path = resolve_config_path(args.config.as_deref());
    let loaded = config_path.as_deref().map(TomlConfig::from_file);
    let mut config = match &loaded {
        Some(Ok(config)) => config.clone(),
        _ => TomlConfig::default(),
    };

    // Initialize tracing; RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{},tower_http=info", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting SnowGuard dashboard (snowguard-dash) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match (&config_path, loaded) {
        (Some(path), Some(Ok(_))) => info!("Loaded configuration from {}", path.display()),
        (_, Some(Err(e))) => warn!("Ignoring configuration file, using defaults: {}", e),
        _ => warn!("No configuration file found, using defaults"),
    }

    if let Some(token) = args.token {
        config.warehouse.token = Some(token);
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let adapter = SourceAdapter::from_config(&config.warehouse);
    let session = load_session(&adapter, now()).await;
    if session.source.available {
        info!(
            metadata = session.metadata.len(),
            audit = session.audit_log.len(),
            "Session loaded from Snowflake"
        );
    } else {
        info!(
            metadata = session.metadata.len(),
            audit = session.audit_log.len(),
            "Session loaded from sample data"
        );
    }

    let app = build_router(AppState::new(session));

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.bind))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("snowguard-dash listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
