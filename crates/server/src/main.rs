use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use debridarr_core::{
    load_config, validate_config, AvailabilityFilter, CatalogStore, Config, JobRegistry,
    LibraryScanner, LogFormat, SqliteCatalog, SqliteStreamCacheStore, StreamCacheStore,
    StreamChecker, StreamPipeline, StreamProvider, StreamSelector,
};
use debridarr_server::api::create_router;
use debridarr_server::clients::{create_debrid_service, StremioProvider};
use debridarr_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn run() -> Result<()> {
    // Determine config path
    let config_path = std::env::var("DEBRIDARR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration before logging so the log format can be configured
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    init_tracing(config.logging.format);
    info!(version = VERSION, "Starting debridarr");
    info!("Configuration loaded from {:?}", config_path);

    validate_config(&config).context("Configuration validation failed")?;

    if config.debrid.api_key.is_empty() {
        warn!("No debrid API key configured, availability checks will fail");
    }
    info!("Database path: {:?}", config.database.path);

    // Stores share one SQLite file
    let store: Arc<dyn StreamCacheStore> = Arc::new(
        SqliteStreamCacheStore::new(&config.database.path)
            .context("Failed to open stream cache store")?
            .with_schedule(
                config.checker.recheck_after(),
                config.checker.unavailable_retry(),
            ),
    );
    let catalog: Arc<dyn CatalogStore> = Arc::new(
        SqliteCatalog::new(&config.database.path).context("Failed to open library catalog")?,
    );
    info!("Stream cache and catalog initialized");

    let pipeline = Arc::new(build_pipeline(&config)?);
    let registry = Arc::new(JobRegistry::new());

    let checker = Arc::new(StreamChecker::new(
        config.checker.clone(),
        Arc::clone(&store),
        Arc::clone(&catalog),
        Arc::clone(&pipeline),
        Arc::clone(&registry),
    ));
    let scanner = Arc::new(LibraryScanner::new(
        config.scanner.clone(),
        Arc::clone(&store),
        Arc::clone(&catalog),
        Arc::clone(&pipeline),
        Arc::clone(&registry),
    ));

    // Background jobs
    let cancel = CancellationToken::new();
    let checker_handle = Arc::clone(&checker).spawn(cancel.clone());
    let scanner_handle = Arc::clone(&scanner).spawn(cancel.clone());
    info!("Background jobs started");

    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&store),
        Arc::clone(&registry),
        Arc::clone(&checker),
    ));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let shutdown = cancel.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            shutdown.cancel();
        })
        .await
        .context("Server error");

    // The server may also stop on its own error; jobs stop either way
    cancel.cancel();
    info!("Waiting for background jobs to stop...");
    for (name, handle) in [("checker", checker_handle), ("scanner", scanner_handle)] {
        if let Err(e) = handle.await {
            error!(job = name, error = %e, "Background job panicked");
        }
    }
    info!("Background jobs stopped");

    served
}

fn build_pipeline(config: &Config) -> Result<StreamPipeline> {
    let provider: Arc<dyn StreamProvider> = Arc::new(
        StremioProvider::new(config.provider.clone())
            .context("Failed to create stream provider")?,
    );
    info!("Using stream provider at {}", config.provider.base_url);

    let debrid =
        create_debrid_service(&config.debrid).context("Failed to create debrid client")?;
    info!("Using debrid backend: {}", debrid.name());

    let filter = AvailabilityFilter::new(debrid, config.debrid.batch_size, config.debrid.timeout());
    let selector = StreamSelector::new(
        config.scoring.clone(),
        config.selection.excluded_qualities.clone(),
    )
    .with_name_filters(config.selection.name_filters());

    Ok(StreamPipeline::new(
        provider,
        filter,
        selector,
        config.selection.allow_url_only_sources,
    ))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
