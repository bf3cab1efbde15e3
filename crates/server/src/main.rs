mod api;
mod metrics;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dissic_core::{
    config::PLAYLIST_DESCRIPTION,
    create_dispatcher,
    external_catalog::SpotifyClientConfig,
    load_config, prepare_routing_table, validate_config, Catalog, CollectionService, Config,
    PendingAuth, RedditScanner, Resolver, Router, ScannerSupervisor, SpotifyAuthenticator,
    SpotifyClient, SupervisorConfig,
};

use api::create_router;
use state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Determine config path
    let config_path = std::env::var("DISSIC_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration before logging so `verbose` can raise the level
    let loaded = load_config(&config_path);
    init_logging(loaded.as_ref().map(|c| c.verbose).unwrap_or(false));

    info!("dissic {} starting", VERSION);
    info!("Loading configuration from {:?}", config_path);
    let config =
        loaded.with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let sources = config.subreddits();
    info!(
        playlists = config.playlists.len(),
        subreddits = sources.len(),
        "Configuration loaded successfully"
    );

    // Process-root shutdown token: signals and retry exhaustion both cancel it
    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            shutdown.cancel();
        }
    });

    // OAuth handshake, completed by the HTTP callback
    let authenticator = Arc::new(
        SpotifyAuthenticator::from_config(&config).context("Failed to create authenticator")?,
    );
    let (pending, auth_rx) = PendingAuth::new(authenticator);
    let pending = Arc::new(pending);

    let state = Arc::new(AppState::new(config.clone(), Arc::clone(&pending)));
    let app = create_router(Arc::clone(&state));

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let server = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
        }
    });

    prompt_authorization(&config, &pending.authorize_url());

    let session = tokio::select! {
        _ = shutdown.cancelled() => {
            info!("Shut down before authentication completed");
            join_server(server).await;
            return Ok(());
        }
        session = auth_rx => session.context("Authentication handshake was dropped")?,
    };

    let client = Arc::new(
        SpotifyClient::new(
            SpotifyClientConfig {
                base_url: config.spotify.api_base_url.clone(),
                ..Default::default()
            },
            session,
        )
        .context("Failed to create Spotify client")?,
    );
    let catalog: Arc<dyn Catalog> = client.clone();
    let collections: Arc<dyn CollectionService> = client;

    let user = collections
        .current_user()
        .await
        .context("Failed to fetch current user")?;
    info!(
        user_id = %user.id,
        display_name = user.display_name.as_deref().unwrap_or(""),
        "Logged in to Spotify"
    );

    let table = tokio::select! {
        _ = shutdown.cancelled() => {
            info!("Shut down while preparing playlists");
            join_server(server).await;
            return Ok(());
        }
        table = prepare_routing_table(
            collections.as_ref(),
            &user.id,
            &config.playlists,
            PLAYLIST_DESCRIPTION,
            Duration::from_millis(config.spotify.setup_pause_ms),
        ) => table.context("Failed to prepare playlists")?,
    };

    // Pipeline
    let resolver = Arc::new(Resolver::new(catalog));
    let router = Arc::new(Router::new(Arc::new(table), collections));
    let (dispatcher_handle, dispatcher) = create_dispatcher(resolver, router, &config.dispatcher);

    let scanner =
        Arc::new(RedditScanner::from_config(&config).context("Failed to create Reddit scanner")?);
    let supervisor = ScannerSupervisor::new(
        scanner,
        &sources,
        dispatcher_handle.into_sink(),
        &SupervisorConfig::from_reddit(&config.reddit),
    );
    state.set_scanner_state(supervisor.subscribe());

    let dispatcher_task = tokio::spawn(dispatcher.run(shutdown.clone()));
    let supervisor_task = tokio::spawn(supervisor.run(shutdown.clone()));
    info!(subreddits = ?sources, "Watching subreddits");

    let supervisor_result = supervisor_task.await.context("Scanner supervisor panicked")?;

    // Either a signal or retry exhaustion; make sure everything else stops too
    shutdown.cancel();
    if let Err(e) = dispatcher_task.await {
        error!("Dispatcher panicked: {}", e);
    }
    join_server(server).await;

    if let Err(e) = supervisor_result {
        bail!(e);
    }

    info!("dissic stopped");
    Ok(())
}

/// Log target of the authorization prompt, kept visible at every verbosity.
const PROMPT_TARGET: &str = "dissic::prompt";

/// Filter used when `RUST_LOG` is unset. Quiet runs only report errors and
/// the authorization prompt.
fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "info,dissic=debug,dissic_core=debug,tower_http=debug"
    } else {
        "error,dissic::prompt=info"
    }
}

fn init_logging(verbose: bool) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_log_filter(verbose).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Open the authorization page, or log it for the user to open.
fn prompt_authorization(config: &Config, url: &str) {
    if config.spotify.open_browser {
        match webbrowser::open(url) {
            Ok(()) => {
                info!(
                    target: PROMPT_TARGET,
                    "Opened the Spotify authorization page in your browser"
                );
                return;
            }
            Err(e) => warn!("Failed to open browser: {}", e),
        }
    }
    info!(target: PROMPT_TARGET, "Authorize dissic by visiting: {}", url);
}

async fn join_server(server: tokio::task::JoinHandle<std::io::Result<()>>) {
    match server.await {
        Ok(Ok(())) => info!("Server stopped"),
        Ok(Err(e)) => error!("Server error: {}", e),
        Err(e) => error!("Server task panicked: {}", e),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::EnvFilter;

    #[test]
    fn test_quiet_filter_only_reports_errors_and_prompt() {
        let filter = default_log_filter(false);
        assert!(filter.starts_with("error"));
        assert!(filter.contains(&format!("{}=info", PROMPT_TARGET)));
        assert!(EnvFilter::try_new(filter).is_ok());
    }

    #[test]
    fn test_verbose_filter_enables_debug() {
        let filter = default_log_filter(true);
        assert!(filter.starts_with("info"));
        assert!(filter.contains("dissic_core=debug"));
        assert!(EnvFilter::try_new(filter).is_ok());
    }
}
