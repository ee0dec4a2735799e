use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use bait_dispatch::{AutoFinalizer, CaseDelivery, HttpCaseDelivery};
use bait_domain::config::Config;
use bait_engine::{EventHandler, OpenAiCompatProvider, ReplyGenerator, ReplyProvider};
use bait_gateway::api;
use bait_gateway::cli::{Cli, Command, ConfigCommand};
use bait_gateway::keys::ApiKeySet;
use bait_gateway::state::AppState;
use bait_sessions::{RemoteBackend, SessionBackend, SessionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Default to serve when no subcommand is given.
        None | Some(Command::Serve) => {
            init_tracing();
            let (config, config_path) = bait_gateway::cli::load_config()?;
            tracing::info!(config_path, "configuration loaded");
            run_server(Arc::new(config)).await
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            if !bait_gateway::cli::validate() {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let (config, _) = bait_gateway::cli::load_config()?;
            bait_gateway::cli::show(&config);
            Ok(())
        }
        Some(Command::Version) => {
            println!("baitline {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Initialize structured JSON tracing (only for the `serve` command).
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bait_gateway=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .json()
        .init();
}

/// Start the gateway server with the given configuration.
async fn run_server(config: Arc<Config>) -> anyhow::Result<()> {
    tracing::info!("Baitline starting");

    // ── Build shared services ────────────────────────────────────────
    let remote = RemoteBackend::from_config(&config.store)
        .context("session store")?
        .map(|b| Arc::new(b) as Arc<dyn SessionBackend>);
    if remote.is_some() {
        tracing::info!(url = ?config.store.remote_url, "remote session store configured");
    } else {
        tracing::info!("no remote session store configured; memory-only operation");
    }
    let store = Arc::new(SessionStore::new(remote));

    let provider = OpenAiCompatProvider::from_config(&config.generation)
        .context("reply provider")?
        .map(|p| Arc::new(p) as Arc<dyn ReplyProvider>);
    if provider.is_none() {
        tracing::info!("no generation endpoint configured; rule-based replies only");
    }
    let generator = ReplyGenerator::new(provider, config.generation.clone());

    let handler = Arc::new(EventHandler::new(store.clone(), generator));
    let delivery: Arc<dyn CaseDelivery> =
        Arc::new(HttpCaseDelivery::from_config(&config.callback).context("case delivery")?);
    let keys = Arc::new(ApiKeySet::from_env(&config.auth.api_keys_env));

    let state = AppState {
        config: config.clone(),
        store: store.clone(),
        handler,
        delivery: delivery.clone(),
        keys,
    };

    // ── Background auto-finalizer ────────────────────────────────────
    let stop = CancellationToken::new();
    let finalizer_task = {
        let finalizer =
            AutoFinalizer::new(store.clone(), delivery, config.finalizer.clone());
        let stop = stop.clone();
        tokio::spawn(async move { finalizer.run(stop).await })
    };

    // ── Router ───────────────────────────────────────────────────────
    let app = api::router(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // ── Bind ─────────────────────────────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;

    tracing::info!(addr = %addr, "Baitline listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(stop.clone()))
        .await
        .context("axum server error")?;

    // ── Post-shutdown ────────────────────────────────────────────────
    stop.cancel();
    if let Err(e) = finalizer_task.await {
        tracing::warn!(error = %e, "auto-finalizer task join failed");
    }

    tracing::info!("shutdown complete");
    Ok(())
}

/// Resolve when SIGINT (or SIGTERM on unix) arrives, cancelling the
/// background loops so the server drains and exits.
async fn shutdown_signal(stop: CancellationToken) {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("installing SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
            _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        tracing::info!("received SIGINT, shutting down");
    }

    stop.cancel();
}
