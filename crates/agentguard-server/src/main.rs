use anyhow::Context;
use clap::Parser;

use agentguard_core::auditor::Auditor;
use agentguard_core::signing;
use agentguard_server::config::ServerConfig;
use agentguard_server::state::AppState;
use agentguard_server::api;

use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind. The port comes from AGENTGUARD_PORT / PORT.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cfg = ServerConfig::from_env();
    init_logging();

    tracing::info!(event = "server_start", config = ?cfg);
    if signing::using_dev_secret() {
        tracing::warn!(
            "{} is unset; tool signatures use the built-in development secret",
            signing::SECRET_ENV
        );
    }

    let state = AppState::initialize(cfg.clone())?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let auditor_handle = if cfg.skip_background_services {
        tracing::info!("background services disabled; auditor not started");
        None
    } else {
        Some(tokio::spawn(
            Auditor::new(state.store.clone()).run(shutdown_rx),
        ))
    };

    let app = api::router(state);
    let addr = format!("{}:{}", args.host, cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;
    tracing::info!(addr = %addr, "agentguard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("axum server error")?;

    // Signal the auditor and let it finish its current cycle.
    let _ = shutdown_tx.send(true);
    if let Some(handle) = auditor_handle {
        let _ = handle.await;
    }
    tracing::info!(event = "server_stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
