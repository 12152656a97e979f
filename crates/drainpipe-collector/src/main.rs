//! drainpipe collector binary.
//!
//! - HTTP drain endpoint: `POST /?app_name=...`
//! - Collection every `collector.interval_ms`, handed to the log sink
//! - Ctrl-C: mark draining, final flush, let in-flight requests finish

use std::process::ExitCode;
use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use drainpipe_collector::dispatch::LogSink;
use drainpipe_collector::{app_state, config, router};
use drainpipe_core::error::{DrainError, Result};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, code = e.client_code().as_str(), "drainpipe-collector failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cfg = config::load()?;
    let listen = cfg.collector.listen_addr()?;

    let state = app_state::AppState::new(cfg)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = state.scheduler(Arc::new(LogSink));
    let scheduler = tokio::spawn(scheduler.run(shutdown_rx));

    let app = router::build_router(state.clone());

    tracing::info!(%listen, "drainpipe-collector starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| DrainError::Internal(format!("bind {listen} failed: {e}")))?;

    let draining = state.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "ctrl_c handler failed, shutting down");
            }
            tracing::info!("shutdown requested, draining");
            draining.set_draining();
        })
        .await
        .map_err(|e| DrainError::Internal(format!("server failed: {e}")))?;

    let _ = shutdown_tx.send(true);
    scheduler
        .await
        .map_err(|e| DrainError::Internal(format!("scheduler task failed: {e}")))?;

    tracing::info!("drainpipe-collector stopped");
    Ok(())
}
