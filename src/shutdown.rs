use std::sync::Arc;
use std::time::Duration;

use tokio::signal;

use crate::server::AppState;

/// Wait for a shutdown signal (SIGINT or SIGTERM).
pub async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown...");
        }
    }
}

/// Give queued reconciliations a chance to publish before the process exits.
pub async fn graceful_shutdown(state: &Arc<AppState>) {
    let pending = state.queue.in_flight();
    if pending == 0 {
        tracing::info!("No in-flight reconciliations");
        return;
    }

    let deadline = Duration::from_secs(state.config.server.drain_secs);
    tracing::info!(
        count = pending,
        workers = state.queue.workers().await,
        deadline_secs = deadline.as_secs(),
        "Waiting for in-flight reconciliations"
    );

    if state.queue.drain(deadline).await {
        tracing::info!("Graceful shutdown complete");
    } else {
        tracing::warn!(
            remaining = state.queue.in_flight(),
            "Shutdown deadline reached with reconciliations still running"
        );
    }
}
