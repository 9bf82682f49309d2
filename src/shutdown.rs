//! Graceful shutdown for the gateway's HTTP server.
//!
//! On SIGTERM or Ctrl+C the listener stops accepting connections and in-flight
//! requests are allowed to drain for at most [`ShutdownConfig::timeout`].

use crate::error::Result;
use std::future::{Future, IntoFuture};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

/// Configuration for graceful shutdown behavior.
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Maximum time to wait for in-flight requests after the signal (default: 30 seconds)
    pub timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// Completes on SIGTERM or SIGINT (Ctrl+C).
#[cfg(unix)]
pub async fn signal_shutdown() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            error!(error = %e, "failed to install SIGTERM handler, falling back to Ctrl+C");
            return ctrl_c().await;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM"),
        _ = ctrl_c() => {}
    }
}

/// Completes on Ctrl+C.
#[cfg(not(unix))]
pub async fn signal_shutdown() {
    ctrl_c().await
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received SIGINT (Ctrl+C)"),
        Err(e) => {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await
        }
    }
}

/// Shutdown trigger driven by OS signals.
pub fn os_signal_shutdown() -> impl Future<Output = ()> + Send + 'static {
    signal_shutdown()
}

/// Serve `app` until `signal` completes, then drain for at most `config.timeout`.
pub async fn run_with_graceful_shutdown<F>(
    listener: tokio::net::TcpListener,
    app: axum::Router,
    signal: F,
    config: ShutdownConfig,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (draining_tx, draining_rx) = oneshot::channel::<()>();

    let signal = async move {
        signal.await;
        info!(timeout = ?config.timeout, "shutdown signal received, draining requests");
        let _ = draining_tx.send(());
    };

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(signal)
        .into_future();
    tokio::pin!(server);

    let drain_deadline = async move {
        if draining_rx.await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(config.timeout).await;
    };

    tokio::select! {
        result = &mut server => {
            result?;
            info!("Graceful shutdown complete");
        }
        _ = drain_deadline => {
            warn!("Shutdown timeout reached, dropping in-flight requests");
        }
    }

    Ok(())
}
