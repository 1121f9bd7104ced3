//! Graceful shutdown.
//!
//! The server stops accepting connections on SIGINT/SIGTERM and gets a
//! bounded window to finish in-flight requests.

use std::future::IntoFuture;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

/// Waits for SIGTERM or SIGINT.
///
/// If a handler cannot be installed the corresponding branch never
/// completes, leaving the other one in charge.
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}

/// Serve `app` until a shutdown signal arrives, then drain for at most
/// `drain_timeout`.
///
/// # Errors
///
/// Returns the I/O error that stopped the server, if any.
pub async fn serve_with_graceful_shutdown(
    listener: TcpListener,
    app: Router,
    drain_timeout: Duration,
) -> std::io::Result<()> {
    serve_until(listener, app, wait_for_signal(), drain_timeout).await
}

/// Serve `app` until `shutdown` resolves, then drain for at most
/// `drain_timeout`.
///
/// # Errors
///
/// Returns the I/O error that stopped the server, if any.
pub async fn serve_until<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    drain_timeout: Duration,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            let _ = signalled_tx.send(());
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => return result,
        Ok(()) = signalled_rx => {}
    }

    match tokio::time::timeout(drain_timeout, server).await {
        Ok(result) => {
            info!("All connections drained");
            result
        }
        Err(_) => {
            warn!(timeout = ?drain_timeout, "Shutdown timeout reached, dropping open connections");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_stops_on_shutdown_signal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let app = Router::new();

        let result = serve_until(
            listener,
            app,
            async {},
            Duration::from_secs(1),
        )
        .await;

        assert!(result.is_ok());
    }
}
