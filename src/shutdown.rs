//! OS signal handling. A signal cancels the shared token, which every worker
//! and the reporter observe.

use std::future::Future;

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Waits for Ctrl+C or SIGTERM, then cancels `token`.
///
/// Returns without cancelling if `token` is cancelled first.
pub async fn wait_for_signal(token: CancellationToken) {
    cancel_on(os_signal(), token).await
}

/// Cancels `token` once `trigger` completes, unless it is already cancelled.
pub async fn cancel_on<F: Future<Output = ()>>(trigger: F, token: CancellationToken) {
    tokio::select! {
        _ = token.cancelled() => {}
        _ = trigger => {
            info!("stopping, waiting for in-flight attempts");
            token.cancel();
        }
    }
}

async fn os_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
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
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        biased;
        _ = ctrl_c => info!("received Ctrl+C"),
        _ = terminate => info!("received SIGTERM"),
    }
}
