use tracing::{info, warn};

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!("listen for ctrl-c failed: {}", error);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                warn!("listen for SIGTERM failed: {}", error);
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
    info!("received termination, signaling shutdown");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::signal::shutdown_signal;

    #[tokio::test]
    async fn test_pending_without_signal() {
        let result = tokio::time::timeout(Duration::from_millis(100), shutdown_signal()).await;
        assert!(result.is_err());
    }
}
