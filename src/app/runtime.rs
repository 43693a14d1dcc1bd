use super::ShutdownReason;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Cancel `token` on SIGINT or SIGTERM. Returns the first reason received.
pub fn install_signal_handlers(token: CancellationToken) -> Arc<Mutex<Option<ShutdownReason>>> {
    let reason = Arc::new(Mutex::new(None));

    // Handle SIGTERM - Unix only
    #[cfg(unix)]
    {
        let token = token.clone();
        let reason = Arc::clone(&reason);
        tokio::spawn(async move {
            let mut sigterm =
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(signal) => signal,
                    Err(e) => {
                        error!("Failed to register SIGTERM handler: {}", e);
                        return;
                    }
                };

            if sigterm.recv().await.is_some() {
                info!("Received SIGTERM signal");
                reason
                    .lock()
                    .await
                    .get_or_insert(ShutdownReason::Signal("SIGTERM".to_string()));
                token.cancel();
            }
        });
    }

    // Handle SIGINT (Ctrl+C) - Cross-platform
    {
        let reason = Arc::clone(&reason);
        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Received SIGINT signal (Ctrl+C)");
                reason
                    .lock()
                    .await
                    .get_or_insert(ShutdownReason::Signal("SIGINT".to_string()));
                token.cancel();
            }
        });
    }

    reason
}
