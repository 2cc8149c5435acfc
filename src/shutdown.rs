//! Signal handling for clean interruption.
//!
//! The first SIGINT (Ctrl+C), SIGTERM, or SIGHUP cancels a
//! [`tokio_util::sync::CancellationToken`]; the backup loop checks it
//! between photos and stops at the next boundary. A second signal exits
//! immediately.

use tokio_util::sync::CancellationToken;

/// Spawn the signal listener and hand back the token it cancels.
pub(crate) fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();

    let handler_token = token.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        let (mut sigterm, mut sighup) = {
            use tokio::signal::unix::{signal, SignalKind};
            (
                signal(SignalKind::terminate()).expect("failed to register SIGTERM handler"),
                signal(SignalKind::hangup()).expect("failed to register SIGHUP handler"),
            )
        };

        let mut signals_seen = 0u32;
        loop {
            #[cfg(unix)]
            {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                    _ = sighup.recv() => {}
                }
            }

            #[cfg(not(unix))]
            {
                tokio::signal::ctrl_c()
                    .await
                    .expect("failed to listen for Ctrl+C");
            }

            signals_seen += 1;
            if signals_seen == 1 {
                tracing::info!("Received shutdown signal, finishing the current photo...");
                tracing::info!("Press Ctrl+C again to force exit");
                handler_token.cancel();
            } else {
                tracing::warn!("Force exit requested");
                std::process::exit(130);
            }
        }
    });

    token
}
