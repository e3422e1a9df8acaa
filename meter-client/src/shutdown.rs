//! Signal handling

use log::{info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Listen for SIGINT/SIGTERM (Ctrl-C elsewhere) in a background task
///
/// The first signal cancels `token`. With `immediately` set the process
/// exits right away instead.
pub fn spawn_signal_listener(token: CancellationToken, immediately: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_signal().await;
        if immediately {
            info!("Shutdown signal received, exiting immediately");
            std::process::exit(0);
        }
        info!("Shutdown signal received, finishing current cycle");
        token.cancel();
    })
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Cannot listen for SIGTERM: {}", e);
            wait_for_ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = wait_for_ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
