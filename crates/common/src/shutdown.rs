//! Graceful shutdown plumbing: one watch channel shared by every
//! long-running task, flipped by SIGINT/SIGTERM.

use tokio::sync::watch;
use tracing::info;

/// Creates the shutdown channel. Tasks watch the receiver and exit their
/// loops when the value flips to `true`.
pub fn channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Waits for SIGINT or SIGTERM, then flips the shutdown flag.
pub async fn listen_for_signals(trigger: watch::Sender<bool>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }

    let _ = trigger.send(true);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_starts_unset_and_flips() {
        let (tx, mut rx) = channel();
        assert!(!*rx.borrow());

        tx.send(true).unwrap();
        rx.changed().await.unwrap();
        assert!(*rx.borrow());
    }
}
