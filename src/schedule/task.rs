use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::auth::AdminAuthenticator;

/// A spawned loop that stops when asked.
pub struct BackgroundTask {
    name: &'static str,
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl BackgroundTask {
    pub(crate) fn new(name: &'static str, shutdown_tx: mpsc::Sender<()>, handle: JoinHandle<()>) -> Self {
        Self {
            name,
            shutdown_tx,
            handle,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signal the loop and wait for it to exit.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.handle.await {
            tracing::warn!(task = self.name, error = %e, "Background task ended abnormally");
        } else {
            tracing::debug!(task = self.name, "Background task stopped");
        }
    }
}

/// Periodically drop expired admin sessions.
pub fn spawn_session_purge(auth: AdminAuthenticator, every: Duration) -> BackgroundTask {
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

    let handle = tokio::spawn(async move {
        tracing::debug!(interval_secs = every.as_secs(), "Session purge started");
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                _ = sleep(every) => {
                    if let Err(e) = auth.purge_expired().await {
                        tracing::warn!(error = %e, "Session purge failed");
                    }
                }
            }
        }
    });

    BackgroundTask::new("session_purge", shutdown_tx, handle)
}
