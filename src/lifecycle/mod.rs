//! Coordinated shutdown
//!
//! On a termination signal every fleet listener, the autocomplete index and the
//! front door are closed concurrently. Each close gets its own timeout; the
//! coordinator waits for all of them before returning, so the process never
//! exits with a listener half torn down.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::autocomplete::AutocompleteIndex;
use crate::fleet::Fleet;
use crate::http::{CloseOutcome, RunningServer};

/// Resolves on Ctrl+C, or SIGTERM on Unix
pub async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to wait for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}

/// What happened to each resource during shutdown
#[derive(Debug, Clone, Default)]
pub struct ShutdownReport {
    pub closed: Vec<String>,
    pub not_opened: Vec<String>,
    pub timed_out: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl ShutdownReport {
    /// Every resource closed within its timeout
    pub fn is_clean(&self) -> bool {
        self.timed_out.is_empty() && self.failed.is_empty()
    }

    fn record(&mut self, name: String, outcome: CloseOutcome) {
        match outcome {
            CloseOutcome::Closed => {
                tracing::debug!(resource = %name, "Closed");
                self.closed.push(name);
            }
            CloseOutcome::NotOpened => {
                tracing::debug!(resource = %name, "Never opened");
                self.not_opened.push(name);
            }
            CloseOutcome::TimedOut => {
                tracing::warn!(resource = %name, "Close timed out, aborted");
                self.timed_out.push(name);
            }
            CloseOutcome::Failed(reason) => {
                tracing::warn!(resource = %name, error = %reason, "Close failed");
                self.failed.push((name, reason));
            }
        }
    }
}

/// Owns every long-lived resource until shutdown
pub struct LifecycleCoordinator {
    fleet: Fleet,
    front_door: RunningServer,
    autocomplete: Arc<AutocompleteIndex>,
    timeout: Duration,
}

impl LifecycleCoordinator {
    pub fn new(
        fleet: Fleet,
        front_door: RunningServer,
        autocomplete: Arc<AutocompleteIndex>,
        timeout: Duration,
    ) -> Self {
        Self {
            fleet,
            front_door,
            autocomplete,
            timeout,
        }
    }

    /// Shared handle to the autocomplete index
    pub fn autocomplete(&self) -> Arc<AutocompleteIndex> {
        self.autocomplete.clone()
    }

    /// Wait for `signal`, then shut everything down
    pub async fn run_until<F>(self, signal: F) -> ShutdownReport
    where
        F: Future<Output = ()>,
    {
        signal.await;
        self.shutdown().await
    }

    /// Close all listeners and the index concurrently and wait for all of them
    pub async fn shutdown(self) -> ShutdownReport {
        let Self {
            fleet,
            front_door,
            autocomplete,
            timeout,
        } = self;

        tracing::info!(listeners = fleet.len() + 1, "Shutting down all servers");

        let autocomplete_close = async move {
            match tokio::time::timeout(timeout, autocomplete.close()).await {
                Ok(Ok(true)) => CloseOutcome::Closed,
                Ok(Ok(false)) => CloseOutcome::NotOpened,
                Ok(Err(e)) => CloseOutcome::Failed(e.to_string()),
                Err(_) => CloseOutcome::TimedOut,
            }
        };

        let (members, index, front) = tokio::join!(
            fleet.close(timeout),
            autocomplete_close,
            front_door.close(timeout),
        );

        let mut report = ShutdownReport::default();
        for (name, outcome) in members {
            report.record(name, outcome);
        }
        report.record("autocomplete index".to_string(), index);
        report.record("front door".to_string(), front);

        tracing::info!(
            closed = report.closed.len(),
            timed_out = report.timed_out.len(),
            failed = report.failed.len(),
            "Shutdown complete"
        );
        report
    }
}
