//! Running listener handle
//!
//! Every listener (fleet member or front door) is an axum server running in its
//! own task, stopped through a oneshot channel wired into graceful shutdown.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};

/// Result of closing one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Stopped within the timeout
    Closed,
    /// Never opened, nothing to close
    NotOpened,
    /// Stopped with an error
    Failed(String),
    /// Still running when the timeout elapsed; the task was aborted
    TimedOut,
}

/// Bind a TCP listener, mapping failure to [`Error::Bind`]
pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| Error::Bind { addr, source })
}

/// A spawned axum server
pub struct RunningServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<io::Result<()>>,
}

impl RunningServer {
    /// Serve `router` on an already bound listener
    pub fn spawn(listener: TcpListener, router: Router) -> Result<Self> {
        let addr = listener.local_addr()?;
        let (tx, rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = rx.await;
                })
                .await
        });

        Ok(Self {
            addr,
            shutdown: Some(tx),
            task,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Whether the serving task has ended
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop accepting, wait up to `timeout` for the task to end, abort otherwise
    pub async fn close(mut self, timeout: Duration) -> CloseOutcome {
        if let Some(tx) = self.shutdown.take() {
            // Receiver is gone only if the task already ended.
            let _ = tx.send(());
        }

        match tokio::time::timeout(timeout, &mut self.task).await {
            Ok(Ok(Ok(()))) => CloseOutcome::Closed,
            Ok(Ok(Err(e))) => CloseOutcome::Failed(e.to_string()),
            Ok(Err(e)) => CloseOutcome::Failed(e.to_string()),
            Err(_) => {
                self.task.abort();
                CloseOutcome::TimedOut
            }
        }
    }
}
