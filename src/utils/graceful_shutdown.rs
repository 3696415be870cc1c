use std::time::Duration;

use eyre::{Result, WrapErr};
use tokio::{signal, sync::watch};

/// Represents different shutdown reasons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT (Ctrl+C)
    Interrupt,
    /// SIGTERM
    Terminate,
    /// Triggered from code
    Requested,
}

/// Coordinates shutdown between the signal handler, the server and the
/// telemetry drain.
pub struct GracefulShutdown {
    shutdown_tx: watch::Sender<Option<ShutdownReason>>,
    /// Maximum time to wait for pending telemetry after the server stops
    drain_timeout: Duration,
}

impl Default for GracefulShutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl GracefulShutdown {
    /// Create a new GracefulShutdown manager with default 10-second drain timeout
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(10))
    }

    pub fn with_timeout(drain_timeout: Duration) -> Self {
        let (shutdown_tx, _) = watch::channel(None);
        Self {
            shutdown_tx,
            drain_timeout,
        }
    }

    pub fn drain_timeout(&self) -> Duration {
        self.drain_timeout
    }

    pub fn is_shutdown_initiated(&self) -> bool {
        self.shutdown_tx.borrow().is_some()
    }

    /// Start shutdown. Only the first reason is kept.
    pub fn trigger_shutdown(&self, reason: ShutdownReason) {
        let first = self.shutdown_tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        });
        if first {
            tracing::info!("Shutdown initiated: {:?}", reason);
        }
    }

    /// Resolve once shutdown has been triggered, however early that happened.
    pub async fn wait_for_shutdown_signal(&self) -> ShutdownReason {
        let mut rx = self.shutdown_tx.subscribe();
        let result = match rx.wait_for(Option::is_some).await {
            Ok(reason) => *reason,
            Err(_) => None,
        };
        result.unwrap_or(ShutdownReason::Requested)
    }

    /// Listen for SIGINT and SIGTERM and trigger shutdown on the first one.
    pub async fn run_signal_handler(&self) -> Result<()> {
        tracing::debug!("Signal handler started. Listening for SIGTERM and SIGINT");

        tokio::select! {
            result = signal::ctrl_c() => {
                result.wrap_err("Failed to listen for SIGINT")?;
                self.trigger_shutdown(ShutdownReason::Interrupt);
            }
            result = wait_for_sigterm() => {
                result?;
                self.trigger_shutdown(ShutdownReason::Terminate);
            }
        }
        Ok(())
    }
}

#[cfg(unix)]
async fn wait_for_sigterm() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};
    let mut sigterm =
        signal(SignalKind::terminate()).wrap_err("Failed to register SIGTERM handler")?;
    sigterm.recv().await;
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_sigterm() -> Result<()> {
    // On non-Unix systems, we only have Ctrl+C
    std::future::pending::<()>().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_trigger_before_wait() {
        let shutdown = GracefulShutdown::new();
        assert!(!shutdown.is_shutdown_initiated());
        shutdown.trigger_shutdown(ShutdownReason::Terminate);
        shutdown.trigger_shutdown(ShutdownReason::Interrupt);

        assert!(shutdown.is_shutdown_initiated());
        assert_eq!(
            shutdown.wait_for_shutdown_signal().await,
            ShutdownReason::Terminate
        );
    }

    #[tokio::test]
    async fn test_waiters_are_woken() {
        let shutdown = Arc::new(GracefulShutdown::with_timeout(Duration::from_secs(1)));
        let waiter = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { shutdown.wait_for_shutdown_signal().await })
        };
        tokio::task::yield_now().await;
        shutdown.trigger_shutdown(ShutdownReason::Requested);

        let reason = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reason, ShutdownReason::Requested);
        assert_eq!(shutdown.drain_timeout(), Duration::from_secs(1));
    }
}
