//! Cooperative shutdown for the server loop.
//!
//! A [`ShutdownCoordinator`] owns a [`CancellationToken`] and, when created
//! with [`install`](ShutdownCoordinator::install), a waiter task blocked on
//! the process's interrupt signals. The server loop polls
//! [`is_running`](ShutdownCoordinator::is_running) once per iteration, so
//! shutdown takes effect within one iteration of the signal.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Run flag shared between the server loop and whoever may stop it.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    waiter: Option<JoinHandle<()>>,
}

impl ShutdownCoordinator {
    /// Spawn a waiter that stops the server on Ctrl-C (and SIGTERM on Unix).
    ///
    /// Must be called from within a tokio runtime.
    pub fn install() -> Self {
        let token = CancellationToken::new();
        let waiter = tokio::spawn(wait_for_signal(token.clone()));
        ShutdownCoordinator {
            token,
            waiter: Some(waiter),
        }
    }

    /// A coordinator stopped only through its [`ShutdownHandle`]s.
    pub fn manual() -> Self {
        ShutdownCoordinator {
            token: CancellationToken::new(),
            waiter: None,
        }
    }

    /// A handle that can stop the server from elsewhere.
    pub fn handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            token: self.token.clone(),
        }
    }

    /// `false` once shutdown has been requested.
    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Request shutdown.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Wait for the signal waiter to finish.
    ///
    /// Cancels the token first, so a waiter still blocked on a signal is
    /// released.
    pub async fn join(mut self) {
        self.token.cancel();
        if let Some(waiter) = self.waiter.take() {
            if let Err(e) = waiter.await {
                warn!(error = %e, "shutdown waiter failed");
            }
        }
    }
}

/// Cloneable trigger for a [`ShutdownCoordinator`].
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    token: CancellationToken,
}

impl ShutdownHandle {
    /// Request shutdown.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Complete once shutdown has been requested.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

async fn wait_for_signal(token: CancellationToken) {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "unable to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => info!("interrupt received, shutting down"),
        _ = terminate => info!("terminate received, shutting down"),
        _ = token.cancelled() => {
            debug!("shutdown requested, signal waiter exiting");
            return;
        }
    }
    token.cancel();
}
