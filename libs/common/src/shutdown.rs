//! Graceful shutdown signal handling

use std::fmt;

use tracing::warn;

/// Signal that asked the service to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    CtrlC,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::CtrlC => write!(f, "SIGINT"),
            ShutdownSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Wait for Ctrl+C, or SIGTERM on Unix
///
/// ```ignore
/// tokio::select! {
///     signal = common::shutdown::wait_for_shutdown() => {
///         info!("{} received", signal);
///     }
///     _ = ticker.tick() => { /* ... */ }
/// }
/// ```
pub async fn wait_for_shutdown() -> ShutdownSignal {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut term_signal = match signal(SignalKind::terminate()) {
            Ok(sig) => Some(sig),
            Err(e) => {
                warn!("SIGTERM handler: {}. Only Ctrl+C will stop the service", e);
                None
            },
        };

        tokio::select! {
            _ = ctrl_c() => ShutdownSignal::CtrlC,
            _ = async {
                match term_signal.as_mut() {
                    Some(sig) => {
                        sig.recv().await;
                    },
                    None => std::future::pending::<()>().await,
                }
            } => ShutdownSignal::Terminate,
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c().await;
        ShutdownSignal::CtrlC
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Ctrl+C handler: {}", e);
        std::future::pending::<()>().await
    }
}
