//! Termination signal bridge.
//!
//! Converts SIGINT/SIGTERM into a single in-process shutdown request. The
//! request is a one-way flag: the first call to [`ShutdownTrigger::request`]
//! flips it, later calls are no-ops. Nothing here performs cleanup.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::Result;

/// Create a connected trigger/listener pair.
pub fn channel() -> (ShutdownTrigger, ShutdownListener) {
    let (tx, rx) = watch::channel(false);
    (
        ShutdownTrigger { tx: Arc::new(tx) },
        ShutdownListener { rx },
    )
}

/// Requests shutdown. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownTrigger {
    /// Request shutdown.
    ///
    /// Returns `true` only for the call that actually flipped the flag.
    pub fn request(&self) -> bool {
        self.tx.send_if_modified(|requested| {
            if *requested {
                false
            } else {
                *requested = true;
                true
            }
        })
    }

    pub fn is_requested(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Observes the shutdown request.
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// Wait until shutdown has been requested.
    ///
    /// Returns immediately if it already was. If every trigger is dropped
    /// without requesting, nobody can ever ask again, so this also returns.
    pub async fn wait(&mut self) {
        let _ = self.rx.wait_for(|requested| *requested).await;
    }

    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Register for SIGINT and SIGTERM and forward them to `trigger`.
///
/// Registration happens before this returns, so a signal delivered right
/// after the call is never lost to the default handler. The returned task
/// keeps listening so repeated signals are absorbed.
#[cfg(unix)]
pub fn spawn_signal_bridge(trigger: ShutdownTrigger) -> Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        loop {
            let name = tokio::select! {
                Some(_) = sigint.recv() => "SIGINT",
                Some(_) = sigterm.recv() => "SIGTERM",
                else => break,
            };
            forward(&trigger, name);
        }
    }))
}

/// Register for Ctrl+C and forward it to `trigger`.
#[cfg(not(unix))]
pub fn spawn_signal_bridge(trigger: ShutdownTrigger) -> Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            forward(&trigger, "ctrl-c");
        }
    }))
}

fn forward(trigger: &ShutdownTrigger, name: &str) {
    if trigger.request() {
        info!(signal = name, "Shutdown requested");
    } else {
        debug!(signal = name, "Already shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_request_fires_once() {
        let (trigger, listener) = channel();
        assert!(!listener.is_requested());

        assert!(trigger.request());
        assert!(!trigger.request());
        assert!(!trigger.clone().request());

        assert!(trigger.is_requested());
        assert!(listener.is_requested());
    }

    #[tokio::test]
    async fn test_wait_returns_after_request() {
        let (trigger, mut listener) = channel();

        let waiter = tokio::spawn(async move {
            listener.wait().await;
        });

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        trigger.request();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_returns_when_already_requested() {
        let (trigger, mut listener) = channel();
        trigger.request();
        tokio::time::timeout(Duration::from_secs(1), listener.wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_returns_when_triggers_dropped() {
        let (trigger, mut listener) = channel();
        drop(trigger);
        tokio::time::timeout(Duration::from_secs(1), listener.wait())
            .await
            .unwrap();
        assert!(!listener.is_requested());
    }
}
