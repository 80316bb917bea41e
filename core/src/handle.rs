//! Stop capability for a started capture module instance.
//!
//! Every capture module hands back a [`StopHandle`] from `start`. The handle
//! owns the listener task and its shutdown channel; [`StopHandle::stop`]
//! consumes it, so a listener can be released at most once.

use std::collections::HashSet;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::domain::Protocol;
use crate::error::{Error, Result};

/// Receiver side of a listener's shutdown request.
pub type ShutdownRx = oneshot::Receiver<()>;

/// Counters shared between a listener task and its stop handle.
#[derive(Debug, Default)]
pub struct CaptureStats {
    interactions: AtomicU64,
    peers: Mutex<HashSet<IpAddr>>,
}

impl CaptureStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one connection or datagram from `peer`.
    pub fn record(&self, peer: SocketAddr) {
        self.interactions.fetch_add(1, Ordering::Relaxed);
        self.peers.lock().insert(peer.ip());
    }

    pub fn interactions(&self) -> u64 {
        self.interactions.load(Ordering::Relaxed)
    }

    pub fn unique_peers(&self) -> usize {
        self.peers.lock().len()
    }
}

/// Summary of a listener returned once it has been released.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopReport {
    pub protocol: Protocol,
    pub port: u16,
    /// Connections (TCP) or datagrams (UDP) seen.
    pub interactions: u64,
    pub unique_peers: usize,
    pub uptime_secs: u64,
}

/// Single-use capability that releases a running listener.
#[derive(Debug)]
pub struct StopHandle {
    protocol: Protocol,
    port: u16,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    stats: Arc<CaptureStats>,
    started_at: Instant,
}

impl StopHandle {
    /// Spawn a listener task and return the handle that stops it.
    ///
    /// The task receives the shutdown receiver and must return once it fires
    /// (or once the sender is dropped). Must be called within a tokio runtime.
    pub fn spawn<F, Fut>(protocol: Protocol, port: u16, stats: Arc<CaptureStats>, listener: F) -> Self
    where
        F: FnOnce(ShutdownRx) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(listener(shutdown_rx));

        Self {
            protocol,
            port,
            shutdown_tx: Some(shutdown_tx),
            task,
            stats,
            started_at: Instant::now(),
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn stats(&self) -> &CaptureStats {
        &self.stats
    }

    /// Ask the listener to stop and wait up to `timeout` for it to release
    /// its resources.
    ///
    /// A listener that does not finish in time is aborted and reported as
    /// [`Error::CleanupTimeout`]; a listener that panicked is reported as
    /// [`Error::Cleanup`].
    pub async fn stop(mut self, timeout: Duration) -> Result<StopReport> {
        if let Some(tx) = self.shutdown_tx.take() {
            // The listener may already be gone; the join below reports how it ended.
            let _ = tx.send(());
        }

        match tokio::time::timeout(timeout, &mut self.task).await {
            Ok(Ok(())) => Ok(self.report()),
            Ok(Err(e)) => Err(Error::Cleanup {
                protocol: self.protocol,
                port: self.port,
                reason: e.to_string(),
            }),
            Err(_) => {
                self.task.abort();
                // Wait for the cancelled listener to drop its sockets.
                let _ = (&mut self.task).await;
                Err(Error::CleanupTimeout {
                    protocol: self.protocol,
                    port: self.port,
                    timeout,
                })
            }
        }
    }

    fn report(&self) -> StopReport {
        StopReport {
            protocol: self.protocol,
            port: self.port,
            interactions: self.stats.interactions(),
            unique_peers: self.stats.unique_peers(),
            uptime_secs: self.started_at.elapsed().as_secs(),
        }
    }
}
