//! Signal bridge driven by real signals.

#![cfg(unix)]

use std::time::Duration;

use bounty_core::shutdown::{self, spawn_signal_bridge};
use nix::sys::signal::{raise, Signal};

#[tokio::test]
async fn sigterm_requests_shutdown_once() {
    let (trigger, mut listener) = shutdown::channel();
    let bridge = spawn_signal_bridge(trigger.clone()).unwrap();

    raise(Signal::SIGTERM).unwrap();
    tokio::time::timeout(Duration::from_secs(2), listener.wait())
        .await
        .unwrap();
    assert!(listener.is_requested());

    // A second signal is absorbed by the bridge.
    raise(Signal::SIGINT).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!bridge.is_finished());
    assert!(!trigger.request());

    bridge.abort();
}
