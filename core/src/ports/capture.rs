//! Capture module ports (interfaces).

use std::future::Future;

use crate::domain::{ModuleConfig, Protocol};
use crate::error::Result;
use crate::handle::StopHandle;

/// Port for one protocol-emulating capture module.
///
/// `start` binds the configured port and begins serving in the background,
/// returning as soon as the listener is in place. Bind failures and rejected
/// key material surface as [`crate::Error::Bind`]. The returned
/// [`StopHandle`] is the only way to release the listener.
pub trait CaptureModule: Send + Sync {
    /// Protocol-specific binding configuration.
    type Config: Send;

    /// Protocol this module emulates.
    const PROTOCOL: Protocol;

    /// Start listening with the given configuration.
    fn start(&self, config: Self::Config) -> impl Future<Output = Result<StopHandle>> + Send;
}

/// Port used by the orchestrator to start any protocol variant.
///
/// Implementations dispatch a [`ModuleConfig`] to the capture module for its
/// protocol. Tests substitute their own launcher to observe lifecycles.
pub trait ModuleLauncher: Send + Sync {
    /// Start one capture module instance.
    fn launch(&self, config: ModuleConfig) -> impl Future<Output = Result<StopHandle>> + Send;
}
