//! Capture orchestrator.
//!
//! Owns the lifecycle of every listener started for one run:
//! `Initializing → Starting → Running → ShuttingDown → Terminated`.

use std::fmt;
use std::mem;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::plan::LaunchPlan;
use crate::domain::Protocol;
use crate::error::{Error, Result};
use crate::handle::{StopHandle, StopReport};
use crate::ports::ModuleLauncher;
use crate::shutdown::ShutdownListener;

/// Stop timeout used until a plan supplies its own.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle phase of an [`Orchestrator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OrchestratorPhase {
    Initializing,
    Starting,
    Running,
    ShuttingDown,
    Terminated,
}

impl fmt::Display for OrchestratorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrchestratorPhase::Initializing => "initializing",
            OrchestratorPhase::Starting => "starting",
            OrchestratorPhase::Running => "running",
            OrchestratorPhase::ShuttingDown => "shutting down",
            OrchestratorPhase::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// A started listener and the capability that stops it.
#[derive(Debug)]
struct RunningInstance {
    id: Uuid,
    protocol: Protocol,
    port: u16,
    handle: StopHandle,
}

/// Read-only view of a running instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceInfo {
    pub id: Uuid,
    pub protocol: Protocol,
    pub port: u16,
}

/// Outcome of draining the running instances.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// Listeners released cleanly, in stop order.
    pub stopped: Vec<StopReport>,
    /// Listeners whose release failed or timed out.
    pub failures: Vec<Error>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of stop invocations this report covers.
    pub fn attempted(&self) -> usize {
        self.stopped.len() + self.failures.len()
    }
}

/// Starts every listener in a [`LaunchPlan`] and stops them again on shutdown.
///
/// The launcher is injected so startup and shutdown ordering can be tested
/// without binding real sockets.
pub struct Orchestrator<L: ModuleLauncher> {
    launcher: L,
    phase: OrchestratorPhase,
    enabled: Vec<Protocol>,
    instances: Vec<RunningInstance>,
    stop_timeout: Duration,
}

impl<L: ModuleLauncher> Orchestrator<L> {
    pub fn new(launcher: L) -> Self {
        Self {
            launcher,
            phase: OrchestratorPhase::Initializing,
            enabled: Vec::new(),
            instances: Vec::new(),
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }

    pub fn phase(&self) -> OrchestratorPhase {
        self.phase
    }

    /// Protocols that started at least one listener, in start order.
    pub fn enabled_protocols(&self) -> &[Protocol] {
        &self.enabled
    }

    pub fn enabled_count(&self) -> usize {
        self.enabled.len()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Running instances in start order.
    pub fn instances(&self) -> Vec<InstanceInfo> {
        self.instances
            .iter()
            .map(|i| InstanceInfo {
                id: i.id,
                protocol: i.protocol,
                port: i.port,
            })
            .collect()
    }

    /// Start every listener in `plan`, one port at a time.
    ///
    /// The first failure aborts the pass. Instances already started in the
    /// pass are stopped (in start order) before the error is returned, and
    /// the orchestrator ends up `Terminated`.
    pub async fn start(&mut self, plan: &LaunchPlan) -> Result<()> {
        if self.phase != OrchestratorPhase::Initializing {
            return Err(Error::Config(format!(
                "Cannot start capture while {}",
                self.phase
            )));
        }

        self.stop_timeout = plan.stop_timeout();
        self.phase = OrchestratorPhase::Starting;
        debug!(instances = plan.instance_count(), "Starting capture listeners");

        for protocol_plan in plan.protocols() {
            let protocol = protocol_plan.protocol;
            let mut started = 0usize;

            for port in protocol_plan.ports.iter() {
                let config = protocol_plan.module_config(port);
                match self.launcher.launch(config).await {
                    Ok(handle) => {
                        let id = Uuid::new_v4();
                        info!(%protocol, port, instance = %id, "Listener started");
                        self.instances.push(RunningInstance {
                            id,
                            protocol,
                            port,
                            handle,
                        });
                        started += 1;
                    }
                    Err(e) => {
                        error!(%protocol, port, error = %e, "Listener failed to start");
                        self.abort_startup().await;
                        return Err(e);
                    }
                }
            }

            if started > 0 {
                self.enabled.push(protocol);
            }
        }

        if self.enabled.is_empty() {
            self.phase = OrchestratorPhase::Terminated;
            return Err(Error::NoProtocolEnabled);
        }

        self.phase = OrchestratorPhase::Running;
        info!(
            protocols = self.enabled.len(),
            instances = self.instances.len(),
            "Capture running"
        );
        Ok(())
    }

    /// Block until `shutdown` fires, then stop every listener.
    ///
    /// Also returns if every trigger is dropped without a request.
    pub async fn run_until_shutdown(&mut self, mut shutdown: ShutdownListener) -> ShutdownReport {
        shutdown.wait().await;
        if !shutdown.is_requested() {
            warn!("Shutdown triggers dropped without a request");
        }
        info!("shutting down...");
        self.shutdown().await
    }

    /// Stop every running listener in start order.
    ///
    /// Each stop is attempted regardless of earlier failures. Calling this
    /// again after it has run returns an empty report.
    pub async fn shutdown(&mut self) -> ShutdownReport {
        if self.phase == OrchestratorPhase::Terminated {
            debug!("Shutdown already complete");
            return ShutdownReport::default();
        }

        self.phase = OrchestratorPhase::ShuttingDown;
        let report = self.drain().await;
        self.phase = OrchestratorPhase::Terminated;

        info!(
            stopped = report.stopped.len(),
            failed = report.failures.len(),
            "Capture stopped"
        );
        report
    }

    async fn abort_startup(&mut self) {
        if !self.instances.is_empty() {
            warn!(
                instances = self.instances.len(),
                "Startup failed, releasing listeners already started"
            );
        }

        self.phase = OrchestratorPhase::ShuttingDown;
        self.drain().await;
        self.phase = OrchestratorPhase::Terminated;
    }

    async fn drain(&mut self) -> ShutdownReport {
        let mut report = ShutdownReport::default();

        for instance in mem::take(&mut self.instances) {
            let RunningInstance {
                id,
                protocol,
                port,
                handle,
            } = instance;

            match handle.stop(self.stop_timeout).await {
                Ok(stopped) => {
                    info!(
                        %protocol,
                        port,
                        instance = %id,
                        interactions = stopped.interactions,
                        "Listener stopped"
                    );
                    report.stopped.push(stopped);
                }
                Err(e) => {
                    warn!(%protocol, port, instance = %id, error = %e, "Listener cleanup failed");
                    report.failures.push(e);
                }
            }
        }

        report
    }
}
