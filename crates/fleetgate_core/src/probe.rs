//! Opportunistic liveness checks.
//!
//! Nothing polls servers on a schedule. Whenever a player is about to be
//! routed somewhere, the target gets pinged in the background; a failed or
//! timed-out ping removes the server locally and tells the cluster with a
//! STOP.

use crate::host::ProxyHost;
use crate::registrar::ServerRegistrar;
use dashmap::DashSet;
use fleetgate_protocol::ServerRecord;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Outcome of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    Reachable,
    /// The ping failed and this probe removed the server and published STOP
    Removed,
    /// The ping failed but the server had already been removed elsewhere
    AlreadyGone,
}

#[derive(Clone)]
pub struct HealthProbe {
    host: Arc<dyn ProxyHost>,
    registrar: Arc<ServerRegistrar>,
    timeout: Duration,
    in_flight: Arc<DashSet<String>>,
}

/// Clears the in-flight mark when a probe finishes, panics included.
struct InFlightGuard {
    in_flight: Arc<DashSet<String>>,
    server_id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.remove(&self.server_id);
    }
}

impl HealthProbe {
    pub fn new(host: Arc<dyn ProxyHost>, registrar: Arc<ServerRegistrar>, timeout: Duration) -> Self {
        Self {
            host,
            registrar,
            timeout,
            in_flight: Arc::new(DashSet::new()),
        }
    }

    /// Starts a background probe of `server` unless one is already running.
    ///
    /// Returns `None` when the call coalesced into an in-flight probe.
    pub fn observe(&self, server: &ServerRecord) -> Option<JoinHandle<ProbeResult>> {
        let guard = self.begin(&server.id)?;
        let probe = self.clone();
        let server = server.clone();

        Some(tokio::spawn(async move {
            let _guard = guard;
            probe.run(&server).await
        }))
    }

    /// Probes `server` on the current task, coalescing like [`observe`](Self::observe).
    pub async fn check(&self, server: &ServerRecord) -> Option<ProbeResult> {
        let _guard = self.begin(&server.id)?;
        Some(self.run(server).await)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn begin(&self, server_id: &str) -> Option<InFlightGuard> {
        if !self.in_flight.insert(server_id.to_string()) {
            debug!("Probe of '{}' already running", server_id);
            return None;
        }
        Some(InFlightGuard {
            in_flight: self.in_flight.clone(),
            server_id: server_id.to_string(),
        })
    }

    async fn run(&self, server: &ServerRecord) -> ProbeResult {
        let failure = match tokio::time::timeout(self.timeout, self.host.ping_server(server)).await {
            Ok(Ok(())) => return ProbeResult::Reachable,
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("no answer within {:?}", self.timeout),
        };

        warn!("⚠️ Server '{}' failed its health check: {}", server.id, failure);

        match self.registrar.retire(&server.id).await {
            Some(record) => {
                if let Err(e) = self.registrar.announce_stop(record).await {
                    error!("❌ Failed to publish STOP for '{}': {}", server.id, e);
                }
                ProbeResult::Removed
            }
            None => ProbeResult::AlreadyGone,
        }
    }
}
