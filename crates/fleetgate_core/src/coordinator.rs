//! Assembly of the coordination components for one proxy instance.

use crate::bridge::{BridgeStats, EventBridge};
use crate::cluster::ClusterView;
use crate::config::CoordinatorConfig;
use crate::directory::{PlayerDirectory, ServerDirectory};
use crate::error::{CoordinatorError, HandlerError};
use crate::fallback::FallbackSelector;
use crate::host::ProxyHost;
use crate::probe::{HealthProbe, ProbeResult};
use crate::registrar::{Origin, ServerRegistrar};
use crate::rescue::RescueCoordinator;
use crate::router::PlayerRouter;
use crate::sessions::PlayerSessions;
use fleetgate_protocol::{
    BusError, GroupAssignment, KickEvent, MessageBus, SendEvent, ServerRecord, ServerStatus,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Point-in-time view of the coordinator's state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    pub servers: usize,
    pub groups: usize,
    pub active_rescues: usize,
    pub probes_in_flight: usize,
    pub bridge: BridgeStats,
}

/// The coordination layer of one proxy instance.
///
/// `Coordinator` owns every component and wires the three inbound bus topics
/// to them:
///
/// * `server_status` - [`ServerRegistrar`]
/// * `player_send` - [`PlayerRouter`]
/// * `player_kick` - [`RescueCoordinator`]
///
/// The proxy host drives the rest directly: [`sessions`](Self::sessions) for
/// login, logout and server switches, and
/// [`on_server_pre_connect`](Self::on_server_pre_connect) before it routes a
/// player anywhere.
pub struct Coordinator {
    config: CoordinatorConfig,
    cluster: Arc<ClusterView>,
    directory: Arc<dyn ServerDirectory>,
    registrar: Arc<ServerRegistrar>,
    selector: FallbackSelector,
    probe: HealthProbe,
    router: PlayerRouter,
    rescue: Arc<RescueCoordinator>,
    sessions: Arc<PlayerSessions>,
    bridge: Arc<EventBridge>,
}

impl Coordinator {
    /// `directory` backs both the shared server set and the online player
    /// sets.
    pub fn new<D>(
        config: CoordinatorConfig,
        host: Arc<dyn ProxyHost>,
        bus: Arc<dyn MessageBus>,
        directory: Arc<D>,
    ) -> Self
    where
        D: ServerDirectory + PlayerDirectory + 'static,
    {
        let players: Arc<dyn PlayerDirectory> = directory.clone();
        let directory: Arc<dyn ServerDirectory> = directory;
        let cluster = Arc::new(ClusterView::new());
        let registrar = Arc::new(ServerRegistrar::new(
            cluster.clone(),
            host.clone(),
            bus.clone(),
            directory.clone(),
            config.default_group.clone(),
        ));
        let selector = FallbackSelector::new(cluster.clone());
        let probe = HealthProbe::new(host.clone(), registrar.clone(), config.probe_timeout);
        let router = PlayerRouter::new(cluster.clone(), host.clone(), probe.clone());
        let rescue = Arc::new(RescueCoordinator::new(
            selector.clone(),
            host,
            probe.clone(),
            config.rescue_poll_interval,
        ));
        let sessions = Arc::new(PlayerSessions::new(
            bus.clone(),
            players,
            rescue.clone(),
            selector.clone(),
        ));

        let mut bridge = EventBridge::new(bus);

        let status_registrar = registrar.clone();
        bridge.on(move |status: ServerStatus| {
            let registrar = status_registrar.clone();
            async move { apply_status(&registrar, status).await }
        });

        let send_router = router.clone();
        bridge.on(move |event: SendEvent| {
            let router = send_router.clone();
            async move { route_send(&router, event).await }
        });

        let kick_rescue = rescue.clone();
        bridge.on(move |kick: KickEvent| {
            let rescue = kick_rescue.clone();
            async move {
                rescue.handle_kick(kick).await;
                Ok::<_, HandlerError>(())
            }
        });

        Self {
            config,
            cluster,
            directory,
            registrar,
            selector,
            probe,
            router,
            rescue,
            sessions,
            bridge: Arc::new(bridge),
        }
    }

    /// Catches up with the cluster, then starts consuming the bus.
    pub async fn start(&self) -> Result<(), CoordinatorError> {
        info!("🚀 Starting coordinator '{}'", self.config.instance_id);
        let loaded = self.load_servers().await?;
        self.bridge.start().await?;
        info!(
            "✅ Coordinator '{}' ready ({} servers known)",
            self.config.instance_id, loaded
        );
        Ok(())
    }

    /// Registers every server in the shared directory locally.
    ///
    /// Loaded servers are not re-announced; they join the default group.
    pub async fn load_servers(&self) -> Result<usize, CoordinatorError> {
        let members = self.directory.members().await?;
        let count = members.len();
        for server in members {
            self.registrar.register(server, None, Origin::Bus).await?;
        }
        info!("📂 Loaded {} servers from the directory", count);
        Ok(count)
    }

    /// Registers a server on behalf of this instance and announces it.
    pub async fn announce_server(
        &self,
        server: ServerRecord,
        group: Option<GroupAssignment>,
    ) -> Result<(), BusError> {
        self.registrar.register(server, group, Origin::Local).await
    }

    /// Removes a server on behalf of this instance and announces the STOP.
    pub async fn retire_server(&self, server_id: &str) -> Result<bool, BusError> {
        match self.registrar.retire(server_id).await {
            Some(record) => {
                self.registrar.announce_stop(record).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Host hook for a player about to connect to `server_id`.
    ///
    /// Starts a background health probe of the target.
    pub fn on_server_pre_connect(&self, server_id: &str) -> Option<JoinHandle<ProbeResult>> {
        match self.cluster.lookup(server_id) {
            Some(server) => self.probe.observe(&server),
            None => None,
        }
    }

    /// Stops rescues and bus subscriptions.
    pub async fn shutdown(&self) {
        info!("🛑 Shutting down coordinator '{}'", self.config.instance_id);
        self.rescue.shutdown();
        self.bridge.shutdown().await;

        let dangling = self.cluster.dangling_members();
        if !dangling.is_empty() {
            warn!("⚠️ Groups reference unknown servers at shutdown: {:?}", dangling);
        }
    }

    pub fn stats(&self) -> CoordinatorStats {
        CoordinatorStats {
            servers: self.cluster.server_count(),
            groups: self.cluster.group_count(),
            active_rescues: self.rescue.active_count(),
            probes_in_flight: self.probe.in_flight(),
            bridge: self.bridge.stats(),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn cluster(&self) -> &Arc<ClusterView> {
        &self.cluster
    }

    pub fn selector(&self) -> &FallbackSelector {
        &self.selector
    }

    pub fn probe(&self) -> &HealthProbe {
        &self.probe
    }

    pub fn router(&self) -> &PlayerRouter {
        &self.router
    }

    pub fn rescue(&self) -> &Arc<RescueCoordinator> {
        &self.rescue
    }

    pub fn sessions(&self) -> &Arc<PlayerSessions> {
        &self.sessions
    }

    pub fn bridge(&self) -> &Arc<EventBridge> {
        &self.bridge
    }
}

async fn apply_status(registrar: &ServerRegistrar, status: ServerStatus) -> Result<(), HandlerError> {
    registrar.apply(status, Origin::Bus).await?;
    Ok(())
}

async fn route_send(router: &PlayerRouter, event: SendEvent) -> Result<(), HandlerError> {
    router.send_player(event.player_id, &event.target_server_id).await?;
    Ok(())
}
