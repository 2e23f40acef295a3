//! Applies server START/STOP transitions to every place a server lives.
//!
//! A transition always updates local state first (cluster view, then the
//! host's live server set, then the shared directory) and only afterwards
//! touches the bus. Both transitions are idempotent, so START and STOP from
//! different publishers commute.

use crate::cluster::ClusterView;
use crate::directory::ServerDirectory;
use crate::host::ProxyHost;
use fleetgate_protocol::{
    BusError, GroupAssignment, MessageBus, ServerRecord, ServerStatus, StatusMode, WireMessage,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a status transition came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Announced on this instance; the acknowledgement goes out on the bus
    Local,
    /// Received from the bus; never re-broadcast
    Bus,
}

pub struct ServerRegistrar {
    cluster: Arc<ClusterView>,
    host: Arc<dyn ProxyHost>,
    bus: Arc<dyn MessageBus>,
    directory: Arc<dyn ServerDirectory>,
    default_group: GroupAssignment,
}

impl ServerRegistrar {
    pub fn new(
        cluster: Arc<ClusterView>,
        host: Arc<dyn ProxyHost>,
        bus: Arc<dyn MessageBus>,
        directory: Arc<dyn ServerDirectory>,
        default_group: GroupAssignment,
    ) -> Self {
        Self {
            cluster,
            host,
            bus,
            directory,
            default_group,
        }
    }

    /// Applies a decoded `server_status` event.
    pub async fn apply(&self, status: ServerStatus, origin: Origin) -> Result<(), BusError> {
        match status.mode {
            StatusMode::Start => self.register(status.server, status.group, origin).await,
            StatusMode::Stop => {
                self.retire(&status.server.id).await;
                Ok(())
            }
        }
    }

    /// Makes `server` routable on this instance.
    ///
    /// A START without a group lands in the configured default group.
    pub async fn register(
        &self,
        server: ServerRecord,
        group: Option<GroupAssignment>,
        origin: Origin,
    ) -> Result<(), BusError> {
        let group = group.unwrap_or_else(|| self.default_group.clone());

        match self.cluster.register(server.clone(), Some(&group)) {
            Some(previous) if previous != server => {
                info!("🔄 Server '{}' re-registered: {} -> {}", server.id, previous.address(), server.address())
            }
            Some(_) => debug!("Server '{}' already registered", server.id),
            None => info!("✅ Server '{}' registered at {} (group '{}')", server.id, server.address(), group.group_id),
        }

        self.host.register_server(&server);
        if let Err(e) = self.directory.add(&server).await {
            warn!("⚠️ Could not add '{}' to the server directory: {}", server.id, e);
        }

        if origin == Origin::Local {
            let ack = ServerStatus::start(server, Some(group));
            self.bus.publish(ServerStatus::TOPIC, ack.encode()).await?;
        }

        Ok(())
    }

    /// Removes `server_id` everywhere.
    ///
    /// A server missing from the cluster view but still in the host's live
    /// set (registered by the host itself, or left behind) is removed from
    /// the host and the directory as well.
    ///
    /// Returns the record only for the call that actually removed it, so
    /// callers can act exactly once per server going away.
    pub async fn retire(&self, server_id: &str) -> Option<ServerRecord> {
        let record = match self.cluster.unregister(server_id) {
            Some(record) => record,
            None => match self.host.get_server(server_id) {
                Some(record) => {
                    debug!("Server '{}' only known to the host", server_id);
                    record
                }
                None => {
                    debug!("STOP for unknown server '{}' ignored", server_id);
                    return None;
                }
            },
        };

        self.host.unregister_server(server_id);
        if let Err(e) = self.directory.remove(&record).await {
            warn!("⚠️ Could not remove '{}' from the server directory: {}", server_id, e);
        }
        info!("🛑 Server '{}' unregistered", server_id);

        Some(record)
    }

    /// Publishes a STOP for `server` on behalf of this instance.
    pub async fn announce_stop(&self, server: ServerRecord) -> Result<(), BusError> {
        self.bus
            .publish(ServerStatus::TOPIC, ServerStatus::stop(server).encode())
            .await
    }

    pub fn cluster(&self) -> &Arc<ClusterView> {
        &self.cluster
    }
}
