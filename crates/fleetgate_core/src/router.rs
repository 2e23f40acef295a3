//! Directed player moves (`player_send`).

use crate::cluster::ClusterView;
use crate::error::RouteError;
use crate::host::{ConnectionStatus, ProxyHost};
use crate::probe::HealthProbe;
use fleetgate_protocol::{PlayerId, ServerRecord};
use std::sync::Arc;
use tracing::{error, info, warn};

/// A failed first attempt is retried once against the same target.
const CONNECT_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Connected { server_id: String, attempts: u32 },
    /// No server with that id is known; nothing was attempted
    TargetNotFound,
    /// The player is not connected to this proxy instance
    PlayerOffline,
}

#[derive(Clone)]
pub struct PlayerRouter {
    cluster: Arc<ClusterView>,
    host: Arc<dyn ProxyHost>,
    probe: HealthProbe,
}

impl PlayerRouter {
    pub fn new(cluster: Arc<ClusterView>, host: Arc<dyn ProxyHost>, probe: HealthProbe) -> Self {
        Self { cluster, host, probe }
    }

    /// Moves `player` to `target_server_id`.
    ///
    /// Lookup misses are not errors. Only a target that is known but refuses
    /// the player twice yields [`RouteError::ConnectFailed`].
    pub async fn send_player(
        &self,
        player: PlayerId,
        target_server_id: &str,
    ) -> Result<SendOutcome, RouteError> {
        let Some(target) = self.resolve(target_server_id) else {
            info!("Send request for {} names unknown server '{}'", player, target_server_id);
            return Ok(SendOutcome::TargetNotFound);
        };

        if !self.host.is_player_online(player) {
            info!("Send request for {} ignored, player is not on this proxy", player);
            return Ok(SendOutcome::PlayerOffline);
        }

        self.probe.observe(&target);

        let mut last_failure = String::new();
        for attempt in 1..=CONNECT_ATTEMPTS {
            match self.host.connect_player(player, &target).await {
                Ok(status) if status.is_successful() => {
                    info!("➡️ Sent {} to '{}' (attempt {})", player, target.id, attempt);
                    return Ok(SendOutcome::Connected {
                        server_id: target.id,
                        attempts: attempt,
                    });
                }
                Ok(status) => last_failure = describe(status),
                Err(e) => last_failure = e.to_string(),
            }
            warn!("⚠️ Attempt {} to send {} to '{}' failed: {}", attempt, player, target.id, last_failure);
        }

        error!("❌ Could not send {} to '{}'", player, target.id);
        Err(RouteError::ConnectFailed {
            player,
            server: target.id,
            attempts: CONNECT_ATTEMPTS,
            last_failure,
        })
    }

    fn resolve(&self, server_id: &str) -> Option<ServerRecord> {
        self.cluster
            .lookup(server_id)
            .or_else(|| self.host.get_server(server_id))
    }
}

pub(crate) fn describe(status: ConnectionStatus) -> String {
    match status {
        ConnectionStatus::Success => "connected",
        ConnectionStatus::AlreadyConnected => "already connected",
        ConnectionStatus::InProgress => "another connection attempt is in progress",
        ConnectionStatus::Cancelled => "connection cancelled",
        ConnectionStatus::ServerDisconnected => "server disconnected the player",
    }
    .to_string()
}
