//! Player presence and location reporting.
//!
//! The proxy host calls into this from its own login, logout and
//! server-connected events. Locations are informational; the host keeps the
//! authoritative session state. Login and logout also maintain the
//! cluster-wide online player sets.

use crate::directory::PlayerDirectory;
use crate::fallback::FallbackSelector;
use crate::rescue::RescueCoordinator;
use dashmap::DashMap;
use fleetgate_protocol::{
    BusError, MessageBus, PlayerId, PlayerLocation, PlayerLocationChange, PlayerStatus, Presence,
    ServerRecord, WireMessage,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct PlayerSessions {
    locations: DashMap<PlayerId, String>,
    bus: Arc<dyn MessageBus>,
    players: Arc<dyn PlayerDirectory>,
    rescue: Arc<RescueCoordinator>,
    selector: FallbackSelector,
}

impl PlayerSessions {
    pub fn new(
        bus: Arc<dyn MessageBus>,
        players: Arc<dyn PlayerDirectory>,
        rescue: Arc<RescueCoordinator>,
        selector: FallbackSelector,
    ) -> Self {
        Self {
            locations: DashMap::new(),
            bus,
            players,
            rescue,
            selector,
        }
    }

    /// Broadcasts that `player` joined the network through this proxy.
    pub async fn on_login(&self, player: PlayerId, name: &str) -> Result<(), BusError> {
        info!("👋 {} ({}) logged in", name, player);
        if let Err(e) = self.players.add_player(player, name).await {
            warn!("⚠️ Could not add {} to the online players: {}", name, e);
        }
        self.publish_presence(player, name, Presence::Join).await
    }

    /// Ends everything this instance tracks for `player`, then broadcasts the
    /// departure.
    pub async fn on_logout(&self, player: PlayerId, name: &str) -> Result<(), BusError> {
        if self.rescue.cancel(player) {
            debug!("Stopped rescue for departing player {}", player);
        }
        self.locations.remove(&player);
        info!("👋 {} ({}) logged out", name, player);
        if let Err(e) = self.players.remove_player(player, name).await {
            warn!("⚠️ Could not remove {} from the online players: {}", name, e);
        }
        self.publish_presence(player, name, Presence::Leave).await
    }

    /// Records that `player` is now on `server_id` and reports the move.
    pub async fn on_server_connected(&self, player: PlayerId, server_id: &str) -> Result<(), BusError> {
        let previous = self.locations.insert(player, server_id.to_string());
        if previous.as_deref() == Some(server_id) {
            return Ok(());
        }

        let change = PlayerLocationChange {
            player_id: player,
            previous,
            current: server_id.to_string(),
        };
        self.bus.publish(PlayerLocationChange::TOPIC, change.encode()).await
    }

    /// Picks the first server for a player who just logged in.
    pub fn choose_initial_server(&self, player: PlayerId) -> Option<ServerRecord> {
        let choice = self.selector.choose_fallback();
        if choice.is_none() {
            warn!("⚠️ No server available for {}", player);
        }
        choice
    }

    pub fn location_of(&self, player: PlayerId) -> Option<PlayerLocation> {
        self.locations.get(&player).map(|entry| PlayerLocation {
            player_id: player,
            server_id: entry.value().clone(),
        })
    }

    pub fn located_count(&self) -> usize {
        self.locations.len()
    }

    async fn publish_presence(&self, player: PlayerId, name: &str, presence: Presence) -> Result<(), BusError> {
        let status = PlayerStatus {
            name: name.to_string(),
            player_id: player,
            presence,
        };
        self.bus.publish(PlayerStatus::TOPIC, status.encode()).await
    }
}
