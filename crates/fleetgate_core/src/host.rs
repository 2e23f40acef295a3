//! Narrow interface onto the proxy host.
//!
//! The coordination layer never owns player connections. Everything it needs
//! from the proxy (its live server table, connection requests, disconnects and
//! server pings) goes through [`ProxyHost`], which the embedding proxy
//! implements.

use crate::error::HostError;
use async_trait::async_trait;
use fleetgate_protocol::{DisplayMessage, PlayerId, ServerRecord};

/// Result status of a completed connection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    /// The player is now connected to the requested server
    Success,
    /// The player was already connected to the requested server
    AlreadyConnected,
    /// Another connection attempt for this player is still running
    InProgress,
    /// The request was cancelled by the proxy or a listener
    Cancelled,
    /// The backend refused or dropped the connection
    ServerDisconnected,
}

impl ConnectionStatus {
    /// True when the player ends up on the requested server.
    pub fn is_successful(&self) -> bool {
        matches!(self, ConnectionStatus::Success | ConnectionStatus::AlreadyConnected)
    }
}

/// Operations the proxy host exposes to the coordination layer.
///
/// Server table operations are synchronous local map updates on the host;
/// anything that talks to a player or a backend is async.
#[async_trait]
pub trait ProxyHost: Send + Sync {
    /// Adds a server to the host's live listener set, replacing any entry with
    /// the same id.
    fn register_server(&self, server: &ServerRecord);

    /// Removes a server from the host's live listener set.
    fn unregister_server(&self, server_id: &str);

    fn get_server(&self, server_id: &str) -> Option<ServerRecord>;

    fn list_servers(&self) -> Vec<ServerRecord>;

    fn is_player_online(&self, player: PlayerId) -> bool;

    /// Requests that `player` be connected to `server` and waits for the outcome.
    async fn connect_player(
        &self,
        player: PlayerId,
        server: &ServerRecord,
    ) -> Result<ConnectionStatus, HostError>;

    /// Disconnects `player` from the proxy entirely, showing `message`.
    async fn disconnect_player(&self, player: PlayerId, message: &DisplayMessage);

    /// Shows `message` to `player` without disconnecting them.
    async fn send_message(&self, player: PlayerId, message: &DisplayMessage);

    /// Pings a backend server. Any error means the server is unreachable.
    async fn ping_server(&self, server: &ServerRecord) -> Result<(), HostError>;
}
