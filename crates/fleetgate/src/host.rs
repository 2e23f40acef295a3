//! Proxy host used when fleetgate runs on its own.
//!
//! It keeps a live server table and can ping servers over TCP, but it carries
//! no player sessions: every player-facing call reports the player offline.
//! A real proxy embeds `fleetgate_core` and implements `ProxyHost` itself.

use async_trait::async_trait;
use dashmap::DashMap;
use fleetgate_core::{ConnectionStatus, HostError, ProxyHost};
use fleetgate_protocol::{DisplayMessage, PlayerId, ServerRecord};
use tokio::net::TcpStream;
use tracing::{debug, trace};

#[derive(Debug, Default)]
pub struct StandaloneHost {
    servers: DashMap<String, ServerRecord>,
}

impl StandaloneHost {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProxyHost for StandaloneHost {
    fn register_server(&self, server: &ServerRecord) {
        trace!("Host table: add {}", server);
        self.servers.insert(server.id.clone(), server.clone());
    }

    fn unregister_server(&self, server_id: &str) {
        trace!("Host table: remove {}", server_id);
        self.servers.remove(server_id);
    }

    fn get_server(&self, server_id: &str) -> Option<ServerRecord> {
        self.servers.get(server_id).map(|entry| entry.value().clone())
    }

    fn list_servers(&self) -> Vec<ServerRecord> {
        let mut servers: Vec<ServerRecord> =
            self.servers.iter().map(|entry| entry.value().clone()).collect();
        servers.sort_by(|a, b| a.id.cmp(&b.id));
        servers
    }

    fn is_player_online(&self, _player: PlayerId) -> bool {
        false
    }

    async fn connect_player(
        &self,
        player: PlayerId,
        _server: &ServerRecord,
    ) -> Result<ConnectionStatus, HostError> {
        Err(HostError::PlayerOffline(player))
    }

    async fn disconnect_player(&self, player: PlayerId, _message: &DisplayMessage) {
        debug!("No session for {}, nothing to disconnect", player);
    }

    async fn send_message(&self, player: PlayerId, _message: &DisplayMessage) {
        debug!("No session for {}, message dropped", player);
    }

    async fn ping_server(&self, server: &ServerRecord) -> Result<(), HostError> {
        TcpStream::connect(server.address())
            .await
            .map(|_| ())
            .map_err(|e| HostError::Ping {
                server: server.id.clone(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_ping_reaches_listening_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let host = StandaloneHost::new();

        let server = ServerRecord::new("local", "127.0.0.1", port);
        assert!(host.ping_server(&server).await.is_ok());

        drop(listener);
        let closed = ServerRecord::new("closed", "127.0.0.1", port);
        assert!(matches!(
            host.ping_server(&closed).await,
            Err(HostError::Ping { .. })
        ));
    }

    #[tokio::test]
    async fn test_server_table() {
        let host = StandaloneHost::new();
        host.register_server(&ServerRecord::new("b", "10.0.0.2", 1));
        host.register_server(&ServerRecord::new("a", "10.0.0.1", 1));
        assert_eq!(host.list_servers()[0].id, "a");

        host.unregister_server("a");
        assert!(host.get_server("a").is_none());
        assert!(!host.is_player_online(PlayerId::new()));
    }
}
