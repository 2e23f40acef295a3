//! Shared fixtures for the coordinator integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use dashmap::DashMap;
use fleetgate_core::{
    ConnectionStatus, Coordinator, CoordinatorConfig, HostError, MemoryDirectory, ProxyHost,
};
use fleetgate_protocol::{
    DisplayMessage, GroupAssignment, MemoryBus, MessageBus, PlayerId, ServerRecord, Subscription,
};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const PLAYER: &str = "550e8400-e29b-41d4-a716-446655440000";

pub fn player() -> PlayerId {
    PLAYER.parse().unwrap()
}

/// Scriptable in-memory proxy host.
///
/// Connection requests pop results from a script; once it runs out they use
/// the fallback result (success unless changed).
#[derive(Default)]
pub struct MockHost {
    servers: DashMap<String, ServerRecord>,
    online: Mutex<HashSet<PlayerId>>,
    script: Mutex<VecDeque<Result<ConnectionStatus, HostError>>>,
    fallback: Mutex<Option<Result<ConnectionStatus, HostError>>>,
    unreachable: Mutex<HashSet<String>>,
    ping_delay: Mutex<Option<Duration>>,
    pub connects: Mutex<Vec<(PlayerId, String)>>,
    pub disconnects: Mutex<Vec<(PlayerId, DisplayMessage)>>,
    pub messages: Mutex<Vec<(PlayerId, DisplayMessage)>>,
    pub pings: AtomicUsize,
}

impl MockHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn login(&self, player: PlayerId) {
        self.online.lock().insert(player);
    }

    pub fn logout(&self, player: PlayerId) {
        self.online.lock().remove(&player);
    }

    pub fn script_connect(&self, result: Result<ConnectionStatus, HostError>) {
        self.script.lock().push_back(result);
    }

    /// Result used once the script is empty.
    pub fn connect_by_default(&self, result: Result<ConnectionStatus, HostError>) {
        *self.fallback.lock() = Some(result);
    }

    pub fn set_unreachable(&self, server_id: &str) {
        self.unreachable.lock().insert(server_id.to_string());
    }

    pub fn set_ping_delay(&self, delay: Duration) {
        *self.ping_delay.lock() = Some(delay);
    }

    pub fn has_server(&self, server_id: &str) -> bool {
        self.servers.contains_key(server_id)
    }

    pub fn connect_count(&self) -> usize {
        self.connects.lock().len()
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.lock().len()
    }
}

#[async_trait]
impl ProxyHost for MockHost {
    fn register_server(&self, server: &ServerRecord) {
        self.servers.insert(server.id.clone(), server.clone());
    }

    fn unregister_server(&self, server_id: &str) {
        self.servers.remove(server_id);
    }

    fn get_server(&self, server_id: &str) -> Option<ServerRecord> {
        self.servers.get(server_id).map(|entry| entry.value().clone())
    }

    fn list_servers(&self) -> Vec<ServerRecord> {
        self.servers.iter().map(|entry| entry.value().clone()).collect()
    }

    fn is_player_online(&self, player: PlayerId) -> bool {
        self.online.lock().contains(&player)
    }

    async fn connect_player(
        &self,
        player: PlayerId,
        server: &ServerRecord,
    ) -> Result<ConnectionStatus, HostError> {
        if !self.is_player_online(player) {
            return Err(HostError::PlayerOffline(player));
        }
        self.connects.lock().push((player, server.id.clone()));

        let scripted = self.script.lock().pop_front();
        scripted
            .or_else(|| self.fallback.lock().clone())
            .unwrap_or(Ok(ConnectionStatus::Success))
    }

    async fn disconnect_player(&self, player: PlayerId, message: &DisplayMessage) {
        self.online.lock().remove(&player);
        self.disconnects.lock().push((player, message.clone()));
    }

    async fn send_message(&self, player: PlayerId, message: &DisplayMessage) {
        self.messages.lock().push((player, message.clone()));
    }

    async fn ping_server(&self, server: &ServerRecord) -> Result<(), HostError> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        let delay = *self.ping_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.unreachable.lock().contains(&server.id) {
            return Err(HostError::Ping {
                server: server.id.clone(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

/// A coordinator wired to in-memory collaborators.
pub struct Harness {
    pub host: Arc<MockHost>,
    pub bus: Arc<MemoryBus>,
    pub directory: Arc<MemoryDirectory>,
    pub coordinator: Coordinator,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: CoordinatorConfig) -> Self {
        let host = MockHost::new();
        let bus = Arc::new(MemoryBus::new());
        let directory = Arc::new(MemoryDirectory::new());
        let coordinator = Coordinator::new(config, host.clone(), bus.clone(), directory.clone());
        Self {
            host,
            bus,
            directory,
            coordinator,
        }
    }

    /// Registers a server as if its START had arrived from the bus.
    pub async fn add_server(&self, id: &str, group: &str, fallback: bool) {
        let payload = format!("START|:|{id}|:|10.0.0.1|:|25565|:|{group}|:|{fallback}");
        self.deliver("server_status", payload).await;
    }

    pub async fn deliver(&self, topic: &str, payload: impl Into<String>) {
        self.coordinator.bridge().deliver(topic, payload.into()).await;
    }

    pub async fn listen(&self, topic: &str) -> Subscription {
        self.bus.subscribe(topic).await.unwrap()
    }
}

pub fn test_config() -> CoordinatorConfig {
    CoordinatorConfig {
        instance_id: "test-proxy".to_string(),
        rescue_poll_interval: Duration::from_millis(10),
        probe_timeout: Duration::from_millis(200),
        default_group: GroupAssignment::new("lobby", true),
    }
}

pub fn drain(subscription: &mut Subscription) -> Vec<String> {
    let mut payloads = Vec::new();
    while let Some(payload) = subscription.try_recv() {
        payloads.push(payload);
    }
    payloads
}

/// Polls `condition` until it holds or one second passes.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
