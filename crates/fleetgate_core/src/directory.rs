//! Cluster-wide sets of online servers and players.
//!
//! Every instance adds the servers it announces and removes the ones it sees
//! stop. A freshly started instance reads the whole server set once to catch
//! up before its bus subscriptions begin. Player names and ids are kept the
//! same way by the instance the player is connected to.

use crate::error::DirectoryError;
use async_trait::async_trait;
use dashmap::DashSet;
use fleetgate_protocol::{PlayerId, ServerRecord};
use tracing::warn;

/// Shared store of online servers, keyed by their `ip|id|port` entry.
#[async_trait]
pub trait ServerDirectory: Send + Sync {
    async fn add(&self, server: &ServerRecord) -> Result<(), DirectoryError>;

    async fn remove(&self, server: &ServerRecord) -> Result<(), DirectoryError>;

    /// Every well-formed entry currently in the directory.
    async fn members(&self) -> Result<Vec<ServerRecord>, DirectoryError>;
}

/// Shared sets of the players online anywhere in the cluster.
#[async_trait]
pub trait PlayerDirectory: Send + Sync {
    async fn add_player(&self, player: PlayerId, name: &str) -> Result<(), DirectoryError>;

    async fn remove_player(&self, player: PlayerId, name: &str) -> Result<(), DirectoryError>;

    /// Names of every online player, sorted.
    async fn player_names(&self) -> Result<Vec<String>, DirectoryError>;
}

/// Parses raw server entries, skipping the malformed ones. Sorted by id.
pub fn parse_server_entries<I, S>(entries: I) -> Vec<ServerRecord>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut records: Vec<ServerRecord> = entries
        .into_iter()
        .filter_map(|entry| {
            let entry = entry.as_ref();
            match ServerRecord::from_directory_entry(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("⚠️ Skipping malformed directory entry '{}': {}", entry, e);
                    None
                }
            }
        })
        .collect();
    records.sort_by(|a, b| a.id.cmp(&b.id));
    records
}

/// In-process directory for a single instance or tests.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    entries: DashSet<String>,
    player_names: DashSet<String>,
    player_ids: DashSet<PlayerId>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a raw entry without validating it.
    pub fn insert_raw(&self, entry: impl Into<String>) {
        self.entries.insert(entry.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_player(&self, player: PlayerId) -> bool {
        self.player_ids.contains(&player)
    }
}

#[async_trait]
impl ServerDirectory for MemoryDirectory {
    async fn add(&self, server: &ServerRecord) -> Result<(), DirectoryError> {
        self.entries.insert(server.to_directory_entry());
        Ok(())
    }

    async fn remove(&self, server: &ServerRecord) -> Result<(), DirectoryError> {
        self.entries.remove(&server.to_directory_entry());
        Ok(())
    }

    async fn members(&self) -> Result<Vec<ServerRecord>, DirectoryError> {
        let entries: Vec<String> = self.entries.iter().map(|entry| entry.key().clone()).collect();
        Ok(parse_server_entries(entries))
    }
}

#[async_trait]
impl PlayerDirectory for MemoryDirectory {
    async fn add_player(&self, player: PlayerId, name: &str) -> Result<(), DirectoryError> {
        self.player_names.insert(name.to_string());
        self.player_ids.insert(player);
        Ok(())
    }

    async fn remove_player(&self, player: PlayerId, name: &str) -> Result<(), DirectoryError> {
        self.player_names.remove(name);
        self.player_ids.remove(&player);
        Ok(())
    }

    async fn player_names(&self) -> Result<Vec<String>, DirectoryError> {
        let mut names: Vec<String> = self.player_names.iter().map(|name| name.key().clone()).collect();
        names.sort();
        Ok(names)
    }
}
