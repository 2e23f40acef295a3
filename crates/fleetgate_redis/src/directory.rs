//! Shared server and player sets stored as Redis sets.

use crate::keys::{player_members, server_member, ONLINE_PLAYER_NAMES_KEY, ONLINE_SERVERS_KEY};
use async_trait::async_trait;
use fleetgate_core::{parse_server_entries, DirectoryError, PlayerDirectory, ServerDirectory};
use fleetgate_protocol::{PlayerId, ServerRecord};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError, RedisResult};
use tracing::info;

#[derive(Clone)]
pub struct RedisDirectory {
    connection: MultiplexedConnection,
}

impl RedisDirectory {
    pub async fn connect(url: &str) -> RedisResult<Self> {
        let client = Client::open(url)?;
        let connection = client.get_multiplexed_async_connection().await?;
        info!("🔌 Connected to Redis directory at {}", client.get_connection_info().addr);
        Ok(Self { connection })
    }
}

fn unavailable(e: RedisError) -> DirectoryError {
    DirectoryError::Unavailable(e.to_string())
}

#[async_trait]
impl ServerDirectory for RedisDirectory {
    async fn add(&self, server: &ServerRecord) -> Result<(), DirectoryError> {
        let mut connection = self.connection.clone();
        connection
            .sadd::<_, _, ()>(ONLINE_SERVERS_KEY, server_member(server))
            .await
            .map_err(unavailable)
    }

    async fn remove(&self, server: &ServerRecord) -> Result<(), DirectoryError> {
        let mut connection = self.connection.clone();
        connection
            .srem::<_, _, ()>(ONLINE_SERVERS_KEY, server_member(server))
            .await
            .map_err(unavailable)
    }

    async fn members(&self) -> Result<Vec<ServerRecord>, DirectoryError> {
        let mut connection = self.connection.clone();
        let entries: Vec<String> = connection
            .smembers(ONLINE_SERVERS_KEY)
            .await
            .map_err(unavailable)?;
        Ok(parse_server_entries(entries))
    }
}

#[async_trait]
impl PlayerDirectory for RedisDirectory {
    async fn add_player(&self, player: PlayerId, name: &str) -> Result<(), DirectoryError> {
        let mut connection = self.connection.clone();
        for (key, member) in player_members(player, name) {
            connection
                .sadd::<_, _, ()>(key, member)
                .await
                .map_err(unavailable)?;
        }
        Ok(())
    }

    async fn remove_player(&self, player: PlayerId, name: &str) -> Result<(), DirectoryError> {
        let mut connection = self.connection.clone();
        for (key, member) in player_members(player, name) {
            connection
                .srem::<_, _, ()>(key, member)
                .await
                .map_err(unavailable)?;
        }
        Ok(())
    }

    async fn player_names(&self) -> Result<Vec<String>, DirectoryError> {
        let mut connection = self.connection.clone();
        let mut names: Vec<String> = connection
            .smembers(ONLINE_PLAYER_NAMES_KEY)
            .await
            .map_err(unavailable)?;
        names.sort();
        Ok(names)
    }
}
