//! `player_server_change` codec: `<player-uuid>|:|<previous-id>|:|<new-id>`.
//!
//! A player with no previous server is written with the literal `null`.

use super::{join_fields, parse_player_id, require_non_empty, split_fields, WireMessage};
use crate::error::DecodeError;
use crate::types::PlayerLocationChange;

pub const TOPIC: &str = "player_server_change";

const NO_SERVER: &str = "null";

impl WireMessage for PlayerLocationChange {
    const TOPIC: &'static str = TOPIC;

    fn encode(&self) -> String {
        let player = self.player_id.to_string();
        let previous = self.previous.as_deref().unwrap_or(NO_SERVER);
        join_fields(&[&player, previous, &self.current])
    }

    fn decode(payload: &str) -> Result<Self, DecodeError> {
        let fields = split_fields(TOPIC, payload, &[3], "3")?;
        let previous = match fields[1] {
            NO_SERVER | "" => None,
            id => Some(id.to_string()),
        };

        Ok(PlayerLocationChange {
            player_id: parse_player_id(TOPIC, fields[0])?,
            previous,
            current: require_non_empty(TOPIC, "server id", fields[2])?.to_string(),
        })
    }
}
