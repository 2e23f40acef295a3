//! `player_send` codec: `<player-uuid>|:|<target-server-id>`.

use super::{join_fields, parse_player_id, require_non_empty, split_fields, WireMessage};
use crate::error::DecodeError;
use crate::types::SendEvent;

pub const TOPIC: &str = "player_send";

impl WireMessage for SendEvent {
    const TOPIC: &'static str = TOPIC;

    fn encode(&self) -> String {
        let player = self.player_id.to_string();
        join_fields(&[&player, &self.target_server_id])
    }

    fn decode(payload: &str) -> Result<Self, DecodeError> {
        let fields = split_fields(TOPIC, payload, &[2], "2")?;
        Ok(SendEvent {
            player_id: parse_player_id(TOPIC, fields[0])?,
            target_server_id: require_non_empty(TOPIC, "target server id", fields[1])?.to_string(),
        })
    }
}
