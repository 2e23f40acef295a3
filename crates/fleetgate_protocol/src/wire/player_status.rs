//! `player_status` codec: `<player-name>|:|<player-uuid>|:|<JOIN|LEAVE>`.

use super::{join_fields, parse_player_id, split_fields, WireMessage};
use crate::error::DecodeError;
use crate::types::{PlayerStatus, Presence};

pub const TOPIC: &str = "player_status";

impl WireMessage for PlayerStatus {
    const TOPIC: &'static str = TOPIC;

    fn encode(&self) -> String {
        let player = self.player_id.to_string();
        join_fields(&[&self.name, &player, self.presence.as_str()])
    }

    fn decode(payload: &str) -> Result<Self, DecodeError> {
        let fields = split_fields(TOPIC, payload, &[3], "3")?;
        let presence = match fields[2] {
            "JOIN" => Presence::Join,
            "LEAVE" => Presence::Leave,
            other => {
                return Err(DecodeError::UnknownVariant {
                    topic: TOPIC,
                    field: "presence",
                    value: other.to_string(),
                })
            }
        };

        Ok(PlayerStatus {
            name: fields[0].to_string(),
            player_id: parse_player_id(TOPIC, fields[1])?,
            presence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlayerId;

    #[test]
    fn test_encode() {
        let player_id: PlayerId = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
        let status = PlayerStatus {
            name: "Steve".to_string(),
            player_id,
            presence: Presence::Leave,
        };
        assert_eq!(
            status.encode(),
            "Steve|:|550e8400-e29b-41d4-a716-446655440000|:|LEAVE"
        );
    }

    #[test]
    fn test_rejects_unknown_presence() {
        assert!(matches!(
            PlayerStatus::decode("Steve|:|550e8400-e29b-41d4-a716-446655440000|:|AFK"),
            Err(DecodeError::UnknownVariant { field: "presence", .. })
        ));
    }
}
