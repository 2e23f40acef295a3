//! `player_kick` codec.
//!
//! ```text
//! <player-uuid>|:|<reason>|:|<display-name>|:|<json-message>|:|<true|false>
//! ```

use super::{join_fields, parse_bool, parse_player_id, split_fields, WireMessage};
use crate::error::DecodeError;
use crate::types::{DisplayMessage, KickEvent};

pub const TOPIC: &str = "player_kick";

impl WireMessage for KickEvent {
    const TOPIC: &'static str = TOPIC;

    fn encode(&self) -> String {
        let player = self.player_id.to_string();
        join_fields(&[
            &player,
            &self.reason,
            &self.reason_display,
            self.message.as_json(),
            if self.rescuable { "true" } else { "false" },
        ])
    }

    fn decode(payload: &str) -> Result<Self, DecodeError> {
        let fields = split_fields(TOPIC, payload, &[5], "5")?;
        Ok(KickEvent {
            player_id: parse_player_id(TOPIC, fields[0])?,
            reason: fields[1].to_string(),
            reason_display: fields[2].to_string(),
            message: DisplayMessage::from_json(fields[3]),
            rescuable: parse_bool(TOPIC, "rescuable", fields[4])?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[test]
    fn test_decode() {
        let payload = format!(
            "{PLAYER}|:|SERVER_CLOSED|:|Server closed|:|{{\"text\":\"Bye\"}}|:|true"
        );
        let event = KickEvent::decode(&payload).unwrap();
        assert_eq!(event.reason, "SERVER_CLOSED");
        assert_eq!(event.reason_display, "Server closed");
        assert_eq!(event.message.as_json(), "{\"text\":\"Bye\"}");
        assert!(event.rescuable);
    }

    #[test]
    fn test_encode_decode_agree() {
        let payload = format!("{PLAYER}|:|BANNED|:|Banned|:|{{\"text\":\"No\"}}|:|false");
        let event = KickEvent::decode(&payload).unwrap();
        assert_eq!(event.encode(), payload);
    }

    #[test]
    fn test_rejects_missing_field() {
        let payload = format!("{PLAYER}|:|SERVER_CLOSED|:|Server closed|:|true");
        assert!(matches!(
            KickEvent::decode(&payload),
            Err(DecodeError::FieldCount { found: 4, .. })
        ));
    }

    #[test]
    fn test_rejects_bad_flag() {
        let payload = format!("{PLAYER}|:|SERVER_CLOSED|:|Server closed|:|{{}}|:|yes");
        assert!(matches!(
            KickEvent::decode(&payload),
            Err(DecodeError::InvalidBool { field: "rescuable", .. })
        ));
    }
}
