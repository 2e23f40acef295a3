//! `server_status` codec.
//!
//! ```text
//! <START|STOP>|:|<server-id>|:|<ip>|:|<port>
//! <START|STOP>|:|<server-id>|:|<ip>|:|<port>|:|<group-id>|:|<true|false>
//! ```

use super::{join_fields, parse_bool, require_non_empty, split_fields, WireMessage};
use crate::error::DecodeError;
use crate::types::{GroupAssignment, ServerRecord, ServerStatus, StatusMode};

pub const TOPIC: &str = "server_status";

impl WireMessage for ServerStatus {
    const TOPIC: &'static str = TOPIC;

    fn encode(&self) -> String {
        let port = self.server.port.to_string();
        let mut fields = vec![
            self.mode.as_str(),
            self.server.id.as_str(),
            self.server.host.as_str(),
            port.as_str(),
        ];
        if let Some(group) = &self.group {
            fields.push(group.group_id.as_str());
            fields.push(if group.fallback_eligible { "true" } else { "false" });
        }
        join_fields(&fields)
    }

    fn decode(payload: &str) -> Result<Self, DecodeError> {
        let fields = split_fields(TOPIC, payload, &[4, 6], "4 or 6")?;

        let mode = match fields[0] {
            "START" => StatusMode::Start,
            "STOP" => StatusMode::Stop,
            other => {
                return Err(DecodeError::UnknownVariant {
                    topic: TOPIC,
                    field: "mode",
                    value: other.to_string(),
                })
            }
        };
        let id = require_non_empty(TOPIC, "server id", fields[1])?;
        let port = fields[3].parse::<u16>().map_err(|_| DecodeError::InvalidPort {
            topic: TOPIC,
            value: fields[3].to_string(),
        })?;

        let group = if fields.len() == 6 {
            let group_id = require_non_empty(TOPIC, "group id", fields[4])?;
            let fallback = parse_bool(TOPIC, "fallback", fields[5])?;
            Some(GroupAssignment::new(group_id, fallback))
        } else {
            None
        };

        Ok(ServerStatus {
            mode,
            server: ServerRecord::new(id, fields[2], port),
            group,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_short_form() {
        let status = ServerStatus::decode("START|:|lobby-1|:|10.0.0.4|:|25565").unwrap();
        assert_eq!(status.mode, StatusMode::Start);
        assert_eq!(status.server, ServerRecord::new("lobby-1", "10.0.0.4", 25565));
        assert!(status.group.is_none());
    }

    #[test]
    fn test_decode_extended_form() {
        let status =
            ServerStatus::decode("START|:|mg-7|:|10.0.0.9|:|25570|:|minigame|:|false").unwrap();
        assert_eq!(status.group, Some(GroupAssignment::new("minigame", false)));
    }

    #[test]
    fn test_encode_matches_literal_format() {
        let status = ServerStatus::stop(ServerRecord::new("lobby-1", "10.0.0.4", 25565));
        assert_eq!(status.encode(), "STOP|:|lobby-1|:|10.0.0.4|:|25565");

        let status = ServerStatus::start(
            ServerRecord::new("lobby-2", "10.0.0.5", 25566),
            Some(GroupAssignment::new("lobby", true)),
        );
        assert_eq!(
            status.encode(),
            "START|:|lobby-2|:|10.0.0.5|:|25566|:|lobby|:|true"
        );
    }

    #[test]
    fn test_rejects_malformed_payloads() {
        assert!(matches!(
            ServerStatus::decode("START|:|lobby-1|:|10.0.0.4"),
            Err(DecodeError::FieldCount { found: 3, .. })
        ));
        assert!(matches!(
            ServerStatus::decode("START|:|lobby-1|:|10.0.0.4|:|25565|:|lobby"),
            Err(DecodeError::FieldCount { found: 5, .. })
        ));
        assert!(matches!(
            ServerStatus::decode("RESTART|:|lobby-1|:|10.0.0.4|:|25565"),
            Err(DecodeError::UnknownVariant { .. })
        ));
        assert!(matches!(
            ServerStatus::decode("START|:|lobby-1|:|10.0.0.4|:|port"),
            Err(DecodeError::InvalidPort { .. })
        ));
        assert!(matches!(
            ServerStatus::decode("START|:|lobby-1|:|10.0.0.4|:|25565|:|lobby|:|maybe"),
            Err(DecodeError::InvalidBool { .. })
        ));
        assert!(matches!(
            ServerStatus::decode("STOP|:||:|10.0.0.4|:|25565"),
            Err(DecodeError::EmptyField { .. })
        ));
    }
}
