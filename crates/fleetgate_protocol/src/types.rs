//! # Core Type Definitions
//!
//! Identifiers, server records and the typed events carried on the bus.
//!
//! ## Key Types
//!
//! - [`PlayerId`] - Wrapper around a UUID so player ids cannot be confused
//!   with other identifiers
//! - [`ServerRecord`] - A backend pod: unique id plus network address
//! - [`GroupAssignment`] - The pool a server announces itself into
//! - [`DisplayMessage`] - Opaque JSON text shown to players

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a connected player.
///
/// # Examples
///
/// ```rust
/// use fleetgate_protocol::PlayerId;
///
/// let player_id: PlayerId = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
/// assert_eq!(player_id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Creates a new random player ID using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for PlayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Servers and groups
// ============================================================================

/// A live backend server as known to this proxy instance.
///
/// The `id` is unique across the cluster at any instant; two records with
/// the same id describe the same server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerRecord {
    /// Cluster-wide server identity
    pub id: String,
    /// Host name or IP address
    pub host: String,
    /// Listening port
    pub port: u16,
}

impl ServerRecord {
    pub fn new(id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            id: id.into(),
            host: host.into(),
            port,
        }
    }

    /// `host:port`, suitable for `TcpStream::connect`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Encodes the record the way the shared server directory stores it:
    /// `<ip>|<id>|<port>`.
    pub fn to_directory_entry(&self) -> String {
        format!("{}|{}|{}", self.host, self.id, self.port)
    }

    /// Parses a `<ip>|<id>|<port>` directory entry.
    pub fn from_directory_entry(entry: &str) -> Result<Self, DecodeError> {
        const TOPIC: &str = "server_directory";

        let parts: Vec<&str> = entry.split('|').collect();
        if parts.len() != 3 {
            return Err(DecodeError::FieldCount {
                topic: TOPIC,
                expected: "3",
                found: parts.len(),
            });
        }
        if parts[1].is_empty() {
            return Err(DecodeError::EmptyField {
                topic: TOPIC,
                field: "server id",
            });
        }
        let port = parts[2].parse::<u16>().map_err(|_| DecodeError::InvalidPort {
            topic: TOPIC,
            value: parts[2].to_string(),
        })?;

        Ok(Self::new(parts[1], parts[0], port))
    }
}

impl fmt::Display for ServerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.id, self.host, self.port)
    }
}

/// The group a server belongs to, as announced by the server itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupAssignment {
    pub group_id: String,
    pub fallback_eligible: bool,
}

impl GroupAssignment {
    pub fn new(group_id: impl Into<String>, fallback_eligible: bool) -> Self {
        Self {
            group_id: group_id.into(),
            fallback_eligible,
        }
    }
}

// ============================================================================
// Bus events
// ============================================================================

/// Whether a `server_status` message announces a server or retires it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusMode {
    Start,
    Stop,
}

impl StatusMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusMode::Start => "START",
            StatusMode::Stop => "STOP",
        }
    }
}

impl fmt::Display for StatusMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A server announcing itself (START) or being retired (STOP).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerStatus {
    pub mode: StatusMode,
    pub server: ServerRecord,
    /// Present only in the extended six-field form
    pub group: Option<GroupAssignment>,
}

impl ServerStatus {
    pub fn start(server: ServerRecord, group: Option<GroupAssignment>) -> Self {
        Self {
            mode: StatusMode::Start,
            server,
            group,
        }
    }

    pub fn stop(server: ServerRecord) -> Self {
        Self {
            mode: StatusMode::Stop,
            server,
            group: None,
        }
    }
}

/// Request to move a specific player to a specific server now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendEvent {
    pub player_id: PlayerId,
    pub target_server_id: String,
}

/// A player was kicked from their backend server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KickEvent {
    pub player_id: PlayerId,
    /// Machine-readable reason code
    pub reason: String,
    /// Human-readable name of the reason
    pub reason_display: String,
    /// Message shown to the player if they end up disconnected
    pub message: DisplayMessage,
    /// Whether the player should be moved to a fallback server instead
    pub rescuable: bool,
}

/// Whether a player joined or left the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Presence {
    Join,
    Leave,
}

impl Presence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Presence::Join => "JOIN",
            Presence::Leave => "LEAVE",
        }
    }
}

/// Login/logout notification published by the proxy that owns the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStatus {
    pub name: String,
    pub player_id: PlayerId,
    pub presence: Presence,
}

/// Last known mapping of a connected player to a backend server.
///
/// Reporting only; the proxy host owns the authoritative session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLocation {
    pub player_id: PlayerId,
    pub server_id: String,
}

/// A player moved between backend servers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerLocationChange {
    pub player_id: PlayerId,
    /// `None` when this is the player's first server after login
    pub previous: Option<String>,
    pub current: String,
}

// ============================================================================
// Display messages
// ============================================================================

/// Formatted text shown to a player, kept as its serialized JSON form.
///
/// The coordination layer never interprets the content; it only forwards it
/// to the proxy host, optionally wrapped behind a prefix line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayMessage(String);

impl DisplayMessage {
    /// Wraps already-serialized JSON text.
    pub fn from_json(json: impl Into<String>) -> Self {
        Self(json.into())
    }

    /// Builds a message from plain text.
    pub fn plain(text: &str) -> Self {
        Self(serde_json::json!({ "text": text }).to_string())
    }

    /// Builds a message from plain text in the given named color.
    pub fn colored(text: &str, color: &str) -> Self {
        Self(serde_json::json!({ "text": text, "color": color }).to_string())
    }

    pub fn as_json(&self) -> &str {
        &self.0
    }

    /// Joins several messages into one, shown back to back.
    pub fn concat(parts: &[DisplayMessage]) -> Self {
        let extra: Vec<serde_json::Value> = parts.iter().map(DisplayMessage::to_value).collect();
        Self(serde_json::json!({ "text": "", "extra": extra }).to_string())
    }

    fn to_value(&self) -> serde_json::Value {
        serde_json::from_str(&self.0).unwrap_or_else(|_| serde_json::json!({ "text": self.0 }))
    }

    /// Returns a new message made of a colored prefix line followed by this
    /// message. Content that is not valid JSON is carried as plain text.
    pub fn prefixed(&self, prefix: &str, color: &str) -> Self {
        let inner = self.to_value();

        Self(
            serde_json::json!({
                "text": format!("{prefix}\n"),
                "color": color,
                "extra": [inner],
            })
            .to_string(),
        )
    }
}

impl fmt::Display for DisplayMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_entry_format() {
        let record = ServerRecord::new("lobby-1", "10.0.0.4", 25565);
        assert_eq!(record.to_directory_entry(), "10.0.0.4|lobby-1|25565");

        let parsed = ServerRecord::from_directory_entry("10.0.0.4|lobby-1|25565").unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_directory_entry_rejects_bad_port() {
        let err = ServerRecord::from_directory_entry("10.0.0.4|lobby-1|99999").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidPort { .. }));

        let err = ServerRecord::from_directory_entry("10.0.0.4|lobby-1").unwrap_err();
        assert!(matches!(err, DecodeError::FieldCount { found: 2, .. }));
    }

    #[test]
    fn test_prefixed_message_keeps_original() {
        let original = DisplayMessage::colored("Server restarting", "yellow");
        let wrapped = original.prefixed("Failed to rescue:", "red");

        let value: serde_json::Value = serde_json::from_str(wrapped.as_json()).unwrap();
        assert_eq!(value["text"], "Failed to rescue:\n");
        assert_eq!(value["color"], "red");
        assert_eq!(value["extra"][0]["text"], "Server restarting");
    }

    #[test]
    fn test_prefixed_message_with_plain_text_body() {
        let wrapped = DisplayMessage::from_json("not json at all").prefixed("Kicked:", "red");

        let value: serde_json::Value = serde_json::from_str(wrapped.as_json()).unwrap();
        assert_eq!(value["extra"][0]["text"], "not json at all");
    }

    #[test]
    fn test_concat_keeps_part_order() {
        let joined = DisplayMessage::concat(&[
            DisplayMessage::colored("You were kicked from your server. ", "red"),
            DisplayMessage::colored("(Restart)", "gray"),
        ]);

        let value: serde_json::Value = serde_json::from_str(joined.as_json()).unwrap();
        assert_eq!(value["extra"][0]["color"], "red");
        assert_eq!(value["extra"][1]["text"], "(Restart)");
    }
}
