//! Redis keys shared by every instance and the members stored under them.

use fleetgate_protocol::{PlayerId, ServerRecord};

/// Set of `host|id|port` entries, one per online server.
pub const ONLINE_SERVERS_KEY: &str = "online_servers";

/// Set of online player names.
pub const ONLINE_PLAYER_NAMES_KEY: &str = "online_player_names";

/// Set of online player ids in hyphenated form.
pub const ONLINE_PLAYER_IDS_KEY: &str = "online_player_uuids";

pub fn server_member(server: &ServerRecord) -> String {
    server.to_directory_entry()
}

/// The `(key, member)` pairs a player occupies while online.
pub fn player_members(player: PlayerId, name: &str) -> [(&'static str, String); 2] {
    [
        (ONLINE_PLAYER_NAMES_KEY, name.to_string()),
        (ONLINE_PLAYER_IDS_KEY, player.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_member_format() {
        let server = ServerRecord::new("lobby-1", "10.0.0.4", 25565);
        assert_eq!(server_member(&server), "10.0.0.4|lobby-1|25565");
        assert_eq!(
            ServerRecord::from_directory_entry(&server_member(&server)).unwrap(),
            server
        );
    }

    #[test]
    fn test_player_members() {
        let player: PlayerId = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
        assert_eq!(
            player_members(player, "Notch"),
            [
                ("online_player_names", "Notch".to_string()),
                (
                    "online_player_uuids",
                    "550e8400-e29b-41d4-a716-446655440000".to_string()
                ),
            ]
        );
    }
}
