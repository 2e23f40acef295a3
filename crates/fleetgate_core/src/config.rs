//! Coordinator configuration types and defaults.
//!
//! The value is built once by the embedding application (from its own
//! settings file, flags or environment) and handed to [`crate::Coordinator::new`].
//! Nothing in the core reads process-wide settings.

use fleetgate_protocol::GroupAssignment;
use std::time::Duration;

/// Default cadence of the kick-rescue polling loop.
pub const DEFAULT_RESCUE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default time a server has to answer a health ping.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Configuration for one proxy instance's coordination layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Name of this proxy instance, used in logs
    pub instance_id: String,

    /// Delay between two rescue attempts for the same player
    pub rescue_poll_interval: Duration,

    /// How long a health ping may take before the server counts as down
    pub probe_timeout: Duration,

    /// Group used for servers that announce themselves without one
    /// (short `server_status` form, directory bulk load)
    pub default_group: GroupAssignment,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            instance_id: "fleetgate".to_string(),
            rescue_poll_interval: DEFAULT_RESCUE_POLL_INTERVAL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            default_group: GroupAssignment::new("lobby", true),
        }
    }
}
