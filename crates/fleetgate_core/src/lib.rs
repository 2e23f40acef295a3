//! # Fleetgate Core
//!
//! Coordination layer shared by every proxy instance in a fleetgate cluster.
//! Instances keep a local, eventually consistent view of the backend servers
//! from START/STOP broadcasts, pick fallback servers by group, route players
//! on request and rescue kicked players instead of dropping them.
//!
//! ## Core Features
//!
//! - **Membership**: Concurrent server map plus ordered groups, updated atomically
//! - **Fallback Selection**: First eligible group with a live member wins
//! - **Event Bridge**: Typed bus dispatch with per-message failure isolation
//! - **Health Probes**: Opportunistic pings that retire dead servers cluster-wide
//! - **Kick Rescue**: Cancellable per-player polling tasks bound to the session
//!
//! ## Collaborators
//!
//! The core never owns sockets or player connections. It talks to the outside
//! world through four traits:
//!
//! - [`ProxyHost`] - the proxy's server table, player connections and pings
//! - [`fleetgate_protocol::MessageBus`] - cluster-wide publish/subscribe
//! - [`ServerDirectory`] and [`PlayerDirectory`] - cluster-wide sets of online
//!   servers and players
//!
//! ## Quick Start Example
//!
//! ```rust,no_run
//! use fleetgate_core::{Coordinator, CoordinatorConfig, MemoryDirectory, ProxyHost};
//! use fleetgate_protocol::{MemoryBus, ServerRecord};
//! use std::sync::Arc;
//!
//! async fn run(host: Arc<dyn ProxyHost>) -> Result<(), Box<dyn std::error::Error>> {
//!     let coordinator = Coordinator::new(
//!         CoordinatorConfig::default(),
//!         host,
//!         Arc::new(MemoryBus::new()),
//!         Arc::new(MemoryDirectory::new()),
//!     );
//!     coordinator.start().await?;
//!
//!     coordinator
//!         .announce_server(ServerRecord::new("lobby-1", "10.0.0.4", 25565), None)
//!         .await?;
//!
//!     coordinator.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod cluster;
pub mod config;
pub mod coordinator;
pub mod directory;
pub mod error;
pub mod fallback;
pub mod groups;
pub mod host;
pub mod membership;
pub mod probe;
pub mod registrar;
pub mod rescue;
pub mod router;
pub mod sessions;

pub use bridge::{BridgeStats, EventBridge};
pub use cluster::ClusterView;
pub use config::{CoordinatorConfig, DEFAULT_PROBE_TIMEOUT, DEFAULT_RESCUE_POLL_INTERVAL};
pub use coordinator::{Coordinator, CoordinatorStats};
pub use directory::{parse_server_entries, MemoryDirectory, PlayerDirectory, ServerDirectory};
pub use error::{CoordinatorError, DirectoryError, HandlerError, HostError, RouteError};
pub use fallback::FallbackSelector;
pub use groups::{GroupRegistry, ServerGroup};
pub use host::{ConnectionStatus, ProxyHost};
pub use membership::MembershipStore;
pub use probe::{HealthProbe, ProbeResult};
pub use registrar::{Origin, ServerRegistrar};
pub use rescue::{KickOutcome, RescueCoordinator, RescueHandle, RescueState};
pub use router::{PlayerRouter, SendOutcome};
pub use sessions::PlayerSessions;
