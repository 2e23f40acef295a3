//! # Fleetgate Redis
//!
//! Redis backend for a fleetgate cluster. Every proxy instance points at the
//! same Redis server:
//!
//! - [`RedisBus`] carries the bus topics over Redis pub/sub
//! - [`RedisDirectory`] keeps the online server and player sets
//!
//! ```rust,no_run
//! use fleetgate_core::{Coordinator, CoordinatorConfig, ProxyHost};
//! use fleetgate_redis::{RedisBus, RedisDirectory};
//! use std::sync::Arc;
//!
//! async fn run(host: Arc<dyn ProxyHost>) -> Result<(), Box<dyn std::error::Error>> {
//!     let url = "redis://127.0.0.1:6379";
//!     let coordinator = Coordinator::new(
//!         CoordinatorConfig::default(),
//!         host,
//!         Arc::new(RedisBus::connect(url).await?),
//!         Arc::new(RedisDirectory::connect(url).await?),
//!     );
//!     coordinator.start().await?;
//!     Ok(())
//! }
//! ```

pub mod bus;
pub mod directory;
pub mod keys;

pub use bus::RedisBus;
pub use directory::RedisDirectory;
pub use keys::{ONLINE_PLAYER_IDS_KEY, ONLINE_PLAYER_NAMES_KEY, ONLINE_SERVERS_KEY};
