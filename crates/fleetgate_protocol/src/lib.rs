//! # Fleetgate Protocol
//!
//! Shared vocabulary for every proxy instance taking part in a fleetgate
//! cluster: the typed events exchanged over the broadcast bus, the literal
//! `|:|`-delimited wire format those events travel in, and the bus
//! abstraction itself.
//!
//! ## Key Types
//!
//! - [`PlayerId`] - Unique identifier for a connected player
//! - [`ServerRecord`] - Identity and network address of a backend pod
//! - [`ServerStatus`], [`SendEvent`], [`KickEvent`] - Inbound bus events
//! - [`PlayerStatus`], [`PlayerLocationChange`] - Outbound bus events
//! - [`MessageBus`] - Publish/subscribe seam implemented by bus clients
//!
//! ## Wire Format
//!
//! Each topic has its own codec module under [`wire`]. Codecs are pure
//! functions from text to a typed value (or a [`DecodeError`]) and back, so
//! bus handlers never split strings themselves.
//!
//! ```rust
//! use fleetgate_protocol::{SendEvent, WireMessage};
//!
//! let event = SendEvent::decode("550e8400-e29b-41d4-a716-446655440000|:|lobby-1").unwrap();
//! assert_eq!(event.target_server_id, "lobby-1");
//! assert_eq!(SendEvent::TOPIC, "player_send");
//! ```

pub mod bus;
pub mod error;
pub mod types;
pub mod wire;

pub use bus::{MemoryBus, MessageBus, Subscription};
pub use error::{BusError, DecodeError};
pub use types::{
    DisplayMessage, GroupAssignment, KickEvent, PlayerId, PlayerLocation, PlayerLocationChange,
    PlayerStatus, Presence, SendEvent, ServerRecord, ServerStatus, StatusMode,
};
pub use wire::{WireMessage, SEPARATOR};
