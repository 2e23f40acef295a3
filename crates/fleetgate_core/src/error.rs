//! Error types for the coordination core.
//!
//! The split mirrors how failures are treated at runtime:
//!
//! * [`HostError`] - a call into the proxy host failed (connect, ping)
//! * [`RouteError`] - a player could not be moved even after the retry
//! * [`DirectoryError`] - the shared server directory was unavailable
//! * [`HandlerError`] - anything a bus handler can fail with; always stops at
//!   the subscription loop boundary
//! * [`CoordinatorError`] - startup failures

use fleetgate_protocol::{BusError, DecodeError, PlayerId};
use thiserror::Error;

/// Failures reported by the proxy host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("player {0} is not connected")]
    PlayerOffline(PlayerId),
    #[error("connection to '{server}' failed: {reason}")]
    Connect { server: String, reason: String },
    #[error("ping to '{server}' failed: {reason}")]
    Ping { server: String, reason: String },
}

/// A send request that exhausted its attempts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("sending {player} to '{server}' failed after {attempts} attempts: {last_failure}")]
    ConnectFailed {
        player: PlayerId,
        server: String,
        attempts: u32,
        last_failure: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("server directory unavailable: {0}")]
    Unavailable(String),
}

/// Everything a bus handler may fail with.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error(transparent)]
    Bus(#[from] BusError),
    #[error("handler panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("bus error: {0}")]
    Bus(#[from] BusError),
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),
    #[error("coordinator already started")]
    AlreadyStarted,
}
