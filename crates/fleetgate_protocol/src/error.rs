//! Error types shared by the codecs and bus clients.

use thiserror::Error;

/// A bus payload that could not be turned into a typed event.
///
/// Decode errors are always local to one message: the subscriber logs them,
/// drops the payload and keeps receiving.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The payload did not split into the number of fields the topic requires
    #[error("{topic}: expected {expected} fields, found {found}")]
    FieldCount {
        topic: &'static str,
        expected: &'static str,
        found: usize,
    },
    /// A field that must carry an identifier was empty
    #[error("{topic}: field '{field}' is empty")]
    EmptyField {
        topic: &'static str,
        field: &'static str,
    },
    /// The player field was not a valid UUID
    #[error("{topic}: invalid player id '{value}'")]
    InvalidPlayerId { topic: &'static str, value: String },
    /// The port field was not a valid u16
    #[error("{topic}: invalid port '{value}'")]
    InvalidPort { topic: &'static str, value: String },
    /// A flag field was neither "true" nor "false"
    #[error("{topic}: invalid boolean '{value}' for '{field}'")]
    InvalidBool {
        topic: &'static str,
        field: &'static str,
        value: String,
    },
    /// An enumerated field carried a value outside its known set
    #[error("{topic}: unknown {field} '{value}'")]
    UnknownVariant {
        topic: &'static str,
        field: &'static str,
        value: String,
    },
}

/// Failures reported by a [`crate::MessageBus`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// The bus connection has been shut down
    #[error("bus is closed")]
    Closed,
    /// Publishing a payload failed
    #[error("publish to '{topic}' failed: {reason}")]
    Publish { topic: String, reason: String },
    /// Subscribing to a topic failed
    #[error("subscribe to '{topic}' failed: {reason}")]
    Subscribe { topic: String, reason: String },
}
