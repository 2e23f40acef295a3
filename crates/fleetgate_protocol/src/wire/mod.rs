//! Literal bus wire format.
//!
//! Every payload is a fixed number of text fields joined by [`SEPARATOR`].
//! Each topic owns one codec module; [`WireMessage`] ties a topic name to its
//! typed event so the dispatcher can decode generically.

pub mod player_kick;
pub mod player_location;
pub mod player_send;
pub mod player_status;
pub mod server_status;

use crate::error::DecodeError;
use crate::types::PlayerId;

/// Field separator used by every topic.
pub const SEPARATOR: &str = "|:|";

/// A typed event bound to exactly one bus topic.
pub trait WireMessage: Sized + Send + Sync + std::fmt::Debug + 'static {
    /// Topic this message travels on
    const TOPIC: &'static str;

    /// Serializes the event into its literal wire form.
    fn encode(&self) -> String;

    /// Parses a wire payload, rejecting anything malformed.
    fn decode(payload: &str) -> Result<Self, DecodeError>;
}

/// Splits a payload and checks the field count against the allowed counts.
pub(crate) fn split_fields<'a>(
    topic: &'static str,
    payload: &'a str,
    allowed: &[usize],
    expected: &'static str,
) -> Result<Vec<&'a str>, DecodeError> {
    let fields: Vec<&str> = payload.split(SEPARATOR).collect();
    if !allowed.contains(&fields.len()) {
        return Err(DecodeError::FieldCount {
            topic,
            expected,
            found: fields.len(),
        });
    }
    Ok(fields)
}

pub(crate) fn join_fields(fields: &[&str]) -> String {
    fields.join(SEPARATOR)
}

pub(crate) fn parse_player_id(topic: &'static str, value: &str) -> Result<PlayerId, DecodeError> {
    value.parse().map_err(|_| DecodeError::InvalidPlayerId {
        topic,
        value: value.to_string(),
    })
}

pub(crate) fn parse_bool(
    topic: &'static str,
    field: &'static str,
    value: &str,
) -> Result<bool, DecodeError> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(DecodeError::InvalidBool {
            topic,
            field,
            value: value.to_string(),
        })
    }
}

pub(crate) fn require_non_empty<'a>(
    topic: &'static str,
    field: &'static str,
    value: &'a str,
) -> Result<&'a str, DecodeError> {
    if value.is_empty() {
        Err(DecodeError::EmptyField { topic, field })
    } else {
        Ok(value)
    }
}
