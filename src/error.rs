//! Error types for tnetstring.

use std::ascii::{escape_default, EscapeDefault};

use thiserror::Error;

/// Main error type for all tnetstring operations.
///
/// "Not enough data yet" and "peer closed" are not errors; they are reported
/// through [`Decoded`](crate::codec::Decoded) and [`Event`](crate::protocol::Event).
#[derive(Debug, Error)]
pub enum TnetstringError {
    /// The value cannot be represented with the current configuration.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Strict text encoding hit a character the encoding cannot represent.
    #[error("Cannot encode {character:?} at position {position} with {encoding}")]
    TextEncode {
        encoding: &'static str,
        character: char,
        position: usize,
    },

    /// Malformed frame (bad length prefix, bad scalar payload, unbalanced map).
    #[error("Format error: {0}")]
    Format(String),

    /// The type tag byte is not one of `~ # ^ ! , } ]`.
    #[error("Unknown type tag '{}'", escaped(.0))]
    UnknownTag(u8),

    /// Non-empty data arrived after the peer signalled end of stream.
    #[error("Received close, then received more data")]
    ClosedConnection,
}

fn escaped(byte: &u8) -> EscapeDefault {
    escape_default(*byte)
}

impl TnetstringError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        TnetstringError::Format(msg.into())
    }
}

/// Result type alias using TnetstringError.
pub type Result<T> = std::result::Result<T, TnetstringError>;
