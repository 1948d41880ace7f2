//! Protocol module - wire format and the incremental connection.
//!
//! This module implements the stream side of tnetstrings:
//! - Type tags, fixed literals and length-prefix parsing
//! - Connection buffering chunked reads into complete values

mod connection;
pub mod wire_format;

pub use connection::{
    Connection, ConnectionConfig, Event, Events, DEFAULT_INITIAL_CAPACITY,
};
pub use wire_format::{tags, FrameHeader, Tag, FALSE, NULL, SEPARATOR, TRUE};
