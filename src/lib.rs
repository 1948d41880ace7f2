//! # tnetstring
//!
//! Codec for the tnetstring ("tagged netstring") serialization format, with a
//! sans-I/O connection that turns arbitrarily chunked network bytes into
//! discrete decoded values.
//!
//! ## Architecture
//!
//! - **Codec** ([`codec`]): pure `encode`/`decode` between [`Value`] and bytes
//! - **Connection** ([`protocol::Connection`]): outbound queue + inbound buffer,
//!   no I/O of its own; the caller owns the transport
//!
//! ## Wire format
//!
//! ```text
//! frame := length ":" payload tag
//! tag   := ~ (null) | # (integer) | ^ (float) | ! (bool)
//!        | , (bytes) | } (map) | ] (list)
//! ```
//!
//! ## Example
//!
//! ```
//! use tnetstring::{Connection, Event, Value};
//!
//! let mut conn = Connection::new();
//! conn.send(&Value::from_iter([(b"message", b"hi")])).unwrap();
//!
//! let wire = conn.data_to_send();
//! assert_eq!(&wire[..], b"19:7:message,2:hi,}");
//!
//! conn.receive(&wire).unwrap();
//! match conn.next_event().unwrap() {
//!     Event::Value(v) => assert_eq!(v.get(b"message").unwrap().as_bytes(), Some(&b"hi"[..])),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

pub mod codec;
pub mod error;
pub mod protocol;
pub mod value;

pub use codec::{decode, encode, Decoded};
pub use error::{Result, TnetstringError};
pub use protocol::{Connection, ConnectionConfig, Event};
pub use value::{Map, Value};
