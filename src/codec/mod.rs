//! Codec module - tnetstring encoding and decoding.
//!
//! - [`encode`] / [`Encoder`] - [`Value`](crate::Value) to wire bytes
//! - [`decode`] / [`Decoder`] - wire bytes to a value plus the unconsumed rest
//! - [`TextConfig`] - how [`Value::Text`](crate::Value::Text) becomes bytes
//!
//! # Design
//!
//! Both directions are pure functions over byte slices. Decoding reports a
//! partial frame as [`Decoded::Incomplete`] rather than an error, so callers
//! buffering network reads can tell "wait" apart from "malformed".
//!
//! # Example
//!
//! ```
//! use tnetstring::codec::{decode, encode};
//! use tnetstring::Value;
//!
//! let value = Value::List(vec![Value::Integer(1), Value::from(b"two")]);
//! let wire = encode(&value).unwrap();
//! assert_eq!(&wire[..], b"10:1:1#3:two,]");
//!
//! let (decoded, rest) = decode(&wire).unwrap().complete().unwrap();
//! assert_eq!(decoded, value);
//! assert!(rest.is_empty());
//! ```

mod decode;
mod encode;
mod text;

pub use decode::{decode, Decoded, Decoder, DEFAULT_MAX_DEPTH};
pub use encode::{encode, encode_with, Encoder};
pub use text::{EncodingErrors, TextConfig, TextEncoding};
