//! tnetstring → Value decoding.
//!
//! Completeness is decided by the top-level length prefix alone: nothing is
//! parsed until the whole frame (prefix, payload and tag) is available.
//! Nested frames are bounded by their parent's declared payload, so a short
//! sub-frame inside a complete parent is a format error, never "need more".

use bytes::Bytes;

use crate::error::{Result, TnetstringError};
use crate::protocol::wire_format::{FrameHeader, Tag};
use crate::value::{Map, Value};

/// Default maximum nesting of lists and maps.
///
/// Decoding recurses once per level; this keeps the deepest accepted input
/// well inside a 2 MiB thread stack in unoptimized builds.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Outcome of a decode attempt that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<'a> {
    /// One value and the bytes following its frame.
    Complete(Value, &'a [u8]),
    /// The buffer holds only part of a frame.
    Incomplete,
}

impl<'a> Decoded<'a> {
    #[inline]
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Decoded::Incomplete)
    }

    /// The decoded value and the rest of the input, if complete.
    #[inline]
    pub fn complete(self) -> Option<(Value, &'a [u8])> {
        match self {
            Decoded::Complete(value, rest) => Some((value, rest)),
            Decoded::Incomplete => None,
        }
    }
}

/// Decoder with resource limits.
#[derive(Debug, Clone, Copy)]
pub struct Decoder {
    max_frame_length: Option<usize>,
    max_depth: usize,
}

impl Default for Decoder {
    fn default() -> Self {
        Self {
            max_frame_length: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject frames whose declared payload exceeds `max` bytes.
    pub fn with_max_frame_length(mut self, max: Option<usize>) -> Self {
        self.max_frame_length = max;
        self
    }

    /// Reject lists and maps nested deeper than `depth`.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Peek at the next frame in `buf` without parsing its payload.
    ///
    /// Returns the frame header once the whole frame is buffered, `None`
    /// while bytes are still missing.
    pub fn frame_header(&self, buf: &[u8]) -> Result<Option<FrameHeader>> {
        let Some(header) = FrameHeader::parse(buf)? else {
            if let (Some(max), Some(pending)) =
                (self.max_frame_length, FrameHeader::pending_length(buf)?)
            {
                if pending > max {
                    return Err(TnetstringError::Format(format!(
                        "Payload size of at least {pending} exceeds maximum {max}"
                    )));
                }
            }
            return Ok(None);
        };
        header.validate(self.max_frame_length)?;
        if buf.len() < header.frame_len() {
            return Ok(None);
        }
        Ok(Some(header))
    }

    /// Decode the first value in `data`.
    pub fn decode<'a>(&self, data: &'a [u8]) -> Result<Decoded<'a>> {
        let Some(header) = self.frame_header(data)? else {
            return Ok(Decoded::Incomplete);
        };
        let value = self.decode_frame(data, &header, 0)?;
        Ok(Decoded::Complete(value, &data[header.frame_len()..]))
    }

    fn decode_frame(&self, frame: &[u8], header: &FrameHeader, depth: usize) -> Result<Value> {
        let payload = &frame[header.payload_start()..header.tag_offset()];

        match Tag::from_byte(frame[header.tag_offset()])? {
            Tag::Null => {
                if !payload.is_empty() {
                    return Err(TnetstringError::format("Null with non-empty payload"));
                }
                Ok(Value::Null)
            }
            Tag::Bool => match payload {
                b"true" => Ok(Value::Bool(true)),
                b"false" => Ok(Value::Bool(false)),
                other => Err(TnetstringError::Format(format!(
                    "Invalid boolean value {:?}",
                    String::from_utf8_lossy(other)
                ))),
            },
            Tag::Integer => parse_number::<i64>(payload, "integer").map(Value::Integer),
            Tag::Float => parse_number::<f64>(payload, "float").map(Value::Float),
            Tag::Bytes => Ok(Value::Bytes(Bytes::copy_from_slice(payload))),
            Tag::List => {
                let mut items = Vec::new();
                let mut rest = payload;
                while !rest.is_empty() {
                    let (item, tail) = self.decode_nested(rest, depth + 1)?;
                    items.push(item);
                    rest = tail;
                }
                Ok(Value::List(items))
            }
            Tag::Map => {
                let mut map = Map::new();
                let mut rest = payload;
                while !rest.is_empty() {
                    let (key, tail) = self.decode_nested(rest, depth + 1)?;
                    if tail.is_empty() {
                        return Err(TnetstringError::format("Unbalanced map"));
                    }
                    let (value, tail) = self.decode_nested(tail, depth + 1)?;
                    map.insert(key, value);
                    rest = tail;
                }
                Ok(Value::Map(map))
            }
        }
    }

    /// Decode one sub-frame from a collection payload.
    fn decode_nested<'a>(&self, data: &'a [u8], depth: usize) -> Result<(Value, &'a [u8])> {
        if depth > self.max_depth {
            return Err(TnetstringError::Format(format!(
                "Nesting exceeds maximum depth {}",
                self.max_depth
            )));
        }
        let header = self
            .frame_header(data)?
            .ok_or_else(|| TnetstringError::format("Truncated element in collection payload"))?;
        let value = self.decode_frame(data, &header, depth)?;
        Ok((value, &data[header.frame_len()..]))
    }
}

fn parse_number<T: std::str::FromStr>(payload: &[u8], kind: &str) -> Result<T> {
    std::str::from_utf8(payload)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            TnetstringError::Format(format!(
                "Invalid {kind} value {:?}",
                String::from_utf8_lossy(payload)
            ))
        })
}

/// Decode the first value in `data` with default limits.
///
/// # Example
///
/// ```
/// use tnetstring::codec::{decode, Decoded};
/// use tnetstring::Value;
///
/// let decoded = decode(b"0:~1:5#").unwrap();
/// assert_eq!(decoded, Decoded::Complete(Value::Null, &b"1:5#"[..]));
///
/// assert!(decode(b"5:hel").unwrap().is_incomplete());
/// ```
pub fn decode(data: &[u8]) -> Result<Decoded<'_>> {
    Decoder::default().decode(data)
}
