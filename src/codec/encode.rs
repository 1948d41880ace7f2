//! Value → tnetstring encoding.

use std::fmt::Write;

use bytes::{BufMut, Bytes, BytesMut};

use super::text::TextConfig;
use crate::error::{Result, TnetstringError};
use crate::protocol::wire_format::{self, Tag};
use crate::value::Value;

/// Reusable encoder holding the text configuration.
///
/// `text: None` rejects [`Value::Text`] so callers can force byte-string-only
/// input.
#[derive(Debug, Clone, Copy)]
pub struct Encoder {
    text: Option<TextConfig>,
}

impl Encoder {
    pub fn new(text: Option<TextConfig>) -> Self {
        Self { text }
    }

    /// Encoder that refuses text values.
    pub fn bytes_only() -> Self {
        Self { text: None }
    }

    #[inline]
    pub fn text_config(&self) -> Option<&TextConfig> {
        self.text.as_ref()
    }

    /// Encode `value` into a new buffer.
    pub fn encode(&self, value: &Value) -> Result<Bytes> {
        let mut out = BytesMut::new();
        self.encode_into(value, &mut out)?;
        Ok(out.freeze())
    }

    /// Append the encoding of `value` to `out`.
    ///
    /// On error `out` is left exactly as it was.
    pub fn encode_into(&self, value: &Value, out: &mut BytesMut) -> Result<()> {
        let mark = out.len();
        let result = self.write_frame(value, out);
        if result.is_err() {
            out.truncate(mark);
        }
        result
    }

    fn write_frame(&self, value: &Value, out: &mut BytesMut) -> Result<()> {
        match value {
            Value::Null => out.put_slice(wire_format::NULL),
            Value::Bool(true) => out.put_slice(wire_format::TRUE),
            Value::Bool(false) => out.put_slice(wire_format::FALSE),
            Value::Integer(n) => put_frame(out, Tag::Integer, n.to_string().as_bytes()),
            Value::Float(f) => put_frame(out, Tag::Float, format!("{f:?}").as_bytes()),
            Value::Bytes(b) => put_frame(out, Tag::Bytes, b),
            Value::Text(s) => {
                let config = self.text.as_ref().ok_or_else(|| {
                    TnetstringError::Unsupported(
                        "cannot encode text without a text encoding".to_string(),
                    )
                })?;
                put_frame(out, Tag::Bytes, &config.encode(s)?);
            }
            Value::List(items) => {
                let mut payload = BytesMut::new();
                for item in items {
                    self.write_frame(item, &mut payload)?;
                }
                put_frame(out, Tag::List, &payload);
            }
            Value::Map(map) => {
                let mut payload = BytesMut::new();
                for (k, v) in map {
                    self.write_frame(k, &mut payload)?;
                    self.write_frame(v, &mut payload)?;
                }
                put_frame(out, Tag::Map, &payload);
            }
        }
        Ok(())
    }
}

/// Write `<len>:<payload><tag>`.
fn put_frame(out: &mut BytesMut, tag: Tag, payload: &[u8]) {
    // up to 20 prefix digits, ':' and the tag
    out.reserve(payload.len() + 22);
    // fmt::Write for BytesMut cannot fail
    let _ = write!(out, "{}", payload.len());
    out.put_u8(wire_format::SEPARATOR);
    out.put_slice(payload);
    out.put_u8(tag.as_byte());
}

/// Encode `value`, converting text as UTF-8 with the strict policy.
///
/// # Example
///
/// ```
/// use tnetstring::{codec, Value};
///
/// let msg: Value = [(b"message", b"hi")].into_iter().collect();
/// assert_eq!(&codec::encode(&msg).unwrap()[..], b"19:7:message,2:hi,}");
/// ```
pub fn encode(value: &Value) -> Result<Bytes> {
    Encoder::new(Some(TextConfig::default())).encode(value)
}

/// Encode `value` with an explicit text configuration (`None` rejects text).
pub fn encode_with(value: &Value, text: Option<&TextConfig>) -> Result<Bytes> {
    Encoder::new(text.copied()).encode(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::text::{EncodingErrors, TextEncoding};
    use crate::value::Map;

    fn enc(value: impl Into<Value>) -> Vec<u8> {
        encode(&value.into()).unwrap().to_vec()
    }

    #[test]
    fn test_scalar_literals() {
        assert_eq!(enc(Value::Null), b"0:~");
        assert_eq!(enc(true), b"4:true!");
        assert_eq!(enc(false), b"5:false!");
    }

    #[test]
    fn test_integers() {
        assert_eq!(enc(0), b"1:0#");
        assert_eq!(enc(42), b"2:42#");
        assert_eq!(enc(-7), b"2:-7#");
        assert_eq!(enc(i64::MIN), b"20:-9223372036854775808#");
    }

    #[test]
    fn test_floats() {
        assert_eq!(enc(1.0), b"3:1.0^");
        assert_eq!(enc(-0.5), b"4:-0.5^");
        assert_eq!(enc(0.1), b"3:0.1^");
        assert_eq!(enc(1e300), b"5:1e300^");
    }

    #[test]
    fn test_bytes_and_text() {
        assert_eq!(enc(b"hello"), b"5:hello,");
        assert_eq!(enc(b""), b"0:,");
        assert_eq!(enc("hello"), b"5:hello,");
        assert_eq!(enc("é"), b"2:\xc3\xa9,");
    }

    #[test]
    fn test_collections() {
        assert_eq!(enc(Value::List(vec![])), b"0:]");
        assert_eq!(enc(Value::Map(Map::new())), b"0:}");
        assert_eq!(
            enc(vec![Value::from(1), Value::from(b"a"), Value::Null]),
            b"11:1:1#1:a,0:~]"
        );

        let msg: Value = [(b"message", b"hi")].into_iter().collect();
        assert_eq!(enc(msg), b"19:7:message,2:hi,}");
    }

    #[test]
    fn test_map_keeps_insertion_order() {
        let map: Value = [(b"b", 1), (b"a", 2)].into_iter().collect();
        assert_eq!(enc(map), b"16:1:b,1:1#1:a,1:2#}");
    }

    #[test]
    fn test_non_bytes_keys_are_encoded() {
        let map: Value = [(Value::Integer(1), Value::Null)].into_iter().collect();
        assert_eq!(enc(map), b"7:1:1#0:~}");
    }

    #[test]
    fn test_text_without_encoding_is_unsupported() {
        let err = encode_with(&Value::from("hello"), None).unwrap_err();
        assert!(matches!(err, TnetstringError::Unsupported(_)));
        assert!(err.to_string().contains("text encoding"));

        // bytes are still fine
        assert_eq!(
            &encode_with(&Value::from(b"hello"), None).unwrap()[..],
            b"5:hello,"
        );
    }

    #[test]
    fn test_nested_text_error_leaves_buffer_untouched() {
        let encoder = Encoder::new(Some(TextConfig::new(
            TextEncoding::Ascii,
            EncodingErrors::Strict,
        )));
        let mut out = BytesMut::from(&b"1:a,"[..]);

        let value = Value::List(vec![Value::from("ok"), Value::from("naïve")]);
        let err = encoder.encode_into(&value, &mut out).unwrap_err();

        assert!(matches!(err, TnetstringError::TextEncode { .. }));
        assert_eq!(&out[..], b"1:a,");
    }

    #[test]
    fn test_encode_into_appends() {
        let encoder = Encoder::bytes_only();
        let mut out = BytesMut::new();
        encoder.encode_into(&Value::Null, &mut out).unwrap();
        encoder.encode_into(&Value::Integer(5), &mut out).unwrap();
        assert_eq!(&out[..], b"0:~1:5#");
        assert!(encoder.text_config().is_none());
    }
}
