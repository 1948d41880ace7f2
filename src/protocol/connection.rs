//! Incremental connection for chunked byte streams.
//!
//! Uses `bytes::BytesMut` for the inbound buffer and performs no I/O: the
//! caller moves bytes between the connection and its transport.
//!
//! - [`Connection::send`] encodes a value onto the outbound queue
//! - [`Connection::data_to_send`] drains the queue for the transport
//! - [`Connection::receive`] feeds bytes read from the transport (empty = EOF)
//! - [`Connection::next_event`] extracts one value, or reports why it can't
//!
//! # Example
//!
//! ```
//! use tnetstring::protocol::{Connection, Event};
//! use tnetstring::Value;
//!
//! let mut client = Connection::new();
//! let mut server = Connection::new();
//!
//! client.send(&Value::from("ping")).unwrap();
//! let wire = client.data_to_send();
//!
//! // Bytes arrive in arbitrary chunks
//! let (head, tail) = wire.split_at(3);
//! server.receive(head).unwrap();
//! assert_eq!(server.next_event().unwrap(), Event::NeedMoreData);
//!
//! server.receive(tail).unwrap();
//! assert_eq!(server.next_event().unwrap(), Event::Value(Value::from(b"ping")));
//! ```

use bytes::{Bytes, BytesMut};

use crate::codec::{Decoded, Decoder, Encoder, TextConfig, DEFAULT_MAX_DEPTH};
use crate::error::{Result, TnetstringError};
use crate::value::Value;

/// Default inbound buffer pre-allocation (8 KiB).
pub const DEFAULT_INITIAL_CAPACITY: usize = 8 * 1024;

/// Configuration for a [`Connection`].
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Text conversion for [`Value::Text`]; `None` rejects text values.
    pub text: Option<TextConfig>,
    /// Largest declared payload accepted from the peer; `None` is unlimited.
    pub max_frame_length: Option<usize>,
    /// Deepest list/map nesting accepted from the peer.
    pub max_depth: usize,
    /// Inbound buffer pre-allocation.
    pub initial_capacity: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            text: Some(TextConfig::default()),
            max_frame_length: None,
            max_depth: DEFAULT_MAX_DEPTH,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }
}

impl ConnectionConfig {
    pub fn text(mut self, text: Option<TextConfig>) -> Self {
        self.text = text;
        self
    }

    pub fn max_frame_length(mut self, max: Option<usize>) -> Self {
        self.max_frame_length = max;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}

/// Result of [`Connection::next_event`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A complete value was decoded and removed from the buffer.
    Value(Value),
    /// The buffer holds a partial frame (or nothing); call again after `receive`.
    NeedMoreData,
    /// The peer closed the stream; no further frame can complete.
    StreamClosed,
}

/// Sans-I/O tnetstring connection.
///
/// Outbound and inbound buffers are independent: sending never touches
/// received data and vice versa.
#[derive(Debug)]
pub struct Connection {
    config: ConnectionConfig,
    encoder: Encoder,
    decoder: Decoder,
    /// Encoded values awaiting `data_to_send`.
    outbound: Vec<Bytes>,
    /// Received bytes not yet decoded.
    inbound: BytesMut,
    /// Set once by an empty `receive`.
    peer_closed: bool,
}

impl Connection {
    /// Create a connection encoding text as strict UTF-8.
    pub fn new() -> Self {
        Self::with_config(ConnectionConfig::default())
    }

    /// Create a connection with custom settings.
    pub fn with_config(config: ConnectionConfig) -> Self {
        Self {
            encoder: Encoder::new(config.text),
            decoder: Decoder::new()
                .with_max_frame_length(config.max_frame_length)
                .with_max_depth(config.max_depth),
            outbound: Vec::new(),
            inbound: BytesMut::with_capacity(config.initial_capacity),
            peer_closed: false,
            config,
        }
    }

    /// Create a connection that only accepts byte strings, never text.
    pub fn bytes_only() -> Self {
        Self::with_config(ConnectionConfig::default().text(None))
    }

    #[inline]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Encode `value` and queue it for sending.
    ///
    /// # Errors
    ///
    /// Returns the encode error; nothing is queued in that case.
    pub fn send(&mut self, value: &Value) -> Result<()> {
        let data = self.encoder.encode(value)?;
        tracing::trace!(len = data.len(), kind = value.type_name(), "queued value");
        self.outbound.push(data);
        Ok(())
    }

    /// Take every queued byte, leaving the queue empty.
    pub fn data_to_send(&mut self) -> Bytes {
        match self.outbound.len() {
            0 => Bytes::new(),
            1 => self.outbound.pop().unwrap_or_default(),
            _ => {
                let total = self.outbound.iter().map(Bytes::len).sum();
                let mut out = BytesMut::with_capacity(total);
                for chunk in self.outbound.drain(..) {
                    out.extend_from_slice(&chunk);
                }
                out.freeze()
            }
        }
    }

    /// Number of bytes queued for sending.
    pub fn pending_send_len(&self) -> usize {
        self.outbound.iter().map(Bytes::len).sum()
    }

    /// Feed bytes read from the transport. An empty slice signals end of stream.
    ///
    /// Content is not validated here; see [`next_event`](Self::next_event).
    ///
    /// # Errors
    ///
    /// Returns [`TnetstringError::ClosedConnection`] if non-empty data arrives
    /// after end of stream.
    pub fn receive(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            if !self.peer_closed {
                tracing::debug!(buffered = self.inbound.len(), "peer closed stream");
            }
            self.peer_closed = true;
            return Ok(());
        }
        if self.peer_closed {
            tracing::warn!(len = data.len(), "data received after close");
            return Err(TnetstringError::ClosedConnection);
        }
        self.inbound.extend_from_slice(data);
        tracing::trace!(
            len = data.len(),
            buffered = self.inbound.len(),
            "received data"
        );
        Ok(())
    }

    /// Try to extract the next value from the received bytes.
    ///
    /// Returns:
    /// - `Ok(Event::Value(v))` and drops the frame from the buffer
    /// - `Ok(Event::NeedMoreData)` if the frame is not complete yet
    /// - `Ok(Event::StreamClosed)` if it never will be
    /// - `Err(...)` for malformed data; the buffer is left untouched
    pub fn next_event(&mut self) -> Result<Event> {
        let (value, consumed) = match self.decoder.decode(&self.inbound) {
            Ok(Decoded::Complete(value, rest)) => (value, self.inbound.len() - rest.len()),
            Ok(Decoded::Incomplete) if self.peer_closed => return Ok(Event::StreamClosed),
            Ok(Decoded::Incomplete) => return Ok(Event::NeedMoreData),
            Err(e) => {
                tracing::warn!(buffered = self.inbound.len(), "decode failed: {}", e);
                return Err(e);
            }
        };

        let _ = self.inbound.split_to(consumed);
        Ok(Event::Value(value))
    }

    /// Iterate over every value currently decodable.
    ///
    /// The iterator ends at the first `NeedMoreData` or `StreamClosed`. An
    /// error is yielded once and ends the iteration. Call again after the
    /// next `receive` to pick up newly completed frames.
    pub fn events(&mut self) -> Events<'_> {
        Events {
            conn: self,
            done: false,
        }
    }

    /// Buffered bytes not yet decoded, and whether the peer has closed.
    pub fn trailing_data(&self) -> (&[u8], bool) {
        (&self.inbound[..], self.peer_closed)
    }

    /// Whether the peer has signalled end of stream.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.peer_closed
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator returned by [`Connection::events`].
pub struct Events<'a> {
    conn: &'a mut Connection,
    done: bool,
}

impl Iterator for Events<'_> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.conn.next_event() {
            Ok(Event::Value(value)) => Some(Ok(value)),
            Ok(Event::NeedMoreData | Event::StreamClosed) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for Events<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{EncodingErrors, TextEncoding};

    fn encoded(value: &Value) -> Bytes {
        crate::codec::encode(value).unwrap()
    }

    #[test]
    fn test_fresh_connection() {
        let mut conn = Connection::new();
        assert_eq!(conn.trailing_data(), (&b""[..], false));
        assert_eq!(conn.next_event().unwrap(), Event::NeedMoreData);
        assert_eq!(conn.trailing_data(), (&b""[..], false));
        assert!(conn.data_to_send().is_empty());
    }

    #[test]
    fn test_send_then_receive_round_trip() {
        let mut conn = Connection::new();
        let value = Value::List(vec![Value::from("text"), Value::from(3)]);

        conn.send(&value).unwrap();
        assert_eq!(conn.trailing_data(), (&b""[..], false));
        let data = conn.data_to_send();

        conn.receive(&data).unwrap();
        assert_eq!(conn.trailing_data(), (&data[..], false));

        let expected = Value::List(vec![Value::from(b"text"), Value::from(3)]);
        assert_eq!(conn.next_event().unwrap(), Event::Value(expected));
        assert_eq!(conn.trailing_data(), (&b""[..], false));
        assert_eq!(conn.next_event().unwrap(), Event::NeedMoreData);
    }

    #[test]
    fn test_data_to_send_concatenates_and_clears() {
        let mut conn = Connection::new();
        conn.send(&Value::Null).unwrap();
        conn.send(&Value::Bool(true)).unwrap();
        conn.send(&Value::from(b"x")).unwrap();
        assert_eq!(conn.pending_send_len(), 3 + 7 + 4);

        assert_eq!(&conn.data_to_send()[..], b"0:~4:true!1:x,");
        assert!(conn.data_to_send().is_empty());
        assert_eq!(conn.pending_send_len(), 0);
    }

    #[test]
    fn test_single_chunk_drain() {
        let mut conn = Connection::new();
        conn.send(&Value::Integer(12)).unwrap();
        assert_eq!(&conn.data_to_send()[..], b"2:12#");
        assert!(conn.data_to_send().is_empty());
    }

    #[test]
    fn test_failed_send_queues_nothing() {
        let mut conn = Connection::bytes_only();
        conn.send(&Value::from(b"ok")).unwrap();

        let err = conn.send(&Value::from("text")).unwrap_err();
        assert!(matches!(err, TnetstringError::Unsupported(_)));
        assert_eq!(&conn.data_to_send()[..], b"2:ok,");
    }

    #[test]
    fn test_custom_text_encoding() {
        let config = ConnectionConfig::default().text(Some(TextConfig::new(
            TextEncoding::Latin1,
            EncodingErrors::Replace,
        )));
        let mut conn = Connection::with_config(config);
        conn.send(&Value::from("né☃")).unwrap();
        assert_eq!(&conn.data_to_send()[..], b"3:n\xe9?,");
    }

    #[test]
    fn test_byte_at_a_time() {
        let value: Value = [(b"message", b"hi")].into_iter().collect();
        let data = encoded(&value);
        let mut conn = Connection::new();

        for (i, byte) in data.iter().enumerate() {
            assert_eq!(conn.next_event().unwrap(), Event::NeedMoreData);
            conn.receive(&[*byte]).unwrap();
            assert_eq!(conn.trailing_data().0, &data[..=i]);
        }
        assert_eq!(conn.next_event().unwrap(), Event::Value(value));
        assert_eq!(conn.trailing_data(), (&b""[..], false));
    }

    #[test]
    fn test_multiple_values_in_one_receive() {
        let mut conn = Connection::new();
        conn.receive(b"0:~1:1#2:ab,4:1:").unwrap();

        let values: Vec<Value> = conn.events().collect::<Result<_>>().unwrap();
        assert_eq!(
            values,
            vec![Value::Null, Value::Integer(1), Value::from(b"ab")]
        );
        assert_eq!(conn.trailing_data().0, b"4:1:");

        // restartable once more data arrives
        conn.receive(b"x,]").unwrap();
        let values: Vec<Value> = conn.events().collect::<Result<_>>().unwrap();
        assert_eq!(values, vec![Value::List(vec![Value::from(b"x")])]);
        assert_eq!(conn.events().count(), 0);
    }

    #[test]
    fn test_close_signal() {
        let mut conn = Connection::new();
        conn.receive(b"").unwrap();
        assert!(conn.is_closed());
        assert_eq!(conn.trailing_data(), (&b""[..], true));
        assert_eq!(conn.next_event().unwrap(), Event::StreamClosed);

        // repeated close is harmless
        conn.receive(b"").unwrap();

        let err = conn.receive(b"Hello, world!").unwrap_err();
        assert!(matches!(err, TnetstringError::ClosedConnection));
        assert_eq!(conn.trailing_data(), (&b""[..], true));
    }

    #[test]
    fn test_close_with_partial_frame() {
        let mut conn = Connection::new();
        conn.receive(b"5:hel").unwrap();
        assert_eq!(conn.next_event().unwrap(), Event::NeedMoreData);

        conn.receive(b"").unwrap();
        assert_eq!(conn.next_event().unwrap(), Event::StreamClosed);
        assert_eq!(conn.trailing_data(), (&b"5:hel"[..], true));
    }

    #[test]
    fn test_buffered_values_survive_close() {
        let mut conn = Connection::new();
        conn.receive(b"1:a,1:b,").unwrap();
        conn.receive(b"").unwrap();
        assert!(conn.receive(b"1:c,").is_err());

        assert_eq!(conn.next_event().unwrap(), Event::Value(Value::from(b"a")));
        assert_eq!(conn.next_event().unwrap(), Event::Value(Value::from(b"b")));
        assert_eq!(conn.next_event().unwrap(), Event::StreamClosed);
    }

    #[test]
    fn test_decode_error_leaves_buffer_intact() {
        let mut conn = Connection::new();
        conn.receive(b"4:data#").unwrap();

        let err = conn.next_event().unwrap_err();
        assert!(matches!(err, TnetstringError::Format(_)));
        assert_eq!(conn.trailing_data(), (&b"4:data#"[..], false));

        // same error on retry, nothing consumed
        assert!(conn.next_event().is_err());
        assert_eq!(conn.trailing_data().0, b"4:data#");
    }

    #[test]
    fn test_events_stop_after_error() {
        let mut conn = Connection::new();
        conn.receive(b"1:a,1:a@1:b,").unwrap();

        let mut events = conn.events();
        assert_eq!(events.next().unwrap().unwrap(), Value::from(b"a"));
        assert!(matches!(
            events.next(),
            Some(Err(TnetstringError::UnknownTag(b'@')))
        ));
        assert!(events.next().is_none());
        assert_eq!(conn.trailing_data().0, b"1:a@1:b,");
    }

    #[test]
    fn test_max_frame_length_from_config() {
        let config = ConnectionConfig::default().max_frame_length(Some(8));
        let mut conn = Connection::with_config(config);
        conn.receive(b"100:").unwrap();

        let err = conn.next_event().unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
        assert_eq!(conn.config().max_frame_length, Some(8));
    }

    #[test]
    fn test_max_frame_length_checked_while_prefix_arrives() {
        let config = ConnectionConfig::default().max_frame_length(Some(16));
        let mut conn = Connection::with_config(config);
        conn.receive(&[b'9'; 4096]).unwrap();

        let err = conn.next_event().unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_garbage_prefix_is_rejected_before_separator() {
        let mut conn = Connection::new();
        conn.receive(b"hello world").unwrap();
        assert!(matches!(conn.next_event(), Err(TnetstringError::Format(_))));

        conn.receive(b"").unwrap();
        assert!(matches!(conn.next_event(), Err(TnetstringError::Format(_))));
        assert_eq!(conn.trailing_data(), (&b"hello world"[..], true));
    }
}
