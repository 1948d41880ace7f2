//! Wire format constants and frame header parsing.
//!
//! Every value is one frame:
//! ```text
//! ┌────────────────┬─────┬──────────────────┬──────┐
//! │ Length         │ ':' │ Payload          │ Tag  │
//! │ decimal digits │ 1 B │ `length` bytes   │ 1 B  │
//! └────────────────┴─────┴──────────────────┴──────┘
//! ```
//!
//! The length counts payload bytes only, never the tag.

use crate::error::{Result, TnetstringError};

/// Separator between the length prefix and the payload.
pub const SEPARATOR: u8 = b':';

/// Encoded `Null`.
pub const NULL: &[u8] = b"0:~";
/// Encoded `true`.
pub const TRUE: &[u8] = b"4:true!";
/// Encoded `false`.
pub const FALSE: &[u8] = b"5:false!";

/// Longest length prefix accepted. `usize::MAX` has 20 decimal digits.
pub const MAX_LENGTH_DIGITS: usize = 20;

/// Type tag bytes.
pub mod tags {
    pub const NULL: u8 = b'~';
    pub const INTEGER: u8 = b'#';
    pub const FLOAT: u8 = b'^';
    pub const BOOL: u8 = b'!';
    pub const BYTES: u8 = b',';
    pub const MAP: u8 = b'}';
    pub const LIST: u8 = b']';
}

/// The type tag that closes a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Null,
    Integer,
    Float,
    Bool,
    Bytes,
    Map,
    List,
}

impl Tag {
    /// Map a tag byte to a `Tag`, rejecting anything outside the grammar.
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            tags::NULL => Ok(Tag::Null),
            tags::INTEGER => Ok(Tag::Integer),
            tags::FLOAT => Ok(Tag::Float),
            tags::BOOL => Ok(Tag::Bool),
            tags::BYTES => Ok(Tag::Bytes),
            tags::MAP => Ok(Tag::Map),
            tags::LIST => Ok(Tag::List),
            other => Err(TnetstringError::UnknownTag(other)),
        }
    }

    #[inline]
    pub fn as_byte(self) -> u8 {
        match self {
            Tag::Null => tags::NULL,
            Tag::Integer => tags::INTEGER,
            Tag::Float => tags::FLOAT,
            Tag::Bool => tags::BOOL,
            Tag::Bytes => tags::BYTES,
            Tag::Map => tags::MAP,
            Tag::List => tags::LIST,
        }
    }
}

/// Parsed length prefix of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Number of digits in the length prefix.
    pub prefix_len: usize,
    /// Declared payload length in bytes.
    pub payload_len: usize,
}

impl FrameHeader {
    /// Parse the length prefix at the start of `buf`.
    ///
    /// Returns:
    /// - `Ok(None)` while the buffered bytes are still a valid start of a
    ///   length prefix and no `:` has arrived yet
    /// - `Ok(Some(header))` once the prefix is complete and valid
    /// - `Err(...)` as soon as the prefix cannot become a canonical decimal
    ///   length (non-digit, leading zero, too many digits, overflow)
    ///
    /// # Example
    ///
    /// ```
    /// use tnetstring::protocol::FrameHeader;
    ///
    /// let header = FrameHeader::parse(b"5:hello,").unwrap().unwrap();
    /// assert_eq!(header.payload_len, 5);
    /// assert_eq!(header.frame_len(), 8);
    ///
    /// assert!(FrameHeader::parse(b"12").unwrap().is_none());
    /// assert!(FrameHeader::parse(b"hello").is_err());
    /// ```
    pub fn parse(buf: &[u8]) -> Result<Option<Self>> {
        let separator = buf.iter().position(|&b| b == SEPARATOR);
        let digits = &buf[..separator.unwrap_or(buf.len())];
        let payload_len = parse_length(digits)?;

        let Some(idx) = separator else {
            return Ok(None);
        };
        let payload_len =
            payload_len.ok_or_else(|| TnetstringError::format("Missing length prefix"))?;

        // prefix + ':' + payload + tag must be addressable
        if payload_len.checked_add(idx + 2).is_none() {
            return Err(TnetstringError::format("Length prefix overflows"));
        }

        Ok(Some(Self {
            prefix_len: idx,
            payload_len,
        }))
    }

    /// Length announced by a prefix whose `:` has not arrived yet.
    ///
    /// More digits can only make it larger, so this is a lower bound on the
    /// final payload length. `None` if nothing is buffered or the prefix is
    /// already complete.
    pub fn pending_length(buf: &[u8]) -> Result<Option<usize>> {
        if buf.contains(&SEPARATOR) {
            return Ok(None);
        }
        parse_length(buf)
    }

    /// Offset of the first payload byte.
    #[inline]
    pub fn payload_start(&self) -> usize {
        self.prefix_len + 1
    }

    /// Offset of the tag byte.
    #[inline]
    pub fn tag_offset(&self) -> usize {
        self.payload_start() + self.payload_len
    }

    /// Total bytes the frame occupies, tag included.
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.tag_offset() + 1
    }

    /// Validate the declared payload length against a limit.
    pub fn validate(&self, max_frame_length: Option<usize>) -> Result<()> {
        match max_frame_length {
            Some(max) if self.payload_len > max => Err(TnetstringError::Format(format!(
                "Payload size {} exceeds maximum {}",
                self.payload_len, max
            ))),
            _ => Ok(()),
        }
    }
}

/// Parse the decimal digits of a (possibly partial) length prefix.
///
/// `Ok(None)` for an empty prefix.
fn parse_length(digits: &[u8]) -> Result<Option<usize>> {
    if digits.is_empty() {
        return Ok(None);
    }
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(TnetstringError::Format(format!(
            "Invalid length prefix {:?}",
            String::from_utf8_lossy(digits)
        )));
    }
    if digits.len() > 1 && digits[0] == b'0' {
        return Err(TnetstringError::Format(format!(
            "Length prefix {:?} has a leading zero",
            String::from_utf8_lossy(digits)
        )));
    }
    if digits.len() > MAX_LENGTH_DIGITS {
        return Err(TnetstringError::format("Length prefix overflows"));
    }

    digits
        .iter()
        .try_fold(0usize, |acc, &d| {
            acc.checked_mul(10)?.checked_add(usize::from(d - b'0'))
        })
        .map(Some)
        .ok_or_else(|| TnetstringError::format("Length prefix overflows"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals_are_well_formed() {
        for literal in [NULL, TRUE, FALSE] {
            let header = FrameHeader::parse(literal).unwrap().unwrap();
            assert_eq!(header.frame_len(), literal.len());
        }
    }

    #[test]
    fn test_parse_header_offsets() {
        let header = FrameHeader::parse(b"19:7:message,2:hi,}").unwrap().unwrap();
        assert_eq!(header.prefix_len, 2);
        assert_eq!(header.payload_len, 19);
        assert_eq!(header.payload_start(), 3);
        assert_eq!(header.tag_offset(), 22);
        assert_eq!(header.frame_len(), 23);
    }

    #[test]
    fn test_parse_zero_length() {
        let header = FrameHeader::parse(b"0:]").unwrap().unwrap();
        assert_eq!(header.payload_len, 0);
        assert_eq!(header.frame_len(), 3);
    }

    #[test]
    fn test_parse_needs_separator() {
        assert!(FrameHeader::parse(b"").unwrap().is_none());
        assert!(FrameHeader::parse(b"1").unwrap().is_none());
        assert!(FrameHeader::parse(b"123").unwrap().is_none());
    }

    #[test]
    fn test_parse_rejects_bad_prefix() {
        assert!(FrameHeader::parse(b":abc,").is_err());
        assert!(FrameHeader::parse(b"1x:a,").is_err());
        assert!(FrameHeader::parse(b"-1:a,").is_err());
        assert!(FrameHeader::parse(b"01:a,").is_err());

        let err = FrameHeader::parse(b"99999999999999999999999:").unwrap_err();
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn test_parse_rejects_bad_prefix_before_separator() {
        assert!(FrameHeader::parse(b"hello").is_err());
        assert!(FrameHeader::parse(b"12x").is_err());
        assert!(FrameHeader::parse(b"05").is_err());
        assert!(FrameHeader::parse(b"0").unwrap().is_none());

        // 21 digits can never be a valid length
        let err = FrameHeader::parse(&[b'1'; MAX_LENGTH_DIGITS + 1]).unwrap_err();
        assert!(err.to_string().contains("overflows"));
        assert!(FrameHeader::parse(&[b'1'; MAX_LENGTH_DIGITS - 1])
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_pending_length() {
        assert_eq!(FrameHeader::pending_length(b"").unwrap(), None);
        assert_eq!(FrameHeader::pending_length(b"123").unwrap(), Some(123));
        assert_eq!(FrameHeader::pending_length(b"123:").unwrap(), None);
        assert!(FrameHeader::pending_length(b"abc").is_err());
    }

    #[test]
    fn test_validate_max_frame_length() {
        let header = FrameHeader::parse(b"1000:").unwrap().unwrap();
        assert!(header.validate(None).is_ok());
        assert!(header.validate(Some(1000)).is_ok());

        let err = header.validate(Some(100)).unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_tag_from_byte() {
        for byte in *b"~#^!,}]" {
            assert_eq!(Tag::from_byte(byte).unwrap().as_byte(), byte);
        }
        assert!(matches!(
            Tag::from_byte(b'@'),
            Err(TnetstringError::UnknownTag(b'@'))
        ));
    }
}
