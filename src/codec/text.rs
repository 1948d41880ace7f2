//! Text to byte-string conversion.
//!
//! The wire format only carries byte strings. [`Value::Text`](crate::Value::Text)
//! is converted with a [`TextConfig`] before framing; decoding never turns
//! bytes back into text.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

use crate::error::{Result, TnetstringError};

/// Byte substituted for unrepresentable characters under `Replace`.
const REPLACEMENT: u8 = b'?';

/// Supported text encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Ascii,
    Latin1,
}

impl TextEncoding {
    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Ascii => "ascii",
            TextEncoding::Latin1 => "latin-1",
        }
    }

    /// Single-byte form of `c`, or `None` if the encoding cannot represent it.
    fn encode_char(self, c: char) -> Option<u8> {
        let limit = match self {
            TextEncoding::Utf8 => return None,
            TextEncoding::Ascii => 0x7F,
            TextEncoding::Latin1 => 0xFF,
        };
        u8::try_from(u32::from(c)).ok().filter(|&b| u32::from(b) <= limit)
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextEncoding {
    type Err = TnetstringError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "ascii" | "us-ascii" => Ok(TextEncoding::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => Ok(TextEncoding::Latin1),
            _ => Err(TnetstringError::Unsupported(format!(
                "unknown text encoding {s:?}"
            ))),
        }
    }
}

/// What to do with characters the encoding cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingErrors {
    /// Fail the whole encode.
    #[default]
    Strict,
    /// Substitute `?`.
    Replace,
    /// Drop the character.
    Ignore,
}

impl FromStr for EncodingErrors {
    type Err = TnetstringError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(EncodingErrors::Strict),
            "replace" => Ok(EncodingErrors::Replace),
            "ignore" => Ok(EncodingErrors::Ignore),
            _ => Err(TnetstringError::Unsupported(format!(
                "unknown encoding error policy {s:?}"
            ))),
        }
    }
}

/// Text encoding plus error policy.
///
/// # Example
///
/// ```
/// use tnetstring::codec::TextConfig;
///
/// let latin1 = TextConfig::from_names("latin-1", "replace").unwrap();
/// assert_eq!(&latin1.encode("café ☕").unwrap()[..], b"caf\xe9 ?");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextConfig {
    pub encoding: TextEncoding,
    pub errors: EncodingErrors,
}

impl TextConfig {
    pub fn new(encoding: TextEncoding, errors: EncodingErrors) -> Self {
        Self { encoding, errors }
    }

    /// Build a config from encoding and policy names (`"utf-8"`, `"strict"`).
    pub fn from_names(encoding: &str, errors: &str) -> Result<Self> {
        Ok(Self::new(encoding.parse()?, errors.parse()?))
    }

    /// Convert `text` to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TnetstringError::TextEncode`] under the strict policy when a
    /// character has no representation in the encoding.
    pub fn encode(&self, text: &str) -> Result<Bytes> {
        if self.encoding == TextEncoding::Utf8 {
            return Ok(Bytes::copy_from_slice(text.as_bytes()));
        }

        let mut out = Vec::with_capacity(text.len());
        for (position, character) in text.chars().enumerate() {
            match (self.encoding.encode_char(character), self.errors) {
                (Some(b), _) => out.push(b),
                (None, EncodingErrors::Replace) => out.push(REPLACEMENT),
                (None, EncodingErrors::Ignore) => {}
                (None, EncodingErrors::Strict) => {
                    return Err(TnetstringError::TextEncode {
                        encoding: self.encoding.name(),
                        character,
                        position,
                    })
                }
            }
        }
        Ok(Bytes::from(out))
    }
}
