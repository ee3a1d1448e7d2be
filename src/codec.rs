//! Character encodings for the input and output streams.
//!
//! Only the encodings a line-oriented text tool needs are supported; there
//! is no detection, the encoding is whatever the user configured.

use std::{borrow::Cow, fmt, str::FromStr};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    /// ISO-8859-1: every byte is the code point of the same value.
    Latin1,
    Ascii,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Decode,
    Encode,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Decode => "decode input",
            Direction::Encode => "encode output",
        })
    }
}

#[derive(Debug, Error)]
#[error("cannot {direction} line {line} as {encoding}: {detail}")]
pub struct EncodingError {
    /// Zero-based line index.
    pub line: usize,
    pub encoding: Encoding,
    pub direction: Direction,
    pub detail: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown encoding `{0}` (expected one of: utf8, latin1, ascii)")]
pub struct UnknownEncoding(pub String);

impl FromStr for Encoding {
    type Err = UnknownEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" | "iso8859-1" => Ok(Encoding::Latin1),
            "ascii" | "us-ascii" => Ok(Encoding::Ascii),
            _ => Err(UnknownEncoding(s.to_owned())),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Encoding::Utf8 => "utf8",
            Encoding::Latin1 => "latin1",
            Encoding::Ascii => "ascii",
        })
    }
}

#[cfg(feature = "simd")]
#[inline]
fn validate_utf8(bytes: &[u8]) -> Result<&str, String> {
    simdutf8::compat::from_utf8(bytes)
        .map_err(|e| format!("invalid UTF-8 sequence at byte {}", e.valid_up_to()))
}

#[cfg(not(feature = "simd"))]
#[inline]
fn validate_utf8(bytes: &[u8]) -> Result<&str, String> {
    std::str::from_utf8(bytes)
        .map_err(|e| format!("invalid UTF-8 sequence at byte {}", e.valid_up_to()))
}

impl Encoding {
    /// Decode one line of raw input. `line` is only used for error reporting.
    pub fn decode<'a>(&self, bytes: &'a [u8], line: usize) -> Result<Cow<'a, str>, EncodingError> {
        let err = |detail: String| EncodingError {
            line,
            encoding: *self,
            direction: Direction::Decode,
            detail,
        };
        match self {
            Encoding::Utf8 => validate_utf8(bytes).map(Cow::Borrowed).map_err(err),
            Encoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                None => validate_utf8(bytes).map(Cow::Borrowed).map_err(err),
                Some(pos) => Err(err(format!("non-ASCII byte 0x{:02X} at byte {pos}", bytes[pos]))),
            },
            Encoding::Latin1 => {
                if bytes.is_ascii() {
                    validate_utf8(bytes).map(Cow::Borrowed).map_err(err)
                } else {
                    Ok(Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()))
                }
            }
        }
    }

    /// Encode one line of output.
    pub fn encode<'a>(&self, text: &'a str, line: usize) -> Result<Cow<'a, [u8]>, EncodingError> {
        let err = |detail: String| EncodingError {
            line,
            encoding: *self,
            direction: Direction::Encode,
            detail,
        };
        match self {
            Encoding::Utf8 => Ok(Cow::Borrowed(text.as_bytes())),
            _ if text.is_ascii() => Ok(Cow::Borrowed(text.as_bytes())),
            Encoding::Ascii => Err(err(unrepresentable(text, 0x7F))),
            Encoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).ok())
                .collect::<Option<Vec<u8>>>()
                .map(Cow::Owned)
                .ok_or_else(|| err(unrepresentable(text, 0xFF))),
        }
    }
}

fn unrepresentable(text: &str, max: u32) -> String {
    match text.char_indices().find(|&(_, c)| u32::from(c) > max) {
        Some((pos, c)) => format!("character {c:?} (U+{:04X}) at byte {pos}", u32::from(c)),
        None => "unrepresentable character".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("utf8".parse(), Ok(Encoding::Utf8));
        assert_eq!("UTF-8".parse(), Ok(Encoding::Utf8));
        assert_eq!("iso-8859-1".parse(), Ok(Encoding::Latin1));
        assert_eq!("ascii".parse(), Ok(Encoding::Ascii));
        assert_eq!(
            "ebcdic".parse::<Encoding>(),
            Err(UnknownEncoding("ebcdic".into()))
        );
    }

    #[test]
    fn utf8_decode_is_zero_copy() {
        let bytes = "héllo".as_bytes();
        let out = Encoding::Utf8.decode(bytes, 0).unwrap();
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out, "héllo");
    }

    #[test]
    fn invalid_utf8_reports_line() {
        let err = Encoding::Utf8.decode(b"ab\xFFcd", 7).unwrap_err();
        assert_eq!(err.line, 7);
        assert_eq!(err.direction, Direction::Decode);
        assert!(err.to_string().contains("line 7"), "{err}");
    }

    #[test]
    fn latin1_round_trip() {
        let out = Encoding::Latin1.decode(b"caf\xE9", 0).unwrap();
        assert_eq!(out, "café");
        let back = Encoding::Latin1.encode(&out, 0).unwrap();
        assert_eq!(back.as_ref(), b"caf\xE9");
    }

    #[test]
    fn latin1_cannot_encode_cjk() {
        let err = Encoding::Latin1.encode("世界", 3).unwrap_err();
        assert_eq!(err.direction, Direction::Encode);
        assert!(err.detail.contains("U+4E16"), "{}", err.detail);
    }

    #[test]
    fn ascii_rejects_high_bytes() {
        assert!(Encoding::Ascii.decode(b"plain", 0).is_ok());
        assert!(Encoding::Ascii.decode(b"caf\xE9", 0).is_err());
        assert!(Encoding::Ascii.encode("café", 0).is_err());
    }
}
