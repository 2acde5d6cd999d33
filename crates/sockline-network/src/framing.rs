//! Message framing.
//!
//! A [`Framing`] creates one [`MessageAssembler`] per `recv()` call. The
//! assembler receives every data chunk of that call and decides when a
//! message is complete. Assemblers are never reused, so nothing leaks from
//! one receive into the next.
//!
//! # Line Framing
//!
//! [`LineFraming`] completes a message when the *most recent chunk* ends
//! with the delimiter:
//!
//! ```text
//! chunks: "he" | "llo\n"         -> "hello\n"        complete
//! chunks: "a\nb"                 -> pending           delimiter not at tail
//! chunks: "a\nb" | "c\n"         -> "a\nbc\n"        complete
//! ```
//!
//! Each chunk is converted to text on its own (invalid UTF-8 becomes
//! U+FFFD), so a multi-byte character split across two chunks is not
//! reassembled.

use sockline_core::constants::EOL;
use tracing::warn;

/// Accumulates the data chunks of a single receive.
pub trait MessageAssembler {
    /// Append `chunk`. Returns the complete message once it is available.
    fn push(&mut self, chunk: &[u8]) -> Option<String>;
}

/// Factory of per-receive assemblers.
pub trait Framing {
    type Assembler: MessageAssembler;

    /// Fresh assembler with an empty accumulator.
    fn assembler(&self) -> Self::Assembler;
}

/// Delimiter-terminated text messages.
///
/// # Example
///
/// ```
/// use sockline_network::{Framing, LineFraming, MessageAssembler};
///
/// let framing = LineFraming::new("\n");
/// let mut assembler = framing.assembler();
///
/// assert_eq!(assembler.push(b"te"), None);
/// assert_eq!(assembler.push(b"st\n"), Some("test\n".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFraming {
    delimiter: String,
}

impl LineFraming {
    /// Framing with a custom delimiter.
    ///
    /// An empty delimiter would never complete a message; it is replaced by
    /// the platform line ending.
    pub fn new(delimiter: impl Into<String>) -> Self {
        let mut delimiter = delimiter.into();
        if delimiter.is_empty() {
            warn!("Empty message delimiter, falling back to the platform line ending");
            delimiter = EOL.to_string();
        }
        Self { delimiter }
    }

    /// Active delimiter.
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }
}

impl Default for LineFraming {
    fn default() -> Self {
        Self {
            delimiter: EOL.to_string(),
        }
    }
}

impl Framing for LineFraming {
    type Assembler = LineAssembler;

    fn assembler(&self) -> LineAssembler {
        LineAssembler {
            delimiter: self.delimiter.clone(),
            chunks: Vec::new(),
        }
    }
}

/// Assembler produced by [`LineFraming`].
#[derive(Debug)]
pub struct LineAssembler {
    delimiter: String,
    chunks: Vec<String>,
}

impl MessageAssembler for LineAssembler {
    fn push(&mut self, chunk: &[u8]) -> Option<String> {
        let text = String::from_utf8_lossy(chunk).into_owned();
        let complete = text.ends_with(&self.delimiter);
        self.chunks.push(text);

        complete.then(|| std::mem::take(&mut self.chunks).concat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_single_chunk_message() {
        let mut assembler = LineFraming::new("\n").assembler();
        assert_eq!(assembler.push(b"test\n"), Some("test\n".to_string()));
    }

    #[test]
    fn test_multi_chunk_message() {
        let mut assembler = LineFraming::new("\n").assembler();

        assert_eq!(assembler.push(b"hel"), None);
        assert_eq!(assembler.push(b"lo wor"), None);
        assert_eq!(assembler.push(b"ld\n"), Some("hello world\n".to_string()));
        assert_eq!(assembler.push(b"next\n"), Some("next\n".to_string()));
    }

    #[rstest]
    #[case(b"a\nb".as_slice())]
    #[case(b"\nabc".as_slice())]
    #[case(b"line\n ".as_slice())]
    fn test_delimiter_mid_chunk_does_not_complete(#[case] chunk: &[u8]) {
        let mut assembler = LineFraming::new("\n").assembler();
        assert_eq!(assembler.push(chunk), None);
    }

    #[test]
    fn test_delimiter_must_end_latest_chunk() {
        let mut assembler = LineFraming::new("\n").assembler();

        assert_eq!(assembler.push(b"first\nsecond"), None);
        assert_eq!(
            assembler.push(b" part\n"),
            Some("first\nsecond part\n".to_string())
        );
    }

    #[test]
    fn test_multi_character_delimiter() {
        let mut assembler = LineFraming::new("\r\n").assembler();

        assert_eq!(assembler.push(b"abc\n"), None);
        assert_eq!(assembler.push(b"def\r\n"), Some("abc\ndef\r\n".to_string()));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut assembler = LineFraming::new("\n").assembler();
        assert_eq!(
            assembler.push(b"caf\xff\n"),
            Some("caf\u{FFFD}\n".to_string())
        );
    }

    #[test]
    fn test_empty_delimiter_falls_back_to_eol() {
        let framing = LineFraming::new("");
        assert_eq!(framing.delimiter(), EOL);
    }

    #[test]
    fn test_assemblers_do_not_share_state() {
        let framing = LineFraming::default();
        let mut first = framing.assembler();
        first.push(b"leftover");

        let mut second = framing.assembler();
        let message = format!("fresh{EOL}");
        assert_eq!(second.push(message.as_bytes()), Some(message.clone()));
    }
}
