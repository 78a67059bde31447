//! Line framing for client input.

use bytes::BytesMut;
use std::io;
use tokio_util::codec::{Decoder, LinesCodec, LinesCodecError};

/// One framed unit of client input.
#[derive(Debug, PartialEq, Eq)]
pub enum Inbound {
    Line(String),
    /// A line longer than the limit; its bytes are discarded up to the
    /// next newline.
    TooLong,
    /// A complete line that was not valid UTF-8. It has been consumed.
    InvalidUtf8,
}

/// [`LinesCodec`] with overlong and non-UTF-8 lines surfaced as items
/// instead of errors, so the stream keeps going after one.
#[derive(Debug)]
pub struct IrcLineCodec {
    inner: LinesCodec,
}

impl IrcLineCodec {
    pub fn new(max_line_length: usize) -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(max_line_length),
        }
    }

    fn map(
        result: Result<Option<String>, LinesCodecError>,
    ) -> Result<Option<Inbound>, LinesCodecError> {
        match result {
            Ok(line) => Ok(line.map(Inbound::Line)),
            Err(LinesCodecError::MaxLineLengthExceeded) => Ok(Some(Inbound::TooLong)),
            Err(LinesCodecError::Io(e)) if e.kind() == io::ErrorKind::InvalidData => {
                Ok(Some(Inbound::InvalidUtf8))
            }
            Err(e) => Err(e),
        }
    }
}

impl Decoder for IrcLineCodec {
    type Item = Inbound;
    type Error = LinesCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Inbound>, LinesCodecError> {
        Self::map(self.inner.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Inbound>, LinesCodecError> {
        Self::map(self.inner.decode_eof(buf))
    }
}
