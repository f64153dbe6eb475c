//! Error types for the midiscan library

use std::io;

/// Cause of a failed decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeErrorKind {
    /// Header or track chunk magic bytes do not match
    #[error("not a MIDI file")]
    NotAMidiFile,

    /// A read would go past the buffer or past a chunk's declared length
    #[error("truncated data")]
    TruncatedData,

    /// Meta event type byte outside the known table
    #[error("unknown meta event type 0x{0:02X}")]
    UnknownMetaType(u8),

    /// Status byte that is neither a channel voice status nor resolvable through running status
    #[error("unknown channel status 0x{0:02X}")]
    UnknownChannelStatus(u8),

    /// Musical time requested for a file using SMPTE division
    #[error("unsupported time format")]
    UnsupportedTimeFormat,
}

/// Decoding failure with the byte offset where it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at offset {offset}")]
pub struct DecodeError {
    pub offset: usize,
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    pub const fn new(offset: usize, kind: DecodeErrorKind) -> Self {
        Self { offset, kind }
    }
}

/// Library error type for midiscan operations
#[derive(Debug, thiserror::Error)]
pub enum MidiError {
    /// The bytes are not a valid Standard MIDI File
    #[error("decoding error: {0}")]
    DecodeError(#[from] DecodeError),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// I/O error while acquiring the bytes, passed through untouched
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::new(14, DecodeErrorKind::UnknownMetaType(0x42));
        assert_eq!(err.to_string(), "unknown meta event type 0x42 at offset 14");
    }

    #[test]
    fn test_io_error_is_kept() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing.mid");
        let err = MidiError::from(io_err);
        match err {
            MidiError::IoError(inner) => assert_eq!(inner.kind(), io::ErrorKind::NotFound),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
