use crate::error::{DecodeError, DecodeErrorKind};
use encoding_rs::WINDOWS_1252;
use nom::error::{ErrorKind, ParseError};
use nom::{bytes, number, IResult, Offset};

/// Standard MIDI variable length quantities are capped at 28 bits.
pub const MAX_VAR_LEN_BYTES: usize = 4;

/// Parser error pointing at the remaining input where decoding stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmfError<'a> {
    pub input: &'a [u8],
    pub kind: DecodeErrorKind,
}

impl<'a> SmfError<'a> {
    pub const fn new(input: &'a [u8], kind: DecodeErrorKind) -> Self {
        Self { input, kind }
    }

    /// Resolve the absolute offset against the buffer the decode started from.
    pub fn into_decode_error(self, origin: &[u8]) -> DecodeError {
        DecodeError::new(origin.offset(self.input), self.kind)
    }
}

impl<'a> ParseError<&'a [u8]> for SmfError<'a> {
    // complete parsers only fail when running out of input
    fn from_error_kind(input: &'a [u8], kind: ErrorKind) -> Self {
        log::debug!("nom error {kind:?} with {} bytes left", input.len());
        Self::new(input, DecodeErrorKind::TruncatedData)
    }

    fn append(_input: &'a [u8], _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

pub type SmfResult<'a, O> = IResult<&'a [u8], O, SmfError<'a>>;

/// Abort the decode at `input`.
pub fn fail<O>(input: &[u8], kind: DecodeErrorKind) -> SmfResult<'_, O> {
    Err(nom::Err::Failure(SmfError::new(input, kind)))
}

/// Convert a nom error into a positioned `DecodeError`.
pub fn to_decode_error(err: nom::Err<SmfError<'_>>, origin: &[u8]) -> DecodeError {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => e.into_decode_error(origin),
        nom::Err::Incomplete(_) => DecodeError::new(origin.len(), DecodeErrorKind::TruncatedData),
    }
}

/// Parse unsigned byte
pub fn parse_u8(i: &[u8]) -> SmfResult<'_, u8> {
    number::complete::be_u8(i)
}

/// Parse signed byte
pub fn parse_i8(i: &[u8]) -> SmfResult<'_, i8> {
    number::complete::be_i8(i)
}

/// Parse big endian unsigned 16
pub fn parse_u16(i: &[u8]) -> SmfResult<'_, u16> {
    number::complete::be_u16(i)
}

/// Parse big endian unsigned 24
pub fn parse_u24(i: &[u8]) -> SmfResult<'_, u32> {
    number::complete::be_u24(i)
}

/// Parse big endian unsigned 32
pub fn parse_u32(i: &[u8]) -> SmfResult<'_, u32> {
    number::complete::be_u32(i)
}

/// Take exactly `n` bytes.
pub fn take_bytes(i: &[u8], n: usize) -> SmfResult<'_, &[u8]> {
    bytes::complete::take(n)(i)
}

/// Decoded variable length quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarLen {
    pub value: u32,
    /// Number of bytes the encoding occupied.
    pub len: usize,
}

/// Parse a variable length quantity.
///
/// Each byte contributes its low 7 bits, big endian. A set top bit means another byte follows.
pub fn parse_var_len(i: &[u8]) -> SmfResult<'_, VarLen> {
    let mut rest = i;
    let mut value: u32 = 0;
    for len in 1..=MAX_VAR_LEN_BYTES {
        let (inner, byte) = parse_u8(rest)?;
        rest = inner;
        value = (value << 7) | u32::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok((rest, VarLen { value, len }));
        }
    }
    log::debug!("Variable length quantity longer than {MAX_VAR_LEN_BYTES} bytes");
    fail(rest, DecodeErrorKind::TruncatedData)
}

/// Read a variable length quantity starting at `offset` in `buffer`.
pub fn read_var_len(buffer: &[u8], offset: usize) -> Result<VarLen, DecodeError> {
    let Some(i) = buffer.get(offset..) else {
        return Err(DecodeError::new(
            buffer.len(),
            DecodeErrorKind::TruncatedData,
        ));
    };
    parse_var_len(i)
        .map(|(_rest, var_len)| var_len)
        .map_err(|err| to_decode_error(err, buffer))
}

/// Payload prefixed by its variable length size.
pub fn parse_var_len_bytes(i: &[u8]) -> SmfResult<'_, &[u8]> {
    let (i, len) = parse_var_len(i)?;
    take_bytes(i, len.value as usize)
}

/// Materialize text payload, falling back to Windows-1252 for legacy files
pub fn make_string(i: &[u8]) -> String {
    match std::str::from_utf8(i) {
        Ok(s) => s.to_string(),
        Err(e) => {
            log::debug!("Text is not UTF-8 ({e}), decoding as Windows-1252");
            let (cow, encoding_used, had_errors) = WINDOWS_1252.decode(i);
            if had_errors {
                log::debug!("Error parsing string with {encoding_used:?}");
            }
            cow.into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_len_single_byte() {
        let (rest, var_len) = parse_var_len(&[0x00]).unwrap();
        assert!(rest.is_empty());
        assert_eq!(var_len, VarLen { value: 0, len: 1 });

        let (_rest, var_len) = parse_var_len(&[0x7F, 0x81]).unwrap();
        assert_eq!(var_len, VarLen { value: 127, len: 1 });
    }

    #[test]
    fn test_var_len_multi_bytes() {
        let (_rest, var_len) = parse_var_len(&[0x81, 0x00]).unwrap();
        assert_eq!(var_len, VarLen { value: 128, len: 2 });

        let (_rest, var_len) = parse_var_len(&[0xC0, 0x00]).unwrap();
        assert_eq!(var_len.value, 0x2000);

        let (_rest, var_len) = parse_var_len(&[0xFF, 0xFF, 0x7F]).unwrap();
        assert_eq!(var_len, VarLen { value: 0x001F_FFFF, len: 3 });

        let (rest, var_len) = parse_var_len(&[0xFF, 0xFF, 0xFF, 0x7F, 0x12]).unwrap();
        assert_eq!(var_len, VarLen { value: 0x0FFF_FFFF, len: 4 });
        assert_eq!(rest, &[0x12]);
    }

    #[test]
    fn test_var_len_too_long() {
        let err = read_var_len(&[0xFF, 0xFF, 0xFF, 0xFF, 0x7F], 0).unwrap_err();
        assert_eq!(err, DecodeError::new(4, DecodeErrorKind::TruncatedData));
    }

    #[test]
    fn test_var_len_truncated() {
        let err = read_var_len(&[0x00, 0x81, 0x80], 1).unwrap_err();
        assert_eq!(err, DecodeError::new(3, DecodeErrorKind::TruncatedData));

        let err = read_var_len(&[0x00], 5).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::TruncatedData);
    }

    #[test]
    fn test_read_var_len_at_offset() {
        let var_len = read_var_len(&[0x00, 0x83, 0x60], 1).unwrap();
        assert_eq!(var_len, VarLen { value: 480, len: 2 });
    }

    #[test]
    fn test_make_string() {
        assert_eq!(make_string(b"Piano"), "Piano");
        // 0xE9 is 'é' in Windows-1252 but not valid UTF-8 on its own
        assert_eq!(make_string(&[0x43, 0x61, 0x66, 0xE9]), "Café");
    }
}
