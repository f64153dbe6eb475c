use crate::analysis::note_builder::Note;
use crate::analysis::time_converter::TimeConverter;
use crate::error::{DecodeError, DecodeErrorKind};
use crate::parser::primitive_parser::{
    fail, parse_u16, parse_u32, take_bytes, to_decode_error, SmfResult,
};
use crate::parser::track_parser::{parse_track, Track};
use nom::Parser;

pub const HEADER_MAGIC: &[u8; 4] = b"MThd";
pub const HEADER_LENGTH: u32 = 6;
/// Position of the division field in the file.
pub const DIVISION_OFFSET: usize = 12;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Format {
    /// Format 0, one multi-channel track
    SingleTrack,
    /// Format 1, simultaneous tracks
    MultiTrack,
    /// Format 2, independent sequences
    MultiSequence,
}

impl Format {
    pub const fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0 => Some(Self::SingleTrack),
            1 => Some(Self::MultiTrack),
            2 => Some(Self::MultiSequence),
            _ => None,
        }
    }
}

/// Time base of the file.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Division {
    TicksPerBeat(u16),
    Smpte {
        frames_per_second: u8,
        ticks_per_frame: u8,
    },
}

impl Division {
    /// Decode the raw header field, the top bit selects SMPTE.
    pub const fn from_raw(raw: u16) -> Self {
        if raw & 0x8000 == 0 {
            Self::TicksPerBeat(raw & 0x7FFF)
        } else {
            // high byte holds the negated frame rate (-24, -25, -29, -30)
            let [high, low] = raw.to_be_bytes();
            Self::Smpte {
                frames_per_second: (high as i8).unsigned_abs(),
                ticks_per_frame: low,
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Header {
    pub format: Format,
    pub track_count: u16,
    pub division: Division,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MidiFile {
    pub header: Header,
    pub tracks: Vec<Track>,
}

impl MidiFile {
    /// Notes of every track, in track order.
    pub fn notes_per_track(&self) -> Vec<Vec<Note>> {
        self.tracks.iter().map(Track::notes).collect()
    }

    /// Musical time helper, fails for SMPTE based files.
    pub fn time_converter(&self) -> Result<TimeConverter, DecodeError> {
        TimeConverter::new(self.header.division)
    }
}

/// Parse the `MThd` chunk.
pub fn parse_header(i: &[u8]) -> SmfResult<'_, Header> {
    log::debug!("Parsing MIDI header");
    let start = i;
    let (i, magic) = take_bytes(i, HEADER_MAGIC.len())?;
    if magic != HEADER_MAGIC {
        return fail(start, DecodeErrorKind::NotAMidiFile);
    }
    let (i, header_len) = parse_u32(i)?;
    if header_len < HEADER_LENGTH {
        log::debug!("Header chunk too short: {header_len}");
        return fail(i, DecodeErrorKind::TruncatedData);
    }
    // longer headers are allowed, the extra bytes are skipped
    let (rest, body) = take_bytes(i, header_len as usize)?;
    let (_, (raw_format, track_count, raw_division)) =
        (parse_u16, parse_u16, parse_u16).parse(body)?;
    let Some(format) = Format::from_raw(raw_format) else {
        log::debug!("Unsupported MIDI format {raw_format}");
        return fail(body, DecodeErrorKind::NotAMidiFile);
    };
    let header = Header {
        format,
        track_count,
        division: Division::from_raw(raw_division),
    };
    log::debug!("{header:?}");
    Ok((rest, header))
}

fn parse_tracks(i: &[u8], track_count: u16) -> SmfResult<'_, Vec<Track>> {
    log::debug!("Parsing {track_count} tracks");
    let mut i = i;
    let mut tracks = Vec::with_capacity(usize::from(track_count));
    for index in 1..=track_count {
        log::debug!("--------");
        log::debug!("Parsing track {index}");
        let (inner, track) = parse_track(i)?;
        i = inner;
        tracks.push(track);
    }
    if !i.is_empty() {
        log::debug!("Ignoring {} bytes after the last track", i.len());
    }
    Ok((i, tracks))
}

fn parse_midi_file(i: &[u8]) -> SmfResult<'_, MidiFile> {
    let (i, header) = parse_header(i)?;
    let (i, tracks) = parse_tracks(i, header.track_count)?;
    Ok((i, MidiFile { header, tracks }))
}

/// Decode a complete Standard MIDI File.
pub fn parse_midi_data(file_data: &[u8]) -> Result<MidiFile, DecodeError> {
    parse_midi_file(file_data)
        .map(|(_rest, midi_file)| midi_file)
        .map_err(|err| {
            let err = to_decode_error(err, file_data);
            log::error!("Failed to parse MIDI data: {err}");
            err
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_division() {
        assert_eq!(Division::from_raw(0x01E0), Division::TicksPerBeat(480));
        assert_eq!(
            Division::from_raw(0xE728),
            Division::Smpte {
                frames_per_second: 25,
                ticks_per_frame: 40
            }
        );
        assert_eq!(
            Division::from_raw(0xE350),
            Division::Smpte {
                frames_per_second: 29,
                ticks_per_frame: 80
            }
        );
    }

    #[test]
    fn test_format() {
        assert_eq!(Format::from_raw(0), Some(Format::SingleTrack));
        assert_eq!(Format::from_raw(2), Some(Format::MultiSequence));
        assert_eq!(Format::from_raw(3), None);
    }

    #[test]
    fn test_parse_header() {
        let data = [
            b'M', b'T', b'h', b'd', 0x00, 0x00, 0x00, 0x06, 0x00, 0x01, 0x00, 0x03, 0x00, 0x60,
        ];
        let (rest, header) = parse_header(&data).unwrap();
        assert!(rest.is_empty());
        assert_eq!(
            header,
            Header {
                format: Format::MultiTrack,
                track_count: 3,
                division: Division::TicksPerBeat(96),
            }
        );
    }

    #[test]
    fn test_parse_long_header() {
        let data = [
            b'M', b'T', b'h', b'd', 0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x01, 0x01, 0xE0,
            0xAA, 0xBB, b'M',
        ];
        let (rest, header) = parse_header(&data).unwrap();
        assert_eq!(rest, b"M");
        assert_eq!(header.format, Format::SingleTrack);
    }

    #[test]
    fn test_not_a_midi_file() {
        let err = parse_midi_data(b"RIFF\x00\x00\x00\x06\x00\x01\x00\x01\x01\xE0").unwrap_err();
        assert_eq!(err, DecodeError::new(0, DecodeErrorKind::NotAMidiFile));

        let err = parse_midi_data(b"MThd\x00\x00\x00\x06\x00\x07\x00\x01\x01\xE0").unwrap_err();
        assert_eq!(err, DecodeError::new(8, DecodeErrorKind::NotAMidiFile));
    }

    #[test]
    fn test_truncated_header() {
        let err = parse_midi_data(b"MThd\x00\x00\x00\x06\x00\x01").unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::TruncatedData);

        let err = parse_midi_data(b"MTh").unwrap_err();
        assert_eq!(err, DecodeError::new(0, DecodeErrorKind::TruncatedData));

        let err = parse_midi_data(b"MThd\x00\x00\x00\x02\x00\x01").unwrap_err();
        assert_eq!(err, DecodeError::new(8, DecodeErrorKind::TruncatedData));
    }

    #[test]
    fn test_missing_track() {
        let err = parse_midi_data(b"MThd\x00\x00\x00\x06\x00\x00\x00\x01\x00\x60").unwrap_err();
        assert_eq!(err, DecodeError::new(14, DecodeErrorKind::TruncatedData));
    }
}
