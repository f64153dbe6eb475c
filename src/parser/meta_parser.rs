use crate::error::DecodeErrorKind;
use crate::parser::primitive_parser::{
    fail, make_string, parse_i8, parse_u16, parse_u24, parse_u8, parse_var_len_bytes, SmfResult,
};
use nom::combinator::map;
use nom::Parser;

// SMF 1.0 meta events, <https://www.midi.org/specifications/file-format-specifications/standard-midi-files>

pub const META_MARKER: u8 = 0xFF;

pub const MICROS_PER_MINUTE: f64 = 60_000_000.0;

/// MIDI clocks in a whole note, 24 per quarter.
pub const CLOCKS_PER_WHOLE: u32 = 96;

const DROP_FRAME: f64 = 30_000.0 / 1001.0;

pub const MAJOR_KEYS: [&str; 15] = [
    "Cb", "Gb", "Db", "Ab", "Eb", "Bb", "F", "C", "G", "D", "A", "E", "B", "F#", "C#",
];

pub const MINOR_KEYS: [&str; 15] = [
    "Abm", "Ebm", "Bbm", "Fm", "Cm", "Gm", "Dm", "Am", "Em", "Bm", "F#m", "C#m", "G#m", "D#m",
    "A#m",
];

#[derive(Debug, Clone, PartialEq)]
pub enum MetaEvent {
    SequenceNumber(u16),
    Text(String),
    Copyright(String),
    SequenceName(String),
    InstrumentName(String),
    Lyrics(String),
    Marker(String),
    CuePoint(String),
    MidiChannelPrefix(u8),
    EndOfTrack,
    SetTempo(Tempo),
    SmpteOffset(SmpteOffset),
    TimeSignature(TimeSignature),
    KeySignature(KeySignature),
    SequencerSpecific(Vec<u8>),
}

impl MetaEvent {
    /// Text payload of the textual meta events.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(s)
            | Self::Copyright(s)
            | Self::SequenceName(s)
            | Self::InstrumentName(s)
            | Self::Lyrics(s)
            | Self::Marker(s)
            | Self::CuePoint(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    pub micros_per_quarter: u32,
    pub bpm: f64,
}

impl Tempo {
    pub fn new(micros_per_quarter: u32) -> Self {
        Self {
            micros_per_quarter,
            bpm: MICROS_PER_MINUTE / f64::from(micros_per_quarter),
        }
    }
}

impl Default for Tempo {
    fn default() -> Self {
        // 120 BPM until a tempo event says otherwise
        Self::new(500_000)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmpteFrameRate {
    TwentyFour,
    TwentyFive,
    /// 29.97 drop frame
    TwentyNine,
    Thirty,
}

impl SmpteFrameRate {
    /// Frame rate encoded in bits 5-6 of the hour byte.
    pub const fn from_hour_byte(byte: u8) -> Self {
        match (byte >> 5) & 0x03 {
            0 => Self::TwentyFour,
            1 => Self::TwentyFive,
            2 => Self::TwentyNine,
            _ => Self::Thirty,
        }
    }

    pub const fn as_f64(&self) -> f64 {
        match self {
            Self::TwentyFour => 24.0,
            Self::TwentyFive => 25.0,
            Self::TwentyNine => DROP_FRAME,
            Self::Thirty => 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmpteOffset {
    pub frame_rate: SmpteFrameRate,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub frames: u8,
    pub subframes: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u32,
    /// MIDI clocks per metronome click, 24 is a quarter note.
    pub clocks_per_click: u8,
    pub thirty_seconds_per_24_clocks: u8,
}

impl TimeSignature {
    pub fn new(
        numerator: u8,
        denominator_power: u8,
        clocks_per_click: u8,
        thirty_seconds_per_24_clocks: u8,
    ) -> Self {
        Self {
            numerator,
            denominator: 2u32.saturating_pow(u32::from(denominator_power)),
            clocks_per_click,
            thirty_seconds_per_24_clocks,
        }
    }

    /// Metronome click as a note value, `1/4` for 24 clocks, `3/8` for 36.
    pub fn metronome(&self) -> String {
        let clocks = u32::from(self.clocks_per_click);
        let divisor = gcd(clocks, CLOCKS_PER_WHOLE);
        format!("{}/{}", clocks / divisor, CLOCKS_PER_WHOLE / divisor)
    }
}

const fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

impl std::fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Major,
    Minor,
}

impl From<u8> for Mode {
    fn from(value: u8) -> Self {
        if value == 0 {
            Self::Major
        } else {
            Self::Minor
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySignature {
    /// Negative for flats, positive for sharps.
    pub sharps_flats: i8,
    pub mode: Mode,
    /// `None` when `sharps_flats` is outside -7..=7
    pub name: Option<&'static str>,
}

impl KeySignature {
    pub fn new(sharps_flats: i8, mode: Mode) -> Self {
        let table = match mode {
            Mode::Major => &MAJOR_KEYS,
            Mode::Minor => &MINOR_KEYS,
        };
        let name = usize::try_from(i16::from(sharps_flats) + 7)
            .ok()
            .and_then(|index| table.get(index))
            .copied();
        Self {
            sharps_flats,
            mode,
            name,
        }
    }
}

impl std::fmt::Display for KeySignature {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.name {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "invalid key ({})", self.sharps_flats),
        }
    }
}

/// The length byte of fixed size meta events is not trusted.
fn skip_fixed_len(i: &[u8], expected: u8) -> SmfResult<'_, ()> {
    let (i, len) = parse_u8(i)?;
    if len != expected {
        log::debug!("Meta event declares length {len}, expected {expected}");
    }
    Ok((i, ()))
}

fn parse_text(i: &[u8]) -> SmfResult<'_, String> {
    map(parse_var_len_bytes, make_string).parse(i)
}

fn parse_smpte_offset(i: &[u8]) -> SmfResult<'_, SmpteOffset> {
    map(
        (parse_u8, parse_u8, parse_u8, parse_u8, parse_u8),
        |(rate_and_hours, minutes, seconds, frames, subframes)| SmpteOffset {
            frame_rate: SmpteFrameRate::from_hour_byte(rate_and_hours),
            hours: rate_and_hours & 0x1F,
            minutes,
            seconds,
            frames,
            subframes,
        },
    )
    .parse(i)
}

fn parse_time_signature(i: &[u8]) -> SmfResult<'_, TimeSignature> {
    map(
        (parse_u8, parse_u8, parse_u8, parse_u8),
        |(numerator, denominator_power, clocks_per_click, thirty_seconds)| {
            TimeSignature::new(
                numerator,
                denominator_power,
                clocks_per_click,
                thirty_seconds,
            )
        },
    )
    .parse(i)
}

fn parse_key_signature(i: &[u8]) -> SmfResult<'_, KeySignature> {
    map((parse_i8, parse_u8), |(sharps_flats, mode)| {
        KeySignature::new(sharps_flats, Mode::from(mode))
    })
    .parse(i)
}

/// Parse a meta event, input positioned on the 0xFF marker.
pub fn parse_meta_event(i: &[u8]) -> SmfResult<'_, MetaEvent> {
    let start = i;
    let (i, _marker) = parse_u8(i)?;
    let (i, meta_type) = parse_u8(i)?;
    log::debug!("Parsing meta event 0x{meta_type:02X}");
    match meta_type {
        0x00 => {
            let (i, ()) = skip_fixed_len(i, 2)?;
            map(parse_u16, MetaEvent::SequenceNumber).parse(i)
        }
        0x01 => map(parse_text, MetaEvent::Text).parse(i),
        0x02 => map(parse_text, MetaEvent::Copyright).parse(i),
        0x03 => map(parse_text, MetaEvent::SequenceName).parse(i),
        0x04 => map(parse_text, MetaEvent::InstrumentName).parse(i),
        0x05 => map(parse_text, MetaEvent::Lyrics).parse(i),
        0x06 => map(parse_text, MetaEvent::Marker).parse(i),
        0x07 => map(parse_text, MetaEvent::CuePoint).parse(i),
        0x20 => {
            let (i, ()) = skip_fixed_len(i, 1)?;
            map(parse_u8, MetaEvent::MidiChannelPrefix).parse(i)
        }
        0x2F => {
            let (i, ()) = skip_fixed_len(i, 0)?;
            Ok((i, MetaEvent::EndOfTrack))
        }
        0x51 => {
            let (i, ()) = skip_fixed_len(i, 3)?;
            map(parse_u24, |micros| MetaEvent::SetTempo(Tempo::new(micros))).parse(i)
        }
        0x54 => {
            let (i, ()) = skip_fixed_len(i, 5)?;
            map(parse_smpte_offset, MetaEvent::SmpteOffset).parse(i)
        }
        0x58 => {
            let (i, ()) = skip_fixed_len(i, 4)?;
            map(parse_time_signature, MetaEvent::TimeSignature).parse(i)
        }
        0x59 => {
            let (i, ()) = skip_fixed_len(i, 2)?;
            map(parse_key_signature, MetaEvent::KeySignature).parse(i)
        }
        0x7F => map(parse_var_len_bytes, |data: &[u8]| {
            MetaEvent::SequencerSpecific(data.to_vec())
        })
        .parse(i),
        unknown => {
            log::debug!("Unknown meta event type 0x{unknown:02X}");
            fail(start, DecodeErrorKind::UnknownMetaType(unknown))
        }
    }
}
