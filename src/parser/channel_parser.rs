use crate::error::DecodeErrorKind;
use crate::parser::primitive_parser::{fail, parse_u8, SmfResult};
use nom::combinator::map;
use nom::Parser;

pub const PITCH_BEND_CENTER: i16 = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelStatus {
    NoteOff,
    NoteOn,
    PolyAftertouch,
    Controller,
    ProgramChange,
    ChannelAftertouch,
    PitchBend,
}

impl ChannelStatus {
    /// Message type from the high nibble of a status byte.
    pub const fn from_status_byte(byte: u8) -> Option<Self> {
        match byte >> 4 {
            0x8 => Some(Self::NoteOff),
            0x9 => Some(Self::NoteOn),
            0xA => Some(Self::PolyAftertouch),
            0xB => Some(Self::Controller),
            0xC => Some(Self::ProgramChange),
            0xD => Some(Self::ChannelAftertouch),
            0xE => Some(Self::PitchBend),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelVoiceEvent {
    NoteOff { channel: u8, note: u8, velocity: u8 },
    NoteOn { channel: u8, note: u8, velocity: u8 },
    PolyAftertouch { channel: u8, note: u8, pressure: u8 },
    Controller { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    ChannelAftertouch { channel: u8, pressure: u8 },
    /// Centered on zero, -8192..=8191
    PitchBend { channel: u8, value: i16 },
}

impl ChannelVoiceEvent {
    pub const fn channel(&self) -> u8 {
        match *self {
            Self::NoteOff { channel, .. }
            | Self::NoteOn { channel, .. }
            | Self::PolyAftertouch { channel, .. }
            | Self::Controller { channel, .. }
            | Self::ProgramChange { channel, .. }
            | Self::ChannelAftertouch { channel, .. }
            | Self::PitchBend { channel, .. } => channel,
        }
    }
}

/// Combine the two 7 bit data bytes of a pitch bend message.
pub fn pitch_bend_value(lsb: u8, msb: u8) -> i16 {
    let raw = ((u16::from(msb & 0x7F) << 8) | (u16::from(lsb & 0x7F) << 1)) >> 1;
    // at most 14 bits
    raw as i16 - PITCH_BEND_CENTER
}

/// Descriptive label of a controller number.
pub const fn controller_name(controller: u8) -> Option<&'static str> {
    let name = match controller {
        0 => "Bank Select",
        1 => "Modulation",
        2 => "Breath Controller",
        4 => "Foot Controller",
        5 => "Portamento Time",
        6 => "Data Entry (MSB)",
        7 => "Main Volume",
        8 => "Balance",
        10 => "Pan",
        11 => "Expression Controller",
        12 => "Effect Control 1",
        13 => "Effect Control 2",
        16 => "General-Purpose Controller 1",
        17 => "General-Purpose Controller 2",
        18 => "General-Purpose Controller 3",
        19 => "General-Purpose Controller 4",
        32 => "LSB for controller 0",
        33 => "LSB for controller 1",
        34 => "LSB for controller 2",
        35 => "LSB for controller 3",
        36 => "LSB for controller 4",
        37 => "LSB for controller 5",
        38 => "LSB for controller 6",
        39 => "LSB for controller 7",
        40 => "LSB for controller 8",
        41 => "LSB for controller 9",
        42 => "LSB for controller 10",
        43 => "LSB for controller 11",
        44 => "LSB for controller 12",
        45 => "LSB for controller 13",
        46 => "LSB for controller 14",
        47 => "LSB for controller 15",
        48 => "LSB for controller 16",
        49 => "LSB for controller 17",
        50 => "LSB for controller 18",
        51 => "LSB for controller 19",
        52 => "LSB for controller 20",
        53 => "LSB for controller 21",
        54 => "LSB for controller 22",
        55 => "LSB for controller 23",
        56 => "LSB for controller 24",
        57 => "LSB for controller 25",
        58 => "LSB for controller 26",
        59 => "LSB for controller 27",
        60 => "LSB for controller 28",
        61 => "LSB for controller 29",
        62 => "LSB for controller 30",
        63 => "LSB for controller 31",
        64 => "Damper Pedal (Sustain)",
        65 => "Portamento",
        66 => "Sostenuto",
        67 => "Soft Pedal",
        68 => "Legato Footswitch",
        69 => "Hold 2",
        70 => "Sound Controller 1 (Timber Variation)",
        71 => "Sound Controller 2 (Timber/Harmonic Content)",
        72 => "Sound Controller 3 (Release Time)",
        73 => "Sound Controller 4 (Attack Time)",
        74 => "Sound Controller 5",
        75 => "Sound Controller 6",
        76 => "Sound Controller 7",
        77 => "Sound Controller 8",
        78 => "Sound Controller 9",
        79 => "Sound Controller 10",
        80 => "General-Purpose Controller 5",
        81 => "General-Purpose Controller 6",
        82 => "General-Purpose Controller 7",
        83 => "General-Purpose Controller 8",
        84 => "Portamento Control",
        91 => "Effects 1 Depth",
        92 => "Effects 2 Depth",
        93 => "Effects 3 Depth",
        94 => "Effects 4 Depth",
        95 => "Effects 5 Depth",
        96 => "Data Increment",
        97 => "Data Decrement",
        98 => "Non-Registered Parameter Number (LSB)",
        99 => "Non-Registered Parameter Number (MSB)",
        100 => "Registered Parameter Number (LSB)",
        101 => "Registered Parameter Number (MSB)",
        121..=127 => "Mode Message",
        _ => return None,
    };
    Some(name)
}

/// Channel voice decoder for a single track.
///
/// Keeps the last status and channel to resolve running status.
/// A new parser must be used for every track.
#[derive(Debug, Default)]
pub struct ChannelVoiceParser {
    running_status: Option<(ChannelStatus, u8)>,
}

impl ChannelVoiceParser {
    pub const fn new() -> Self {
        Self {
            running_status: None,
        }
    }

    /// Parse a channel voice message, with or without its status byte.
    pub fn parse_event<'a>(&mut self, i: &'a [u8]) -> SmfResult<'a, ChannelVoiceEvent> {
        let (rest, status_byte) = parse_u8(i)?;
        let (i, status, channel) = match ChannelStatus::from_status_byte(status_byte) {
            Some(status) => (rest, status, status_byte & 0x0F),
            None => {
                // data byte or system status, the previous status applies
                let Some((status, channel)) = self.running_status else {
                    log::debug!("Status 0x{status_byte:02X} without running status");
                    return fail(i, DecodeErrorKind::UnknownChannelStatus(status_byte));
                };
                (i, status, channel)
            }
        };
        self.running_status = Some((status, channel));

        match status {
            ChannelStatus::NoteOff => map((parse_u8, parse_u8), |(note, velocity)| {
                ChannelVoiceEvent::NoteOff {
                    channel,
                    note,
                    velocity,
                }
            })
            .parse(i),
            ChannelStatus::NoteOn => map((parse_u8, parse_u8), |(note, velocity)| {
                ChannelVoiceEvent::NoteOn {
                    channel,
                    note,
                    velocity,
                }
            })
            .parse(i),
            ChannelStatus::PolyAftertouch => map((parse_u8, parse_u8), |(note, pressure)| {
                ChannelVoiceEvent::PolyAftertouch {
                    channel,
                    note,
                    pressure,
                }
            })
            .parse(i),
            ChannelStatus::Controller => map((parse_u8, parse_u8), |(controller, value)| {
                ChannelVoiceEvent::Controller {
                    channel,
                    controller,
                    value,
                }
            })
            .parse(i),
            ChannelStatus::ProgramChange => map(parse_u8, |program| {
                ChannelVoiceEvent::ProgramChange { channel, program }
            })
            .parse(i),
            ChannelStatus::ChannelAftertouch => map(parse_u8, |pressure| {
                ChannelVoiceEvent::ChannelAftertouch { channel, pressure }
            })
            .parse(i),
            ChannelStatus::PitchBend => map((parse_u8, parse_u8), |(lsb, msb)| {
                ChannelVoiceEvent::PitchBend {
                    channel,
                    value: pitch_bend_value(lsb, msb),
                }
            })
            .parse(i),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nom::Offset;

    #[test]
    fn test_running_status() {
        let data = [0x90, 0x40, 0x7F, 0x40, 0x00];
        let mut parser = ChannelVoiceParser::new();

        let (rest, event) = parser.parse_event(&data).unwrap();
        assert_eq!(
            event,
            ChannelVoiceEvent::NoteOn {
                channel: 0,
                note: 0x40,
                velocity: 0x7F
            }
        );
        assert_eq!(data.offset(rest), 3);

        let (last, event) = parser.parse_event(rest).unwrap();
        assert_eq!(
            event,
            ChannelVoiceEvent::NoteOn {
                channel: 0,
                note: 0x40,
                velocity: 0
            }
        );
        assert_eq!(rest.offset(last), 2);
        assert!(last.is_empty());
    }

    #[test]
    fn test_running_status_one_data_byte() {
        let data = [0xC5, 0x10, 0x11];
        let mut parser = ChannelVoiceParser::new();
        let (rest, event) = parser.parse_event(&data).unwrap();
        assert_eq!(
            event,
            ChannelVoiceEvent::ProgramChange {
                channel: 5,
                program: 0x10
            }
        );
        let (rest, event) = parser.parse_event(rest).unwrap();
        assert!(rest.is_empty());
        assert_eq!(
            event,
            ChannelVoiceEvent::ProgramChange {
                channel: 5,
                program: 0x11
            }
        );
    }

    #[test]
    fn test_status_change_updates_running_status() {
        let data = [0x90, 0x3C, 0x40, 0x83, 0x3C, 0x00, 0x3E, 0x00];
        let mut parser = ChannelVoiceParser::new();
        let (rest, _) = parser.parse_event(&data).unwrap();
        let (rest, _) = parser.parse_event(rest).unwrap();
        let (_rest, event) = parser.parse_event(rest).unwrap();
        assert_eq!(
            event,
            ChannelVoiceEvent::NoteOff {
                channel: 3,
                note: 0x3E,
                velocity: 0
            }
        );
        assert_eq!(event.channel(), 3);
    }

    #[test]
    fn test_data_byte_without_running_status() {
        let data = [0x40, 0x7F];
        let mut parser = ChannelVoiceParser::new();
        let err = parser.parse_event(&data).unwrap_err();
        let nom::Err::Failure(err) = err else {
            panic!("expected failure, got {err:?}");
        };
        assert_eq!(err.kind, DecodeErrorKind::UnknownChannelStatus(0x40));
        assert_eq!(data.offset(err.input), 0);
    }

    #[test]
    fn test_system_status_is_rejected() {
        // no previous status to fall back on
        let mut parser = ChannelVoiceParser::new();
        let data = [0xF2, 0x00, 0x00];
        let err = parser.parse_event(&data).unwrap_err();
        let nom::Err::Failure(err) = err else {
            panic!("expected failure, got {err:?}");
        };
        assert_eq!(err.kind, DecodeErrorKind::UnknownChannelStatus(0xF2));
        assert_eq!(data.offset(err.input), 0);
    }

    #[test]
    fn test_system_status_uses_running_status() {
        let data = [0x90, 0x3C, 0x40, 0xF2, 0x00];
        let mut parser = ChannelVoiceParser::new();
        let (rest, _) = parser.parse_event(&data).unwrap();
        let (last, event) = parser.parse_event(rest).unwrap();
        assert!(last.is_empty());
        assert_eq!(
            event,
            ChannelVoiceEvent::NoteOn {
                channel: 0,
                note: 0xF2,
                velocity: 0
            }
        );
    }

    #[test]
    fn test_pitch_bend() {
        assert_eq!(pitch_bend_value(0x00, 0x40), 0);
        assert_eq!(pitch_bend_value(0x00, 0x00), -8192);
        assert_eq!(pitch_bend_value(0x7F, 0x7F), 8191);
        assert_eq!(pitch_bend_value(0x01, 0x40), 1);

        let mut parser = ChannelVoiceParser::new();
        let (_rest, event) = parser.parse_event(&[0xE2, 0x7F, 0x7F]).unwrap();
        assert_eq!(
            event,
            ChannelVoiceEvent::PitchBend {
                channel: 2,
                value: 8191
            }
        );
    }

    #[test]
    fn test_truncated_message() {
        let mut parser = ChannelVoiceParser::new();
        let err = parser.parse_event(&[0xB0, 0x07]).unwrap_err();
        let nom::Err::Error(err) = err else {
            panic!("expected recoverable error, got {err:?}");
        };
        assert_eq!(err.kind, DecodeErrorKind::TruncatedData);
    }

    #[test]
    fn test_status_from_byte() {
        assert_eq!(
            ChannelStatus::from_status_byte(0x93),
            Some(ChannelStatus::NoteOn)
        );
        assert_eq!(
            ChannelStatus::from_status_byte(0xCF),
            Some(ChannelStatus::ProgramChange)
        );
        assert_eq!(ChannelStatus::from_status_byte(0xF0), None);
        assert_eq!(ChannelStatus::from_status_byte(0x45), None);
    }

    #[test]
    fn test_controller_names() {
        assert_eq!(controller_name(7), Some("Main Volume"));
        assert_eq!(controller_name(64), Some("Damper Pedal (Sustain)"));
        assert_eq!(controller_name(123), Some("Mode Message"));
        assert_eq!(controller_name(3), None);
    }
}
