use crate::analysis::note_builder::{Note, NoteBuilder};
use crate::error::DecodeErrorKind;
use crate::parser::channel_parser::{ChannelVoiceEvent, ChannelVoiceParser};
use crate::parser::meta_parser::{
    parse_meta_event, KeySignature, MetaEvent, Tempo, TimeSignature, META_MARKER,
};
use crate::parser::primitive_parser::{
    fail, parse_u32, parse_u8, parse_var_len, take_bytes, SmfResult,
};
use crate::parser::sysex_parser::{parse_sysex_event, SysexEvent, SYSEX_END, SYSEX_START};
use nom::combinator::map;
use nom::{Offset, Parser};

pub const TRACK_MAGIC: &[u8; 4] = b"MTrk";

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Ticks since the previous event of the track.
    pub delta_ticks: u32,
    /// Ticks since the start of the track.
    pub absolute_ticks: u64,
    /// Bytes consumed, delta time included.
    pub byte_length: usize,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Meta(MetaEvent),
    Sysex(SysexEvent),
    ChannelVoice(ChannelVoiceEvent),
}

impl Event {
    pub fn as_meta(&self) -> Option<&MetaEvent> {
        match &self.kind {
            EventKind::Meta(meta) => Some(meta),
            _ => None,
        }
    }

    pub fn as_channel_voice(&self) -> Option<&ChannelVoiceEvent> {
        match &self.kind {
            EventKind::ChannelVoice(message) => Some(message),
            _ => None,
        }
    }
}

/// Value found at a given tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timed<T> {
    pub ticks: u64,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Track {
    pub events: Vec<Event>,
}

impl Track {
    /// Declared chunk length, equal to the sum of the events byte lengths.
    pub fn byte_length(&self) -> usize {
        self.events.iter().map(|e| e.byte_length).sum()
    }

    /// Tick of the last event.
    pub fn end_ticks(&self) -> u64 {
        self.events.last().map_or(0, |e| e.absolute_ticks)
    }

    fn meta_events(&self) -> impl Iterator<Item = (u64, &MetaEvent)> {
        self.events
            .iter()
            .filter_map(|e| e.as_meta().map(|meta| (e.absolute_ticks, meta)))
    }

    /// First sequence/track name of the track.
    pub fn name(&self) -> Option<&str> {
        self.meta_events().find_map(|(_, meta)| match meta {
            MetaEvent::SequenceName(name) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn tempo_changes(&self) -> Vec<Timed<Tempo>> {
        self.meta_events()
            .filter_map(|(ticks, meta)| match meta {
                MetaEvent::SetTempo(tempo) => Some(Timed {
                    ticks,
                    value: *tempo,
                }),
                _ => None,
            })
            .collect()
    }

    pub fn time_signatures(&self) -> Vec<Timed<TimeSignature>> {
        self.meta_events()
            .filter_map(|(ticks, meta)| match meta {
                MetaEvent::TimeSignature(signature) => Some(Timed {
                    ticks,
                    value: *signature,
                }),
                _ => None,
            })
            .collect()
    }

    pub fn key_signatures(&self) -> Vec<Timed<KeySignature>> {
        self.meta_events()
            .filter_map(|(ticks, meta)| match meta {
                MetaEvent::KeySignature(signature) => Some(Timed {
                    ticks,
                    value: *signature,
                }),
                _ => None,
            })
            .collect()
    }

    /// Notes rebuilt from the note on/off pairs, recomputed on every call.
    pub fn notes(&self) -> Vec<Note> {
        NoteBuilder::new().build_for_track(self)
    }
}

/// Decodes the events of a single track chunk.
pub struct TrackParser {
    channel_parser: ChannelVoiceParser,
    absolute_ticks: u64,
}

impl TrackParser {
    /// Fresh parser, running status starts empty.
    pub const fn new() -> Self {
        Self {
            channel_parser: ChannelVoiceParser::new(),
            absolute_ticks: 0,
        }
    }

    /// Parse the whole chunk body, every byte must belong to an event.
    pub fn parse_events<'a>(&mut self, body: &'a [u8]) -> SmfResult<'a, Vec<Event>> {
        let mut i = body;
        let mut events = Vec::new();
        while !i.is_empty() {
            let (inner, event) = self.parse_event(i)?;
            i = inner;
            events.push(event);
        }
        if !matches!(
            events.last().and_then(Event::as_meta),
            Some(MetaEvent::EndOfTrack)
        ) {
            log::debug!("Track does not end with an end of track event");
        }
        Ok((i, events))
    }

    /// Parse delta time and event.
    pub fn parse_event<'a>(&mut self, i: &'a [u8]) -> SmfResult<'a, Event> {
        let start = i;
        let (i, delta) = parse_var_len(i)?;
        let (_, marker) = parse_u8(i)?;
        let (i, kind) = match marker {
            META_MARKER => map(parse_meta_event, EventKind::Meta).parse(i)?,
            SYSEX_START | SYSEX_END => map(parse_sysex_event, EventKind::Sysex).parse(i)?,
            _ => {
                let (i, message) = self.channel_parser.parse_event(i)?;
                (i, EventKind::ChannelVoice(message))
            }
        };
        self.absolute_ticks += u64::from(delta.value);
        let event = Event {
            delta_ticks: delta.value,
            absolute_ticks: self.absolute_ticks,
            byte_length: start.offset(i),
            kind,
        };
        log::debug!("{event:?}");
        Ok((i, event))
    }
}

impl Default for TrackParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a `MTrk` chunk.
pub fn parse_track(i: &[u8]) -> SmfResult<'_, Track> {
    let start = i;
    let (i, magic) = take_bytes(i, TRACK_MAGIC.len())?;
    if magic != TRACK_MAGIC {
        log::debug!("Expected track chunk, found {magic:02X?}");
        return fail(start, DecodeErrorKind::NotAMidiFile);
    }
    let (i, chunk_len) = parse_u32(i)?;
    log::debug!("Parsing track chunk of {chunk_len} bytes");
    let (rest, body) = take_bytes(i, chunk_len as usize)?;
    // running status never leaks from one track to the next
    let (_, events) = TrackParser::new().parse_events(body)?;
    Ok((rest, Track { events }))
}
