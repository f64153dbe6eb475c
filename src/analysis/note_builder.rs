use crate::parser::channel_parser::ChannelVoiceEvent;
use crate::parser::track_parser::{Event, Track};
use std::collections::{HashMap, VecDeque};
use std::fmt::Display;

const SHARP_NOTES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A note rebuilt from a note on and its matching note off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    pub channel: u8,
    pub note_number: u8,
    pub start_ticks: u64,
    pub end_ticks: u64,
    pub duration_ticks: u64,
    pub velocity_on: u8,
    pub velocity_off: u8,
}

impl Note {
    /// Scientific pitch notation, middle C (60) is `C4`.
    pub fn pitch_name(&self) -> String {
        let name = SHARP_NOTES[usize::from(self.note_number % 12)];
        let octave = i32::from(self.note_number / 12) - 1;
        format!("{name}{octave}")
    }
}

impl Display for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ch:{} [{}..{}] velocity:{}/{}",
            self.pitch_name(),
            self.channel,
            self.start_ticks,
            self.end_ticks,
            self.velocity_on,
            self.velocity_off
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingNote {
    start_ticks: u64,
    velocity: u8,
}

/// Pairs note on/off events of a single track.
pub struct NoteBuilder {
    open_notes: HashMap<(u8, u8), VecDeque<PendingNote>>, // keyed by (channel, note)
    notes: Vec<Note>,                                     // in completion order
}

impl NoteBuilder {
    pub fn new() -> Self {
        Self {
            open_notes: HashMap::new(),
            notes: Vec::new(),
        }
    }

    /// Consume the track events and return the notes in the order they were closed.
    pub fn build_for_track(mut self, track: &Track) -> Vec<Note> {
        for event in &track.events {
            self.push_event(event);
        }
        let still_open: usize = self.open_notes.values().map(VecDeque::len).sum();
        if still_open > 0 {
            log::debug!("Dropping {still_open} notes without note off at end of track");
        }
        self.notes
    }

    /// Record a single event, anything but note on/off is ignored.
    pub fn push_event(&mut self, event: &Event) {
        match event.as_channel_voice() {
            Some(&ChannelVoiceEvent::NoteOn {
                channel,
                note,
                velocity,
            }) if velocity > 0 => {
                self.open_notes
                    .entry((channel, note))
                    .or_default()
                    .push_back(PendingNote {
                        start_ticks: event.absolute_ticks,
                        velocity,
                    });
            }
            // note on with zero velocity is a note off
            Some(
                &ChannelVoiceEvent::NoteOn {
                    channel,
                    note,
                    velocity,
                }
                | &ChannelVoiceEvent::NoteOff {
                    channel,
                    note,
                    velocity,
                },
            ) => self.close_note(channel, note, velocity, event.absolute_ticks),
            _ => {}
        }
    }

    fn close_note(&mut self, channel: u8, note_number: u8, velocity_off: u8, end_ticks: u64) {
        let Some(pending) = self
            .open_notes
            .get_mut(&(channel, note_number))
            .and_then(VecDeque::pop_front)
        else {
            log::debug!("Ignoring note off without note on ch:{channel} note:{note_number}");
            return;
        };
        self.notes.push(Note {
            channel,
            note_number,
            start_ticks: pending.start_ticks,
            end_ticks,
            // hand built tracks may close a note before it started
            duration_ticks: end_ticks.saturating_sub(pending.start_ticks),
            velocity_on: pending.velocity,
            velocity_off,
        });
    }
}

impl Default for NoteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::track_parser::EventKind;

    fn event(absolute_ticks: u64, message: ChannelVoiceEvent) -> Event {
        Event {
            delta_ticks: 0,
            absolute_ticks,
            byte_length: 0,
            kind: EventKind::ChannelVoice(message),
        }
    }

    fn note_on(ticks: u64, channel: u8, note: u8, velocity: u8) -> Event {
        event(
            ticks,
            ChannelVoiceEvent::NoteOn {
                channel,
                note,
                velocity,
            },
        )
    }

    fn note_off(ticks: u64, channel: u8, note: u8, velocity: u8) -> Event {
        event(
            ticks,
            ChannelVoiceEvent::NoteOff {
                channel,
                note,
                velocity,
            },
        )
    }

    fn build(events: Vec<Event>) -> Vec<Note> {
        NoteBuilder::new().build_for_track(&Track { events })
    }

    #[test]
    fn test_single_note() {
        let notes = build(vec![note_on(0, 0, 60, 64), note_off(480, 0, 60, 0)]);
        assert_eq!(
            notes,
            vec![Note {
                channel: 0,
                note_number: 60,
                start_ticks: 0,
                end_ticks: 480,
                duration_ticks: 480,
                velocity_on: 64,
                velocity_off: 0,
            }]
        );
    }

    #[test]
    fn test_zero_velocity_note_on_closes() {
        let notes = build(vec![note_on(10, 3, 40, 100), note_on(20, 3, 40, 0)]);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].channel, 3);
        assert_eq!(notes[0].start_ticks, 10);
        assert_eq!(notes[0].duration_ticks, 10);
        assert_eq!(notes[0].velocity_off, 0);
    }

    #[test]
    fn test_overlapping_same_pitch_is_fifo() {
        let notes = build(vec![
            note_on(0, 0, 60, 10),
            note_on(100, 0, 60, 20),
            note_off(200, 0, 60, 1),
            note_off(300, 0, 60, 2),
        ]);
        assert_eq!(notes.len(), 2);
        assert_eq!((notes[0].start_ticks, notes[0].end_ticks), (0, 200));
        assert_eq!(notes[0].velocity_on, 10);
        assert_eq!((notes[1].start_ticks, notes[1].end_ticks), (100, 300));
        assert_eq!(notes[1].velocity_on, 20);
    }

    #[test]
    fn test_emission_order_follows_note_off() {
        let notes = build(vec![
            note_on(0, 0, 60, 64),
            note_on(0, 0, 64, 64),
            note_off(100, 0, 64, 0),
            note_off(200, 0, 60, 0),
        ]);
        let numbers: Vec<u8> = notes.iter().map(|n| n.note_number).collect();
        assert_eq!(numbers, vec![64, 60]);
    }

    #[test]
    fn test_channels_are_independent() {
        let notes = build(vec![
            note_on(0, 0, 60, 64),
            note_off(50, 1, 60, 0),
            note_off(100, 0, 60, 0),
        ]);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].channel, 0);
        assert_eq!(notes[0].end_ticks, 100);
    }

    #[test]
    fn test_orphans_and_open_notes_dropped() {
        let notes = build(vec![
            note_off(0, 0, 50, 0),
            note_on(10, 0, 52, 64),
            event(
                20,
                ChannelVoiceEvent::ProgramChange {
                    channel: 0,
                    program: 1,
                },
            ),
        ]);
        assert!(notes.is_empty());
    }

    #[test]
    fn test_note_off_before_note_on_tick() {
        let notes = build(vec![note_on(100, 0, 60, 64), note_on(50, 0, 60, 0)]);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].start_ticks, 100);
        assert_eq!(notes[0].end_ticks, 50);
        assert_eq!(notes[0].duration_ticks, 0);
    }

    #[test]
    fn test_pitch_name() {
        let mut note = build(vec![note_on(0, 0, 60, 64), note_off(1, 0, 60, 0)])[0];
        assert_eq!(note.pitch_name(), "C4");
        note.note_number = 0;
        assert_eq!(note.pitch_name(), "C-1");
        note.note_number = 70;
        assert_eq!(note.pitch_name(), "A#4");
        note.note_number = 127;
        assert_eq!(note.pitch_name(), "G9");
    }
}
