//! Midiscan - Standard MIDI File decoder
//!
//! This library provides:
//! - Decoding of Standard MIDI Files (formats 0, 1 and 2) into tracks of timed events
//! - Meta, system exclusive and channel voice events, running status included
//! - Note reconstruction from note on/off pairs
//! - Tick to beat conversion and note length labels
//!
//! # Example
//!
//! ```no_run
//! use midiscan::{parse_midi_data, TimeConverter};
//!
//! let file_data = std::fs::read("song.mid").unwrap();
//! let midi_file = parse_midi_data(&file_data).unwrap();
//! let converter = TimeConverter::new(midi_file.header.division).unwrap();
//! for note in midi_file.tracks[0].notes() {
//!     println!("{note} {}", converter.note_length(note.duration_ticks).label());
//! }
//! ```

pub mod analysis;
pub mod error;
pub mod loader;
pub mod parser;

// Re-export main types for convenience
pub use analysis::{
    note_builder::{Note, NoteBuilder},
    time_converter::{NoteLength, TimeConverter},
};
pub use error::{DecodeError, DecodeErrorKind, MidiError};
pub use loader::{load_midi_file, load_midi_file_async, load_midi_file_with};
pub use parser::channel_parser::{controller_name, ChannelVoiceEvent};
pub use parser::meta_parser::{KeySignature, MetaEvent, Mode, Tempo, TimeSignature};
pub use parser::midi_parser::{parse_midi_data, Division, Format, Header, MidiFile};
pub use parser::primitive_parser::{read_var_len, VarLen};
pub use parser::sysex_parser::SysexEvent;
pub use parser::track_parser::{Event, EventKind, Timed, Track};
