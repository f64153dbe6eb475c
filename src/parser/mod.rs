pub mod channel_parser;
pub mod meta_parser;
pub mod midi_parser;
pub mod primitive_parser;
pub mod sysex_parser;
pub mod track_parser;
