pub mod note_builder;
pub mod time_converter;
