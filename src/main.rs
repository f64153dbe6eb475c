use crate::AppError::ConfigError;
use crate::report::ReportOptions;
use clap::Parser;
use config::Config;
use midiscan::{load_midi_file, MidiError};
use std::path::PathBuf;

mod config;
mod report;

fn main() {
    let result = main_result();
    std::process::exit(match result {
        Ok(()) => 0,
        Err(err) => {
            // use Display instead of Debug for user friendly error messages
            log::error!("{err}");
            1
        }
    });
}

pub fn main_result() -> Result<(), AppError> {
    // setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("midiscan=info"))
        .init();

    // args
    let args = CliArgs::parse();
    let midi_file_path = PathBuf::from(&args.midi_file_path);

    // check if MIDI file exists
    if !midi_file_path.exists() {
        let err = ConfigError(format!("MIDI file not found {midi_file_path:?}"));
        return Err(err);
    }

    // read local config, flags take precedence
    let local_config = Config::read_config()?;
    let options = ReportOptions {
        show_events: args.events || local_config.show_events(),
        show_notes: args.notes || local_config.show_notes(),
        show_bar_beat: args.bar_beat || local_config.show_bar_beat(),
    };

    // go!
    let midi_file = load_midi_file(&midi_file_path)?;
    if let Some(track) = args.track {
        if track >= midi_file.tracks.len() {
            let err = ConfigError(format!(
                "Track {track} not found, the file has {} tracks",
                midi_file.tracks.len()
            ));
            return Err(err);
        }
    }
    report::print_report(&midi_file, args.track, options);
    Ok(())
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the Standard MIDI File.
    midi_file_path: String,
    /// Print every decoded event.
    #[arg(long, default_value_t = false)]
    events: bool,
    /// Print the notes rebuilt from note on/off pairs.
    #[arg(long, default_value_t = false)]
    notes: bool,
    /// Print positions as beat:ticks instead of raw ticks.
    #[arg(long, default_value_t = false)]
    bar_beat: bool,
    /// Only report the track at this index (starting at 0).
    #[arg(long)]
    track: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    ConfigError(String),
    #[error("parsing error: {0}")]
    ParsingError(String),
    #[error("other error: {0}")]
    OtherError(String),
}

impl From<MidiError> for AppError {
    fn from(error: MidiError) -> Self {
        match error {
            MidiError::DecodeError(e) => Self::ParsingError(e.to_string()),
            MidiError::ConfigError(s) => Self::ConfigError(s),
            MidiError::IoError(e) => Self::OtherError(e.to_string()),
        }
    }
}
