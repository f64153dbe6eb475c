use std::{
    fs::{create_dir_all, File},
    io::{BufReader, Write},
    path::PathBuf,
};

use home::home_dir;
use serde::{Deserialize, Serialize};

use midiscan::MidiError;

/// Default report sections, each one can be enabled from the command line as well.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    show_events: bool,
    #[serde(default)]
    show_notes: bool,
    #[serde(default)]
    show_bar_beat: bool,
}

impl Config {
    // folder placed in $HOME directory
    const FOLDER: &'static str = ".midiscan";

    pub const fn show_events(&self) -> bool {
        self.show_events
    }

    pub const fn show_notes(&self) -> bool {
        self.show_notes
    }

    pub const fn show_bar_beat(&self) -> bool {
        self.show_bar_beat
    }

    fn get_base_path() -> Result<PathBuf, MidiError> {
        let home = home_dir()
            .ok_or_else(|| MidiError::ConfigError("Could not find home directory".to_string()))?;
        let path = home.join(Self::FOLDER);
        Ok(path)
    }

    fn get_path() -> Result<PathBuf, MidiError> {
        let base = Self::get_base_path()?;
        Ok(base.join("config.json"))
    }

    /// Creates config if it does not exist
    pub fn read_config() -> Result<Self, MidiError> {
        let base_path = Self::get_base_path()?;
        if !base_path.exists() {
            create_dir_all(base_path)?;
        }
        let config_path = Self::get_path()?;
        if !config_path.exists() {
            // create default config
            Config::default().save_config()?;
        }
        let file = File::open(config_path)?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader).map_err(|err| {
            MidiError::ConfigError(format!("Could not read local configuration {err:}"))
        })?;
        log::debug!("{config:?}");
        Ok(config)
    }

    /// Assumes the config folder exists
    pub fn save_config(&self) -> Result<(), MidiError> {
        let config_path = Self::get_path()?;
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            MidiError::ConfigError(format!("Could not save local configuration {err:}"))
        })?;
        let mut file = File::create(config_path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
