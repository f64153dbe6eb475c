use crate::error::MidiError;
use crate::parser::midi_parser::{parse_midi_data, MidiFile};
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|f| f.to_str())
        .map(|f| f.to_string())
        .unwrap_or_default()
}

/// Reads and decodes a MIDI file, blocking the current thread.
pub fn load_midi_file(path: impl AsRef<Path>) -> Result<MidiFile, MidiError> {
    let path = path.as_ref();
    log::info!("Loading file: {:?}", file_name(path));
    let file_data = std::fs::read(path)?;
    Ok(parse_midi_data(&file_data)?)
}

/// Reads the file through the async runtime, decoding happens once the bytes are in memory.
pub async fn load_midi_file_async(path: impl Into<PathBuf>) -> Result<MidiFile, MidiError> {
    let path = path.into();
    log::info!("Loading file: {:?}", file_name(&path));
    let file_data = tokio::fs::read(&path).await?;
    Ok(parse_midi_data(&file_data)?)
}

/// Loads the file on a runtime task and hands the outcome to `on_complete`.
///
/// Must be called from within a tokio runtime.
pub fn load_midi_file_with<F>(path: impl Into<PathBuf>, on_complete: F) -> JoinHandle<()>
where
    F: FnOnce(Result<MidiFile, MidiError>) + Send + 'static,
{
    let path = path.into();
    tokio::spawn(async move {
        let result = load_midi_file_async(path).await;
        on_complete(result);
    })
}
