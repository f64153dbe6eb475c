use crate::error::{DecodeError, DecodeErrorKind};
use crate::parser::midi_parser::{Division, DIVISION_OFFSET};
use std::fmt::Display;

/// Denominators of the whole to 1/64 note units.
pub const NOTE_UNITS: [u64; 7] = [1, 2, 4, 8, 16, 32, 64];

// durations are scaled so that a 1/64 note is always a whole number of units
const SCALE: u64 = 16;

/// Breakdown of a duration into whole, half ... 1/64 notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteLength {
    /// Count per unit, indexed like `NOTE_UNITS`.
    pub counts: [u64; 7],
    /// Ticks left below a 1/64 note, rounded down.
    pub leftover_ticks: u64,
    exact: bool,
}

impl NoteLength {
    /// True when the units cover the duration without leftover.
    pub const fn is_exact(&self) -> bool {
        self.exact
    }

    /// Label such as `1/4` or `1/2 + 1/8`, `0` below a 1/64 note.
    pub fn label(&self) -> String {
        let parts: Vec<String> = self
            .counts
            .iter()
            .zip(NOTE_UNITS)
            .filter(|(count, _)| **count > 0)
            .map(|(count, denominator)| format!("{count}/{denominator}"))
            .collect();
        if parts.is_empty() {
            "0".to_string()
        } else {
            parts.join(" + ")
        }
    }
}

impl Display for NoteLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())?;
        if !self.exact {
            write!(f, " (~)")?;
        }
        Ok(())
    }
}

/// Converts ticks into musical positions for a ticks per beat division.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeConverter {
    ticks_per_beat: u16,
}

impl TimeConverter {
    pub fn new(division: Division) -> Result<Self, DecodeError> {
        match division {
            Division::TicksPerBeat(ticks_per_beat) if ticks_per_beat > 0 => {
                Ok(Self { ticks_per_beat })
            }
            Division::TicksPerBeat(_) => {
                log::warn!("Division of zero ticks per beat");
                Err(DecodeError::new(
                    DIVISION_OFFSET,
                    DecodeErrorKind::UnsupportedTimeFormat,
                ))
            }
            Division::Smpte { .. } => Err(DecodeError::new(
                DIVISION_OFFSET,
                DecodeErrorKind::UnsupportedTimeFormat,
            )),
        }
    }

    pub const fn ticks_per_beat(&self) -> u16 {
        self.ticks_per_beat
    }

    /// Beat index and ticks into that beat.
    pub fn bar_beat(&self, ticks: u64) -> (u64, u64) {
        let ticks_per_beat = u64::from(self.ticks_per_beat);
        (ticks / ticks_per_beat, ticks % ticks_per_beat)
    }

    /// Greedy decomposition, largest unit first.
    pub fn note_length(&self, duration_ticks: u64) -> NoteLength {
        let ticks_per_beat = u64::from(self.ticks_per_beat);
        let mut remaining = duration_ticks.saturating_mul(SCALE);
        let mut counts = [0; 7];
        for (k, count) in counts.iter_mut().enumerate() {
            // whole note is four beats
            let unit = (ticks_per_beat * 4 * SCALE) >> k;
            *count = remaining / unit;
            remaining %= unit;
        }
        NoteLength {
            counts,
            leftover_ticks: remaining / SCALE,
            exact: remaining == 0,
        }
    }
}
