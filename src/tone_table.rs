//! Note to tone-period lookup used by the Sound Tracker driver.
//!
//! The driver ships its own 96-entry table (eight octaves). Periods are for
//! the ZX Spectrum AY clock and decrease as pitch rises.

use log::warn;

use crate::error::{PlaybackError, Result};

/// Number of notes covered by the table.
pub const NOTE_COUNT: usize = 96;

/// AY clock of the ZX Spectrum 128 (Hz).
pub const ZX_AY_CLOCK_HZ: f32 = 1_773_400.0;

const PERIOD_DENOMINATOR: f32 = 16.0;

const PERIODS: [u16; NOTE_COUNT] = [
    3832, 3600, 3424, 3200, 3032, 2856, 2696, 2544, 2400, 2272, 2136, 2016, 1916, 1800, 1712, 1600,
    1516, 1428, 1348, 1272, 1200, 1136, 1068, 1008, 958, 900, 856, 800, 758, 714, 674, 636, 600,
    568, 534, 504, 479, 450, 428, 400, 379, 357, 337, 318, 300, 284, 267, 252, 239, 225, 214, 200,
    189, 178, 168, 159, 150, 142, 133, 126, 119, 112, 107, 100, 94, 89, 84, 79, 75, 71, 66, 63,
    59, 56, 53, 50, 47, 44, 42, 39, 37, 35, 33, 31, 29, 28, 26, 25, 23, 22, 21, 19, 18, 17, 16,
    15,
];

/// Static tone-period table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToneTable;

impl ToneTable {
    /// Tone period for `note`, failing for notes outside the table.
    pub fn lookup(note: u8) -> Result<u16> {
        PERIODS
            .get(usize::from(note))
            .copied()
            .ok_or(PlaybackError::NoteOutOfRange { note })
    }

    /// Tone period for `note`, clamping notes past the table to the highest entry.
    pub fn lookup_clamped(note: u8) -> u16 {
        match Self::lookup(note) {
            Ok(period) => period,
            Err(_) => {
                warn!("note {note} past the tone table, clamped to {}", NOTE_COUNT - 1);
                PERIODS[NOTE_COUNT - 1]
            }
        }
    }

    /// All periods, lowest note first.
    pub fn periods() -> &'static [u16; NOTE_COUNT] {
        &PERIODS
    }

    /// Frequency of `note` for a given AY master clock.
    pub fn frequency(note: u8, clock_hz: f32) -> Option<f32> {
        let period = Self::lookup(note).ok()?;
        Some(clock_hz / (PERIOD_DENOMINATOR * f32::from(period)))
    }
}
