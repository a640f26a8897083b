//! Sound Tracker (STC) replayer for the AY-3-8910 / YM2149.
//!
//! This crate decodes compiled Sound Tracker songs and produces the values of
//! the 14 PSG registers once per frame (normally 50 Hz), exactly as the
//! ZX Spectrum driver would write them:
//! - Bounds-checked [`SongImage`] loader for the STC byte layout
//! - Pattern interpreter, sample/ornament mixer and tempo clock
//! - [`Sequencer`] producing a [`RegisterFrame`] per tick or mirroring the
//!   writes into any [`RegisterSink`]
//! - Optional ZX Spectrum port adapter and song metadata helpers
//!
//! # Example
//!
//! ```no_run
//! use ym2149_stc_replayer::{PlayerConfig, Sequencer, SongImage};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("song.stc")?;
//! let song = SongImage::load(bytes)?;
//! let mut sequencer = Sequencer::new(song, PlayerConfig::default().frame_limit(50 * 60));
//! for frame in sequencer.frames() {
//!     let frame = frame?;
//!     println!("{:02x?}", frame.registers);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod builder;
pub mod channel;
pub mod clock;
pub mod config;
pub mod error;
pub mod format;
pub mod metadata;
pub mod mixer;
pub mod pattern;
pub mod ports;
pub mod registers;
pub mod sequencer;
pub mod song;
pub mod tone_table;

pub use crate::builder::{OrnamentData, SampleData, SongBuilder};
pub use crate::channel::{ChannelState, EnvelopeMode};
pub use crate::config::{NoteOverflow, PlayerConfig};
pub use crate::error::{FormatError, PlaybackError, Result, TableKind};
pub use crate::metadata::{MetadataFields, StcMetadata, measure_song_frames};
pub use crate::ports::{AyPortDecoder, PortWriter, SpectrumPortBus};
pub use crate::registers::{ChipRegisters, MixerFlags, RegisterFrame, RegisterSink};
pub use crate::sequencer::{Frames, PlaybackState, Sequencer};
pub use crate::song::{SongImage, StcHeader};
pub use crate::tone_table::ToneTable;
