//! Song metadata and loop-length measurement.

use serde::Serialize;

use crate::config::PlayerConfig;
use crate::error::Result;
use crate::sequencer::Sequencer;
use crate::song::SongImage;

/// Common metadata accessors for a loaded song.
pub trait MetadataFields {
    /// Song title (the STC identifier text).
    fn title(&self) -> &str;

    /// Author; STC images do not store one.
    fn author(&self) -> &str {
        ""
    }

    /// Format name.
    fn format(&self) -> &str {
        "STC"
    }

    /// Frames in one pass through the positions list, if known.
    fn frame_count(&self) -> Option<usize> {
        None
    }

    /// Playback frame rate in Hz.
    fn frame_rate(&self) -> u32 {
        50
    }

    /// Song duration in seconds, if known.
    fn duration_seconds(&self) -> Option<f32> {
        self.frame_count()
            .map(|frames| frames as f32 / self.frame_rate() as f32)
    }
}

/// Metadata of an STC song.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StcMetadata {
    /// Identifier text from the header.
    pub identifier: String,
    /// Image size declared in the header.
    pub declared_size: u16,
    /// Image size actually loaded.
    pub image_size: usize,
    /// Frames per pattern step.
    pub tempo: u8,
    /// Entries in the positions list.
    pub position_count: u8,
    /// Frame rate used for the duration.
    pub frame_rate: u32,
    /// Measured length of one pass, `None` if it was not measured or did not finish.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_count: Option<usize>,
    /// Length in seconds derived from `frame_count`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f32>,
}

impl StcMetadata {
    /// Header-only metadata; no playback is performed.
    pub fn from_song(song: &SongImage, config: &PlayerConfig) -> Self {
        let header = song.header();
        Self {
            identifier: header.identifier.clone(),
            declared_size: header.declared_size,
            image_size: song.len(),
            tempo: header.tempo,
            position_count: header.song_length,
            frame_rate: config.frame_rate,
            frame_count: None,
            duration_seconds: None,
        }
    }

    /// Metadata including the measured song length, playing at most `limit` frames.
    pub fn measure(song: &SongImage, config: &PlayerConfig, limit: usize) -> Result<Self> {
        let mut metadata = Self::from_song(song, config);
        metadata.frame_count = measure_song_frames(song, limit)?;
        metadata.duration_seconds = metadata.duration_seconds();
        Ok(metadata)
    }
}

impl MetadataFields for StcMetadata {
    fn title(&self) -> &str {
        &self.identifier
    }

    fn frame_count(&self) -> Option<usize> {
        self.frame_count
    }

    fn frame_rate(&self) -> u32 {
        self.frame_rate
    }
}

/// Frames played before the positions list wraps back to position 0.
///
/// Runs a fresh sequencer for at most `limit` frames; returns `Ok(None)` if
/// the song did not wrap in time.
pub fn measure_song_frames(song: &SongImage, limit: usize) -> Result<Option<usize>> {
    let mut sequencer = Sequencer::new(song.clone(), PlayerConfig::default());
    let mut entered = 0;
    let mut starts = 0;
    while sequencer.frame_count() < limit {
        sequencer.tick()?;
        let state = sequencer.playback_state();
        if state.positions_entered == entered {
            continue;
        }
        entered = state.positions_entered;
        if state.current_position == Some(0) {
            starts += 1;
            if starts == 2 {
                return Ok(Some(sequencer.frame_count() - 1));
            }
        }
    }
    Ok(None)
}
