//! Playback options.

use serde::{Deserialize, Serialize};

/// Default frame rate of the interrupt driving the player (Hz).
pub const DEFAULT_FRAME_RATE: u32 = 50;

/// Behaviour when a transposed note lands past the 96-entry tone table.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoteOverflow {
    /// Use the highest table entry and log a warning.
    #[default]
    Clamp,
    /// Stop with [`crate::PlaybackError::NoteOutOfRange`].
    Fail,
}

/// Configuration for a [`crate::Sequencer`].
///
/// Missing fields fall back to their defaults when deserializing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Handling of notes past the tone table.
    pub note_overflow: NoteOverflow,
    /// Upper bound on the frames yielded by [`crate::Sequencer::frames`].
    pub frame_limit: Option<usize>,
    /// Frames per second, used for duration reporting only.
    pub frame_rate: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            note_overflow: NoteOverflow::Clamp,
            frame_limit: None,
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

impl PlayerConfig {
    /// Set the note overflow policy.
    pub fn note_overflow(mut self, policy: NoteOverflow) -> Self {
        self.note_overflow = policy;
        self
    }

    /// Stop the frame iterator after `limit` frames.
    pub fn frame_limit(mut self, limit: usize) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    /// Set the frame rate; 0 is replaced by the default.
    pub fn frame_rate(mut self, rate: u32) -> Self {
        self.frame_rate = if rate == 0 { DEFAULT_FRAME_RATE } else { rate };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_clamp_at_fifty_hz() {
        let config = PlayerConfig::default();
        assert_eq!(config.note_overflow, NoteOverflow::Clamp);
        assert_eq!(config.frame_limit, None);
        assert_eq!(config.frame_rate, 50);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: PlayerConfig =
            serde_json::from_str(r#"{ "note_overflow": "fail", "frame_limit": 500 }"#).unwrap();
        assert_eq!(config.note_overflow, NoteOverflow::Fail);
        assert_eq!(config.frame_limit, Some(500));
        assert_eq!(config.frame_rate, DEFAULT_FRAME_RATE);
    }

    #[test]
    fn builder_rejects_zero_rate() {
        let config = PlayerConfig::default().frame_rate(0).frame_limit(3);
        assert_eq!(config.frame_rate, DEFAULT_FRAME_RATE);
        assert_eq!(config.frame_limit, Some(3));
    }
}
