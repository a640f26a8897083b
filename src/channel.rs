//! Per-channel playback state.

use crate::format::{OrnamentRef, SampleRef, STEP_COUNT};

/// `remaining_note_ticks` value of a silent channel.
pub const CHANNEL_FINISHED: u8 = 0xff;
/// Sample steps granted by a fresh note.
pub const NOTE_TICKS: u8 = STEP_COUNT as u8;

/// Volume mode of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeMode {
    /// Plain 4-bit volume.
    #[default]
    Simple,
    /// An envelope command ran; the envelope registers go out with the next flush.
    Triggered,
    /// Envelope stays enabled on the volume register without being restarted.
    Sustained,
}

impl EnvelopeMode {
    /// Whether the hardware envelope drives this channel's volume.
    pub fn is_envelope(&self) -> bool {
        !matches!(self, EnvelopeMode::Simple)
    }
}

/// State of one of the three tracker channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelState {
    /// Next pattern byte; `None` until the first position is entered.
    pub pattern_cursor: Option<usize>,
    /// Ticks left before the pattern advances again.
    pub note_duration_counter: u8,
    /// Value reloaded into the counter on underflow.
    pub note_duration_reload: u8,
    /// Current note (0..=0x5f from the pattern).
    pub note: u8,
    /// Selected sample; `None` plays an all-zero sample.
    pub sample: Option<SampleRef>,
    /// Selected ornament.
    pub ornament: OrnamentRef,
    /// Sample/ornament step played on the next frame (0..=31).
    pub sample_step_index: u8,
    /// Volume mode.
    pub envelope_mode: EnvelopeMode,
    /// Frames left in the current sample run, [`CHANNEL_FINISHED`] when silent.
    pub remaining_note_ticks: u8,
}

impl ChannelState {
    /// Silent channel with the default ornament selected.
    pub fn new(ornament: OrnamentRef) -> Self {
        Self {
            pattern_cursor: None,
            note_duration_counter: 0,
            note_duration_reload: 0,
            note: 0,
            sample: None,
            ornament,
            sample_step_index: 0,
            envelope_mode: EnvelopeMode::Simple,
            remaining_note_ticks: CHANNEL_FINISHED,
        }
    }

    /// Whether the channel is silent.
    pub fn is_finished(&self) -> bool {
        self.remaining_note_ticks == CHANNEL_FINISHED
    }

    /// Silence the channel.
    pub fn finish(&mut self) {
        self.remaining_note_ticks = CHANNEL_FINISHED;
    }

    /// Start a note from the first sample step.
    pub fn start_note(&mut self, note: u8) {
        self.note = note;
        self.sample_step_index = 0;
        self.remaining_note_ticks = NOTE_TICKS;
    }

    /// Count down one pattern tick. Returns `true` when the pattern must advance.
    ///
    /// Underflow is detected on the sign bit, so reload values of 0x80 and above
    /// advance the pattern on every tick.
    pub fn tick_duration(&mut self) -> bool {
        self.note_duration_counter = self.note_duration_counter.wrapping_sub(1);
        if self.note_duration_counter & 0x80 == 0 {
            return false;
        }
        self.note_duration_counter = self.note_duration_reload;
        true
    }

    /// Set both the live counter and its reload value.
    pub fn set_duration(&mut self, duration: u8) {
        self.note_duration_counter = duration;
        self.note_duration_reload = duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> ChannelState {
        ChannelState::new(OrnamentRef(0))
    }

    #[test]
    fn new_channel_is_silent() {
        let ch = channel();
        assert!(ch.is_finished());
        assert!(!ch.envelope_mode.is_envelope());
        assert!(EnvelopeMode::Sustained.is_envelope());
        assert_eq!(ch.pattern_cursor, None);
    }

    #[test]
    fn zero_duration_advances_every_tick() {
        let mut ch = channel();
        assert!((0..5).all(|_| ch.tick_duration()));
    }

    #[test]
    fn duration_holds_for_reload_plus_one_ticks() {
        let mut ch = channel();
        ch.set_duration(2);
        let ticks: Vec<bool> = (0..6).map(|_| ch.tick_duration()).collect();
        assert_eq!(ticks, [false, false, true, false, false, true]);
    }

    #[test]
    fn start_note_resets_sample_run() {
        let mut ch = channel();
        ch.sample_step_index = 17;
        ch.start_note(0x24);
        assert_eq!(ch.note, 0x24);
        assert_eq!(ch.sample_step_index, 0);
        assert_eq!(ch.remaining_note_ticks, NOTE_TICKS);
        assert!(!ch.is_finished());
    }
}
