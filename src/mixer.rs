//! Per-frame channel mixing: sample step, ornament, tone lookup and volume.

use crate::channel::{ChannelState, EnvelopeMode};
use crate::config::NoteOverflow;
use crate::error::Result;
use crate::format::SampleStep;
use crate::registers::{MixerFlags, RegisterBuffer};
use crate::song::SongImage;
use crate::tone_table::ToneTable;

/// Computes one channel's contribution to the register image.
#[derive(Debug, Clone, Copy)]
pub struct ChannelMixer<'a> {
    song: &'a SongImage,
    transposition: u8,
    overflow: NoteOverflow,
}

impl<'a> ChannelMixer<'a> {
    /// Mixer for the current position's transposition.
    pub fn new(song: &'a SongImage, transposition: u8, overflow: NoteOverflow) -> Self {
        Self {
            song,
            transposition,
            overflow,
        }
    }

    /// Advance `channel` by one frame and write its registers.
    ///
    /// A silent channel only gets its volume cleared; its tone registers keep
    /// their last value and it adds no bits to the mixer register.
    pub fn mix(
        &self,
        channel: &mut ChannelState,
        index: usize,
        registers: &mut RegisterBuffer,
    ) -> Result<()> {
        let Some(step_index) = self.advance_sample(channel)? else {
            registers.set_volume(index, 0);
            return Ok(());
        };

        let step = match channel.sample {
            Some(sample) => self.song.sample_step(sample, step_index)?,
            None => SampleStep::default(),
        };

        registers.add_mixer(MixerFlags::for_channel(
            index,
            !step.tone_enabled(),
            !step.noise_enabled(),
        ));
        if step.noise_enabled() {
            registers.set_noise(step.noise);
        }

        let offset = self.song.ornament_offset(channel.ornament, step_index)?;
        let note = channel
            .note
            .wrapping_add(offset)
            .wrapping_add(self.transposition)
            & 0x7f;
        let period = match self.overflow {
            NoteOverflow::Clamp => ToneTable::lookup_clamped(note),
            NoteOverflow::Fail => ToneTable::lookup(note)?,
        };
        registers.set_tone(index, step.apply_delta(period));

        registers.set_volume(index, step.volume);
        match channel.envelope_mode {
            EnvelopeMode::Simple => {}
            EnvelopeMode::Triggered => {
                channel.envelope_mode = EnvelopeMode::Sustained;
                registers.enable_envelope(index);
            }
            EnvelopeMode::Sustained => {
                registers.clear_envelope_shape();
                registers.enable_envelope(index);
            }
        }
        Ok(())
    }

    /// Step the sample counters. Returns the step to play, or `None` when the
    /// channel is (or just became) silent.
    fn advance_sample(&self, channel: &mut ChannelState) -> Result<Option<u8>> {
        if channel.is_finished() {
            return Ok(None);
        }

        channel.remaining_note_ticks = channel.remaining_note_ticks.wrapping_sub(1);
        let mut step_index = channel.sample_step_index;
        channel.sample_step_index = step_index.wrapping_add(1) & 0x1f;

        if channel.remaining_note_ticks == 0 {
            let sample_loop = match channel.sample {
                Some(sample) => self.song.sample_loop(sample)?,
                None => Default::default(),
            };
            if !sample_loop.is_looping() {
                channel.finish();
                return Ok(None);
            }
            step_index = sample_loop.position.wrapping_sub(1);
            channel.sample_step_index = sample_loop.position & 0x1f;
            channel.remaining_note_ticks = sample_loop.length.wrapping_add(1);
        }
        // a run counted down through zero, or reloaded with 0xff, is silent at once
        if channel.is_finished() {
            return Ok(None);
        }
        Ok(Some(step_index))
    }
}
