//! Pattern bytecode decoding and interpretation.
//!
//! Each channel owns a cursor into its pattern data. When the channel's
//! duration counter fires, commands are executed until one of them consumes
//! the pattern step (a note, a rest or an empty step) or the end marker is
//! reached.

use log::trace;

use crate::channel::{ChannelState, EnvelopeMode};
use crate::error::FormatError;
use crate::format::PATTERN_END;
use crate::registers::RegisterBuffer;
use crate::song::SongImage;

/// Decoded pattern command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternCommand {
    /// `0x00-0x5f`: start a note.
    Note(u8),
    /// `0x60-0x6f`: select sample `byte - 0x60`.
    Sample(u8),
    /// `0x70-0x7f`: select ornament `byte - 0x70` and drop the envelope.
    Ornament(u8),
    /// `0x80`: silence the channel for this step.
    Rest,
    /// `0x81`: consume the step without changing anything.
    Empty,
    /// `0x82`: back to ornament 0 without envelope.
    OrnamentOff,
    /// `0x83-0x8e`: envelope shape `byte - 0x80` with the period low byte that follows.
    Envelope {
        /// Value for R13.
        shape: u8,
        /// Value for R11.
        period: u8,
    },
    /// Any other byte: step duration `byte - 0xa1`.
    Duration(u8),
    /// `0xff`: end of the pattern.
    ///
    /// On channel A the sequencer enters the next position before the step
    /// runs, so A only decodes it when the new pattern is empty on that
    /// channel. On B and C the cursor stays on the marker until the next
    /// position resets it.
    End,
}

impl PatternCommand {
    /// Decode the command at `cursor`. Returns the command and the cursor past it.
    ///
    /// The end marker is not consumed, so the returned cursor equals `cursor`.
    pub fn decode(song: &SongImage, cursor: usize) -> Result<(Self, usize), FormatError> {
        let byte = song.read_u8(cursor)?;
        let command = match byte {
            0x00..=0x5f => PatternCommand::Note(byte),
            0x60..=0x6f => PatternCommand::Sample(byte - 0x60),
            0x70..=0x7f => PatternCommand::Ornament(byte - 0x70),
            0x80 => PatternCommand::Rest,
            0x81 => PatternCommand::Empty,
            0x82 => PatternCommand::OrnamentOff,
            0x83..=0x8e => {
                let period = song.read_u8(cursor + 1)?;
                return Ok((
                    PatternCommand::Envelope {
                        shape: byte - 0x80,
                        period,
                    },
                    cursor + 2,
                ));
            }
            PATTERN_END => return Ok((PatternCommand::End, cursor)),
            _ => PatternCommand::Duration(byte.wrapping_sub(0xa1)),
        };
        Ok((command, cursor + 1))
    }

    /// Whether the command finishes the pattern step.
    pub fn ends_step(&self) -> bool {
        matches!(
            self,
            PatternCommand::Note(_)
                | PatternCommand::Rest
                | PatternCommand::Empty
                | PatternCommand::End
        )
    }
}

/// Whether the channel's cursor sits on the end marker (or was never set).
pub fn at_pattern_end(song: &SongImage, channel: &ChannelState) -> Result<bool, FormatError> {
    match channel.pattern_cursor {
        None => Ok(true),
        Some(cursor) => Ok(song.read_u8(cursor)? == PATTERN_END),
    }
}

/// Run one pattern step on `channel`.
///
/// Envelope commands write R11 and R13 into `registers` directly; everything
/// else only touches the channel state.
pub fn interpret_step(
    song: &SongImage,
    channel: &mut ChannelState,
    index: usize,
    registers: &mut RegisterBuffer,
) -> Result<(), FormatError> {
    let Some(mut cursor) = channel.pattern_cursor else {
        return Ok(());
    };

    loop {
        let (command, next) = PatternCommand::decode(song, cursor)?;
        trace!("channel {index} @0x{cursor:04x}: {command:?}");
        cursor = next;
        apply(song, channel, command, registers)?;
        if command.ends_step() {
            break;
        }
    }

    channel.pattern_cursor = Some(cursor);
    Ok(())
}

fn apply(
    song: &SongImage,
    channel: &mut ChannelState,
    command: PatternCommand,
    registers: &mut RegisterBuffer,
) -> Result<(), FormatError> {
    match command {
        PatternCommand::Note(note) => channel.start_note(note),
        PatternCommand::Sample(number) => channel.sample = Some(song.sample(number)?),
        PatternCommand::Ornament(number) => {
            channel.ornament = song.ornament(number)?;
            channel.envelope_mode = EnvelopeMode::Simple;
        }
        PatternCommand::Rest => channel.finish(),
        PatternCommand::Empty | PatternCommand::End => {}
        PatternCommand::OrnamentOff => {
            channel.ornament = song.default_ornament();
            channel.envelope_mode = EnvelopeMode::Simple;
        }
        PatternCommand::Envelope { shape, period } => {
            registers.set_envelope(shape, period);
            channel.ornament = song.default_ornament();
            channel.envelope_mode = EnvelopeMode::Triggered;
        }
        PatternCommand::Duration(duration) => channel.set_duration(duration),
    }
    Ok(())
}
