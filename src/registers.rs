//! AY/YM register image built by the driver and the frames handed to callers.
//!
//! [`RegisterBuffer`] is the driver's private copy of registers R0-R13. At the
//! end of each frame it is flushed to a [`RegisterSink`] in the order the
//! Spectrum driver writes them: R10 down to R0, or R13 down to R0 when an
//! envelope shape is pending. [`ChipRegisters`] is the sink-side view that keeps
//! the last value written to each register.

use bitflags::bitflags;
use std::ops::Index;

/// Number of registers produced per frame (R0-R13).
pub const REGISTER_COUNT: usize = 14;

/// Noise period register.
pub const REG_NOISE: usize = 6;
/// Mixer control register.
pub const REG_MIXER: usize = 7;
/// First channel amplitude register.
pub const REG_VOLUME_A: usize = 8;
/// Envelope period, low byte.
pub const REG_ENVELOPE_LO: usize = 11;
/// Envelope period, high byte.
pub const REG_ENVELOPE_HI: usize = 12;
/// Envelope shape register; writing it restarts the envelope.
pub const REG_ENVELOPE_SHAPE: usize = 13;

/// Amplitude bit selecting the hardware envelope.
pub const VOLUME_ENVELOPE_BIT: u8 = 0x10;

bitflags! {
    /// Mixer Control Register (R7) bitflags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MixerFlags: u8 {
        /// Channel A tone enable (1 = disable, 0 = enable)
        const CH_A_TONE = 0x01;
        /// Channel B tone enable
        const CH_B_TONE = 0x02;
        /// Channel C tone enable
        const CH_C_TONE = 0x04;
        /// Channel A noise enable (1 = disable, 0 = enable)
        const CH_A_NOISE = 0x08;
        /// Channel B noise enable
        const CH_B_NOISE = 0x10;
        /// Channel C noise enable
        const CH_C_NOISE = 0x20;
    }
}

impl MixerFlags {
    /// Create mixer flags from raw register value
    pub fn from_register(value: u8) -> Self {
        MixerFlags::from_bits_truncate(value)
    }

    /// Disable bits contributed by `channel` (0-2).
    pub fn for_channel(channel: usize, tone_off: bool, noise_off: bool) -> Self {
        let mut bits = 0u8;
        if tone_off {
            bits |= 0x01 << channel;
        }
        if noise_off {
            bits |= 0x08 << channel;
        }
        MixerFlags::from_bits_truncate(bits)
    }

    /// Check if the tone of `channel` is enabled
    pub fn is_tone_enabled(&self, channel: usize) -> bool {
        self.bits() & (0x01 << channel) == 0
    }

    /// Check if the noise of `channel` is enabled
    pub fn is_noise_enabled(&self, channel: usize) -> bool {
        self.bits() & (0x08 << channel) == 0
    }
}

/// Receiver of register writes (register index, value).
pub trait RegisterSink {
    /// Write `value` into register `register`.
    fn write_register(&mut self, register: u8, value: u8);
}

/// Records every write in order.
impl RegisterSink for Vec<(u8, u8)> {
    fn write_register(&mut self, register: u8, value: u8) {
        self.push((register, value));
    }
}

impl<S: RegisterSink + ?Sized> RegisterSink for &mut S {
    fn write_register(&mut self, register: u8, value: u8) {
        (**self).write_register(register, value);
    }
}

/// The driver's register image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegisterBuffer {
    values: [u8; REGISTER_COUNT],
}

impl RegisterBuffer {
    /// All registers zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw register values.
    pub fn values(&self) -> &[u8; REGISTER_COUNT] {
        &self.values
    }

    /// Clear the mixer register before the channels OR their bits in.
    pub fn begin_mix(&mut self) {
        self.values[REG_MIXER] = 0;
    }

    /// Store a channel's tone period (low byte, high byte).
    pub fn set_tone(&mut self, channel: usize, period: u16) {
        let [lo, hi] = period.to_le_bytes();
        self.values[channel * 2] = lo;
        self.values[channel * 2 + 1] = hi;
    }

    /// Store the shared noise period.
    pub fn set_noise(&mut self, period: u8) {
        self.values[REG_NOISE] = period;
    }

    /// OR a channel's disable bits into the mixer register.
    pub fn add_mixer(&mut self, flags: MixerFlags) {
        self.values[REG_MIXER] |= flags.bits();
    }

    /// Current mixer register.
    pub fn mixer(&self) -> MixerFlags {
        MixerFlags::from_register(self.values[REG_MIXER])
    }

    /// Store a channel's amplitude register.
    pub fn set_volume(&mut self, channel: usize, volume: u8) {
        self.values[REG_VOLUME_A + channel] = volume;
    }

    /// Enable the hardware envelope on a channel's amplitude register.
    pub fn enable_envelope(&mut self, channel: usize) {
        self.values[REG_VOLUME_A + channel] |= VOLUME_ENVELOPE_BIT;
    }

    /// Store envelope shape and period low byte; R12 is never written by the driver.
    pub fn set_envelope(&mut self, shape: u8, period_lo: u8) {
        self.values[REG_ENVELOPE_SHAPE] = shape;
        self.values[REG_ENVELOPE_LO] = period_lo;
    }

    /// Drop the pending envelope shape so R11-R13 are skipped on flush.
    pub fn clear_envelope_shape(&mut self) {
        self.values[REG_ENVELOPE_SHAPE] = 0;
    }

    /// Pending envelope shape (0 when none).
    pub fn envelope_shape(&self) -> u8 {
        self.values[REG_ENVELOPE_SHAPE]
    }

    /// Write the image to `sink`, highest register first.
    pub fn flush<S: RegisterSink + ?Sized>(&self, sink: &mut S) {
        let top = if self.envelope_shape() == 0 {
            REG_VOLUME_A + 2
        } else {
            REG_ENVELOPE_SHAPE
        };
        for register in (0..=top).rev() {
            sink.write_register(register as u8, self.values[register]);
        }
    }
}

/// Sink-side register view: last value written to each register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChipRegisters {
    values: [u8; REGISTER_COUNT],
    envelope_written: bool,
}

impl ChipRegisters {
    /// All registers zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the envelope latch at the start of a frame.
    pub fn begin_frame(&mut self) {
        self.envelope_written = false;
    }

    /// Snapshot the current values.
    pub fn frame(&self) -> RegisterFrame {
        RegisterFrame {
            registers: self.values,
            envelope_written: self.envelope_written,
        }
    }
}

impl RegisterSink for ChipRegisters {
    fn write_register(&mut self, register: u8, value: u8) {
        let index = usize::from(register);
        if index >= REGISTER_COUNT {
            return;
        }
        self.values[index] = value;
        if index == REG_ENVELOPE_SHAPE {
            self.envelope_written = true;
        }
    }
}

/// Register snapshot produced by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegisterFrame {
    /// R0-R13 in index order.
    pub registers: [u8; REGISTER_COUNT],
    /// R13 was written during this frame (the envelope restarts).
    pub envelope_written: bool,
}

impl RegisterFrame {
    /// 12-bit tone period of `channel` as the chip sees it.
    pub fn tone_period(&self, channel: usize) -> u16 {
        let lo = u16::from(self.registers[channel * 2]);
        let hi = u16::from(self.registers[channel * 2 + 1] & 0x0f);
        (hi << 8) | lo
    }

    /// Noise period (R6).
    pub fn noise_period(&self) -> u8 {
        self.registers[REG_NOISE]
    }

    /// Mixer register (R7).
    pub fn mixer(&self) -> MixerFlags {
        MixerFlags::from_register(self.registers[REG_MIXER])
    }

    /// Amplitude register of `channel`, including the envelope bit.
    pub fn volume(&self, channel: usize) -> u8 {
        self.registers[REG_VOLUME_A + channel]
    }

    /// Envelope period (R11/R12).
    pub fn envelope_period(&self) -> u16 {
        u16::from_le_bytes([
            self.registers[REG_ENVELOPE_LO],
            self.registers[REG_ENVELOPE_HI],
        ])
    }

    /// Envelope shape (R13).
    pub fn envelope_shape(&self) -> u8 {
        self.registers[REG_ENVELOPE_SHAPE]
    }

    /// Replay the snapshot into another sink, R0 first.
    pub fn write_to<S: RegisterSink + ?Sized>(&self, sink: &mut S) {
        for (register, value) in self.registers.iter().enumerate() {
            sink.write_register(register as u8, *value);
        }
    }
}

impl Index<usize> for RegisterFrame {
    type Output = u8;

    fn index(&self, register: usize) -> &u8 {
        &self.registers[register]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixer_bits_follow_channel_position() {
        assert_eq!(
            MixerFlags::for_channel(0, true, true),
            MixerFlags::CH_A_TONE | MixerFlags::CH_A_NOISE
        );
        assert_eq!(MixerFlags::for_channel(1, false, true), MixerFlags::CH_B_NOISE);
        assert_eq!(MixerFlags::for_channel(2, true, false), MixerFlags::CH_C_TONE);

        let flags = MixerFlags::from_register(0x3e);
        assert!(flags.is_tone_enabled(0));
        assert!(!flags.is_tone_enabled(1));
        assert!(!flags.is_noise_enabled(0));
    }

    #[test]
    fn flush_skips_envelope_registers_without_shape() {
        let mut buffer = RegisterBuffer::new();
        buffer.set_tone(1, 0x0123);
        let mut writes: Vec<(u8, u8)> = Vec::new();
        buffer.flush(&mut writes);
        assert_eq!(writes.len(), 11);
        assert_eq!(writes[0].0, 10);
        assert_eq!(writes[10], (0, 0));
        assert!(writes.contains(&(2, 0x23)));
        assert!(writes.contains(&(3, 0x01)));
    }

    #[test]
    fn flush_includes_envelope_when_shape_pending() {
        let mut buffer = RegisterBuffer::new();
        buffer.set_envelope(0x0a, 0x40);
        let mut chip = ChipRegisters::new();
        buffer.flush(&mut chip);
        let frame = chip.frame();
        assert!(frame.envelope_written);
        assert_eq!(frame.envelope_shape(), 0x0a);
        assert_eq!(frame.envelope_period(), 0x40);

        buffer.clear_envelope_shape();
        chip.begin_frame();
        buffer.flush(&mut chip);
        let frame = chip.frame();
        assert!(!frame.envelope_written);
        assert_eq!(frame.envelope_shape(), 0x0a, "R13 keeps its last written value");
    }

    #[test]
    fn frame_tone_period_masks_high_nibble() {
        let mut frame = RegisterFrame::default();
        frame.registers[4] = 0x34;
        frame.registers[5] = 0xf2;
        assert_eq!(frame.tone_period(2), 0x234);
        assert_eq!(frame[5], 0xf2);

        let mut writes: Vec<(u8, u8)> = Vec::new();
        frame.write_to(&mut writes);
        assert_eq!(writes.len(), REGISTER_COUNT);
        assert_eq!(writes[5], (5, 0xf2));
    }
}
