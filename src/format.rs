//! Data structures describing the STC byte layout.

use bitflags::bitflags;

/// Size of the fixed header; the samples table starts right after it.
pub const HEADER_SIZE: usize = 27;
/// Offset of the tempo byte.
pub const TEMPO_OFFSET: usize = 0;
/// Offset of the positions table pointer.
pub const POSITIONS_POINTER_OFFSET: usize = 1;
/// Offset of the ornaments table pointer.
pub const ORNAMENTS_POINTER_OFFSET: usize = 3;
/// Offset of the patterns table pointer.
pub const PATTERNS_POINTER_OFFSET: usize = 5;
/// Offset of the identifier text.
pub const IDENTIFIER_OFFSET: usize = 7;
/// Length of the identifier text.
pub const IDENTIFIER_LEN: usize = 18;
/// Offset of the declared image size.
pub const SIZE_OFFSET: usize = 25;

/// Steps in every sample and ornament.
pub const STEP_COUNT: usize = 32;
/// Sample record: number byte, 32 three-byte steps, loop position and length.
pub const SAMPLE_STRIDE: usize = 1 + STEP_COUNT * 3 + 2;
/// Ornament record: number byte and 32 pitch offsets.
pub const ORNAMENT_STRIDE: usize = 1 + STEP_COUNT;
/// Pattern record: number byte and three channel pointers.
pub const PATTERN_STRIDE: usize = 7;

/// Pattern end sentinel.
pub const PATTERN_END: u8 = 0xff;

bitflags! {
    /// Flags stored in the second byte of a sample step.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SampleFlags: u8 {
        /// Noise is disabled for this step.
        const NOISE_OFF = 0x80;
        /// Tone is disabled for this step.
        const TONE_OFF = 0x40;
        /// Pitch delta is added to the tone period (subtracted when clear).
        const DELTA_ADD = 0x20;
    }
}

/// One decoded sample step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleStep {
    /// Channel volume (0-15).
    pub volume: u8,
    /// Noise period written to R6 when noise is enabled (0-31).
    pub noise: u8,
    /// Tone period adjustment (12 bits).
    pub delta: u16,
    /// Mixer and delta-direction flags.
    pub flags: SampleFlags,
}

impl SampleStep {
    /// Decode the three raw step bytes.
    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        let [b0, b1, b2] = bytes;
        Self {
            volume: b0 & 0x0f,
            noise: b1 & 0x1f,
            delta: (u16::from(b0 >> 4) << 8) | u16::from(b2),
            flags: SampleFlags::from_bits_truncate(b1),
        }
    }

    /// Whether this step enables noise on its channel.
    pub fn noise_enabled(&self) -> bool {
        !self.flags.contains(SampleFlags::NOISE_OFF)
    }

    /// Whether this step enables tone on its channel.
    pub fn tone_enabled(&self) -> bool {
        !self.flags.contains(SampleFlags::TONE_OFF)
    }

    /// Apply the pitch delta to a tone period (16-bit wrapping, like the driver).
    pub fn apply_delta(&self, period: u16) -> u16 {
        if self.flags.contains(SampleFlags::DELTA_ADD) {
            period.wrapping_add(self.delta)
        } else {
            period.wrapping_sub(self.delta)
        }
    }
}

/// Loop point stored after the 32 sample steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleLoop {
    /// One-based loop start step; 0 and 0x81-0xff mean the sample does not loop.
    pub position: u8,
    /// Number of extra steps played after the loop start.
    pub length: u8,
}

impl SampleLoop {
    /// Whether the sample restarts instead of finishing.
    ///
    /// The start step minus one must not have the sign bit set.
    pub fn is_looping(&self) -> bool {
        self.position.wrapping_sub(1) & 0x80 == 0
    }
}

/// Location of a sample's step data (just after its number byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleRef(pub(crate) usize);

impl SampleRef {
    /// Offset of step 0 inside the image.
    pub fn offset(&self) -> usize {
        self.0
    }
}

/// Location of an ornament's offsets (just after its number byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrnamentRef(pub(crate) usize);

impl OrnamentRef {
    /// Offset of step 0 inside the image.
    pub fn offset(&self) -> usize {
        self.0
    }
}

/// Entry of the positions table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Pattern number played at this position.
    pub pattern: u8,
    /// Transposition added to every note (mod 128 after the sum).
    pub transposition: u8,
}

/// Pattern record resolved into per-channel bytecode offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternRecord {
    /// Pattern number.
    pub number: u8,
    /// Start of the bytecode for channels A, B and C.
    pub channels: [usize; 3],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_step_decodes_packed_fields() {
        let step = SampleStep::from_bytes([0x3c, 0xa7, 0x10]);
        assert_eq!(step.volume, 0x0c);
        assert_eq!(step.delta, 0x0310);
        assert_eq!(step.noise, 0x07);
        assert!(!step.noise_enabled());
        assert!(step.tone_enabled());
        assert_eq!(step.apply_delta(0x100), 0x410);
    }

    #[test]
    fn sample_delta_subtracts_with_wrapping() {
        let step = SampleStep::from_bytes([0x00, 0x00, 0x05]);
        assert_eq!(step.apply_delta(3), 0xfffe);
        assert!(step.noise_enabled());
    }

    #[test]
    fn record_strides_match_layout() {
        assert_eq!(SAMPLE_STRIDE, 99);
        assert_eq!(ORNAMENT_STRIDE, 33);
    }

    #[test]
    fn loop_position_sign_bit_disables_loop() {
        let looping = |position| SampleLoop { position, length: 0 }.is_looping();
        assert!(!looping(0));
        assert!(looping(1));
        assert!(looping(0x20));
        assert!(looping(0x80));
        assert!(!looping(0x81));
        assert!(!looping(0xff));
    }
}
