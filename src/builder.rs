//! Assemble STC images from parts.
//!
//! Useful for tests and tools that generate songs. The layout produced is
//! header, samples, ornaments, pattern table, pattern bytecode and finally the
//! positions table; every pointer is filled in by [`SongBuilder::build`].

use crate::format::{HEADER_SIZE, IDENTIFIER_LEN, STEP_COUNT};

const DEFAULT_IDENTIFIER: &str = "SONG BY ST COMPILE";

/// Step data and loop point of one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleData {
    steps: [[u8; 3]; STEP_COUNT],
    loop_position: u8,
    loop_length: u8,
}

impl SampleData {
    /// Every step uses the same three raw bytes; no loop.
    pub fn constant(b0: u8, b1: u8, b2: u8) -> Self {
        Self {
            steps: [[b0, b1, b2]; STEP_COUNT],
            loop_position: 0,
            loop_length: 0,
        }
    }

    /// Raw steps from the start; missing steps are zero.
    pub fn from_steps(steps: &[[u8; 3]]) -> Self {
        let mut data = Self::constant(0, 0, 0);
        for (slot, step) in data.steps.iter_mut().zip(steps) {
            *slot = *step;
        }
        data
    }

    /// Loop back to one-based step `position` for `length` extra steps.
    pub fn looping(mut self, position: u8, length: u8) -> Self {
        self.loop_position = position;
        self.loop_length = length;
        self
    }

    fn write(&self, out: &mut Vec<u8>) {
        for step in &self.steps {
            out.extend_from_slice(step);
        }
        out.push(self.loop_position);
        out.push(self.loop_length);
    }
}

/// Pitch offsets of one ornament.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrnamentData {
    offsets: [u8; STEP_COUNT],
}

impl OrnamentData {
    /// All offsets zero.
    pub fn flat() -> Self {
        Self {
            offsets: [0; STEP_COUNT],
        }
    }

    /// Offsets from the start; missing steps are zero.
    pub fn from_offsets(offsets: &[u8]) -> Self {
        let mut data = Self::flat();
        for (slot, offset) in data.offsets.iter_mut().zip(offsets) {
            *slot = *offset;
        }
        data
    }
}

/// Builder for complete STC images.
#[derive(Debug, Clone)]
pub struct SongBuilder {
    tempo: u8,
    identifier: String,
    samples: Vec<(u8, SampleData)>,
    ornaments: Vec<(u8, OrnamentData)>,
    patterns: Vec<(u8, [Vec<u8>; 3])>,
    positions: Vec<(u8, u8)>,
}

impl SongBuilder {
    /// Empty song with the given tempo.
    pub fn new(tempo: u8) -> Self {
        Self {
            tempo,
            identifier: DEFAULT_IDENTIFIER.to_string(),
            samples: Vec::new(),
            ornaments: Vec::new(),
            patterns: Vec::new(),
            positions: Vec::new(),
        }
    }

    /// Identifier text; truncated or space-padded to 18 bytes.
    pub fn identifier(mut self, identifier: &str) -> Self {
        self.identifier = identifier.to_string();
        self
    }

    /// Append sample `number`.
    pub fn sample(mut self, number: u8, data: SampleData) -> Self {
        self.samples.push((number, data));
        self
    }

    /// Append ornament `number`.
    pub fn ornament(mut self, number: u8, data: OrnamentData) -> Self {
        self.ornaments.push((number, data));
        self
    }

    /// Append pattern `number` with the bytecode of channels A, B and C.
    ///
    /// The bytecode is copied as is, so it should end with `0xff`.
    pub fn pattern(mut self, number: u8, channels: [Vec<u8>; 3]) -> Self {
        self.patterns.push((number, channels));
        self
    }

    /// Append a position playing `pattern` with `transposition`.
    pub fn position(mut self, pattern: u8, transposition: u8) -> Self {
        self.positions.push((pattern, transposition));
        self
    }

    /// Lay out the image and fill in every pointer.
    ///
    /// Pointers are 16 bits wide, so images past 64 KiB wrap their offsets.
    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0u8; HEADER_SIZE];

        for (number, sample) in &self.samples {
            out.push(*number);
            sample.write(&mut out);
        }

        let ornaments = out.len();
        for (number, ornament) in &self.ornaments {
            out.push(*number);
            out.extend_from_slice(&ornament.offsets);
        }

        let patterns = out.len();
        let table_len = self.patterns.len() * 7;
        out.resize(patterns + table_len, 0);
        for (slot, (number, channels)) in self.patterns.iter().enumerate() {
            let record = patterns + slot * 7;
            out[record] = *number;
            for (channel, bytecode) in channels.iter().enumerate() {
                let start = out.len() as u16;
                let pointer = record + 1 + channel * 2;
                out[pointer..pointer + 2].copy_from_slice(&start.to_le_bytes());
                out.extend_from_slice(bytecode);
            }
        }

        let positions = out.len();
        out.push((self.positions.len() as u8).wrapping_sub(1));
        for (pattern, transposition) in &self.positions {
            out.push(*pattern);
            out.push(*transposition);
        }

        out[0] = self.tempo;
        out[1..3].copy_from_slice(&(positions as u16).to_le_bytes());
        out[3..5].copy_from_slice(&(ornaments as u16).to_le_bytes());
        out[5..7].copy_from_slice(&(patterns as u16).to_le_bytes());

        let mut identifier = [b' '; IDENTIFIER_LEN];
        for (slot, byte) in identifier.iter_mut().zip(self.identifier.bytes()) {
            *slot = byte;
        }
        out[7..7 + IDENTIFIER_LEN].copy_from_slice(&identifier);

        let size = out.len() as u16;
        out[25..27].copy_from_slice(&size.to_le_bytes());
        out
    }
}
