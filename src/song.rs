//! STC song image: the raw buffer plus bounds-checked table access.
//!
//! All pointers stored in the image are 16-bit little-endian offsets relative
//! to the start of the buffer. Every read is checked, so a corrupt song
//! surfaces as a [`FormatError`] instead of reading adjacent memory.

use log::debug;

use crate::error::{FormatError, TableKind};
use crate::format::{
    HEADER_SIZE, IDENTIFIER_LEN, IDENTIFIER_OFFSET, ORNAMENT_STRIDE, ORNAMENTS_POINTER_OFFSET,
    OrnamentRef, PATTERN_STRIDE, PATTERNS_POINTER_OFFSET, POSITIONS_POINTER_OFFSET,
    PatternRecord, Position, SAMPLE_STRIDE, SIZE_OFFSET, STEP_COUNT, SampleLoop, SampleRef,
    SampleStep, TEMPO_OFFSET,
};

type FormatResult<T> = std::result::Result<T, FormatError>;

/// Header fields parsed once at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StcHeader {
    /// Frames per pattern step.
    pub tempo: u8,
    /// Offset of the first (pattern, transposition) entry.
    pub positions: usize,
    /// Number of positions (stored count byte plus one, wrapping).
    pub song_length: u8,
    /// Offset of the ornaments table.
    pub ornaments: usize,
    /// Offset of the patterns table.
    pub patterns: usize,
    /// Offset of the samples table.
    pub samples: usize,
    /// Identifier text with trailing padding removed.
    pub identifier: String,
    /// Size declared by the compiler (not validated against the buffer).
    pub declared_size: u16,
}

/// Immutable STC image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongImage {
    data: Vec<u8>,
    header: StcHeader,
    default_ornament: OrnamentRef,
}

impl SongImage {
    /// Parse and validate an STC image.
    ///
    /// Every position must name an existing pattern whose channel pointers
    /// stay inside the image.
    pub fn load(bytes: impl Into<Vec<u8>>) -> FormatResult<Self> {
        let data = bytes.into();
        let mut image = Self {
            data,
            header: StcHeader {
                tempo: 0,
                positions: 0,
                song_length: 0,
                ornaments: 0,
                patterns: 0,
                samples: HEADER_SIZE,
                identifier: String::new(),
                declared_size: 0,
            },
            default_ornament: OrnamentRef(0),
        };
        image.ensure_range(0, HEADER_SIZE)?;

        let tempo = image.read_u8(TEMPO_OFFSET)?;
        let positions_table = image.read_pointer(POSITIONS_POINTER_OFFSET)?;
        let ornaments = image.read_pointer(ORNAMENTS_POINTER_OFFSET)?;
        let patterns = image.read_pointer(PATTERNS_POINTER_OFFSET)?;
        let declared_size = image.read_u16(SIZE_OFFSET)?;

        let count_byte = image.read_u8(positions_table)?;
        let positions = positions_table + 1;
        image.ensure_range(positions, (usize::from(count_byte) + 1) * 2)?;
        image.ensure_range(ornaments, 1)?;
        image.ensure_range(patterns, 1)?;

        let raw_identifier = &image.data[IDENTIFIER_OFFSET..IDENTIFIER_OFFSET + IDENTIFIER_LEN];
        let identifier = String::from_utf8_lossy(raw_identifier)
            .trim_end_matches(|c: char| c == '\0' || c == ' ')
            .to_string();

        image.header = StcHeader {
            tempo,
            positions,
            song_length: count_byte.wrapping_add(1),
            ornaments,
            patterns,
            samples: HEADER_SIZE,
            identifier,
            declared_size,
        };
        image.default_ornament = image.ornament(0)?;
        for index in 0..=count_byte {
            let position = image.position(index)?;
            image.pattern(position.pattern)?;
        }

        debug!(
            "loaded STC '{}': tempo {}, {} positions, {} bytes",
            image.header.identifier,
            tempo,
            image.header.song_length,
            image.data.len()
        );
        Ok(image)
    }

    /// Parsed header.
    pub fn header(&self) -> &StcHeader {
        &self.header
    }

    /// Frames per pattern step.
    pub fn tempo(&self) -> u8 {
        self.header.tempo
    }

    /// Number of positions in the song.
    pub fn song_length(&self) -> u8 {
        self.header.song_length
    }

    /// Raw image bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Image size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the image is empty (never true for a loaded song).
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Ornament 0, selected by default and by the envelope commands.
    pub fn default_ornament(&self) -> OrnamentRef {
        self.default_ornament
    }

    /// Read one byte.
    pub fn read_u8(&self, offset: usize) -> FormatResult<u8> {
        self.ensure_range(offset, 1)?;
        Ok(self.data[offset])
    }

    /// Read a little-endian word.
    pub fn read_u16(&self, offset: usize) -> FormatResult<u16> {
        self.ensure_range(offset, 2)?;
        Ok(u16::from_le_bytes([self.data[offset], self.data[offset + 1]]))
    }

    /// Resolve the pointer stored at `cursor`; the caller advances past the two bytes.
    pub fn read_pointer(&self, cursor: usize) -> FormatResult<usize> {
        let target = usize::from(self.read_u16(cursor)?);
        self.ensure_range(target, 1)?;
        Ok(target)
    }

    /// Linear scan for the first `stride`-sized record whose first byte is `key`.
    pub fn scan_table(&self, base: usize, stride: usize, key: u8) -> FormatResult<usize> {
        self.scan(TableKind::Raw, base, stride, key)
    }

    /// Look up a sample by number.
    pub fn sample(&self, number: u8) -> FormatResult<SampleRef> {
        let record = self.scan(TableKind::Samples, self.header.samples, SAMPLE_STRIDE, number)?;
        self.ensure_range(record, SAMPLE_STRIDE)?;
        Ok(SampleRef(record + 1))
    }

    /// Look up an ornament by number.
    pub fn ornament(&self, number: u8) -> FormatResult<OrnamentRef> {
        let record = self.scan(
            TableKind::Ornaments,
            self.header.ornaments,
            ORNAMENT_STRIDE,
            number,
        )?;
        self.ensure_range(record, ORNAMENT_STRIDE)?;
        Ok(OrnamentRef(record + 1))
    }

    /// Look up a pattern by number and resolve its three channel pointers.
    pub fn pattern(&self, number: u8) -> FormatResult<PatternRecord> {
        let record = self.scan(TableKind::Patterns, self.header.patterns, PATTERN_STRIDE, number)?;
        self.ensure_range(record, PATTERN_STRIDE)?;
        Ok(PatternRecord {
            number,
            channels: [
                self.read_pointer(record + 1)?,
                self.read_pointer(record + 3)?,
                self.read_pointer(record + 5)?,
            ],
        })
    }

    /// Entry `index` of the positions table.
    pub fn position(&self, index: u8) -> FormatResult<Position> {
        let entry = self.header.positions + usize::from(index) * 2;
        Ok(Position {
            pattern: self.read_u8(entry)?,
            transposition: self.read_u8(entry + 1)?,
        })
    }

    /// Step `index` (masked to 0..31) of a sample.
    pub fn sample_step(&self, sample: SampleRef, index: u8) -> FormatResult<SampleStep> {
        let offset = sample.offset() + usize::from(index & 0x1f) * 3;
        self.ensure_range(offset, 3)?;
        Ok(SampleStep::from_bytes([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ]))
    }

    /// Loop point stored after the sample steps.
    pub fn sample_loop(&self, sample: SampleRef) -> FormatResult<SampleLoop> {
        let offset = sample.offset() + STEP_COUNT * 3;
        Ok(SampleLoop {
            position: self.read_u8(offset)?,
            length: self.read_u8(offset + 1)?,
        })
    }

    /// Pitch offset at step `index` (masked to 0..31) of an ornament.
    pub fn ornament_offset(&self, ornament: OrnamentRef, index: u8) -> FormatResult<u8> {
        self.read_u8(ornament.offset() + usize::from(index & 0x1f))
    }

    fn scan(&self, table: TableKind, base: usize, stride: usize, key: u8) -> FormatResult<usize> {
        let not_found = FormatError::RecordNotFound { table, key, base };
        let mut offset = base;
        while offset < self.data.len() {
            if self.data[offset] == key {
                return Ok(offset);
            }
            if stride == 0 {
                break;
            }
            offset = offset.checked_add(stride).ok_or(not_found.clone())?;
        }
        Err(not_found)
    }

    fn ensure_range(&self, offset: usize, len: usize) -> FormatResult<()> {
        let truncated = FormatError::Truncated {
            offset,
            len,
            size: self.data.len(),
        };
        let end = offset.checked_add(len).ok_or(truncated.clone())?;
        if end > self.data.len() {
            return Err(truncated);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{OrnamentData, SampleData, SongBuilder};

    fn simple_song() -> Vec<u8> {
        SongBuilder::new(3)
            .sample(1, SampleData::constant(0x0f, 0x40, 0))
            .ornament(0, OrnamentData::flat())
            .pattern(1, [vec![0x61, 0x00, 0xff], vec![0x81], vec![0x81]])
            .position(1, 0)
            .build()
    }

    #[test]
    fn load_parses_header_fields() {
        let song = SongImage::load(simple_song()).unwrap();
        assert_eq!(song.tempo(), 3);
        assert_eq!(song.song_length(), 1);
        assert_eq!(song.header().samples, HEADER_SIZE);
        assert_eq!(song.header().identifier, "SONG BY ST COMPILE");
        assert_eq!(usize::from(song.header().declared_size), song.len());
    }

    #[test]
    fn load_rejects_short_header() {
        let err = SongImage::load(vec![0u8; 10]).unwrap_err();
        assert!(matches!(err, FormatError::Truncated { offset: 0, .. }));
    }

    #[test]
    fn load_rejects_pointer_past_end() {
        let mut bytes = simple_song();
        let len = bytes.len() as u16;
        bytes[5..7].copy_from_slice(&len.to_le_bytes());
        let err = SongImage::load(bytes).unwrap_err();
        assert!(matches!(err, FormatError::Truncated { .. }));
    }

    #[test]
    fn load_requires_ornament_zero() {
        let bytes = SongBuilder::new(1)
            .sample(1, SampleData::constant(0x0f, 0x40, 0))
            .ornament(3, OrnamentData::flat())
            .pattern(1, [vec![0x00], vec![0x81], vec![0x81]])
            .position(1, 0)
            .build();
        let err = SongImage::load(bytes).unwrap_err();
        assert!(matches!(
            err,
            FormatError::RecordNotFound {
                table: TableKind::Ornaments,
                key: 0,
                ..
            }
        ));
    }

    #[test]
    fn load_rejects_dangling_channel_pointer() {
        let mut bytes = simple_song();
        let record = usize::from(u16::from_le_bytes([bytes[5], bytes[6]]));
        bytes[record + 3..record + 5].copy_from_slice(&0xfff0u16.to_le_bytes());
        let err = SongImage::load(bytes).unwrap_err();
        assert!(matches!(err, FormatError::Truncated { offset: 0xfff0, len: 1, .. }));
    }

    #[test]
    fn load_rejects_position_without_pattern() {
        let bytes = SongBuilder::new(1)
            .sample(1, SampleData::constant(0x0f, 0x40, 0))
            .ornament(0, OrnamentData::flat())
            .pattern(1, [vec![0x00, 0xff], vec![0xff], vec![0xff]])
            .position(1, 0)
            .position(4, 0)
            .build();
        let err = SongImage::load(bytes).unwrap_err();
        assert!(matches!(
            err,
            FormatError::RecordNotFound {
                table: TableKind::Patterns,
                key: 4,
                ..
            }
        ));
    }

    #[test]
    fn read_pointer_is_little_endian() {
        let song = SongImage::load(simple_song()).unwrap();
        let bytes = song.as_bytes();
        let expected = usize::from(u16::from_le_bytes([bytes[5], bytes[6]]));
        assert_eq!(song.read_pointer(5).unwrap(), expected);
    }

    #[test]
    fn scan_table_finds_last_record() {
        let bytes = vec![1, 0, 0, 2, 0, 0, 7, 0, 0];
        let song_bytes = {
            let mut song = simple_song();
            let base = song.len();
            song.extend_from_slice(&bytes);
            (song, base)
        };
        let (raw, base) = song_bytes;
        let song = SongImage::load(raw).unwrap();
        assert_eq!(song.scan_table(base, 3, 7).unwrap(), base + 6);
    }

    #[test]
    fn scan_table_reports_missing_record() {
        let song = SongImage::load(simple_song()).unwrap();
        let err = song.sample(9).unwrap_err();
        assert!(matches!(
            err,
            FormatError::RecordNotFound {
                table: TableKind::Samples,
                key: 9,
                ..
            }
        ));
    }

    #[test]
    fn pattern_lookup_resolves_channel_pointers() {
        let song = SongImage::load(simple_song()).unwrap();
        let record = song.pattern(1).unwrap();
        assert_eq!(song.read_u8(record.channels[0]).unwrap(), 0x61);
        assert_eq!(song.read_u8(record.channels[1]).unwrap(), 0x81);
    }
}
