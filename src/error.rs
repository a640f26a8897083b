//! Error handling for STC loading and playback.

use thiserror::Error;

/// Convenient result alias for STC playback.
pub type Result<T, E = PlaybackError> = std::result::Result<T, E>;

/// Structural problems found in an STC image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// A header field, pointer or table record lies (partly) outside the buffer.
    #[error("read of {len} byte(s) at offset 0x{offset:04x} exceeds STC image of {size} bytes")]
    Truncated {
        /// Offset of the first byte that was requested.
        offset: usize,
        /// Number of bytes requested.
        len: usize,
        /// Total size of the image.
        size: usize,
    },
    /// A linear table scan left the buffer without finding the record.
    #[error("{table} record {key} not found (scan started at offset 0x{base:04x})")]
    RecordNotFound {
        /// Which table was scanned.
        table: TableKind,
        /// Record number that was searched for.
        key: u8,
        /// Offset where the scan started.
        base: usize,
    },
}

/// Tables that are searched by record number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// 99-byte sample records.
    Samples,
    /// 33-byte ornament records.
    Ornaments,
    /// 7-byte pattern records.
    Patterns,
    /// Caller supplied table (raw [`crate::SongImage::scan_table`]).
    Raw,
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TableKind::Samples => "sample",
            TableKind::Ornaments => "ornament",
            TableKind::Patterns => "pattern",
            TableKind::Raw => "table",
        };
        f.write_str(name)
    }
}

/// Errors that stop playback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// Song data referenced during playback is malformed.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// A computed note has no entry in the 96-note tone table.
    #[error("note {note} is outside the 96-entry tone table")]
    NoteOutOfRange {
        /// Offending note number (0..=127).
        note: u8,
    },
}
