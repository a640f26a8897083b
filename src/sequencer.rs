//! Frame sequencer: tempo clock, position list, patterns and register output.

use log::{debug, warn};

use crate::channel::ChannelState;
use crate::clock::PlaybackClock;
use crate::config::PlayerConfig;
use crate::error::{FormatError, Result};
use crate::mixer::ChannelMixer;
use crate::pattern::{at_pattern_end, interpret_step};
use crate::registers::{ChipRegisters, RegisterBuffer, RegisterFrame, RegisterSink};
use crate::song::SongImage;

/// Number of tracker channels.
pub const CHANNEL_COUNT: usize = 3;

/// Position-list state shared by all channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackState {
    /// Index to enter on the next pattern end, always below the song length.
    pub next_position_index: u8,
    /// Position currently playing, `None` before the first frame.
    pub current_position: Option<u8>,
    /// Transposition of the current position.
    pub transposition: u8,
    /// Number of positions entered since the start.
    pub positions_entered: u64,
}

/// Plays an STC song one frame at a time.
#[derive(Debug, Clone)]
pub struct Sequencer {
    song: SongImage,
    config: PlayerConfig,
    clock: PlaybackClock,
    channels: [ChannelState; CHANNEL_COUNT],
    state: PlaybackState,
    buffer: RegisterBuffer,
    chip: ChipRegisters,
    frame_count: usize,
}

impl Sequencer {
    /// Sequencer positioned before the first frame.
    pub fn new(song: SongImage, config: PlayerConfig) -> Self {
        let clock = PlaybackClock::new(song.tempo());
        let channels = [ChannelState::new(song.default_ornament()); CHANNEL_COUNT];
        Self {
            song,
            config,
            clock,
            channels,
            state: PlaybackState::default(),
            buffer: RegisterBuffer::new(),
            chip: ChipRegisters::new(),
            frame_count: 0,
        }
    }

    /// Load `bytes` and build a sequencer with the default configuration.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        Ok(Self::new(SongImage::load(bytes)?, PlayerConfig::default()))
    }

    /// Advance one frame and return the resulting register values.
    ///
    /// After an error the sequencer state is unspecified; playback should stop.
    pub fn tick(&mut self) -> Result<RegisterFrame> {
        self.advance()?;
        self.chip.begin_frame();
        self.buffer.flush(&mut self.chip);
        Ok(self.chip.frame())
    }

    /// Like [`Sequencer::tick`], also mirroring every register write into `sink`.
    pub fn tick_into<S: RegisterSink + ?Sized>(&mut self, sink: &mut S) -> Result<RegisterFrame> {
        self.advance()?;
        self.chip.begin_frame();
        self.buffer.flush(&mut self.chip);
        self.buffer.flush(sink);
        Ok(self.chip.frame())
    }

    /// Iterator over successive frames.
    ///
    /// Stops after the configured frame limit or after yielding the first error.
    pub fn frames(&mut self) -> Frames<'_> {
        Frames {
            sequencer: self,
            done: false,
        }
    }

    /// Loaded song.
    pub fn song(&self) -> &SongImage {
        &self.song
    }

    /// Active configuration.
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Position list state.
    pub fn playback_state(&self) -> &PlaybackState {
        &self.state
    }

    /// Position currently playing.
    pub fn current_position(&self) -> Option<u8> {
        self.state.current_position
    }

    /// State of channel `index` (0 = A).
    pub fn channel(&self, index: usize) -> Option<&ChannelState> {
        self.channels.get(index)
    }

    /// Frames produced so far.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Registers as last written.
    pub fn registers(&self) -> RegisterFrame {
        self.chip.frame()
    }

    fn advance(&mut self) -> Result<()> {
        if self.clock.tick() {
            self.advance_if_due()?;
        }

        self.buffer.begin_mix();
        let mixer = ChannelMixer::new(
            &self.song,
            self.state.transposition,
            self.config.note_overflow,
        );
        for (index, channel) in self.channels.iter_mut().enumerate() {
            mixer.mix(channel, index, &mut self.buffer)?;
        }

        self.frame_count += 1;
        Ok(())
    }

    fn advance_if_due(&mut self) -> Result<(), FormatError> {
        for index in 0..CHANNEL_COUNT {
            if !self.channels[index].tick_duration() {
                continue;
            }
            if index == 0 && at_pattern_end(&self.song, &self.channels[0])? {
                self.enter_next_position()?;
            }
            interpret_step(&self.song, &mut self.channels[index], index, &mut self.buffer)?;
        }
        Ok(())
    }

    fn enter_next_position(&mut self) -> Result<(), FormatError> {
        let mut index = self.state.next_position_index;
        if index >= self.song.song_length() {
            index = 0;
        }
        let next = index.wrapping_add(1);
        self.state.next_position_index = if next >= self.song.song_length() { 0 } else { next };

        let position = self.song.position(index)?;
        let pattern = self.song.pattern(position.pattern)?;
        self.state.transposition = position.transposition;
        self.state.current_position = Some(index);
        self.state.positions_entered += 1;
        for (channel, start) in self.channels.iter_mut().zip(pattern.channels) {
            channel.pattern_cursor = Some(start);
        }

        debug!(
            "frame {}: position {} -> pattern {} (transpose {})",
            self.frame_count, index, position.pattern, position.transposition
        );
        if at_pattern_end(&self.song, &self.channels[0])? {
            warn!("pattern {} has no data on channel A", position.pattern);
        }
        Ok(())
    }
}

/// Frame iterator returned by [`Sequencer::frames`].
#[derive(Debug)]
pub struct Frames<'a> {
    sequencer: &'a mut Sequencer,
    done: bool,
}

impl Iterator for Frames<'_> {
    type Item = Result<RegisterFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(limit) = self.sequencer.config.frame_limit {
            if self.sequencer.frame_count >= limit {
                self.done = true;
                return None;
            }
        }
        let frame = self.sequencer.tick();
        if frame.is_err() {
            self.done = true;
        }
        Some(frame)
    }
}

impl std::iter::FusedIterator for Frames<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{OrnamentData, SampleData, SongBuilder};
    use crate::error::PlaybackError;
    use crate::tone_table::ToneTable;

    fn sequencer(bytes: Vec<u8>) -> Sequencer {
        Sequencer::new(SongImage::load(bytes).unwrap(), PlayerConfig::default())
    }

    #[test]
    fn first_frame_enters_position_zero() {
        let bytes = SongBuilder::new(2)
            .sample(1, SampleData::constant(0x0f, 0x80, 0))
            .ornament(0, OrnamentData::flat())
            .pattern(0, [vec![0x61, 0x0c, 0xff], vec![0x81, 0xff], vec![0x81, 0xff]])
            .position(0, 5)
            .build();
        let mut seq = sequencer(bytes);
        assert_eq!(seq.current_position(), None);

        let frame = seq.tick().unwrap();
        assert_eq!(seq.current_position(), Some(0));
        assert_eq!(seq.playback_state().transposition, 5);
        assert_eq!(seq.channel(0).unwrap().note, 0x0c);
        assert_eq!(frame.tone_period(0), ToneTable::lookup(0x0c + 5).unwrap());
        assert_eq!(frame.volume(0), 0x0f);
        assert_eq!(seq.frame_count(), 1);
    }

    #[test]
    fn positions_wrap_to_start() {
        let bytes = SongBuilder::new(1)
            .sample(1, SampleData::constant(0x0f, 0x80, 0))
            .ornament(0, OrnamentData::flat())
            .pattern(0, [vec![0x61, 0x00, 0xff], vec![0xff], vec![0xff]])
            .pattern(1, [vec![0x61, 0x02, 0xff], vec![0xff], vec![0xff]])
            .position(0, 0)
            .position(1, 0)
            .build();
        let mut seq = sequencer(bytes);
        let mut positions = Vec::new();
        for _ in 0..6 {
            seq.tick().unwrap();
            positions.push(seq.current_position().unwrap());
        }
        assert_eq!(positions, [0, 1, 0, 1, 0, 1]);
        assert_eq!(seq.playback_state().positions_entered, 6);
    }

    #[test]
    fn missing_pattern_is_reported_before_playback() {
        let bytes = SongBuilder::new(1)
            .sample(1, SampleData::constant(0x0f, 0x80, 0))
            .ornament(0, OrnamentData::flat())
            .pattern(0, [vec![0x00, 0xff], vec![0xff], vec![0xff]])
            .position(3, 0)
            .build();
        let err = Sequencer::from_bytes(bytes).unwrap_err();
        assert!(matches!(
            err,
            PlaybackError::Format(FormatError::RecordNotFound { key: 3, .. })
        ));
    }

    #[test]
    fn frames_respect_limit_and_fuse_on_error() {
        let bytes = SongBuilder::new(1)
            .sample(1, SampleData::constant(0x0f, 0x80, 0))
            .ornament(0, OrnamentData::flat())
            .pattern(0, [vec![0x61, 0x00, 0xff], vec![0xff], vec![0xff]])
            .position(0, 0)
            .build();
        let song = SongImage::load(bytes).unwrap();
        let mut seq = Sequencer::new(song, PlayerConfig::default().frame_limit(10));
        assert_eq!(seq.frames().count(), 10);
        assert_eq!(seq.frames().count(), 0);

        let broken = SongBuilder::new(1)
            .ornament(0, OrnamentData::flat())
            .pattern(0, [vec![0x6e, 0x00, 0xff], vec![0xff], vec![0xff]])
            .position(0, 0)
            .build();
        let mut seq = sequencer(broken);
        let results: Vec<_> = seq.frames().take(5).collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }

    #[test]
    fn tick_into_mirrors_writes() {
        let bytes = SongBuilder::new(1)
            .sample(1, SampleData::constant(0x0f, 0x80, 0))
            .ornament(0, OrnamentData::flat())
            .pattern(0, [vec![0x61, 0xa2, 0x8a, 0x10, 0x00, 0xff], vec![0xff], vec![0xff]])
            .position(0, 0)
            .build();
        let mut seq = sequencer(bytes);
        let mut writes: Vec<(u8, u8)> = Vec::new();
        let frame = seq.tick_into(&mut writes).unwrap();
        assert_eq!(writes.len(), 14);
        assert_eq!(writes[0], (13, 0x0a));
        assert!(frame.envelope_written);
        assert_eq!(frame.volume(0), 0x1f);

        writes.clear();
        let frame = seq.tick_into(&mut writes).unwrap();
        assert_eq!(writes.len(), 11);
        assert!(!frame.envelope_written);
        assert_eq!(frame.volume(0), 0x1f);
    }
}
