//! Tempo divider deciding on which frames the pattern layer runs.

/// Counts frames down from the song tempo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackClock {
    tempo: u8,
    counter: u8,
}

impl PlaybackClock {
    /// Clock primed so that the very first tick advances the patterns.
    pub fn new(tempo: u8) -> Self {
        Self { tempo, counter: 1 }
    }

    /// Advance one frame. Returns `true` when the pattern layer must advance.
    ///
    /// The counter wraps like the driver's 8-bit counter, so a tempo of 0
    /// behaves as 256 frames per step.
    pub fn tick(&mut self) -> bool {
        self.counter = self.counter.wrapping_sub(1);
        if self.counter == 0 {
            self.counter = self.tempo;
            true
        } else {
            false
        }
    }

    /// Frames per pattern step.
    pub fn tempo(&self) -> u8 {
        self.tempo
    }

    /// Frames left until the next pattern step.
    pub fn counter(&self) -> u8 {
        self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_always_advances() {
        let mut clock = PlaybackClock::new(6);
        assert!(clock.tick());
        assert_eq!(clock.counter(), 6);
    }

    #[test]
    fn advances_every_tempo_frames() {
        let mut clock = PlaybackClock::new(3);
        let pattern: Vec<bool> = (0..7).map(|_| clock.tick()).collect();
        assert_eq!(pattern, [true, false, false, true, false, false, true]);
    }

    #[test]
    fn tempo_one_advances_every_frame() {
        let mut clock = PlaybackClock::new(1);
        assert!((0..10).all(|_| clock.tick()));
    }

    #[test]
    fn zero_tempo_wraps_to_256_frames() {
        let mut clock = PlaybackClock::new(0);
        assert!(clock.tick());
        let waited = (0..256).take_while(|_| !clock.tick()).count();
        assert_eq!(waited, 255);
    }
}
