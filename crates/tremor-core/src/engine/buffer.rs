//! Circular sample buffer for the render session
//!
//! Fixed-capacity ring of mono samples. Exclusively owned and mutated by
//! the renderer; the producer only reaches it through chunk commands, so no
//! synchronization lives here. Unlike an SPSC ring, the read cursor is
//! random-access (the resampler peeks ahead for interpolation) and can be
//! frozen: once playback has started from a known position, ingestion-driven
//! overwrites must not move it.

use crate::types::Sample;

/// Fixed-capacity circular container of audio samples
///
/// Invariant: `count` is the number of unconsumed samples between
/// `read_index` and `write_index` modulo capacity, `0 <= count <= capacity`.
#[derive(Debug)]
pub struct SampleBuffer {
    data: Vec<Sample>,
    write_index: usize,
    read_index: usize,
    count: usize,
}

impl SampleBuffer {
    /// Create a buffer holding up to `capacity` samples
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "SampleBuffer capacity must be non-zero");
        Self {
            data: vec![0.0; capacity],
            write_index: 0,
            read_index: 0,
            count: 0,
        }
    }

    /// Total capacity in samples
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of buffered, unconsumed samples
    #[inline]
    pub fn occupancy(&self) -> usize {
        self.count
    }

    /// Whether the buffer holds no unconsumed samples
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether every slot holds an unconsumed sample
    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == self.data.len()
    }

    /// Current write position (for start-cursor computation)
    #[inline]
    pub fn write_index(&self) -> usize {
        self.write_index
    }

    /// Current read position
    #[inline]
    pub fn read_index(&self) -> usize {
        self.read_index
    }

    /// Append one sample, overwriting the oldest unread sample when full.
    ///
    /// When full and `freeze_read_cursor` is false, the read cursor slides
    /// forward with the overwritten data (the consumer window follows the
    /// freshest `capacity` samples). When full and `freeze_read_cursor` is
    /// true, the read cursor stays put: the established playback start must
    /// not drift, even though the sample it pointed at may now be gone.
    /// In that case `count` remains at capacity and can overstate the
    /// truly-valid unread samples if the writer laps the reader — keeping
    /// the start position is preferred over keeping `count` exact here.
    pub fn write(&mut self, sample: Sample, freeze_read_cursor: bool) {
        let capacity = self.data.len();
        let was_full = self.count == capacity;

        self.data[self.write_index] = sample;
        self.write_index = (self.write_index + 1) % capacity;

        if was_full {
            if !freeze_read_cursor {
                self.read_index = (self.read_index + 1) % capacity;
            }
        } else {
            self.count += 1;
        }
    }

    /// Consume the oldest sample, or `None` if empty
    #[inline]
    pub fn read(&mut self) -> Option<Sample> {
        if self.count == 0 {
            return None;
        }
        let sample = self.data[self.read_index];
        self.read_index = (self.read_index + 1) % self.data.len();
        self.count -= 1;
        Some(sample)
    }

    /// Sample at `offset` ahead of the read cursor, without consuming.
    ///
    /// Used by the fractional-rate resampler. `offset` must be less than
    /// the current occupancy.
    #[inline]
    pub fn peek(&self, offset: usize) -> Sample {
        debug_assert!(offset < self.count, "peek past buffered data");
        self.data[(self.read_index + offset) % self.data.len()]
    }

    /// Advance the read cursor by `n` consumed samples
    #[inline]
    pub fn advance_read(&mut self, n: usize) {
        debug_assert!(n <= self.count, "advance_read past buffered data");
        self.read_index = (self.read_index + n) % self.data.len();
        self.count -= n;
    }

    /// Point the read cursor at the oldest buffered sample.
    ///
    /// Used exactly once per session, when the pre-roll threshold is
    /// reached and the playback start position is fixed.
    pub fn rewind_to_oldest(&mut self) {
        let capacity = self.data.len();
        self.read_index = (self.write_index + capacity - self.count) % capacity;
    }

    /// Reallocate to `new_capacity`, relinearizing the logical contents.
    ///
    /// Buffered samples are copied out in read order and land at index 0 of
    /// the new storage, so the old wraparound boundary disappears. No-op if
    /// `new_capacity` does not exceed the current capacity. Must be called
    /// from ingestion (block-boundary message handling), never from the
    /// per-sample render loop.
    pub fn grow(&mut self, new_capacity: usize) {
        let capacity = self.data.len();
        if new_capacity <= capacity {
            return;
        }
        let mut data = vec![0.0; new_capacity];
        for i in 0..self.count {
            data[i] = self.data[(self.read_index + i) % capacity];
        }
        self.data = data;
        self.read_index = 0;
        self.write_index = self.count;
    }

    /// Reset to empty (new or looped stream)
    pub fn reset(&mut self) {
        self.write_index = 0;
        self.read_index = 0;
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(buffer: &mut SampleBuffer, samples: &[Sample], freeze: bool) {
        for &s in samples {
            buffer.write(s, freeze);
        }
    }

    #[test]
    fn test_write_then_read_in_order() {
        let mut buffer = SampleBuffer::new(8);
        fill(&mut buffer, &[1.0, 2.0, 3.0], false);
        assert_eq!(buffer.occupancy(), 3);

        assert_eq!(buffer.read(), Some(1.0));
        assert_eq!(buffer.read(), Some(2.0));
        assert_eq!(buffer.read(), Some(3.0));
        assert_eq!(buffer.read(), None);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_occupancy_never_exceeds_capacity() {
        let mut buffer = SampleBuffer::new(4);
        for i in 0..100 {
            buffer.write(i as Sample, false);
            assert!(buffer.occupancy() <= buffer.capacity());
        }
        assert_eq!(buffer.occupancy(), 4);
    }

    #[test]
    fn test_overwrite_slides_window_when_unfrozen() {
        let mut buffer = SampleBuffer::new(4);
        // 6 writes into capacity 4: the two oldest are discarded
        fill(&mut buffer, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], false);
        buffer.rewind_to_oldest();

        assert_eq!(buffer.occupancy(), 4);
        assert_eq!(buffer.read(), Some(3.0));
        assert_eq!(buffer.read(), Some(4.0));
        assert_eq!(buffer.read(), Some(5.0));
        assert_eq!(buffer.read(), Some(6.0));
    }

    #[test]
    fn test_overwrite_keeps_read_cursor_when_frozen() {
        let mut buffer = SampleBuffer::new(4);
        fill(&mut buffer, &[1.0, 2.0, 3.0, 4.0], false);
        buffer.rewind_to_oldest();
        let locked_read = buffer.read_index();

        // Overflow with the cursor frozen: write side wraps, read stays
        buffer.write(5.0, true);
        buffer.write(6.0, true);

        assert_eq!(buffer.read_index(), locked_read);
        assert_eq!(buffer.occupancy(), 4);
    }

    #[test]
    fn test_read_wraps_around() {
        let mut buffer = SampleBuffer::new(4);
        fill(&mut buffer, &[1.0, 2.0, 3.0], false);
        buffer.read();
        buffer.read();
        // write past the physical end
        fill(&mut buffer, &[4.0, 5.0, 6.0], false);

        assert_eq!(buffer.occupancy(), 4);
        assert_eq!(buffer.read(), Some(3.0));
        assert_eq!(buffer.read(), Some(4.0));
        assert_eq!(buffer.read(), Some(5.0));
        assert_eq!(buffer.read(), Some(6.0));
    }

    #[test]
    fn test_peek_ahead_of_read_cursor() {
        let mut buffer = SampleBuffer::new(4);
        fill(&mut buffer, &[1.0, 2.0, 3.0, 4.0], false);
        buffer.read();
        buffer.write(5.0, false); // wraps to slot 0

        assert_eq!(buffer.peek(0), 2.0);
        assert_eq!(buffer.peek(3), 5.0);
        // peeking does not consume
        assert_eq!(buffer.occupancy(), 4);
    }

    #[test]
    fn test_grow_relinearizes_across_wrap() {
        let mut buffer = SampleBuffer::new(4);
        fill(&mut buffer, &[1.0, 2.0, 3.0, 4.0], false);
        buffer.read();
        buffer.read();
        fill(&mut buffer, &[5.0, 6.0], false); // contents now wrap physically

        buffer.grow(8);
        assert_eq!(buffer.capacity(), 8);
        assert_eq!(buffer.occupancy(), 4);
        assert_eq!(buffer.read_index(), 0);

        assert_eq!(buffer.read(), Some(3.0));
        assert_eq!(buffer.read(), Some(4.0));
        assert_eq!(buffer.read(), Some(5.0));
        assert_eq!(buffer.read(), Some(6.0));

        // grown space is writable without overwriting
        fill(&mut buffer, &[7.0; 8], false);
        assert_eq!(buffer.occupancy(), 8);
    }

    #[test]
    fn test_grow_to_smaller_is_noop() {
        let mut buffer = SampleBuffer::new(8);
        fill(&mut buffer, &[1.0, 2.0], false);
        buffer.grow(4);
        assert_eq!(buffer.capacity(), 8);
        assert_eq!(buffer.occupancy(), 2);
    }

    #[test]
    fn test_rewind_to_oldest_after_partial_fill() {
        let mut buffer = SampleBuffer::new(8);
        fill(&mut buffer, &[1.0, 2.0, 3.0], false);
        buffer.rewind_to_oldest();
        // (write_index - count) mod capacity
        assert_eq!(buffer.read_index(), 0);
        assert_eq!(buffer.read(), Some(1.0));
    }

    #[test]
    fn test_reset_empties_buffer() {
        let mut buffer = SampleBuffer::new(4);
        fill(&mut buffer, &[1.0, 2.0, 3.0], false);
        buffer.reset();
        assert!(buffer.is_empty());
        assert_eq!(buffer.read(), None);
    }
}
