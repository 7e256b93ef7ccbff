//! Real-time sample renderer
//!
//! Owns the circular [`SampleBuffer`] and the playback state for one
//! audification session. Chunks and transport commands arrive through the
//! lock-free command queue and are applied at tick boundaries; each render
//! tick fully populates one output block at the requested speed, padding
//! with silence wherever data is unavailable. The tick never blocks, never
//! allocates, and never fails — starvation, garbage speed and stream
//! exhaustion all map to defined degraded outputs.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::{PlayState, Sample, SAMPLE_RATE};

use super::buffer::SampleBuffer;
use super::command::{RendererCommand, RendererEvent};

/// Lower clamp for the speed multiplier; zero or negative speed is
/// meaningless and must never reach the resampler
pub const MIN_SPEED: f64 = 0.001;

/// What ingestion does when the buffer is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BufferPolicy {
    /// Reallocate larger storage (relinearized), up to the configured
    /// maximum capacity; preferred for long unbounded sessions
    #[default]
    Grow,
    /// Overwrite the oldest unread sample; acceptable for fixed-horizon
    /// sessions
    Overwrite,
}

/// Per-session constants, fixed at construction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Output sample rate the session renders at
    pub sample_rate: u32,
    /// Buffered audio required before playback auto-starts
    pub preroll_secs: f64,
    /// Initial buffer capacity
    pub capacity_secs: f64,
    /// Capacity ceiling for the Grow policy; past this the buffer falls
    /// back to overwrite-oldest
    pub max_capacity_secs: f64,
    /// Full-buffer behavior
    pub buffer_policy: BufferPolicy,
    /// Initial playback speed multiplier
    pub speed: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            preroll_secs: 1.0,
            capacity_secs: 60.0,
            max_capacity_secs: 3600.0,
            buffer_policy: BufferPolicy::default(),
            speed: 1.0,
        }
    }
}

impl SessionConfig {
    /// Set the output sample rate
    pub fn with_sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate;
        self
    }

    /// Set the pre-roll duration in seconds
    pub fn with_preroll_secs(mut self, secs: f64) -> Self {
        self.preroll_secs = secs;
        self
    }

    /// Set the initial playback speed
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Pre-roll threshold in samples, clamped to the buffer capacity so a
    /// session can always start
    pub fn preroll_samples(&self) -> usize {
        let preroll = (self.preroll_secs * self.sample_rate as f64) as usize;
        preroll.clamp(1, self.capacity_samples())
    }

    /// Initial buffer capacity in samples
    pub fn capacity_samples(&self) -> usize {
        ((self.capacity_secs * self.sample_rate as f64) as usize).max(1)
    }

    /// Growth ceiling in samples
    pub fn max_capacity_samples(&self) -> usize {
        ((self.max_capacity_secs * self.sample_rate as f64) as usize)
            .max(self.capacity_samples())
    }

    /// Telemetry cadence in rendered output samples (~100ms)
    pub fn status_interval_samples(&self) -> u64 {
        (self.sample_rate as u64 / 10).max(1)
    }
}

/// Playback state for a render session
///
/// Mutated only by the renderer, in response to ingestion and transport
/// commands, all on the render timeline.
#[derive(Debug)]
pub struct PlaybackState {
    /// Playback speed multiplier (always >= MIN_SPEED)
    pub speed: f64,
    /// Whether ticks currently produce audio (false = silence)
    pub is_playing: bool,
    /// True once the pre-roll threshold was reached and the read cursor
    /// was fixed
    pub has_started: bool,
    /// True from the moment `has_started` flips; never reverts. While set,
    /// ingestion may no longer shift the read cursor.
    pub read_cursor_locked: bool,
    /// Cumulative underrun ticks this session
    pub underrun_count: u64,
    /// Render ticks executed this session
    pub tick_counter: u64,
}

/// Lock-free state mirror for the producer/UI side
///
/// The renderer stores occupancy, underruns and play state here with
/// relaxed ordering after every mutation, so the non-real-time side can
/// poll without waiting for a Status event. Advisory only; the render
/// tick never reads these back.
pub struct RendererAtomics {
    /// Buffer occupancy in samples
    pub buffered: AtomicU64,
    /// Cumulative underrun count
    pub underruns: AtomicU64,
    /// Encoded PlayState
    pub state: AtomicU8,
}

impl RendererAtomics {
    fn new() -> Self {
        Self {
            buffered: AtomicU64::new(0),
            underruns: AtomicU64::new(0),
            state: AtomicU8::new(PlayState::Waiting.to_u8()),
        }
    }

    /// Current buffer occupancy (lock-free)
    #[inline]
    pub fn buffered(&self) -> u64 {
        self.buffered.load(Ordering::Relaxed)
    }

    /// Cumulative underruns (lock-free)
    #[inline]
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }

    /// Current play state (lock-free)
    #[inline]
    pub fn play_state(&self) -> PlayState {
        PlayState::from_u8(self.state.load(Ordering::Relaxed))
    }
}

/// The real-time sample renderer for one audification session
pub struct Renderer {
    buffer: SampleBuffer,
    state: PlaybackState,
    preroll_samples: usize,
    max_capacity: usize,
    policy: BufferPolicy,
    /// Terminal latch: once the stream drains, every later tick renders
    /// silence and returns false, with no further notifications
    finished: bool,
    status_interval: u64,
    samples_since_status: u64,
    events: rtrb::Producer<RendererEvent>,
    atomics: Arc<RendererAtomics>,
}

impl Renderer {
    /// Create a renderer for a new session
    pub fn new(config: &SessionConfig, events: rtrb::Producer<RendererEvent>) -> Self {
        Self {
            buffer: SampleBuffer::new(config.capacity_samples()),
            state: PlaybackState {
                speed: config.speed.max(MIN_SPEED),
                is_playing: false,
                has_started: false,
                read_cursor_locked: false,
                underrun_count: 0,
                tick_counter: 0,
            },
            preroll_samples: config.preroll_samples(),
            max_capacity: config.max_capacity_samples(),
            policy: config.buffer_policy,
            finished: false,
            status_interval: config.status_interval_samples(),
            samples_since_status: 0,
            events,
            atomics: Arc::new(RendererAtomics::new()),
        }
    }

    /// Get a reference to the lock-free state mirror
    pub fn atomics(&self) -> Arc<RendererAtomics> {
        Arc::clone(&self.atomics)
    }

    /// Current playback state
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Current buffer occupancy in samples
    pub fn occupancy(&self) -> usize {
        self.buffer.occupancy()
    }

    /// Whether the session reached its terminal state
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Drain and apply all pending commands (called at the tick boundary)
    pub fn process_commands(&mut self, rx: &mut rtrb::Consumer<RendererCommand>) {
        while let Ok(command) = rx.pop() {
            match command {
                RendererCommand::Chunk(chunk) => self.ingest(&chunk),
                RendererCommand::SetSpeed(speed) => self.set_speed(speed),
                RendererCommand::Pause => self.pause(),
                RendererCommand::Resume => self.resume(),
            }
        }
    }

    /// Append a chunk of samples to the session buffer.
    ///
    /// Never blocks or fails: on overflow the buffer either grows (Grow
    /// policy, up to the configured ceiling) or overwrites oldest-first.
    /// The first time occupancy reaches the pre-roll threshold, the read
    /// cursor is fixed at the oldest buffered sample and playback starts.
    pub fn ingest(&mut self, chunk: &[Sample]) {
        if self.policy == BufferPolicy::Grow {
            self.grow_for(chunk.len());
        }

        for &sample in chunk {
            self.buffer.write(sample, self.state.read_cursor_locked);
        }

        if !self.state.has_started && self.buffer.occupancy() >= self.preroll_samples {
            self.buffer.rewind_to_oldest();
            self.state.read_cursor_locked = true;
            self.state.has_started = true;
            self.state.is_playing = true;
            self.sync_state_atomic();
            self.emit(RendererEvent::Started);
            log::info!(
                "pre-roll reached ({} samples buffered), playback started",
                self.buffer.occupancy()
            );
        }

        self.sync_buffered_atomic();
    }

    /// Set the playback speed used from the next tick on
    pub fn set_speed(&mut self, speed: f64) {
        self.state.speed = speed.max(MIN_SPEED);
    }

    /// Suspend output; buffer and cursors stay untouched
    pub fn pause(&mut self) {
        self.state.is_playing = false;
        self.sync_state_atomic();
    }

    /// Resume output. No effect before auto-start: playback then begins on
    /// its own once the pre-roll threshold is met.
    pub fn resume(&mut self) {
        if self.state.has_started && !self.finished {
            self.state.is_playing = true;
            self.sync_state_atomic();
        }
    }

    /// Render one output block at the current speed.
    ///
    /// The slice length is the tick's block size. Always fully populates
    /// the block (silence where data is unavailable) and returns the
    /// liveness flag: `false` once the stream has drained for good.
    pub fn render(&mut self, output: &mut [Sample]) -> bool {
        if self.finished {
            output.fill(0.0);
            return false;
        }

        self.state.tick_counter += 1;

        if !self.state.is_playing {
            output.fill(0.0);
            return true;
        }

        let block_size = output.len();
        let speed = self.state.speed;
        let samples_needed = (block_size as f64 * speed).ceil() as usize;

        let alive = if self.buffer.occupancy() < samples_needed {
            self.render_underrun(output)
        } else if speed == 1.0 {
            // Unity speed is the common case: direct copy, no
            // interpolation overhead or rounding noise
            for slot in output.iter_mut() {
                *slot = self.buffer.read().unwrap_or(0.0);
            }
            true
        } else {
            self.render_resampled(output, samples_needed);
            true
        };

        if alive {
            self.samples_since_status += block_size as u64;
            if self.samples_since_status >= self.status_interval {
                self.samples_since_status = 0;
                self.emit(RendererEvent::Status {
                    buffered: self.buffer.occupancy(),
                    underruns: self.state.underrun_count,
                });
            }
        }

        self.sync_buffered_atomic();
        alive
    }

    /// Underrun: pass through the few real samples 1:1 and pad with
    /// silence. Resampling is skipped on purpose — stretching too-little
    /// data to fill a block amplifies artifacts.
    fn render_underrun(&mut self, output: &mut [Sample]) -> bool {
        let mut filled = 0;
        while filled < output.len() {
            match self.buffer.read() {
                Some(sample) => {
                    output[filled] = sample;
                    filled += 1;
                }
                None => break,
            }
        }
        output[filled..].fill(0.0);

        self.state.underrun_count += 1;
        self.atomics
            .underruns
            .store(self.state.underrun_count, Ordering::Relaxed);
        self.emit(RendererEvent::Underrun {
            buffered: self.buffer.occupancy(),
        });
        log::debug!(
            "underrun #{}: {} real samples, {} padded",
            self.state.underrun_count,
            filled,
            output.len() - filled
        );

        if self.buffer.is_empty() {
            // Occupancy hit zero while draining: the stream is exhausted.
            // A paused-but-not-drained session never lands here.
            self.state.is_playing = false;
            self.finished = true;
            self.sync_state_atomic();
            self.emit(RendererEvent::Finished);
            log::info!(
                "stream drained after {} ticks ({} underruns)",
                self.state.tick_counter,
                self.state.underrun_count
            );
            false
        } else {
            true
        }
    }

    /// Variable-speed playback via linear interpolation over fractional
    /// source positions. Consumes exactly `samples_needed` source samples
    /// for the block, which differs from the block size whenever speed != 1.
    fn render_resampled(&mut self, output: &mut [Sample], samples_needed: usize) {
        let speed = self.state.speed;
        for (i, slot) in output.iter_mut().enumerate() {
            let source_pos = i as f64 * speed;
            let read_pos = source_pos.floor() as usize;
            *slot = if read_pos < samples_needed - 1 {
                let frac = (source_pos - read_pos as f64) as Sample;
                let a = self.buffer.peek(read_pos);
                let b = self.buffer.peek(read_pos + 1);
                a * (1.0 - frac) + b * frac
            } else {
                // last fractional position: no look-ahead past available data
                self.buffer.peek(read_pos)
            };
        }
        self.buffer.advance_read(samples_needed);
    }

    /// Grow the buffer ahead of an ingest that would overflow it, doubling
    /// until the chunk fits or the ceiling is reached. Runs during command
    /// handling at the block boundary, never in the per-sample loop.
    fn grow_for(&mut self, incoming: usize) {
        let needed = self.buffer.occupancy() + incoming;
        if needed <= self.buffer.capacity() || self.buffer.capacity() >= self.max_capacity {
            return;
        }
        let mut new_capacity = self.buffer.capacity();
        while new_capacity < needed {
            new_capacity *= 2;
        }
        let new_capacity = new_capacity.min(self.max_capacity);
        if new_capacity > self.buffer.capacity() {
            log::debug!(
                "growing sample buffer {} -> {} samples",
                self.buffer.capacity(),
                new_capacity
            );
            self.buffer.grow(new_capacity);
        }
    }

    /// Push an event without ever blocking the tick; if the queue is full
    /// the event is dropped (telemetry is advisory)
    fn emit(&mut self, event: RendererEvent) {
        let _ = self.events.push(event);
    }

    #[inline]
    fn sync_buffered_atomic(&self) {
        self.atomics
            .buffered
            .store(self.buffer.occupancy() as u64, Ordering::Relaxed);
    }

    #[inline]
    fn sync_state_atomic(&self) {
        let state = if self.finished {
            PlayState::Finished
        } else if !self.state.has_started {
            PlayState::Waiting
        } else if self.state.is_playing {
            PlayState::Playing
        } else {
            PlayState::Paused
        };
        self.atomics.state.store(state.to_u8(), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::command::event_channel;

    /// Session sized in whole samples: sample_rate 100 makes the
    /// secs-based config fields exact
    fn test_config(capacity: usize, preroll: usize) -> SessionConfig {
        SessionConfig {
            sample_rate: 100,
            preroll_secs: preroll as f64 / 100.0,
            capacity_secs: capacity as f64 / 100.0,
            max_capacity_secs: capacity as f64 / 100.0,
            buffer_policy: BufferPolicy::Overwrite,
            speed: 1.0,
        }
    }

    fn make_renderer(config: SessionConfig) -> (Renderer, rtrb::Consumer<RendererEvent>) {
        let (tx, rx) = event_channel();
        (Renderer::new(&config, tx), rx)
    }

    fn drain_events(rx: &mut rtrb::Consumer<RendererEvent>) -> Vec<RendererEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.pop() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_auto_start_at_preroll_threshold() {
        let (mut renderer, mut rx) = make_renderer(test_config(16, 8));

        renderer.ingest(&[0.1; 7]);
        assert!(!renderer.state().has_started);
        assert!(drain_events(&mut rx).is_empty());

        renderer.ingest(&[0.1; 1]);
        assert!(renderer.state().has_started);
        assert!(renderer.state().is_playing);
        assert!(renderer.state().read_cursor_locked);
        assert_eq!(drain_events(&mut rx), vec![RendererEvent::Started]);

        // read cursor points at the oldest sample: (write_index - count) mod capacity
        assert_eq!(renderer.buffer.read_index(), 0);
    }

    #[test]
    fn test_auto_start_happens_once() {
        let (mut renderer, mut rx) = make_renderer(test_config(16, 4));
        renderer.ingest(&[0.1; 8]);
        renderer.ingest(&[0.2; 4]);
        let started = drain_events(&mut rx)
            .iter()
            .filter(|e| matches!(e, RendererEvent::Started))
            .count();
        assert_eq!(started, 1);
    }

    #[test]
    fn test_unity_speed_fidelity() {
        let (mut renderer, _rx) = make_renderer(test_config(64, 4));
        let samples: Vec<Sample> = (0..16).map(|i| i as Sample / 16.0).collect();
        renderer.ingest(&samples);

        let mut output = [9.9; 8];
        assert!(renderer.render(&mut output));
        assert_eq!(&output[..], &samples[..8]);
        assert_eq!(renderer.occupancy(), 8);
    }

    #[test]
    fn test_underrun_outputs_real_samples_then_silence() {
        let (mut renderer, mut rx) = make_renderer(test_config(64, 3));
        renderer.ingest(&[0.5, 0.6, 0.7]);

        let mut output = [9.9; 8];
        assert!(renderer.render(&mut output));
        assert_eq!(&output[..3], &[0.5, 0.6, 0.7]);
        assert_eq!(&output[3..], &[0.0; 5]);
        assert_eq!(renderer.occupancy(), 0);
        assert_eq!(renderer.state().underrun_count, 1);

        let events = drain_events(&mut rx);
        assert!(events.contains(&RendererEvent::Underrun { buffered: 0 }));
        // draining to zero is terminal
        assert!(events.contains(&RendererEvent::Finished));
    }

    #[test]
    fn test_drain_to_finish_is_terminal() {
        let (mut renderer, mut rx) = make_renderer(test_config(64, 3));
        renderer.ingest(&[0.5, 0.6, 0.7]);

        let mut output = [9.9; 8];
        renderer.render(&mut output);
        drain_events(&mut rx);

        // next tick with an empty buffer: all zeros, returns false,
        // no further notifications
        let mut output = [9.9; 8];
        assert!(!renderer.render(&mut output));
        assert_eq!(output, [0.0; 8]);
        assert!(drain_events(&mut rx).is_empty());
        assert!(renderer.is_finished());
        assert_eq!(renderer.atomics().play_state(), PlayState::Finished);
    }

    #[test]
    fn test_finished_emitted_exactly_once() {
        let (mut renderer, mut rx) = make_renderer(test_config(64, 2));
        renderer.ingest(&[0.5, 0.6]);

        let mut output = [0.0; 4];
        renderer.render(&mut output);
        renderer.render(&mut output);
        renderer.render(&mut output);

        let finished = drain_events(&mut rx)
            .iter()
            .filter(|e| matches!(e, RendererEvent::Finished))
            .count();
        assert_eq!(finished, 1);
    }

    #[test]
    fn test_resampling_at_double_speed() {
        let (mut renderer, _rx) = make_renderer(test_config(64, 8));
        renderer.ingest(&[1.0; 8]);
        renderer.set_speed(2.0);

        let mut output = [0.0; 4];
        assert!(renderer.render(&mut output));
        // interpolation between equal neighbors is a no-op
        assert_eq!(output, [1.0; 4]);
        // consumed ceil(4 * 2.0) = 8 source samples
        assert_eq!(renderer.occupancy(), 0);
    }

    #[test]
    fn test_resampling_interpolates_between_neighbors() {
        let (mut renderer, _rx) = make_renderer(test_config(64, 4));
        renderer.ingest(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        renderer.set_speed(1.5);

        let mut output = [0.0; 4];
        assert!(renderer.render(&mut output));
        // source positions 0.0, 1.5, 3.0, 4.5; the last is samplesNeeded-1
        // within ceil(4*1.5)=6, so positions 0..2 interpolate and 4.5 does too
        assert_eq!(output[0], 0.0);
        assert_eq!(output[1], 1.5);
        assert_eq!(output[2], 3.0);
        assert_eq!(output[3], 4.5);
        assert_eq!(renderer.occupancy(), 0);
    }

    #[test]
    fn test_half_speed_consumes_fewer_samples() {
        let (mut renderer, _rx) = make_renderer(test_config(64, 4));
        renderer.ingest(&[0.5; 16]);
        renderer.set_speed(0.5);

        let mut output = [0.0; 8];
        assert!(renderer.render(&mut output));
        assert_eq!(output, [0.5; 8]);
        // consumed ceil(8 * 0.5) = 4 source samples
        assert_eq!(renderer.occupancy(), 12);
    }

    #[test]
    fn test_overflow_overwrite_before_lock() {
        let (mut renderer, _rx) = make_renderer(test_config(8, 100));
        // the whole chunk is written before the start check runs, so the
        // overwrites happen with the cursor still unfrozen
        let samples: Vec<Sample> = (0..12).map(|i| i as Sample).collect();
        renderer.ingest(&samples);

        // count never exceeded capacity and the window slid forward:
        // the oldest 4 samples were discarded
        assert_eq!(renderer.occupancy(), 8);
        let mut output = [0.0; 8];
        renderer.render(&mut output);
        assert_eq!(output, [4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);
    }

    #[test]
    fn test_read_cursor_frozen_after_lock() {
        let (mut renderer, _rx) = make_renderer(test_config(8, 8));
        renderer.ingest(&(0..8).map(|i| i as Sample).collect::<Vec<_>>());
        assert!(renderer.state().read_cursor_locked);
        let locked_read = renderer.buffer.read_index();

        // overflow after lock: write side wraps, read cursor must not move
        renderer.ingest(&[99.0; 4]);
        assert_eq!(renderer.buffer.read_index(), locked_read);
        assert!(renderer.state().read_cursor_locked);
    }

    #[test]
    fn test_pause_is_silent_and_non_destructive() {
        let (mut renderer, _rx) = make_renderer(test_config(64, 4));
        let samples: Vec<Sample> = (0..32).map(|i| i as Sample).collect();
        renderer.ingest(&samples);
        renderer.pause();

        for _ in 0..3 {
            let mut output = [9.9; 8];
            assert!(renderer.render(&mut output));
            assert_eq!(output, [0.0; 8]);
        }
        assert_eq!(renderer.occupancy(), 32);

        renderer.resume();
        let mut output = [0.0; 8];
        assert!(renderer.render(&mut output));
        assert_eq!(&output[..], &samples[..8]);
    }

    #[test]
    fn test_resume_before_start_is_noop() {
        let (mut renderer, _rx) = make_renderer(test_config(64, 16));
        renderer.ingest(&[0.1; 4]);
        renderer.resume();
        assert!(!renderer.state().is_playing);

        // playback still starts on its own once the pre-roll is met
        renderer.ingest(&[0.1; 12]);
        assert!(renderer.state().is_playing);
    }

    #[test]
    fn test_speed_clamped_to_positive() {
        let (mut renderer, _rx) = make_renderer(test_config(64, 4));
        renderer.set_speed(0.0);
        assert_eq!(renderer.state().speed, MIN_SPEED);
        renderer.set_speed(-3.0);
        assert_eq!(renderer.state().speed, MIN_SPEED);
    }

    #[test]
    fn test_status_emitted_at_cadence() {
        // sample_rate 100 -> status every 10 rendered samples
        let (mut renderer, mut rx) = make_renderer(test_config(64, 4));
        renderer.ingest(&[0.1; 64]);
        drain_events(&mut rx);

        let mut output = [0.0; 10];
        renderer.render(&mut output);
        let events = drain_events(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, RendererEvent::Status { buffered: 54, underruns: 0 })));
    }

    #[test]
    fn test_grow_policy_extends_capacity() {
        let config = SessionConfig {
            sample_rate: 100,
            preroll_secs: 0.04,
            capacity_secs: 0.08,
            max_capacity_secs: 0.64,
            buffer_policy: BufferPolicy::Grow,
            speed: 1.0,
        };
        let (mut renderer, _rx) = make_renderer(config);

        let samples: Vec<Sample> = (0..32).map(|i| i as Sample).collect();
        renderer.ingest(&samples);
        // grew past the initial 8-sample capacity; nothing lost
        assert_eq!(renderer.occupancy(), 32);

        let mut output = [0.0; 8];
        renderer.render(&mut output);
        assert_eq!(&output[..], &samples[..8]);
    }

    #[test]
    fn test_grow_policy_respects_ceiling() {
        let config = SessionConfig {
            sample_rate: 100,
            preroll_secs: 0.04,
            capacity_secs: 0.08,
            max_capacity_secs: 0.16,
            buffer_policy: BufferPolicy::Grow,
            speed: 1.0,
        };
        let (mut renderer, _rx) = make_renderer(config);

        renderer.ingest(&(0..64).map(|i| i as Sample).collect::<Vec<_>>());
        // capped at 16 samples; overwrite-oldest past the ceiling
        assert_eq!(renderer.occupancy(), 16);
    }

    #[test]
    fn test_commands_applied_in_order() {
        let (mut renderer, _rx) = make_renderer(test_config(64, 4));
        let (mut tx, mut cmd_rx) = crate::engine::command::command_channel();

        tx.push(RendererCommand::Chunk(
            (0..16).map(|i| i as Sample).collect::<Vec<_>>().into_boxed_slice(),
        ))
        .unwrap();
        tx.push(RendererCommand::SetSpeed(2.0)).unwrap();
        tx.push(RendererCommand::Pause).unwrap();

        renderer.process_commands(&mut cmd_rx);
        assert_eq!(renderer.occupancy(), 16);
        assert_eq!(renderer.state().speed, 2.0);
        assert!(!renderer.state().is_playing);
    }

    #[test]
    fn test_occupancy_invariant_under_random_ingests() {
        let (mut renderer, _rx) = make_renderer(test_config(32, 8));
        let mut seed: u64 = 0x5eed;
        for _ in 0..200 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let len = (seed >> 33) as usize % 17;
            renderer.ingest(&vec![0.25; len]);
            assert!(renderer.occupancy() <= 32);
        }
    }
}
