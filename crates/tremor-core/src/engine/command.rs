//! Lock-free message channels across the real-time boundary
//!
//! The producer (fetch pipeline / UI) and the renderer run on independent
//! timelines and share no mutable state; they communicate only through two
//! SPSC ring buffers, one per direction:
//!
//! - producer → renderer: [`RendererCommand`] (chunk payloads, transport)
//! - renderer → producer: [`RendererEvent`] (started/underrun/finished/status)
//!
//! The `rtrb` ring buffer is wait-free on both ends and never allocates
//! after construction, so the render tick can drain commands and push
//! events without risking a dropout. Commands take effect at the next tick
//! boundary; there is no preemption of an in-flight tick.

use crate::types::Sample;

/// Commands sent from the producer to the renderer
///
/// Fire-and-forget: none of these produce a reply. Chunk payloads are boxed
/// so the enum stays pointer-sized for cache-efficient queueing.
#[derive(Debug, Clone, PartialEq)]
pub enum RendererCommand {
    /// Append a chunk of samples to the session buffer
    Chunk(Box<[Sample]>),
    /// Set the playback speed multiplier for subsequent ticks
    SetSpeed(f64),
    /// Suspend output (silence); buffer and cursors untouched
    Pause,
    /// Resume output; no effect before auto-start or when already playing
    Resume,
}

/// Notifications emitted by the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RendererEvent {
    /// Pre-roll reached; playback has started. Emitted exactly once.
    Started,
    /// A tick requested more samples than were buffered
    Underrun {
        /// Occupancy after the tick consumed what it could
        buffered: usize,
    },
    /// Buffer drained to empty during underrun; terminal. Emitted exactly
    /// once; no further events follow.
    Finished,
    /// Periodic telemetry (~100ms of rendered output)
    Status {
        /// Current buffer occupancy in samples
        buffered: usize,
        /// Cumulative underrun count for the session
        underruns: u64,
    },
}

/// Capacity of the command queue
///
/// Chunks arrive at most every few hundred milliseconds and transport
/// commands are sporadic, but a stalled audio device must not make the
/// producer drop data immediately. 256 slots give several minutes of
/// headroom at typical chunk pacing.
pub const COMMAND_QUEUE_CAPACITY: usize = 256;

/// Capacity of the event queue
///
/// Status events arrive ~10/s; a producer polling once per second stays
/// far below this. When the queue is full the renderer drops the event
/// rather than wait — telemetry is advisory.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// Create the producer→renderer command channel
pub fn command_channel() -> (rtrb::Producer<RendererCommand>, rtrb::Consumer<RendererCommand>) {
    rtrb::RingBuffer::new(COMMAND_QUEUE_CAPACITY)
}

/// Create the renderer→producer event channel
pub fn event_channel() -> (rtrb::Producer<RendererEvent>, rtrb::Consumer<RendererEvent>) {
    rtrb::RingBuffer::new(EVENT_QUEUE_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_channel_roundtrip() {
        let (mut tx, mut rx) = command_channel();

        tx.push(RendererCommand::SetSpeed(2.0)).unwrap();
        tx.push(RendererCommand::Chunk(vec![0.5; 4].into_boxed_slice()))
            .unwrap();

        assert!(matches!(rx.pop().unwrap(), RendererCommand::SetSpeed(s) if s == 2.0));
        match rx.pop().unwrap() {
            RendererCommand::Chunk(chunk) => assert_eq!(chunk.len(), 4),
            _ => panic!("expected chunk"),
        }
        assert!(rx.pop().is_err());
    }

    #[test]
    fn test_event_channel_roundtrip() {
        let (mut tx, mut rx) = event_channel();

        tx.push(RendererEvent::Started).unwrap();
        tx.push(RendererEvent::Underrun { buffered: 17 }).unwrap();

        assert_eq!(rx.pop().unwrap(), RendererEvent::Started);
        assert_eq!(rx.pop().unwrap(), RendererEvent::Underrun { buffered: 17 });
        assert!(rx.pop().is_err());
    }

    #[test]
    fn test_command_size() {
        // Keep RendererCommand small for cache efficiency in the ring
        // buffer: chunk payloads are boxed slices (ptr + len), so the
        // whole enum fits in 24 bytes.
        let size = std::mem::size_of::<RendererCommand>();
        assert!(size <= 24, "RendererCommand is {} bytes, expected <= 24", size);
    }
}
