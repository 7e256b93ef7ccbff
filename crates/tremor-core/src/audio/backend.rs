//! Producer-side handles to the running audio system
//!
//! The renderer lives inside the real-time callback; the producer holds
//! only these wrappers around the lock-free queues plus the atomics
//! mirror. All operations here are non-blocking.

use std::sync::Arc;

use crate::engine::{command_channel, RendererAtomics, RendererCommand, RendererEvent};

/// Command sender for the producer/controller side
///
/// Wraps the lock-free producer end of the command queue. Pushing is
/// wait-free; a full queue returns the command so the caller can retry
/// after a pause (the producer side is allowed to wait, the renderer
/// never is).
pub struct CommandSender {
    pub(crate) producer: rtrb::Producer<RendererCommand>,
}

impl CommandSender {
    /// Send a command to the renderer (non-blocking)
    ///
    /// Returns `Err(cmd)` with the command handed back if the queue is
    /// full.
    pub fn send(&mut self, cmd: RendererCommand) -> Result<(), RendererCommand> {
        self.producer.push(cmd).map_err(|e| match e {
            rtrb::PushError::Full(value) => value,
        })
    }

    /// Whether the queue currently has room for another command
    pub fn has_space(&self) -> bool {
        self.producer.slots() > 0
    }
}

/// Create a command sender and the matching renderer-side consumer
///
/// Used by the audio backend at stream creation, and directly by tests
/// or headless producers that drive a renderer without a device.
pub fn new_command_sender() -> (CommandSender, rtrb::Consumer<RendererCommand>) {
    let (producer, consumer) = command_channel();
    (CommandSender { producer }, consumer)
}

/// Event receiver for the producer/controller side
pub struct EventReceiver {
    pub(crate) consumer: rtrb::Consumer<RendererEvent>,
}

impl EventReceiver {
    /// Pop the next pending renderer event, if any (non-blocking)
    pub fn try_recv(&mut self) -> Option<RendererEvent> {
        self.consumer.pop().ok()
    }
}

/// Result of starting the audio system
///
/// Everything the producer/controller needs to drive and observe the
/// session.
pub struct AudioSystemResult {
    /// Handle keeping the output stream alive; drop to stop audio
    pub handle: super::cpal_backend::AudioHandle,
    /// Lock-free command sender
    pub command_sender: CommandSender,
    /// Lock-free event receiver
    pub event_receiver: EventReceiver,
    /// Renderer state mirror for polling without events
    pub atomics: Arc<RendererAtomics>,
    /// Negotiated sample rate of the output stream
    pub sample_rate: u32,
    /// Requested buffer size in frames
    pub buffer_size: u32,
    /// Output latency in milliseconds (one-way)
    pub latency_ms: f32,
}
