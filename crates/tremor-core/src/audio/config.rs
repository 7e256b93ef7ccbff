//! Audio output configuration
//!
//! Device selection, buffer size and sample rate preferences for the
//! output stream. Fixed at stream creation; the negotiated values are
//! reported back in `AudioSystemResult`.

use serde::{Deserialize, Serialize};

use crate::types::BLOCK_SIZE;

/// Largest output block the backend will ever hand the renderer in one
/// callback. Used to pre-allocate the render buffer so the callback never
/// allocates.
pub const MAX_BUFFER_SIZE: usize = 8192;

/// Default buffer size when no preference is specified (frames)
/// 512 frames is a safe default that works on most systems.
pub const DEFAULT_BUFFER_SIZE: u32 = 512;

/// Default sample rate for the output stream (44.1kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = crate::types::SAMPLE_RATE;

/// Preferred buffer size for the output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BufferSize {
    /// Let the system choose the default buffer size
    #[default]
    Default,
    /// Request a specific buffer size in frames (may be adjusted by the
    /// device)
    Fixed(u32),
    /// Small buffer for responsive transport at the cost of underrun
    /// headroom
    LowLatency,
}

impl BufferSize {
    /// Buffer size in frames, or None for system default
    pub fn as_frames(&self) -> Option<u32> {
        match self {
            BufferSize::Default => None,
            BufferSize::Fixed(frames) => Some(*frames),
            BufferSize::LowLatency => Some(BLOCK_SIZE as u32),
        }
    }
}

/// Audio output device identifier
///
/// Includes both the device name and the host backend (ALSA, WASAPI, ...)
/// so devices from different hosts can be told apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceId {
    /// Device name as reported by the system
    pub name: String,
    /// Audio host identifier (e.g., "ALSA", "CoreAudio"); None uses the
    /// default host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl DeviceId {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: None,
        }
    }

    pub fn with_host(name: &str, host: &str) -> Self {
        Self {
            name: name.to_string(),
            host: Some(host.to_string()),
        }
    }

    /// Display label that includes the host if available
    pub fn display_label(&self) -> String {
        match &self.host {
            Some(host) => format!("[{}] {}", host, self.name),
            None => self.name.clone(),
        }
    }
}

/// Configuration for the audio output backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Output device (None = system default)
    pub device: Option<DeviceId>,
    /// Preferred buffer size
    pub buffer_size: BufferSize,
    /// Preferred sample rate (None = DEFAULT_SAMPLE_RATE, falling back to
    /// whatever the device supports)
    pub sample_rate: Option<u32>,
}

impl AudioConfig {
    /// Set the output device
    pub fn with_device(mut self, device: DeviceId) -> Self {
        self.device = Some(device);
        self
    }

    /// Set a fixed buffer size in frames
    pub fn with_buffer_frames(mut self, frames: u32) -> Self {
        self.buffer_size = BufferSize::Fixed(frames);
        self
    }

    /// Set the preferred sample rate
    pub fn with_sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = Some(rate);
        self
    }
}
