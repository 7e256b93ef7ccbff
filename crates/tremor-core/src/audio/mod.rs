//! Cross-platform audio output for Tremor
//!
//! Runs the renderer inside a CPAL output stream with a lock-free
//! design for real-time safety:
//!
//! - **Producer thread**: Sends commands via lock-free ringbuffer
//! - **Audio thread**: Owns the Renderer exclusively, processes commands
//!   at block boundaries
//! - **Atomics**: Producer polls playback state via relaxed atomics
//!   (no locks)
//!
//! # Example Usage
//!
//! ```ignore
//! use tremor_core::audio::{start_audio_system, AudioConfig};
//! use tremor_core::engine::{RendererCommand, SessionConfig};
//!
//! let mut audio = start_audio_system(&AudioConfig::default(), &SessionConfig::default())?;
//!
//! // Feed samples from the producer side
//! audio.command_sender.send(RendererCommand::Chunk(samples))?;
//!
//! // Read state via atomics (no locks)
//! let buffered = audio.atomics.buffered();
//! ```

mod backend;
mod config;
mod cpal_backend;
mod device;
mod error;

// Re-export public API
pub use config::{
    AudioConfig, BufferSize, DeviceId, DEFAULT_BUFFER_SIZE, DEFAULT_SAMPLE_RATE, MAX_BUFFER_SIZE,
};

pub use backend::{new_command_sender, AudioSystemResult, CommandSender, EventReceiver};

pub use cpal_backend::{start_audio_system, AudioHandle};

pub use device::{find_device_by_id, get_default_device, get_output_devices, OutputDevice};

pub use error::{AudioError, AudioResult};
