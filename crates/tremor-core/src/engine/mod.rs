//! Audification engine - circular buffer, renderer, message channels
//!
//! This module contains the real-time core:
//! - SampleBuffer: circular container the session's samples live in
//! - Renderer: tick-driven sample renderer with variable-speed resampling
//! - Command/event channels: the lock-free boundary to the producer side

mod buffer;
mod command;
mod renderer;

pub use buffer::*;
pub use command::*;
pub use renderer::*;
