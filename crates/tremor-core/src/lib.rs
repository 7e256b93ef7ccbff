//! Tremor Core - Real-time audification engine for seismic waveforms
//!
//! Streams long waveform recordings as audible sound. Playback starts as
//! soon as a short pre-roll has buffered; the rest of the data arrives
//! progressively while the renderer keeps the output glitch-free.

pub mod audio;
pub mod engine;
pub mod types;

pub use types::*;
