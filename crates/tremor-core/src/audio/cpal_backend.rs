//! CPAL audio output backend
//!
//! Builds a single output stream whose callback exclusively owns the
//! renderer. The callback pops pending commands at the block boundary,
//! renders one mono block, and fans it out to every device channel.
//!
//! ```text
//! ┌──────────────────┐                     ┌─────────────────────┐
//! │  Producer thread │───push()───────────►│   Command Queue     │
//! │ (fetch pipeline) │                     │  (lock-free SPSC)   │
//! └──────────────────┘                     └──────────┬──────────┘
//!         ▲                                           │ pop()
//!         │ try_recv()                                ▼
//! ┌───────┴──────────┐                     ┌─────────────────────┐
//! │   Event Queue    │◄────push()──────────│  CPAL Audio Thread  │
//! │ (lock-free SPSC) │                     │  (owns Renderer)    │
//! └──────────────────┘                     └─────────────────────┘
//! ```

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize as CpalBufferSize, SampleFormat, Stream, StreamConfig};

use crate::engine::{event_channel, Renderer, RendererCommand, SessionConfig};
use crate::types::Sample;

use super::backend::{new_command_sender, AudioSystemResult, EventReceiver};
use super::config::{AudioConfig, DEFAULT_BUFFER_SIZE, DEFAULT_SAMPLE_RATE, MAX_BUFFER_SIZE};
use super::device::{find_device_by_id, get_default_device};
use super::error::{AudioError, AudioResult};

/// Handle to the running output stream
///
/// Keeps the stream alive. Drop this to stop audio.
pub struct AudioHandle {
    _stream: Stream,
    sample_rate: u32,
    buffer_size: u32,
}

impl AudioHandle {
    /// Negotiated sample rate of the output stream
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Requested buffer size in frames
    pub fn buffer_size(&self) -> u32 {
        self.buffer_size
    }

    /// Output latency in milliseconds (one-way)
    pub fn latency_ms(&self) -> f32 {
        (self.buffer_size as f32 / self.sample_rate as f32) * 1000.0
    }
}

/// State owned by the audio callback
struct CallbackState {
    renderer: Renderer,
    command_rx: rtrb::Consumer<RendererCommand>,
    /// Pre-allocated mono render buffer; the callback never allocates
    render_buffer: Vec<Sample>,
}

/// Start the audio system for one audification session
///
/// The session's sample rate is overridden by whatever rate the device
/// negotiates, so pre-roll and telemetry cadence stay wall-clock
/// accurate.
pub fn start_audio_system(
    config: &AudioConfig,
    session: &SessionConfig,
) -> AudioResult<AudioSystemResult> {
    let device = match &config.device {
        Some(id) => find_device_by_id(id)?,
        None => get_default_device()?,
    };

    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    log::info!("Using audio device: {}", device_name);

    let (supported_config, buffer_size) = get_output_config(&device, config)?;
    let sample_rate = supported_config.sample_rate().0;

    let stream_config = StreamConfig {
        channels: supported_config.channels(),
        sample_rate: supported_config.sample_rate(),
        buffer_size: CpalBufferSize::Fixed(buffer_size),
    };

    let latency_ms = (buffer_size as f32 / sample_rate as f32) * 1000.0;

    log::info!(
        "Audio config: {} channels, {}Hz, {} frames (~{:.1}ms latency)",
        stream_config.channels,
        sample_rate,
        buffer_size,
        latency_ms
    );

    let session = session.clone().with_sample_rate(sample_rate);

    let (command_sender, command_rx) = new_command_sender();
    let (event_tx, event_rx) = event_channel();

    let renderer = Renderer::new(&session, event_tx);
    let atomics = renderer.atomics();

    let state = Arc::new(Mutex::new(CallbackState {
        renderer,
        command_rx,
        render_buffer: vec![0.0; MAX_BUFFER_SIZE],
    }));

    let stream = build_output_stream(&device, &stream_config, state)?;
    stream
        .play()
        .map_err(|e| AudioError::StreamPlayError(e.to_string()))?;

    log::info!("Audio stream started");

    Ok(AudioSystemResult {
        handle: AudioHandle {
            _stream: stream,
            sample_rate,
            buffer_size,
        },
        command_sender,
        event_receiver: EventReceiver { consumer: event_rx },
        atomics,
        sample_rate,
        buffer_size,
        latency_ms,
    })
}

/// Get the best output configuration for a device
///
/// Returns (SupportedStreamConfig, buffer_size_in_frames).
fn get_output_config(
    device: &cpal::Device,
    config: &AudioConfig,
) -> AudioResult<(cpal::SupportedStreamConfig, u32)> {
    let supported_configs: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| AudioError::ConfigError(e.to_string()))?
        .collect();

    if supported_configs.is_empty() {
        return Err(AudioError::ConfigError(
            "No supported output configurations".to_string(),
        ));
    }

    let target_sample_rate = config.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE);

    // Prefer f32 format and the requested sample rate
    let best_config = supported_configs
        .iter()
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .find(|c| {
            target_sample_rate >= c.min_sample_rate().0
                && target_sample_rate <= c.max_sample_rate().0
        })
        .or_else(|| {
            supported_configs
                .iter()
                .find(|c| c.sample_format() == SampleFormat::F32)
        })
        .or_else(|| supported_configs.first())
        .ok_or_else(|| {
            AudioError::ConfigError("No suitable output configuration found".to_string())
        })?;

    let sample_rate = if target_sample_rate >= best_config.min_sample_rate().0
        && target_sample_rate <= best_config.max_sample_rate().0
    {
        cpal::SampleRate(target_sample_rate)
    } else {
        let fallback = best_config.max_sample_rate();
        log::warn!(
            "Audio device doesn't support {}Hz, falling back to {}Hz",
            target_sample_rate,
            fallback.0
        );
        fallback
    };

    let stream_config = best_config.clone().with_sample_rate(sample_rate);

    let buffer_size = match config.buffer_size.as_frames() {
        Some(frames) => frames.clamp(64, MAX_BUFFER_SIZE as u32),
        None => DEFAULT_BUFFER_SIZE,
    };

    log::debug!(
        "Selected buffer size: {} frames for {:?} mode",
        buffer_size,
        config.buffer_size
    );

    Ok((stream_config, buffer_size))
}

/// Build the output stream
///
/// The mono rendered signal is duplicated into every device channel. The
/// renderer's liveness flag going false (stream drained) leaves the
/// stream running on silence; the controller reacts to the Finished
/// event and drops the handle.
fn build_output_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    state: Arc<Mutex<CallbackState>>,
) -> AudioResult<Stream> {
    let channels = config.channels as usize;

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                let mut state = state.lock().unwrap();
                let state = &mut *state;
                let n_frames = data.len() / channels;

                // Apply pending commands once, at the block boundary
                state.renderer.process_commands(&mut state.command_rx);

                // Render in MAX_BUFFER_SIZE slices in case the device asks
                // for more frames than the pre-allocated buffer holds
                let mut frames_done = 0;
                while frames_done < n_frames {
                    let n = (n_frames - frames_done).min(MAX_BUFFER_SIZE);
                    let block = &mut state.render_buffer[..n];
                    state.renderer.render(block);

                    let out = &mut data[frames_done * channels..(frames_done + n) * channels];
                    for (frame, &sample) in out.chunks_mut(channels).zip(block.iter()) {
                        frame.fill(sample);
                    }
                    frames_done += n;
                }
            },
            move |err| {
                log::error!("Audio stream error: {}", err);
            },
            None, // no timeout
        )
        .map_err(|e| AudioError::StreamBuildError(e.to_string()))?;

    Ok(stream)
}
