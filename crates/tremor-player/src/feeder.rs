//! Background feeder thread
//!
//! Slices a decoded waveform into fixed-duration chunks and pushes them
//! through the lock-free command queue on a timed schedule, simulating
//! the progressive arrival of data over a network. The feeder may block
//! freely; the renderer never does.
//!
//! The command queue is single-producer, so the feeder is also the relay
//! for transport commands: the controller hands it pause/resume/speed
//! over an mpsc channel and the feeder forwards them interleaved with
//! chunk delivery. After the source is exhausted the feeder keeps
//! relaying transport until the controller hangs up.

use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tremor_core::audio::CommandSender;
use tremor_core::engine::RendererCommand;

use crate::config::FeederConfig;
use crate::source::WaveformSource;

/// How long to sleep before retrying a push into a full command queue
const FULL_QUEUE_BACKOFF: Duration = Duration::from_millis(10);

/// Handle to the background feeder thread
pub struct Feeder {
    handle: JoinHandle<()>,
}

impl Feeder {
    /// Spawn the feeder thread
    ///
    /// Takes ownership of the command sender (sole producer). Transport
    /// commands arriving on `transport` are forwarded between chunks.
    pub fn spawn(
        source: WaveformSource,
        config: FeederConfig,
        sender: CommandSender,
        transport: Receiver<RendererCommand>,
    ) -> Self {
        let handle = thread::Builder::new()
            .name("waveform-feeder".to_string())
            .spawn(move || {
                feeder_thread(source, config, sender, transport);
            })
            .expect("Failed to spawn feeder thread");

        Self { handle }
    }

    /// Wait for the feeder to exit (source delivered and transport
    /// channel closed)
    pub fn join(self) {
        let _ = self.handle.join();
    }
}

/// The feeder thread function
fn feeder_thread(
    source: WaveformSource,
    config: FeederConfig,
    mut sender: CommandSender,
    transport: Receiver<RendererCommand>,
) {
    let chunk_samples =
        ((config.chunk_ms as f64 / 1000.0) * source.sample_rate as f64).max(1.0) as usize;

    let pacing = if config.rate_factor > 0.0 {
        Some(Duration::from_millis(
            (config.chunk_ms as f64 / config.rate_factor) as u64,
        ))
    } else {
        None
    };

    let total_chunks = source.samples.len().div_ceil(chunk_samples);
    log::info!(
        "Feeder started: {} ({} samples, {} chunks of {} samples, pacing {:?})",
        source.label,
        source.samples.len(),
        total_chunks,
        chunk_samples,
        pacing
    );

    for (i, chunk) in source.samples.chunks(chunk_samples).enumerate() {
        forward_transport(&transport, &mut sender);
        push_with_backoff(&mut sender, RendererCommand::Chunk(chunk.into()));

        log::debug!("Feeder delivered chunk {}/{}", i + 1, total_chunks);

        if let Some(interval) = pacing {
            thread::sleep(interval);
        }
    }

    log::info!("Feeder finished: {} fully delivered", source.label);

    // Source exhausted; keep relaying transport until the controller
    // drops its end
    while let Ok(cmd) = transport.recv() {
        push_with_backoff(&mut sender, cmd);
    }
}

/// Forward any pending transport commands (non-blocking drain)
fn forward_transport(transport: &Receiver<RendererCommand>, sender: &mut CommandSender) {
    while let Ok(cmd) = transport.try_recv() {
        push_with_backoff(sender, cmd);
    }
}

/// Push a command, retrying with a short sleep while the queue is full
fn push_with_backoff(sender: &mut CommandSender, mut cmd: RendererCommand) {
    while let Err(returned) = sender.send(cmd) {
        cmd = returned;
        thread::sleep(FULL_QUEUE_BACKOFF);
    }
}
