//! Waveform sources for the feeder
//!
//! Two sources: WAV files decoded via hound (mixed down to mono,
//! normalized to [-1, 1]), and a synthetic linear sweep for detecting
//! buffering glitches (any discontinuity in the output means a sample
//! was dropped or duplicated somewhere between ingestion and render).

use std::path::Path;

use anyhow::{bail, Context, Result};

/// A fully decoded mono waveform ready for chunked delivery
pub struct WaveformSource {
    /// Mono samples normalized to [-1, 1]
    pub samples: Vec<f32>,
    /// Native sample rate of the source material
    pub sample_rate: u32,
    /// Label for logging (file name or generator name)
    pub label: String,
}

impl WaveformSource {
    /// Duration of the source in seconds at its native rate
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Load a WAV file and mix it down to normalized mono
pub fn load_wav(path: &Path) -> Result<WaveformSource> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file: {:?}", path))?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        bail!("WAV file has zero channels: {:?}", path);
    }

    log::info!(
        "Loading WAV: {:?} ({} ch, {} Hz, {:?} {}-bit)",
        path,
        spec.channels,
        spec.sample_rate,
        spec.sample_format,
        spec.bits_per_sample
    );

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .with_context(|| format!("Failed to decode float samples from {:?}", path))?,
        hound::SampleFormat::Int => {
            // Normalize by the full scale of the source bit depth
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()
                .with_context(|| format!("Failed to decode int samples from {:?}", path))?
        }
    };

    let samples = mix_to_mono(&interleaved, channels);

    let label = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("wav")
        .to_string();

    log::info!(
        "Loaded {} mono samples ({:.1}s at {} Hz)",
        samples.len(),
        samples.len() as f64 / spec.sample_rate as f64,
        spec.sample_rate
    );

    Ok(WaveformSource {
        samples,
        sample_rate: spec.sample_rate,
        label,
    })
}

/// Average interleaved channels into a mono signal
fn mix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Generate a linear sweep from -1.0 to +1.0
///
/// The sweep is strictly monotonic, so any glitch in the playback path
/// shows up as an audible step.
pub fn linear_sweep(sample_count: usize, sample_rate: u32) -> WaveformSource {
    let samples = if sample_count <= 1 {
        vec![-1.0; sample_count]
    } else {
        let step = 2.0 / (sample_count - 1) as f64;
        (0..sample_count)
            .map(|i| (-1.0 + i as f64 * step) as f32)
            .collect()
    };

    WaveformSource {
        samples,
        sample_rate,
        label: format!("linear-sweep-{}", sample_count),
    }
}
