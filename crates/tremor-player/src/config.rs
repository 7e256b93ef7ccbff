//! Player configuration for tremor-player
//!
//! Configuration is stored as YAML in the user's config directory.
//! Default location: ~/.config/tremor-player/config.yaml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use tremor_core::audio::AudioConfig;
use tremor_core::engine::SessionConfig;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Audio output settings (device, buffer size, sample rate)
    pub audio: AudioConfig,
    /// Playback session settings (pre-roll, buffer policy, speed)
    pub session: SessionConfig,
    /// Feeder settings (chunk duration, delivery pacing)
    pub feeder: FeederConfig,
}

/// Feeder configuration section
///
/// Controls how the producer thread slices the source waveform and how
/// fast it delivers chunks relative to their audio duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeederConfig {
    /// Duration of each delivered chunk in milliseconds
    pub chunk_ms: u64,
    /// Delivery pacing relative to real time: 1.0 delivers a chunk every
    /// chunk_ms wall-clock milliseconds (simulated network arrival),
    /// larger values deliver faster, 0 disables pacing entirely
    pub rate_factor: f64,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            chunk_ms: 250,    // Matches typical progressive-fetch granularity
            rate_factor: 4.0, // Deliver 4x faster than playback consumes
        }
    }
}

/// Get the default config file path
///
/// Returns: ~/.config/tremor-player/config.yaml
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("tremor-player")
        .join("config.yaml")
}

/// Load configuration from a YAML file
///
/// If the file doesn't exist, returns default config.
/// If the file exists but is invalid, logs a warning and returns default config.
pub fn load_config(path: &Path) -> PlayerConfig {
    log::info!("load_config: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_config: Config file doesn't exist, using defaults");
        return PlayerConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<PlayerConfig>(&contents) {
            Ok(config) => {
                log::info!(
                    "load_config: Loaded config - chunk: {}ms, rate factor: {:.1}, speed: {:.3}",
                    config.feeder.chunk_ms,
                    config.feeder.rate_factor,
                    config.session.speed
                );
                config
            }
            Err(e) => {
                log::warn!("load_config: Failed to parse config: {}, using defaults", e);
                PlayerConfig::default()
            }
        },
        Err(e) => {
            log::warn!(
                "load_config: Failed to read config file: {}, using defaults",
                e
            );
            PlayerConfig::default()
        }
    }
}

/// Save configuration to a YAML file
///
/// Creates parent directories if they don't exist.
pub fn save_config(config: &PlayerConfig, path: &Path) -> Result<()> {
    log::info!("save_config: Saving to {:?}", path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;

    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    log::info!("save_config: Config saved successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlayerConfig::default();
        assert_eq!(config.feeder.chunk_ms, 250);
        assert_eq!(config.feeder.rate_factor, 4.0);
        assert_eq!(config.session.speed, 1.0);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut config = PlayerConfig::default();
        config.feeder.chunk_ms = 100;
        config.feeder.rate_factor = 1.0;
        config.session = config.session.with_speed(2.5).with_preroll_secs(0.5);

        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: PlayerConfig = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(parsed.feeder.chunk_ms, 100);
        assert_eq!(parsed.feeder.rate_factor, 1.0);
        assert_eq!(parsed.session.speed, 2.5);
        assert_eq!(parsed.session.preroll_secs, 0.5);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = load_config(Path::new("/nonexistent/tremor-player/config.yaml"));
        assert_eq!(config.feeder.chunk_ms, 250);
    }
}
