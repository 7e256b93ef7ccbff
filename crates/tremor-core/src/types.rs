//! Common types for Tremor
//!
//! Fundamental audio types shared by the renderer engine and the output
//! backend.

/// Default sample rate for audified output (44.1kHz)
/// This is the default; the actual rate is negotiated with the device at
/// stream creation.
pub const SAMPLE_RATE: u32 = 44100;

/// Render block size used when no device-negotiated size applies
/// (offline rendering and tests). Matches the fixed quantum of the
/// real-time callback on most backends.
pub const BLOCK_SIZE: usize = 128;

/// Audio sample type (signed-normalized float, range approx. [-1, 1])
pub type Sample = f32;

/// Playback state of a render session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    /// Buffering pre-roll; playback has not started yet
    #[default]
    Waiting,
    /// Actively rendering buffered samples
    Playing,
    /// Paused by transport command; buffer and cursors untouched
    Paused,
    /// Stream fully drained; terminal
    Finished,
}

impl PlayState {
    /// Encode for atomic storage (see `RendererAtomics`)
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            PlayState::Waiting => 0,
            PlayState::Playing => 1,
            PlayState::Paused => 2,
            PlayState::Finished => 3,
        }
    }

    /// Decode from atomic storage
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => PlayState::Playing,
            2 => PlayState::Paused,
            3 => PlayState::Finished,
            _ => PlayState::Waiting,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_state_roundtrip() {
        for state in [
            PlayState::Waiting,
            PlayState::Playing,
            PlayState::Paused,
            PlayState::Finished,
        ] {
            assert_eq!(PlayState::from_u8(state.to_u8()), state);
        }
    }
}
