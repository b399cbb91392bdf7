use thiserror::Error;

/// Configuration-time failures of [`AudioSessionController::prepare`]
///
/// The streaming path has no error type, everything that can go wrong is
/// rejected here before audio starts.
///
/// [`AudioSessionController::prepare`]: crate::audio::audio_engine::AudioSessionController::prepare
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Sample rate is zero, negative or not finite
    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(f64),

    /// Nyquist is at or below one of the design cutoffs
    #[error("Sample rate {sample_rate} Hz cannot place a {cutoff_hz} Hz cutoff below Nyquist")]
    CutoffAboveNyquist { cutoff_hz: f64, sample_rate: f64 },

    /// No channels to process
    #[error("Invalid channel count: {0}")]
    InvalidChannelCount(usize),

    /// Maximum block size of zero
    #[error("Invalid maximum block size: {0}")]
    InvalidBlockSize(usize),
}
