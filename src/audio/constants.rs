/// Audio processing constants
/// Separated from the plugin shell so the DSP core has no host dependency

/// Cutoff frequencies for the selectable filter paths
pub const CUTOFF_ONE_POLE_HZ: f64 = 5.0; // Target for the 1st-order DC blocker
pub const CUTOFF_10HZ: f64 = 10.0;
pub const CUTOFF_20HZ: f64 = 20.0;

/// The analysis low-pass falls back to this when nothing is being removed
pub const DEFAULT_ANALYSIS_CUTOFF_HZ: f64 = CUTOFF_20HZ;

/// Butterworth Q for the 2nd-order sections (1/sqrt(2))
pub const BUTTERWORTH_Q: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Cutoffs are clamped into [MIN_CUTOFF_HZ, nyquist * MAX_CUTOFF_NYQUIST_RATIO]
pub const MIN_CUTOFF_HZ: f64 = 0.01;
pub const MAX_CUTOFF_NYQUIST_RATIO: f64 = 0.999;

/// RMS and low-frequency energy are published every N accumulated samples
pub const RMS_WINDOW_SAMPLES: usize = 256;

/// Waveform preview ring size. Must stay a power of two.
pub const VISUALIZER_CAPACITY: usize = 1024;

/// Used until the host tells us otherwise
pub const DEFAULT_SAMPLE_RATE: f64 = 44100.0;

/// Reported to the host so the 2-pole decay is not cut off when the input stops
pub const TAIL_LENGTH_SECONDS: f64 = 0.1;

/// Display precision for the metric readouts (values are shown in percent)
pub const DC_DISPLAY_DECIMALS: usize = 3;
pub const LEVEL_DISPLAY_DECIMALS: usize = 2;
