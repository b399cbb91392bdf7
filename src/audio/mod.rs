pub mod audio_engine;
pub mod biquad;
pub mod coefficients;
pub mod constants;
pub mod error;
pub mod filter_engine;
pub mod meter_communication;
pub mod metrics_engine;
pub mod one_pole;
pub mod sample_buffer_engine;
