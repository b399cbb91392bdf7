pub mod waveform_display;

pub use waveform_display::WaveformDisplay;
